pub mod clock;
pub mod frames;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use frames::FrameStats;
pub use timer::{PhaseTimer, TimerToken, precise_sleep};
