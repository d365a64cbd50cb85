pub mod phase;
pub mod shape;
pub mod trial;

pub use phase::Phase;
pub use shape::{Answer, Shape};
pub use trial::{ResultsSummary, Trial, TrialResult};
