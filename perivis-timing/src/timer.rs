use std::time::Duration;

/// Identifies one arming of a [`PhaseTimer`]. Re-arming mints a new
/// token, so an expiry event carrying an old token is recognizably
/// stale and can be dropped instead of firing into the wrong phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// One-shot deadline holder with at most one pending timer. Arming
/// cancels whatever was pending before, so two timers can never be
/// armed for the same logical trial.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    armed: Option<(TimerToken, Duration)>,
    generation: u64,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to come due `after` from `now`, replacing any
    /// pending deadline. Returns the token the expiry will carry.
    pub fn arm(&mut self, now: Duration, after: Duration) -> TimerToken {
        self.generation += 1;
        let token = TimerToken(self.generation);
        self.armed = Some((token, now + after));
        token
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Takes the deadline if it has come due, disarming the timer.
    pub fn poll(&mut self, now: Duration) -> Option<TimerToken> {
        match self.armed {
            Some((token, deadline)) if now >= deadline => {
                self.armed = None;
                Some(token)
            }
            _ => None,
        }
    }

    /// Time remaining until the pending deadline, zero if overdue.
    pub fn due_in(&self, now: Duration) -> Option<Duration> {
        self.armed.map(|(_, deadline)| deadline.saturating_sub(now))
    }
}

/// Sleeps without the scheduler slack of `std::thread::sleep` where the
/// platform allows it.
pub fn precise_sleep(duration: Duration) {
    #[cfg(target_os = "linux")]
    {
        use libc::{CLOCK_MONOTONIC, clock_nanosleep, timespec};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };
        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }
    #[cfg(not(target_os = "linux"))]
    std::thread::sleep(duration);
}
