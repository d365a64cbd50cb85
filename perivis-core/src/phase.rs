/// Stages of one experiment run. `Results` is terminal until the next
/// start resets the machine to `Intro`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Intro,
    Blank,
    Display,
    PostDisplayBlank,
    Choice,
    Results,
}

impl Phase {
    /// Phase entered when this phase's timer expires. `None` for phases
    /// that wait on participant input instead of a timer.
    pub fn on_timeout(&self) -> Option<Phase> {
        match self {
            Phase::Blank => Some(Phase::Display),
            Phase::Display => Some(Phase::PostDisplayBlank),
            Phase::PostDisplayBlank => Some(Phase::Choice),
            _ => None,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.on_timeout().is_some()
    }

    pub fn accepts_choice(&self) -> bool {
        matches!(self, Phase::Choice)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Results)
    }

    /// The fixation mark is on screen from the first blank through the
    /// post-display blank.
    pub fn shows_fixation(&self) -> bool {
        matches!(self, Phase::Blank | Phase::Display | Phase::PostDisplayBlank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_phases_chain_to_choice() {
        assert_eq!(Phase::Blank.on_timeout(), Some(Phase::Display));
        assert_eq!(Phase::Display.on_timeout(), Some(Phase::PostDisplayBlank));
        assert_eq!(Phase::PostDisplayBlank.on_timeout(), Some(Phase::Choice));
    }

    #[test]
    fn input_phases_have_no_timeout() {
        for phase in [Phase::Intro, Phase::Choice, Phase::Results] {
            assert_eq!(phase.on_timeout(), None);
            assert!(!phase.is_timed());
        }
    }

    #[test]
    fn only_results_is_terminal() {
        assert!(Phase::Results.is_terminal());
        for phase in [
            Phase::Intro,
            Phase::Blank,
            Phase::Display,
            Phase::PostDisplayBlank,
            Phase::Choice,
        ] {
            assert!(!phase.is_terminal());
        }
    }

    #[test]
    fn fixation_is_up_from_first_blank_through_post_display() {
        for phase in [Phase::Blank, Phase::Display, Phase::PostDisplayBlank] {
            assert!(phase.shows_fixation());
        }
        for phase in [Phase::Intro, Phase::Choice, Phase::Results] {
            assert!(!phase.shows_fixation());
        }
    }
}
