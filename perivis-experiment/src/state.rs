use std::time::Duration;

use perivis_core::{Answer, Phase, Trial, TrialResult};
use perivis_timing::{Clock, PhaseTimer, TimerToken};
use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::config::{ExperimentConfig, ExperimentMode};
use crate::sequence;

/// Floor applied to misconfigured phase durations so a zero duration
/// degrades to a fast run instead of a stalled timer.
const MIN_PHASE_MS: u64 = 1;

#[derive(Debug, Error, PartialEq)]
pub enum ExperimentError {
    #[error("{event} is not valid in phase {phase:?}")]
    InvalidPhase { phase: Phase, event: &'static str },
    #[error("fixation judgments are not part of the single-target variant")]
    NotDualTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentEvent {
    StartPressed,
    PhaseElapsed(TimerToken),
    PeripheralChosen(Answer),
    FixationChosen(Answer),
}

/// Two-slot buffer for the dual-target variant. The two judgments
/// arrive independently in either order; the trial is finalized only
/// once both slots are filled, and nothing is recorded before that.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct JudgmentBuffer {
    peripheral: Option<Answer>,
    fixation: Option<Answer>,
}

impl JudgmentBuffer {
    fn complete(&self) -> Option<(Answer, Answer)> {
        match (self.peripheral, self.fixation) {
            (Some(p), Some(f)) => Some((p, f)),
            _ => None,
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Read-only view handed to the rendering boundary on every phase
/// change. The trial is a copy; the machine keeps exclusive ownership
/// of the live sequence and ledger.
#[derive(Debug, Clone)]
pub struct PhaseSnapshot {
    pub phase: Phase,
    pub trial: Option<Trial>,
    /// 1-based number of the current trial, 0 outside a run.
    pub trial_number: usize,
    pub total_trials: usize,
}

/// Drives one experiment run through its phases: timed blank/display
/// windows, the choice phase, retry insertion on failed fixation
/// judgments, and the result ledger.
///
/// Generic over the clock and rng so tests can substitute a manual
/// clock and a seeded rng.
pub struct ExperimentStateMachine<C: Clock, R: Rng> {
    phase: Phase,
    config: ExperimentConfig,
    clock: C,
    rng: R,
    timer: PhaseTimer,
    pending: Option<TimerToken>,
    sequence: Vec<Trial>,
    current: usize,
    results: Vec<TrialResult>,
    buffer: JudgmentBuffer,
}

impl<C: Clock, R: Rng> ExperimentStateMachine<C, R> {
    pub fn new(config: ExperimentConfig, clock: C, rng: R) -> Self {
        Self {
            phase: Phase::Intro,
            config,
            clock,
            rng,
            timer: PhaseTimer::new(),
            pending: None,
            sequence: Vec::new(),
            current: 0,
            results: Vec::new(),
            buffer: JudgmentBuffer::default(),
        }
    }

    /// Begins a fresh run: cancels any pending timer, regenerates the
    /// sequence, and resets the ledger. Valid in any phase, so a
    /// restart mid-run cannot leave a stale timer armed.
    pub fn start(&mut self) {
        self.timer.cancel();
        self.pending = None;
        self.sequence = sequence::generate(&self.config.shapes, &self.config.positions, &mut self.rng);
        self.current = 0;
        self.results.clear();
        self.buffer.clear();

        if self.sequence.is_empty() {
            tracing::warn!("empty shape or position set, nothing to run");
            self.phase = Phase::Results;
            return;
        }

        tracing::info!(trials = self.sequence.len(), mode = ?self.config.mode, "run started");
        self.enter_blank();
    }

    /// Polls the phase timer. Expired deadlines come back as events for
    /// [`handle_event`](Self::handle_event), so the driver loop decides
    /// when transitions are applied and tests never sleep.
    pub fn update(&mut self) -> Vec<ExperimentEvent> {
        let now = self.clock.now();
        self.timer
            .poll(now)
            .map(ExperimentEvent::PhaseElapsed)
            .into_iter()
            .collect()
    }

    /// Applies one event. `Ok(false)` means the event was stale or not
    /// applicable (a dropped timer never corrupts the run); `Err` is a
    /// caller contract violation such as a choice outside the choice
    /// phase.
    pub fn handle_event(&mut self, event: ExperimentEvent) -> Result<bool, ExperimentError> {
        match event {
            ExperimentEvent::StartPressed => {
                self.start();
                Ok(true)
            }
            ExperimentEvent::PhaseElapsed(token) => Ok(self.on_phase_elapsed(token)),
            ExperimentEvent::PeripheralChosen(answer) => {
                self.submit_peripheral(answer).map(|()| true)
            }
            ExperimentEvent::FixationChosen(answer) => self.submit_fixation(answer).map(|()| true),
        }
    }

    /// Peripheral identification. Finalizes the trial immediately in
    /// the single-target variant; buffers in the dual-target variant.
    pub fn submit_peripheral(&mut self, answer: Answer) -> Result<(), ExperimentError> {
        self.ensure_choice("peripheral choice")?;
        match self.config.mode {
            ExperimentMode::Single => self.finalize_single(answer),
            ExperimentMode::Dual => {
                self.buffer.peripheral = Some(answer);
                self.try_finalize_dual();
            }
        }
        Ok(())
    }

    /// Central fixation identification (dual-target variant only).
    pub fn submit_fixation(&mut self, answer: Answer) -> Result<(), ExperimentError> {
        self.ensure_choice("fixation choice")?;
        if self.config.mode != ExperimentMode::Dual {
            return Err(ExperimentError::NotDualTarget);
        }
        self.buffer.fixation = Some(answer);
        self.try_finalize_dual();
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    pub fn summary(&self) -> perivis_core::ResultsSummary {
        perivis_core::ResultsSummary::from_results(&self.results)
    }

    /// Time until the pending phase timer comes due, for drivers that
    /// want to wait instead of spinning.
    pub fn due_in(&self) -> Option<Duration> {
        self.timer.due_in(self.clock.now())
    }

    pub fn snapshot(&self) -> PhaseSnapshot {
        let in_trial = !matches!(self.phase, Phase::Intro | Phase::Results);
        PhaseSnapshot {
            phase: self.phase,
            trial: if in_trial {
                self.sequence.get(self.current).cloned()
            } else {
                None
            },
            trial_number: if in_trial { self.current + 1 } else { 0 },
            total_trials: self.sequence.len(),
        }
    }

    fn ensure_choice(&self, event: &'static str) -> Result<(), ExperimentError> {
        if self.phase.accepts_choice() {
            Ok(())
        } else {
            Err(ExperimentError::InvalidPhase {
                phase: self.phase,
                event,
            })
        }
    }

    fn on_phase_elapsed(&mut self, token: TimerToken) -> bool {
        if self.pending != Some(token) {
            tracing::debug!(?token, "stale timer expiry ignored");
            return false;
        }
        self.pending = None;

        let Some(next) = self.phase.on_timeout() else {
            return false;
        };
        self.phase = next;
        match next {
            Phase::Display => self.arm(self.config.display_ms),
            Phase::PostDisplayBlank => self.arm(self.config.blank_ms),
            // Choice waits on participant input, no timer.
            _ => {}
        }
        tracing::debug!(phase = ?self.phase, trial = self.current, "phase advanced");
        true
    }

    /// Enters the pre-display blank for the current trial, assigning a
    /// fresh fixation shape in the dual-target variant.
    fn enter_blank(&mut self) {
        if self.config.mode == ExperimentMode::Dual {
            if let Some(trial) = self.sequence.get_mut(self.current) {
                trial.fixation_shape = self.config.shapes.choose(&mut self.rng).copied();
            }
        }
        self.phase = Phase::Blank;
        self.arm(self.config.blank_ms);
    }

    fn arm(&mut self, ms: u64) {
        let ms = if ms < MIN_PHASE_MS {
            tracing::warn!(ms, min = MIN_PHASE_MS, "phase duration below minimum, clamping");
            MIN_PHASE_MS
        } else {
            ms
        };
        let now = self.clock.now();
        self.pending = Some(self.timer.arm(now, Duration::from_millis(ms)));
    }

    fn finalize_single(&mut self, answer: Answer) {
        let Some(trial) = self.sequence.get(self.current).cloned() else {
            return;
        };
        let result = TrialResult {
            position: trial.position,
            shown_shape: trial.shape,
            correct: answer.matches(trial.shape),
            chosen_shape: answer,
            fixation_shape: None,
            chosen_fixation: None,
            correct_fixation: None,
            is_retry: trial.is_retry,
            original_index: trial.original_index,
        };
        tracing::info!(trial = self.current, correct = result.correct, "trial completed");
        self.results.push(result);
        self.advance();
    }

    fn try_finalize_dual(&mut self) {
        let Some((peripheral, fixation)) = self.buffer.complete() else {
            return;
        };
        self.buffer.clear();
        let Some(trial) = self.sequence.get(self.current).cloned() else {
            return;
        };

        let correct_fixation = trial
            .fixation_shape
            .map(|s| fixation.matches(s))
            .unwrap_or(false);
        let result = TrialResult {
            position: trial.position,
            shown_shape: trial.shape,
            correct: peripheral.matches(trial.shape),
            chosen_shape: peripheral,
            fixation_shape: trial.fixation_shape,
            chosen_fixation: Some(fixation),
            correct_fixation: Some(correct_fixation),
            is_retry: trial.is_retry,
            original_index: trial.original_index,
        };

        // A missed or unknown fixation judgment earns one re-attempt,
        // and only for trials that are not themselves re-attempts.
        if !correct_fixation && !trial.is_retry {
            self.sequence.push(trial.retry(self.current));
            tracing::info!(original = self.current, "fixation missed, retry queued");
        }

        tracing::info!(
            trial = self.current,
            correct = result.correct,
            correct_fixation,
            "trial completed"
        );
        self.results.push(result);
        self.advance();
    }

    /// Moves to the next trial or finishes the run. Checked against the
    /// sequence length after any retry append, so a just-queued retry
    /// is visited before the run ends.
    fn advance(&mut self) {
        if self.current + 1 < self.sequence.len() {
            self.current += 1;
            self.enter_blank();
        } else {
            self.timer.cancel();
            self.pending = None;
            self.phase = Phase::Results;
            tracing::info!(results = self.results.len(), "run finished");
        }
    }
}
