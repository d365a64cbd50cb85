use serde::{Deserialize, Serialize};

use crate::shape::{Answer, Shape};

/// One planned presentation: a shape at an angle (degrees) on the
/// eccentricity circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub shape: Shape,
    pub position: u16,
    pub is_retry: bool,
    /// Index of the trial this retry stems from. `Some` iff `is_retry`.
    pub original_index: Option<usize>,
    /// Central shape flashed alongside the peripheral one (dual-target
    /// variant). Assigned per presentation when the trial becomes
    /// current, never reused across trials.
    pub fixation_shape: Option<Shape>,
}

impl Trial {
    pub fn new(shape: Shape, position: u16) -> Self {
        Self {
            shape,
            position,
            is_retry: false,
            original_index: None,
            fixation_shape: None,
        }
    }

    /// The single re-attempt spawned when the fixation judgment for the
    /// trial at `index` failed. Same shape and position; the fixation
    /// shape is drawn fresh when the retry is presented.
    pub fn retry(&self, index: usize) -> Self {
        Self {
            shape: self.shape,
            position: self.position,
            is_retry: true,
            original_index: Some(index),
            fixation_shape: None,
        }
    }
}

/// Recorded outcome of one completed trial, appended in completion
/// order. Fixation fields are `None` for the single-target variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub position: u16,
    pub shown_shape: Shape,
    pub chosen_shape: Answer,
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixation_shape: Option<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_fixation: Option<Answer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_fixation: Option<bool>,
    pub is_retry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_index: Option<usize>,
}

/// Aggregate accuracy over a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsSummary {
    pub trials: usize,
    pub correct: usize,
    pub fixation_judged: usize,
    pub fixation_correct: usize,
    pub retries: usize,
}

impl ResultsSummary {
    pub fn from_results(results: &[TrialResult]) -> Self {
        Self {
            trials: results.len(),
            correct: results.iter().filter(|r| r.correct).count(),
            fixation_judged: results.iter().filter(|r| r.chosen_fixation.is_some()).count(),
            fixation_correct: results
                .iter()
                .filter(|r| r.correct_fixation == Some(true))
                .count(),
            retries: results.iter().filter(|r| r.is_retry).count(),
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.correct as f64 / self.trials as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_copies_shape_and_position() {
        let trial = Trial::new(Shape::Triangle, 90);
        let retry = trial.retry(7);
        assert_eq!(retry.shape, Shape::Triangle);
        assert_eq!(retry.position, 90);
        assert!(retry.is_retry);
        assert_eq!(retry.original_index, Some(7));
        assert_eq!(retry.fixation_shape, None);
    }

    #[test]
    fn summary_counts_accuracy() {
        let results = vec![
            TrialResult {
                position: 0,
                shown_shape: Shape::Circle,
                chosen_shape: Answer::Shape(Shape::Circle),
                correct: true,
                fixation_shape: None,
                chosen_fixation: None,
                correct_fixation: None,
                is_retry: false,
                original_index: None,
            },
            TrialResult {
                position: 180,
                shown_shape: Shape::Square,
                chosen_shape: Answer::Unknown,
                correct: false,
                fixation_shape: None,
                chosen_fixation: None,
                correct_fixation: None,
                is_retry: true,
                original_index: Some(0),
            },
        ];
        let summary = ResultsSummary::from_results(&results);
        assert_eq!(summary.trials, 2);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.retries, 1);
        assert!((summary.accuracy() - 0.5).abs() < f64::EPSILON);
    }
}
