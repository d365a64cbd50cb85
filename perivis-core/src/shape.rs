use serde::{Deserialize, Serialize};

/// Silhouettes shown to the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Star,
    Cross,
}

impl Shape {
    pub const ALL: [Shape; 5] = [
        Shape::Circle,
        Shape::Square,
        Shape::Triangle,
        Shape::Star,
        Shape::Cross,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Triangle => "triangle",
            Shape::Star => "star",
            Shape::Cross => "cross",
        }
    }
}

/// A participant's identification: a concrete shape, or the explicit
/// "don't know" response. `Unknown` never equals a real shape, so it is
/// always scored incorrect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Shape(Shape),
    Unknown,
}

impl Answer {
    pub fn matches(&self, shape: Shape) -> bool {
        matches!(self, Answer::Shape(s) if *s == shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_matches_no_shape() {
        for shape in Shape::ALL {
            assert!(!Answer::Unknown.matches(shape));
        }
    }

    #[test]
    fn shape_answer_matches_only_itself() {
        assert!(Answer::Shape(Shape::Star).matches(Shape::Star));
        assert!(!Answer::Shape(Shape::Star).matches(Shape::Cross));
    }

    #[test]
    fn labels_are_distinct() {
        let mut labels: Vec<&str> = Shape::ALL.iter().map(Shape::label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), Shape::ALL.len());
    }
}
