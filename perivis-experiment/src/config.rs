use perivis_core::Shape;

/// Whether the participant judges only the peripheral shape, or the
/// peripheral and the central fixation shape together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentMode {
    Single,
    Dual,
}

/// Run parameters, supplied by the caller. Changes take effect on the
/// next start; the machine reads its config only at phase entry.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub blank_ms: u64,
    pub display_ms: u64,
    /// Shapes in declared order; the cross-product iterates these on
    /// the outside.
    pub shapes: Vec<Shape>,
    /// Angles in degrees on the eccentricity circle, declared order.
    pub positions: Vec<u16>,
    pub mode: ExperimentMode,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            blank_ms: 2000,
            display_ms: 100,
            shapes: Shape::ALL.to_vec(),
            positions: (0..8).map(|i| i * 45).collect(),
            mode: ExperimentMode::Single,
        }
    }
}
