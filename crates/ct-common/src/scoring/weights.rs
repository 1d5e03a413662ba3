/// Default preselection weights.
///
/// The skills weight is applied once per matching skill, so the total has
/// no fixed upper bound.
pub const DEFAULT_WEIGHTS: PreselectionWeights = PreselectionWeights {
    academic_average: 0.5,
    college: 0.3,
    skills: 0.01,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreselectionWeights {
    pub academic_average: f64,
    pub college: f64,
    /// Bonus per relevant skill held.
    pub skills: f64,
}

impl Default for PreselectionWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl PreselectionWeights {
    pub fn is_non_negative(&self) -> bool {
        self.academic_average >= 0.0 && self.college >= 0.0 && self.skills >= 0.0
    }
}
