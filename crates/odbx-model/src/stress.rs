//! Stress tensor records.

/// Symmetric stress tensor in the database's component order
/// (`S11, S22, S33, S12, S13, S23`)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StressTensor {
    pub s11: f64,
    pub s22: f64,
    pub s33: f64,
    pub s12: f64,
    pub s13: f64,
    pub s23: f64,
}

impl StressTensor {
    pub fn new(s11: f64, s22: f64, s33: f64, s12: f64, s13: f64, s23: f64) -> Self {
        Self {
            s11,
            s22,
            s33,
            s12,
            s13,
            s23,
        }
    }

    /// Build from a field value's component list. Returns `None` when fewer
    /// than six components are present; extra components are ignored.
    pub fn from_components(data: &[f64]) -> Option<Self> {
        match data {
            [s11, s22, s33, s12, s13, s23, ..] => {
                Some(Self::new(*s11, *s22, *s33, *s12, *s13, *s23))
            }
            _ => None,
        }
    }

    pub fn components(&self) -> [f64; 6] {
        [self.s11, self.s22, self.s33, self.s12, self.s13, self.s23]
    }
}

/// Element-averaged stress: one row of the stress table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementStress {
    pub element_label: i32,
    /// Mean of the per-sample von Mises values
    pub mises: f64,
    /// Component-wise mean of the sampled tensors
    pub tensor: StressTensor,
    /// Number of samples that contributed
    pub samples: usize,
}
