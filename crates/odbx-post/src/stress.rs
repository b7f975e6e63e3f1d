//! Von Mises evaluation and per-element stress averaging.
//!
//! Samples (integration points or element-nodal values) are accumulated per
//! element. The equivalent stress is averaged sample by sample: the row's
//! MISES is the mean of the per-sample von Mises values, not the von Mises of
//! the averaged tensor. The two differ whenever the samples are not
//! proportional.

use std::collections::BTreeMap;

use odbx_model::{ElementStress, FieldValue, StressTensor};

/// Compute von Mises stress from stress tensor components
///
/// Formula: σ_v = sqrt(((S11 - S22)² + (S22 - S33)² + (S33 - S11)² + 6 * (S12² + S13² + S23²)) / 2)
///
/// # Example
///
/// ```
/// use odbx_model::StressTensor;
/// use odbx_post::stress::compute_mises_stress;
///
/// let uniaxial = StressTensor::new(100.0, 0.0, 0.0, 0.0, 0.0, 0.0);
/// assert!((compute_mises_stress(&uniaxial) - 100.0).abs() < 1e-12);
/// ```
pub fn compute_mises_stress(stress: &StressTensor) -> f64 {
    let s = stress;
    let normal = (s.s11 - s.s22).powi(2) + (s.s22 - s.s33).powi(2) + (s.s33 - s.s11).powi(2);
    let shear = 6.0 * (s.s12.powi(2) + s.s13.powi(2) + s.s23.powi(2));
    ((normal + shear) / 2.0).sqrt()
}

/// One stress sample attributed to an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressSample {
    pub element_label: i32,
    pub tensor: StressTensor,
    /// Equivalent stress supplied by the database, if any
    pub mises: Option<f64>,
}

impl StressSample {
    pub fn new(element_label: i32, tensor: StressTensor) -> Self {
        Self {
            element_label,
            tensor,
            mises: None,
        }
    }

    pub fn with_mises(mut self, mises: f64) -> Self {
        self.mises = Some(mises);
        self
    }

    /// Interpret a stress field value. `None` when the value has no element
    /// label or fewer than six components.
    pub fn from_field_value(value: &FieldValue) -> Option<Self> {
        Some(Self {
            element_label: value.element_label?,
            tensor: StressTensor::from_components(&value.data)?,
            mises: value.mises,
        })
    }

    /// Supplied equivalent stress when usable, otherwise computed from the tensor
    pub fn mises(&self) -> f64 {
        match self.mises {
            Some(m) if m.is_finite() => m,
            _ => compute_mises_stress(&self.tensor),
        }
    }
}

/// Running sums of one element's samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StressAccumulator {
    mises: f64,
    components: [f64; 6],
    count: usize,
}

impl StressAccumulator {
    pub fn add(&mut self, sample: &StressSample) {
        self.mises += sample.mises();
        for (sum, value) in self.components.iter_mut().zip(sample.tensor.components()) {
            *sum += value;
        }
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of the accumulated samples. An empty accumulator divides by one,
    /// giving an all-zero row instead of NaN.
    pub fn mean(&self, element_label: i32) -> ElementStress {
        let n = self.count.max(1) as f64;
        let [s11, s22, s33, s12, s13, s23] = self.components.map(|sum| sum / n);
        ElementStress {
            element_label,
            mises: self.mises / n,
            tensor: StressTensor::new(s11, s22, s33, s12, s13, s23),
            samples: self.count,
        }
    }
}

/// Average samples per element, ordered by ascending element label.
pub fn average_by_element<I>(samples: I) -> Vec<ElementStress>
where
    I: IntoIterator<Item = StressSample>,
{
    let mut by_element = BTreeMap::<i32, StressAccumulator>::new();
    for sample in samples {
        by_element.entry(sample.element_label).or_default().add(&sample);
    }

    by_element
        .iter()
        .map(|(&label, acc)| acc.mean(label))
        .collect()
}
