use serde::{Deserialize, Serialize};

/// Fixed-length face descriptor produced by an external detector.
///
/// Stored as `f64` so persisted values survive a save/load cycle bit-for-bit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encoding(Vec<f64>);

impl Encoding {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Euclidean distance to `other`.
    ///
    /// Callers are responsible for checking that both encodings share a
    /// dimension; extra trailing components of the longer one are ignored.
    pub fn distance(&self, other: &Encoding) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

impl From<Vec<f64>> for Encoding {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl From<Vec<f32>> for Encoding {
    fn from(values: Vec<f32>) -> Self {
        Self(values.into_iter().map(f64::from).collect())
    }
}
