//! Characteristic-to-loading map estimated by the dynamic regression.

use ndarray::{Array1, Array2, ArrayView1};

use crate::FactorName;

/// The `K x L` matrix Γ mapping an asset's characteristic vector to its
/// factor loadings: `beta = Γ z`.
///
/// Immutable once estimated.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingMatrix {
    factors: Vec<FactorName>,
    characteristics: Vec<String>,
    gamma: Array2<f64>,
}

impl LoadingMatrix {
    /// Wrap an estimated Γ. Returns `None` when the shape does not match the labels.
    #[must_use]
    pub fn new(
        factors: Vec<FactorName>,
        characteristics: Vec<String>,
        gamma: Array2<f64>,
    ) -> Option<Self> {
        (gamma.nrows() == factors.len() && gamma.ncols() == characteristics.len())
            .then_some(Self { factors, characteristics, gamma })
    }

    /// Factor labels (rows).
    #[must_use]
    pub fn factors(&self) -> &[FactorName] {
        &self.factors
    }

    /// Characteristic labels (columns).
    #[must_use]
    pub fn characteristics(&self) -> &[String] {
        &self.characteristics
    }

    /// The raw matrix.
    #[must_use]
    pub const fn gamma(&self) -> &Array2<f64> {
        &self.gamma
    }

    /// Entry for one factor/characteristic pair.
    #[must_use]
    pub fn get(&self, factor: &FactorName, characteristic: &str) -> Option<f64> {
        let k = self.factors.iter().position(|f| f == factor)?;
        let l = self.characteristics.iter().position(|c| c == characteristic)?;
        Some(self.gamma[[k, l]])
    }

    /// Loadings implied by a characteristic vector.
    #[must_use]
    pub fn betas(&self, z: ArrayView1<'_, f64>) -> Array1<f64> {
        self.gamma.dot(&z)
    }
}
