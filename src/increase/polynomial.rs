use std::path::Path;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use super::{BacIncrease, BacTable};
use crate::BacError;

/// Degree in each variable of the default BAC surface
pub const DEFAULT_ORDER: usize = 3;

/// Coefficients fitted to the default table, used when no fitted file is available
///
/// Row-major in `(i, j)`: entry `i * 4 + j` multiplies `drinks^i * weight^j`.
pub const FALLBACK_COEFFICIENTS: [f64; 16] = [
    4.44974702e-03,
    -1.17137983e-04,
    9.12197099e-07,
    -2.12299842e-09,
    9.56141142e-02,
    -8.64115228e-04,
    3.26934846e-06,
    -4.39083421e-09,
    2.67995601e-04,
    -7.61634984e-06,
    6.75404403e-08,
    -1.73084231e-10,
    -1.11933009e-05,
    3.28956868e-07,
    -3.07216348e-09,
    8.16564848e-12,
];

/// Error type for the polynomial surface
#[derive(Error, Debug, Clone)]
pub enum PolynomialError {
    #[error("Expected a square number of coefficients, got {0}")]
    CoefficientCount(usize),
    #[error("Cannot fit {coefficients} coefficients to {points} points")]
    TooFewPoints { points: usize, coefficients: usize },
    #[error("Least-squares fit failed: {0}")]
    FitError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerdeError(String),
}

/// A bivariate polynomial surface for the BAC increase
///
/// With `order` n the surface is
///
/// ```text
/// f(x, y) = sum over i, j in 0..=n of c[i * (n + 1) + j] * x^i * y^j
/// ```
///
/// where `x` is the number of standard drinks and `y` the body weight. The
/// surface is evaluated on the exact inputs, with no rounding, so it is defined
/// everywhere but only as accurate as the fit it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    order: usize,
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Create a polynomial from a flat, row-major list of coefficients
    ///
    /// The number of coefficients must be `(order + 1)^2` for some order.
    pub fn from_coefficients(coefficients: Vec<f64>) -> Result<Self, PolynomialError> {
        let len = coefficients.len();
        let side = (len as f64).sqrt().round() as usize;
        if len == 0 || side * side != len {
            return Err(PolynomialError::CoefficientCount(len));
        }
        Ok(Polynomial {
            order: side - 1,
            coefficients,
        })
    }

    /// The surface shipped with the crate
    pub fn fallback() -> Self {
        Polynomial {
            order: DEFAULT_ORDER,
            coefficients: FALLBACK_COEFFICIENTS.to_vec(),
        }
    }

    /// Least-squares fit of a surface of the given order over every point of `table`
    pub fn fit(table: &BacTable, order: usize) -> Result<Self, PolynomialError> {
        let ncols = (order + 1).pow(2);
        let points: Vec<(f64, f64, f64)> = table.points().collect();
        if points.len() < ncols {
            return Err(PolynomialError::TooFewPoints {
                points: points.len(),
                coefficients: ncols,
            });
        }

        let design = DMatrix::from_fn(points.len(), ncols, |row, k| {
            let (x, y, _) = points[row];
            let (i, j) = (k / (order + 1), k % (order + 1));
            x.powi(i as i32) * y.powi(j as i32)
        });
        let z = DVector::from_iterator(points.len(), points.iter().map(|p| p.2));

        // Equilibrate the columns, raw powers of the weight span many decades
        let scales: Vec<f64> = design
            .column_iter()
            .map(|column| {
                let norm = column.norm();
                if norm > 0.0 {
                    norm
                } else {
                    1.0
                }
            })
            .collect();
        let mut scaled = design;
        for (k, scale) in scales.iter().enumerate() {
            for value in scaled.column_mut(k).iter_mut() {
                *value /= scale;
            }
        }

        let solution = scaled
            .svd(true, true)
            .solve(&z, 1e-12)
            .map_err(|e| PolynomialError::FitError(e.to_string()))?;

        let coefficients: Vec<f64> = solution
            .iter()
            .zip(scales.iter())
            .map(|(c, scale)| c / scale)
            .collect();
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PolynomialError::FitError(
                "non-finite coefficient in solution".to_string(),
            ));
        }

        tracing::info!(
            "Fitted order-{} BAC surface to {} table points",
            order,
            points.len()
        );
        Ok(Polynomial {
            order,
            coefficients,
        })
    }

    /// Degree in each variable
    pub fn order(&self) -> usize {
        self.order
    }

    /// Flat, row-major coefficients
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Evaluate the surface at `x` standard drinks and body weight `y`
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let n = self.order + 1;
        let mut z = 0.0;
        let mut xi = 1.0;
        for i in 0..n {
            let mut yj = 1.0;
            for j in 0..n {
                z += self.coefficients[i * n + j] * xi * yj;
                yj *= y;
            }
            xi *= x;
        }
        z
    }

    /// Evaluate the surface pointwise over paired inputs
    pub fn evaluate_many(&self, xs: &[f64], ys: &[f64]) -> Vec<f64> {
        xs.iter()
            .zip(ys.iter())
            .map(|(&x, &y)| self.evaluate(x, y))
            .collect()
    }

    /// Largest absolute difference between the surface and the table on its grid
    pub fn max_residual(&self, table: &BacTable) -> f64 {
        table
            .points()
            .map(|(x, y, z)| (self.evaluate(x, y) - z).abs())
            .fold(0.0, f64::max)
    }

    /// Write the coefficients as a flat JSON array
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PolynomialError> {
        let json = serde_json::to_string_pretty(&self.coefficients)
            .map_err(|e| PolynomialError::SerdeError(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| PolynomialError::IoError(e.to_string()))
    }

    /// Read coefficients written by [Polynomial::save_json]
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PolynomialError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| PolynomialError::IoError(e.to_string()))?;
        let coefficients: Vec<f64> = serde_json::from_str(&contents)
            .map_err(|e| PolynomialError::SerdeError(e.to_string()))?;
        let poly = Self::from_coefficients(coefficients)?;
        tracing::info!(
            "Loaded {} polynomial coefficients from {}",
            poly.coefficients.len(),
            path.display()
        );
        Ok(poly)
    }
}

impl Default for Polynomial {
    fn default() -> Self {
        Self::fallback()
    }
}

impl BacIncrease for Polynomial {
    fn increase(&self, standard_drinks: f64, weight: f64) -> Result<f64, BacError> {
        Ok(self.evaluate(standard_drinks, weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coefficient_count() {
        assert!(Polynomial::from_coefficients(vec![1.0; 16]).is_ok());
        assert_eq!(Polynomial::from_coefficients(vec![1.0; 9]).unwrap().order(), 2);
        assert!(matches!(
            Polynomial::from_coefficients(vec![1.0; 15]),
            Err(PolynomialError::CoefficientCount(15))
        ));
        assert!(matches!(
            Polynomial::from_coefficients(Vec::new()),
            Err(PolynomialError::CoefficientCount(0))
        ));
    }

    #[test]
    fn test_evaluate_layout() {
        // 1 + 2y + 3x + 4xy
        let poly = Polynomial::from_coefficients(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(poly.evaluate(0.0, 0.0), 1.0);
        assert_eq!(poly.evaluate(0.0, 1.0), 3.0);
        assert_eq!(poly.evaluate(1.0, 0.0), 4.0);
        assert_eq!(poly.evaluate(2.0, 3.0), 1.0 + 6.0 + 6.0 + 24.0);
        assert_eq!(
            poly.evaluate_many(&[0.0, 1.0], &[1.0, 0.0]),
            vec![3.0, 4.0]
        );
    }

    #[test]
    fn test_fallback_matches_table() {
        let table = BacTable::embedded().unwrap();
        let poly = Polynomial::fallback();
        assert!(poly.max_residual(&table) < 0.01);
        assert_relative_eq!(poly.evaluate(1.0, 150.0), 0.025, epsilon = 1e-3);
    }

    #[test]
    fn test_fit_recovers_exact_surface() {
        let weights: Vec<f64> = (0..6).map(|k| 100.0 + 20.0 * k as f64).collect();
        let drinks: Vec<f64> = (0..6).map(|k| k as f64).collect();
        let surface = |x: f64, y: f64| 0.01 + 0.002 * x - 1e-5 * y + 3e-6 * x * y;
        let values = DMatrix::from_fn(weights.len(), drinks.len(), |r, c| {
            surface(drinks[c], weights[r])
        });
        let table = BacTable::new(weights, drinks, values).unwrap();

        let poly = Polynomial::fit(&table, 1).unwrap();
        assert_eq!(poly.order(), 1);
        let expected = [0.01, -1e-5, 0.002, 3e-6];
        for (c, e) in poly.coefficients().iter().zip(expected.iter()) {
            assert_relative_eq!(*c, *e, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_fit_default_table() {
        let table = BacTable::embedded().unwrap();
        let poly = Polynomial::fit(&table, DEFAULT_ORDER).unwrap();
        assert_eq!(poly.coefficients().len(), 16);
        assert!(poly.max_residual(&table) < 0.01);
    }

    #[test]
    fn test_fit_needs_enough_points() {
        let table = BacTable::new(
            vec![100.0, 200.0],
            vec![1.0, 2.0],
            DMatrix::from_row_slice(2, 2, &[0.04, 0.08, 0.02, 0.04]),
        )
        .unwrap();
        assert!(matches!(
            Polynomial::fit(&table, 3),
            Err(PolynomialError::TooFewPoints {
                points: 4,
                coefficients: 16
            })
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let path = std::env::temp_dir().join(format!("bacsim_poly_{}.json", std::process::id()));
        let poly = Polynomial::fallback();
        poly.save_json(&path).unwrap();
        let loaded = Polynomial::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, poly);
    }
}
