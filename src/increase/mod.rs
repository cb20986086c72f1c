//! Models for the BAC increase caused by a drink
//!
//! A [BacIncrease] maps a number of standard drinks and a body weight to the
//! rise in blood-alcohol concentration. Two strategies are provided:
//!
//! - [BacTable]: direct lookup in a tabulated grid, keyed by weight rounded to
//!   the nearest ten and drink count rounded to the nearest integer
//! - [Polynomial]: a bivariate polynomial surface fitted to the same grid,
//!   evaluated on the unrounded inputs
//!
//! [IncreaseModel] holds either one, so the strategy can be picked from
//! configuration. [BacModel] pairs it with the configured elimination and is
//! what [crate::BacConfig::build] returns.

pub mod polynomial;
pub mod table;

pub use polynomial::Polynomial;
pub use table::BacTable;

use crate::config::DecayModel;
use crate::BacError;

/// Capability of computing the BAC increase for a drink
pub trait BacIncrease {
    /// BAC increase for `standard_drinks` consumed by a person weighing `weight`
    fn increase(&self, standard_drinks: f64, weight: f64) -> Result<f64, BacError>;

    /// Elimination that people built on this model start with
    fn decay(&self) -> DecayModel {
        DecayModel::default()
    }
}

impl<T: BacIncrease + ?Sized> BacIncrease for &T {
    fn increase(&self, standard_drinks: f64, weight: f64) -> Result<f64, BacError> {
        (**self).increase(standard_drinks, weight)
    }

    fn decay(&self) -> DecayModel {
        (**self).decay()
    }
}

impl<T: BacIncrease + ?Sized> BacIncrease for Box<T> {
    fn increase(&self, standard_drinks: f64, weight: f64) -> Result<f64, BacError> {
        (**self).increase(standard_drinks, weight)
    }

    fn decay(&self) -> DecayModel {
        (**self).decay()
    }
}

/// The increase strategy selected at start-up
#[derive(Debug, Clone)]
pub enum IncreaseModel {
    Table(BacTable),
    Polynomial(Polynomial),
}

impl BacIncrease for IncreaseModel {
    fn increase(&self, standard_drinks: f64, weight: f64) -> Result<f64, BacError> {
        match self {
            IncreaseModel::Table(table) => table.increase(standard_drinks, weight),
            IncreaseModel::Polynomial(poly) => poly.increase(standard_drinks, weight),
        }
    }
}

impl From<BacTable> for IncreaseModel {
    fn from(table: BacTable) -> Self {
        IncreaseModel::Table(table)
    }
}

impl From<Polynomial> for IncreaseModel {
    fn from(poly: Polynomial) -> Self {
        IncreaseModel::Polynomial(poly)
    }
}

/// A configured increase strategy together with its elimination model
#[derive(Debug, Clone)]
pub struct BacModel {
    increase: IncreaseModel,
    decay: DecayModel,
}

impl BacModel {
    pub fn new(increase: impl Into<IncreaseModel>, decay: DecayModel) -> Self {
        BacModel {
            increase: increase.into(),
            decay,
        }
    }

    /// The increase strategy
    pub fn increase_model(&self) -> &IncreaseModel {
        &self.increase
    }
}

impl BacIncrease for BacModel {
    fn increase(&self, standard_drinks: f64, weight: f64) -> Result<f64, BacError> {
        self.increase.increase(standard_drinks, weight)
    }

    fn decay(&self) -> DecayModel {
        self.decay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategies_are_interchangeable() {
        let models: Vec<Box<dyn BacIncrease>> = vec![
            Box::new(BacTable::embedded().unwrap()),
            Box::new(Polynomial::fallback()),
            Box::new(IncreaseModel::from(BacTable::embedded().unwrap())),
        ];
        for model in &models {
            let delta = model.increase(1.0, 150.0).unwrap();
            assert!((delta - 0.025).abs() < 0.01, "delta = {}", delta);
            assert_eq!(model.decay(), DecayModel::default());
        }
    }

    #[test]
    fn test_bac_model_carries_decay() {
        let decay = DecayModel::new(0.02, crate::config::ElapsedTime::SubDay);
        let model = BacModel::new(Polynomial::fallback(), decay);
        assert_eq!(model.decay(), decay);
        fn decay_of<M: BacIncrease>(model: M) -> DecayModel {
            model.decay()
        }
        assert_eq!(decay_of(&model), decay);
        assert_eq!(decay_of(Box::new(model.clone())), decay);
        assert_eq!(
            model.increase(2.0, 180.0).unwrap(),
            Polynomial::fallback().evaluate(2.0, 180.0)
        );
        assert!(matches!(model.increase_model(), IncreaseModel::Polynomial(_)));
    }
}
