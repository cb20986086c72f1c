use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Volume of pure alcohol in one U.S. standard drink, in fluid ounces
pub const STANDARD_DRINK: f64 = 0.6;

/// A single drink with a volume and an alcohol content
///
/// The alcohol-by-volume is always stored as a fraction. Values above 1 are
/// taken to be percentages and divided by 100 on construction, so
/// `Drink::new("IPA", 12.0, 6.5)` and `Drink::new("IPA", 12.0, 0.065)` are the
/// same drink. No other validation is performed.
///
/// The number of standard drinks is derived from volume and abv when the
/// drink is built and cannot be set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DrinkSpec")]
pub struct Drink {
    name: String,
    volume: f64,
    abv: f64,
    standard_drinks: f64,
}

impl Drink {
    /// Create a new drink
    ///
    /// # Arguments
    ///
    /// * `name` - Label stored in the drink log
    /// * `volume` - Volume of the drink, in fluid ounces
    /// * `abv` - Alcohol by volume, either as a fraction or a percentage
    pub fn new(name: impl Into<String>, volume: f64, abv: f64) -> Self {
        let abv = normalize_abv(abv);
        Drink {
            name: name.into(),
            volume,
            abv,
            standard_drinks: volume * abv / STANDARD_DRINK,
        }
    }

    /// Get the name of the drink
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the volume of the drink
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Get the alcohol by volume as a fraction
    pub fn abv(&self) -> f64 {
        self.abv
    }

    /// Volume of pure alcohol in the drink
    pub fn alcohol_content(&self) -> f64 {
        self.volume * self.abv
    }

    /// Number of standard drinks this drink amounts to
    pub fn standard_drinks(&self) -> f64 {
        self.standard_drinks
    }

    /// Return a copy of this drink with a different volume
    pub fn with_volume(&self, volume: f64) -> Self {
        Drink::new(self.name.clone(), volume, self.abv)
    }

    /// Return a copy of this drink with a different alcohol content
    pub fn with_abv(&self, abv: f64) -> Self {
        Drink::new(self.name.clone(), self.volume, abv)
    }
}

/// The inputs of a drink, so deserializing goes through [Drink::new]
#[derive(Deserialize)]
struct DrinkSpec {
    name: String,
    volume: f64,
    abv: f64,
}

impl From<DrinkSpec> for Drink {
    fn from(spec: DrinkSpec) -> Self {
        Drink::new(spec.name, spec.volume, spec.abv)
    }
}

fn normalize_abv(abv: f64) -> f64 {
    if abv > 1.0 {
        abv / 100.0
    } else {
        abv
    }
}

/// Mixing two drinks pours them into one glass: volumes and alcohol add up.
impl Add for Drink {
    type Output = Drink;

    fn add(self, rhs: Drink) -> Drink {
        let volume = self.volume + rhs.volume;
        let alcohol = self.alcohol_content() + rhs.alcohol_content();
        let abv = if volume == 0.0 { 0.0 } else { alcohol / volume };
        Drink {
            name: format!("{} + {}", self.name, rhs.name),
            volume,
            abv,
            standard_drinks: alcohol / STANDARD_DRINK,
        }
    }
}

impl fmt::Display for Drink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} oz, {:.1}% abv, {:.2} standard drinks)",
            self.name,
            self.volume,
            self.abv * 100.0,
            self.standard_drinks
        )
    }
}
