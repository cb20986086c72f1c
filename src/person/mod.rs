pub mod log;

use std::fmt;

use chrono::{DateTime, Utc};

pub use self::log::{DrinkLog, LogEntry};

use crate::config::DecayModel;
use crate::drink::Drink;
use crate::increase::BacIncrease;
use crate::BacError;

/// A drinker and the history of their blood-alcohol concentration
///
/// The BAC is kept as a log rather than a single value. Each new entry is
/// computed from the previous one: the BAC eliminated since then is
/// subtracted, the increase from the drink is added, and the result is
/// clamped at zero.
///
/// The increase model is borrowed, so one model built at start-up can serve
/// any number of people. A [Person] is not synchronized; callers recording
/// drinks from several threads must serialize access themselves.
///
/// # Example
///
/// ```rust
/// use bacsim::prelude::*;
///
/// let model = BacConfig::default().build().unwrap();
/// let mut person = Person::new("Alex", 30, 160.0, &model);
/// person.record_drink(&Drink::new("lager", 12.0, 5.0), None).unwrap();
/// assert!(person.current_bac() > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Person<'a, M: BacIncrease> {
    name: String,
    age: u32,
    weight: f64,
    bmi: Option<f64>,
    log: DrinkLog,
    model: &'a M,
    decay: DecayModel,
}

impl<'a, M: BacIncrease> Person<'a, M> {
    /// Create a sober person, starting the log now
    ///
    /// The elimination model is taken from `model`, see [BacIncrease::decay].
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the person
    /// * `age` - Age in years
    /// * `weight` - Body weight, in pounds
    /// * `model` - BAC increase model
    pub fn new(name: impl Into<String>, age: u32, weight: f64, model: &'a M) -> Self {
        Person {
            name: name.into(),
            age,
            weight,
            bmi: None,
            log: DrinkLog::new(Utc::now()),
            model,
            decay: model.decay(),
        }
    }

    /// Set the body-mass index, which does not enter the BAC computation
    pub fn with_bmi(mut self, bmi: f64) -> Self {
        self.bmi = Some(bmi);
        self
    }

    /// Use a different elimination model
    pub fn with_decay(mut self, decay: DecayModel) -> Self {
        self.decay = decay;
        self
    }

    /// Restart the log with a sober entry at `time`
    pub fn starting_at(mut self, time: DateTime<Utc>) -> Self {
        self.log = DrinkLog::new(time);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bmi(&self) -> Option<f64> {
        self.bmi
    }

    pub fn decay(&self) -> &DecayModel {
        &self.decay
    }

    /// The full drink log
    pub fn log(&self) -> &DrinkLog {
        &self.log
    }

    /// The most recent log entry
    pub fn last_entry(&self) -> &LogEntry {
        self.log.last()
    }

    /// BAC at the most recent log entry
    pub fn current_bac(&self) -> f64 {
        self.log.last().bac()
    }

    /// Record a drink at `time`, or now if `None`, and return the new BAC
    ///
    /// Fails without touching the log if `time` is before the last entry or
    /// the increase model has no value for this drink and weight.
    pub fn record_drink(
        &mut self,
        drink: &Drink,
        time: Option<DateTime<Utc>>,
    ) -> Result<f64, BacError> {
        let time = time.unwrap_or_else(Utc::now);
        let decrease = self.decrease_until(time)?;
        let increase = self.model.increase(drink.standard_drinks(), self.weight)?;
        self.append(time, Some(drink.name().to_string()), decrease, increase)
    }

    /// Record the passage of time without a drink and return the new BAC
    pub fn record_elapsed(&mut self, time: Option<DateTime<Utc>>) -> Result<f64, BacError> {
        let time = time.unwrap_or_else(Utc::now);
        let decrease = self.decrease_until(time)?;
        self.append(time, None, decrease, 0.0)
    }

    /// BAC at any `time`, reconstructed from the log
    ///
    /// Uses the latest entry at or before `time` and the elimination since
    /// then. Times before the log starts give 0.
    pub fn bac_at(&self, time: DateTime<Utc>) -> f64 {
        match self.log.entry_at(time) {
            Some(entry) => (entry.bac() - self.decay.decrease(entry.time(), time)).max(0.0),
            None => 0.0,
        }
    }

    fn decrease_until(&self, time: DateTime<Utc>) -> Result<f64, BacError> {
        let last = self.log.last().time();
        if time < last {
            return Err(BacError::OutOfOrder { last, time });
        }
        Ok(self.decay.decrease(last, time))
    }

    fn append(
        &mut self,
        time: DateTime<Utc>,
        drink: Option<String>,
        decrease: f64,
        increase: f64,
    ) -> Result<f64, BacError> {
        let unclamped = self.current_bac() - decrease + increase;
        let bac = unclamped.max(0.0);
        if unclamped < 0.0 {
            tracing::debug!("{}: BAC reached zero, clamped from {}", self.name, unclamped);
        }
        tracing::debug!(
            "{}: {} at {}, -{:.4} +{:.4} => BAC {:.4}",
            self.name,
            drink.as_deref().unwrap_or("no drink"),
            time,
            decrease,
            increase,
            bac
        );
        self.log.push(LogEntry::new(time, drink, bac))?;
        Ok(bac)
    }
}

impl<M: BacIncrease> fmt::Display for Person<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} (age {}, {} lbs), BAC {:.4}",
            self.name,
            self.age,
            self.weight,
            self.current_bac()
        )?;
        write!(f, "{}", self.log)
    }
}
