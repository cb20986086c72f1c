//! Blood-alcohol concentration (BAC) estimation from a log of drinks
//!
//! A [Person] keeps a time-ordered log of drinks and the BAC after each one.
//! Between entries alcohol is eliminated at a fixed hourly rate, and every
//! drink adds an increase given by a [BacIncrease] model: either a lookup in a
//! tabulated [BacTable] or a fitted [Polynomial] surface. Which one is used,
//! and where its data comes from, is set once through a [BacConfig].
//!
//! ```rust
//! use bacsim::prelude::*;
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let config = BacConfig {
//!     strategy: Strategy::Table,
//!     ..Default::default()
//! };
//! let model = config.build().unwrap();
//!
//! let start = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
//! let mut person = Person::new("Alex", 30, 150.0, &model).starting_at(start);
//!
//! let beer = Drink::new("lager", 12.0, 5.0);
//! person.record_drink(&beer, Some(start)).unwrap();
//! person.record_drink(&beer, Some(start + Duration::hours(1))).unwrap();
//! assert!((person.current_bac() - 0.035).abs() < 1e-9);
//! ```

pub mod config;
pub mod drink;
pub mod error;
pub mod increase;
pub mod person;

pub use crate::config::{BacConfig, DecayModel, ElapsedTime, Strategy};
pub use crate::drink::Drink;
pub use crate::increase::{BacIncrease, BacModel, BacTable, IncreaseModel, Polynomial};
pub use crate::person::{DrinkLog, LogEntry, Person};
pub use error::BacError;

pub mod prelude {
    pub use crate::config::{BacConfig, DecayModel, ElapsedTime, Strategy};
    pub use crate::drink::Drink;
    pub use crate::error::BacError;
    pub use crate::increase::{BacIncrease, BacModel, BacTable, IncreaseModel, Polynomial};
    pub use crate::person::{DrinkLog, LogEntry, Person};
}
