use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::ConfigError;
use crate::increase::polynomial::PolynomialError;
use crate::increase::table::TableError;

#[derive(Error, Debug)]
pub enum BacError {
    #[error("Error in the BAC table: {0}")]
    TableError(#[from] TableError),
    #[error("Error in the polynomial surface: {0}")]
    PolynomialError(#[from] PolynomialError),
    #[error("Error in the configuration: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("CSV error: {0}")]
    CSVError(String),
    #[error("Entry at {time} is earlier than the last log entry at {last}")]
    OutOfOrder {
        last: DateTime<Utc>,
        time: DateTime<Utc>,
    },
}
