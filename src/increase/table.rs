use std::io::Read;
use std::path::Path;

use nalgebra::DMatrix;
use thiserror::Error;

use super::BacIncrease;
use crate::BacError;

/// The BAC table shipped with the crate, weights 90..=250 lbs and 0..=10 standard drinks
pub const DEFAULT_TABLE: &str = include_str!("../../data/bac_by_drink.csv");

/// Error type for the BAC table
#[derive(Error, Debug, Clone)]
pub enum TableError {
    /// Error encountered when reading CSV data
    #[error("CSV error: {0}")]
    CSVError(String),
    /// A cell could not be read as a number
    #[error("Could not parse '{value}' in row {row}, column {column}")]
    ParseError {
        row: usize,
        column: usize,
        value: String,
    },
    /// A row has a different number of cells than the header
    #[error("Row {row} has {found} drink columns, expected {expected}")]
    ShapeError {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// The table has no weights or no drink counts
    #[error("The BAC table is empty")]
    Empty,
    /// The rounded weight or drink count is not tabulated
    #[error("Value not found in BAC table for weight {weight} and {standard_drinks} standard drinks")]
    ValueNotFound { weight: f64, standard_drinks: f64 },
}

/// Round to the nearest multiple of ten, halves away from zero
pub fn round_to_nearest_ten(value: f64) -> f64 {
    (value / 10.0).round() * 10.0
}

/// Tabulated BAC increase by body weight and number of standard drinks
///
/// Rows are keyed by body weight, columns by standard-drink count. The CSV
/// layout is a header of drink counts after a leading weight column:
///
/// ```text
/// Body Weight,0,1,2
/// 100,0.000,0.037,0.075
/// 110,0.000,0.034,0.068
/// ```
#[derive(Debug, Clone)]
pub struct BacTable {
    weights: Vec<f64>,
    drink_counts: Vec<f64>,
    values: DMatrix<f64>,
}

impl BacTable {
    /// Build a table from its parts
    ///
    /// `values` must have one row per weight and one column per drink count.
    pub fn new(
        weights: Vec<f64>,
        drink_counts: Vec<f64>,
        values: DMatrix<f64>,
    ) -> Result<Self, TableError> {
        if weights.is_empty() || drink_counts.is_empty() {
            return Err(TableError::Empty);
        }
        if values.nrows() != weights.len() || values.ncols() != drink_counts.len() {
            return Err(TableError::ShapeError {
                row: values.nrows(),
                expected: drink_counts.len(),
                found: values.ncols(),
            });
        }
        Ok(BacTable {
            weights,
            drink_counts,
            values,
        })
    }

    /// Parse the table shipped with the crate
    pub fn embedded() -> Result<Self, TableError> {
        Self::from_reader(DEFAULT_TABLE.as_bytes())
    }

    /// Read a BAC table from a CSV file
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| TableError::CSVError(e.to_string()))?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            "Loaded BAC table from {} ({} weights x {} drink counts)",
            path.display(),
            table.weights.len(),
            table.drink_counts.len()
        );
        Ok(table)
    }

    /// Read a BAC table from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| TableError::CSVError(e.to_string()))?
            .clone();
        // The first header names the weight column
        let drink_counts = headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(column, h)| parse_cell(h, 0, column))
            .collect::<Result<Vec<f64>, _>>()?;

        let mut weights = Vec::new();
        let mut cells = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| TableError::CSVError(e.to_string()))?;
            let row = index + 1;
            if record.len() != drink_counts.len() + 1 {
                return Err(TableError::ShapeError {
                    row,
                    expected: drink_counts.len(),
                    found: record.len().saturating_sub(1),
                });
            }
            weights.push(parse_cell(&record[0], row, 0)?);
            for (column, value) in record.iter().enumerate().skip(1) {
                cells.push(parse_cell(value, row, column)?);
            }
        }

        let values = DMatrix::from_row_slice(weights.len(), drink_counts.len(), &cells);
        Self::new(weights, drink_counts, values)
    }

    /// Tabulated body weights, in row order
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Tabulated standard-drink counts, in column order
    pub fn drink_counts(&self) -> &[f64] {
        &self.drink_counts
    }

    /// Look up the exact cell for a tabulated weight and drink count
    pub fn get(&self, weight: f64, drink_count: f64) -> Option<f64> {
        let row = self.weights.iter().position(|&w| w == weight)?;
        let column = self.drink_counts.iter().position(|&d| d == drink_count)?;
        Some(self.values[(row, column)])
    }

    /// Every grid point as `(standard_drinks, weight, bac_increase)`
    ///
    /// Points are yielded weight by weight, with drink counts varying fastest.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.weights.iter().enumerate().flat_map(move |(row, &weight)| {
            self.drink_counts
                .iter()
                .enumerate()
                .map(move |(column, &drinks)| (drinks, weight, self.values[(row, column)]))
        })
    }

    /// Number of grid points
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl BacIncrease for BacTable {
    fn increase(&self, standard_drinks: f64, weight: f64) -> Result<f64, BacError> {
        let rounded_weight = round_to_nearest_ten(weight);
        let rounded_drinks = standard_drinks.round();
        match self.get(rounded_weight, rounded_drinks) {
            Some(value) => Ok(value),
            None => {
                tracing::warn!(
                    "No BAC table entry for weight {} ({}) and {} ({}) standard drinks",
                    weight,
                    rounded_weight,
                    standard_drinks,
                    rounded_drinks
                );
                Err(TableError::ValueNotFound {
                    weight,
                    standard_drinks,
                }
                .into())
            }
        }
    }
}

fn parse_cell(value: &str, row: usize, column: usize) -> Result<f64, TableError> {
    value.parse::<f64>().map_err(|_| TableError::ParseError {
        row,
        column,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_nearest_ten() {
        assert_eq!(round_to_nearest_ten(154.0), 150.0);
        assert_eq!(round_to_nearest_ten(155.0), 160.0);
        assert_eq!(round_to_nearest_ten(96.2), 100.0);
        assert_eq!(round_to_nearest_ten(0.0), 0.0);
    }

    #[test]
    fn test_embedded_table_shape() {
        let table = BacTable::embedded().unwrap();
        assert_eq!(table.weights().len(), 17);
        assert_eq!(table.drink_counts().len(), 11);
        assert_eq!(table.weights()[0], 90.0);
        assert_eq!(table.weights()[16], 250.0);
        assert_eq!(table.drink_counts()[10], 10.0);
        assert_eq!(table.len(), 17 * 11);
        assert_eq!(table.get(150.0, 4.0), Some(0.1));
        assert_eq!(table.get(150.0, 0.0), Some(0.0));
    }

    #[test]
    fn test_lookup_rounds_inputs() {
        let table = BacTable::embedded().unwrap();
        assert_eq!(table.increase(1.0, 150.0).unwrap(), 0.025);
        assert_eq!(table.increase(0.8, 146.0).unwrap(), 0.025);
        assert_eq!(table.increase(2.4, 204.9).unwrap(), 0.037);

        // Ties round away from zero
        assert_eq!(round_to_nearest_ten(145.0), 150.0);
        assert_eq!(table.increase(2.5, 145.0).unwrap(), 0.075);
    }

    #[test]
    fn test_lookup_miss() {
        let table = BacTable::embedded().unwrap();
        for &(drinks, weight) in &[(1.0, 80.0), (1.0, 260.0), (11.0, 150.0), (-1.0, 150.0)] {
            match table.increase(drinks, weight) {
                Err(BacError::TableError(TableError::ValueNotFound {
                    weight: w,
                    standard_drinks: d,
                })) => {
                    assert_eq!(w, weight);
                    assert_eq!(d, drinks);
                }
                other => panic!("expected a lookup miss, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_points_order() {
        let csv = "Body Weight,1,2\n100,0.04,0.08\n200,0.02,0.04\n";
        let table = BacTable::from_reader(csv.as_bytes()).unwrap();
        let points: Vec<_> = table.points().collect();
        assert_eq!(
            points,
            vec![
                (1.0, 100.0, 0.04),
                (2.0, 100.0, 0.08),
                (1.0, 200.0, 0.02),
                (2.0, 200.0, 0.04)
            ]
        );
    }

    #[test]
    fn test_malformed_tables() {
        let bad_cell = "Body Weight,1,2\n100,0.04,abc\n";
        assert!(matches!(
            BacTable::from_reader(bad_cell.as_bytes()),
            Err(TableError::ParseError { row: 1, column: 2, .. })
        ));

        let bad_header = "Body Weight,one\n100,0.04\n";
        assert!(matches!(
            BacTable::from_reader(bad_header.as_bytes()),
            Err(TableError::ParseError { row: 0, column: 1, .. })
        ));

        let short_row = "Body Weight,1,2\n100,0.04\n";
        assert!(matches!(
            BacTable::from_reader(short_row.as_bytes()),
            Err(TableError::ShapeError { row: 1, expected: 2, found: 1 })
        ));

        let no_rows = "Body Weight,1,2\n";
        assert!(matches!(
            BacTable::from_reader(no_rows.as_bytes()),
            Err(TableError::Empty)
        ));
    }
}
