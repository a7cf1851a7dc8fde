// src/dataset/types.rs

use serde::Serialize;
use std::{fmt, str::FromStr};

/// One of the fixed string columns every dataset must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Field {
    Country,
    #[serde(rename = "ISO3")]
    Iso3,
    Sector,
    Indicator,
    Unit,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Country,
        Field::Iso3,
        Field::Sector,
        Field::Indicator,
        Field::Unit,
    ];

    /// Header name as it appears in the dataset and in JSON output.
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::Country => "Country",
            Field::Iso3 => "ISO3",
            Field::Sector => "Sector",
            Field::Indicator => "Indicator",
            Field::Unit => "Unit",
        }
    }

    /// Query-string parameter name used by the HTTP layer.
    pub fn param_name(&self) -> &'static str {
        match self {
            Field::Country => "country",
            Field::Iso3 => "iso3",
            Field::Sector => "sector",
            Field::Indicator => "indicator",
            Field::Unit => "unit",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    /// Exact, case-sensitive match on the column name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.column_name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A single dataset record. `years[i]` is the value for the table's i-th
/// year column; missing cells were already normalised to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub country: String,
    pub iso3: String,
    pub sector: String,
    pub indicator: String,
    pub unit: String,
    pub years: Vec<f64>,
}

impl Row {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Country => &self.country,
            Field::Iso3 => &self.iso3,
            Field::Sector => &self.sector,
            Field::Indicator => &self.indicator,
            Field::Unit => &self.unit,
        }
    }
}

/// Immutable in-memory dataset.
#[derive(Debug, Clone, Default)]
pub struct Table {
    year_columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Every row is padded (or cut) so it carries exactly one value per
    /// year column.
    pub fn new(year_columns: Vec<String>, mut rows: Vec<Row>) -> Self {
        let width = year_columns.len();
        for row in &mut rows {
            row.years.resize(width, 0.0);
        }
        Self { year_columns, rows }
    }

    pub fn year_columns(&self) -> &[String] {
        &self.year_columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
