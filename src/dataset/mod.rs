// src/dataset/mod.rs

pub mod types;

pub use types::{Field, Row, Table, UnknownField};

use csv::ReaderBuilder;
use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Cell contents treated as "no value" in year columns, compared
/// case-insensitively.
const NULL_TOKENS: &[&str] = &[
    "", "-", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NaN", "None", "NULL",
];

/// Open `path` and load it as a [`Table`].
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::data_source(path, "dataset not found"),
        _ => Error::data_source(path, format!("cannot open dataset: {}", e)),
    })?;
    load_from_reader(BufReader::new(file), path)
}

/// Parse delimited text with a header row. `origin` only labels errors.
pub fn load_from_reader<R: Read>(reader: R, origin: &Path) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| Error::data_source(origin, format!("reading header row: {}", e)))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(Error::data_source(origin, "no header row"));
    }

    let positions = required_positions(&headers)?;
    let (year_columns, year_positions) = year_columns(&headers);
    debug!(
        columns = headers.len(),
        years = year_columns.len(),
        "parsed dataset header"
    );

    let mut rows = Vec::new();
    // running |value| per year column; bounds every group sum the query can produce
    let mut magnitudes = vec![0f64; year_columns.len()];
    for result in rdr.records() {
        let record =
            result.map_err(|e| Error::data_source(origin, format!("CSV parse error: {}", e)))?;
        let line = record.position().map_or(0, |p| p.line());
        let text = |idx: usize| record.get(idx).unwrap_or("").to_string();

        let mut years = Vec::with_capacity(year_positions.len());
        for (name, &idx) in year_columns.iter().zip(&year_positions) {
            let raw = record.get(idx).unwrap_or("");
            let value = parse_year_cell(raw).ok_or_else(|| {
                Error::data_source(
                    origin,
                    format!(
                        "non-numeric value '{}' in column {} at line {}",
                        raw, name, line
                    ),
                )
            })?;
            years.push(value);
        }
        for ((total, value), name) in magnitudes.iter_mut().zip(&years).zip(&year_columns) {
            *total += value.abs();
            if !total.is_finite() {
                return Err(Error::data_source(
                    origin,
                    format!("values in column {} overflow when summed at line {}", name, line),
                ));
            }
        }

        rows.push(Row {
            country: text(positions[0]),
            iso3: text(positions[1]),
            sector: text(positions[2]),
            indicator: text(positions[3]),
            unit: text(positions[4]),
            years,
        });
    }

    info!(
        rows = rows.len(),
        year_columns = year_columns.len(),
        "loaded dataset"
    );
    Ok(Table::new(year_columns, rows))
}

/// Header index of each `Field::ALL` entry, or a validation error naming
/// every absent column.
fn required_positions(headers: &[String]) -> Result<[usize; 5]> {
    let mut positions = [0usize; 5];
    let mut missing = Vec::new();
    for (slot, field) in positions.iter_mut().zip(Field::ALL) {
        match headers.iter().position(|h| h == field.column_name()) {
            Some(idx) => *slot = idx,
            None => missing.push(field.column_name().to_string()),
        }
    }
    if missing.is_empty() {
        Ok(positions)
    } else {
        missing.sort();
        Err(Error::Validation { missing })
    }
}

/// All-digit headers in header order; a repeated name keeps its first column.
fn year_columns(headers: &[String]) -> (Vec<String>, Vec<usize>) {
    let mut names: Vec<String> = Vec::new();
    let mut positions = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if is_year_column(header) && !names.contains(header) {
            names.push(header.clone());
            positions.push(idx);
        }
    }
    (names, positions)
}

pub fn is_year_column(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

fn parse_year_cell(raw: &str) -> Option<f64> {
    let cell = raw.trim();
    if NULL_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(cell)) {
        return Some(0.0);
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}
