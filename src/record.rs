// src/record.rs

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

use crate::query::GroupedRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    pub year: String,
    pub value: f64,
}

/// Externally visible shape of one group: key fields as strings, then the
/// full year series.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRecord {
    pub fields: Vec<(String, String)>,
    pub years: Vec<YearValue>,
}

// Hand-written so key fields keep their group-key order ahead of `years`.
impl Serialize for GroupedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("years", &self.years)?;
        map.end()
    }
}

/// Reshape a grouped row into a [`GroupedRecord`]. `years` has one entry per
/// `year_columns` element, in that order; a year without a sum reads 0.
pub fn transform(row: &GroupedRow, year_columns: &[String]) -> GroupedRecord {
    let years = year_columns
        .iter()
        .enumerate()
        .map(|(i, year)| YearValue {
            year: year.clone(),
            value: row.sums.get(i).copied().unwrap_or(0.0),
        })
        .collect();

    let fields = row
        .keys
        .iter()
        .map(|(field, value)| (field.column_name().to_string(), value.to_string()))
        .collect();

    GroupedRecord { fields, years }
}

pub fn transform_all(rows: &[GroupedRow], year_columns: &[String]) -> Vec<GroupedRecord> {
    rows.iter().map(|r| transform(r, year_columns)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Field;

    fn grouped(sums: Vec<f64>) -> GroupedRow {
        GroupedRow {
            keys: vec![
                (Field::Country, "X".into()),
                (Field::Sector, "Energy".into()),
                (Field::Unit, "USD".into()),
            ],
            sums,
        }
    }

    #[test]
    fn test_json_shape() {
        let record = transform(&grouped(vec![12.0]), &["2020".to_string()]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Country":"X","Sector":"Energy","Unit":"USD","years":[{"year":"2020","value":12.0}]}"#
        );
    }

    #[test]
    fn test_years_complete_and_ordered() {
        let years: Vec<String> = ["2003", "2001", "2002"].iter().map(|s| s.to_string()).collect();
        let record = transform(&grouped(vec![0.0, 4.5]), &years);

        let got: Vec<(&str, f64)> = record
            .years
            .iter()
            .map(|yv| (yv.year.as_str(), yv.value))
            .collect();
        assert_eq!(got, vec![("2003", 0.0), ("2001", 4.5), ("2002", 0.0)]);
        assert!(record.fields.iter().any(|(k, v)| k == "Sector" && v == "Energy"));
        assert!(record.fields.iter().all(|(k, _)| k != "years"));
    }

    #[test]
    fn test_no_year_columns() {
        let record = transform(&grouped(vec![]), &[]);
        assert!(record.years.is_empty());
        assert_eq!(
            serde_json::to_value(&record).unwrap()["years"],
            serde_json::json!([])
        );
    }
}
