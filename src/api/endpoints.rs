// src/api/endpoints.rs

use std::collections::HashMap;

use crate::dataset::Field;
use crate::error::{Error, Result};
use crate::query::{FilterMode, Filters};

/// A read-only aggregation endpoint: which keys it groups by and which
/// fields callers may filter on.
#[derive(Debug)]
pub struct Endpoint {
    pub name: &'static str,
    pub group_keys: &'static [Field],
    pub filters: &'static [Field],
}

pub static SECTOR: Endpoint = Endpoint {
    name: "sector",
    group_keys: &[Field::Country, Field::Sector],
    filters: &[Field::Country, Field::Sector],
};

pub static GROUPED_SECTOR: Endpoint = Endpoint {
    name: "grouped-sector",
    group_keys: &[Field::Country, Field::Indicator, Field::Sector],
    filters: &[Field::Country, Field::Sector],
};

pub static INDICATOR: Endpoint = Endpoint {
    name: "indicator",
    group_keys: &[Field::Country, Field::Indicator],
    filters: &[Field::Country, Field::Indicator],
};

pub static GROUPED_INDICATOR: Endpoint = Endpoint {
    name: "grouped-indicator",
    group_keys: &[Field::Country, Field::Sector, Field::Indicator],
    filters: &[Field::Country, Field::Indicator],
};

pub static COUNTRY: Endpoint = Endpoint {
    name: "country",
    group_keys: &[Field::Country, Field::Iso3],
    filters: &[Field::Country],
};

impl Endpoint {
    /// Translate query-string parameters into [`Filters`]. In strict mode a
    /// parameter this endpoint doesn't accept is a bad request; otherwise it
    /// is ignored.
    pub fn filters_from_params(
        &self,
        params: &HashMap<String, String>,
        mode: FilterMode,
    ) -> Result<Filters> {
        if mode == FilterMode::Strict {
            let mut unexpected: Vec<&str> = params
                .keys()
                .map(String::as_str)
                .filter(|k| !self.filters.iter().any(|f| f.param_name() == *k))
                .collect();
            if !unexpected.is_empty() {
                unexpected.sort_unstable();
                return Err(Error::InvalidRequest(format!(
                    "unsupported query parameter(s) for {}: {}",
                    self.name,
                    unexpected.join(", ")
                )));
            }
        }

        let mut filters = Filters::new();
        for field in self.filters {
            filters.insert(field.column_name(), params.get(field.param_name()).cloned());
        }
        Ok(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_params_map_to_column_filters() {
        let filters = SECTOR
            .filters_from_params(
                &params(&[("country", "Kenya"), ("indicator", "ignored")]),
                FilterMode::Permissive,
            )
            .unwrap();
        let resolved = filters.resolve(FilterMode::Strict).unwrap();
        assert_eq!(resolved, vec![(Field::Country, "Kenya")]);
    }

    #[test]
    fn test_strict_rejects_foreign_params() {
        let err = COUNTRY
            .filters_from_params(
                &params(&[("sector", "Energy"), ("country", "Kenya")]),
                FilterMode::Strict,
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported query parameter(s) for country: sector"
        );
    }
}
