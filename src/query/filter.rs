// src/query/filter.rs

use std::collections::BTreeMap;
use tracing::debug;

use crate::dataset::Field;
use crate::error::{Error, Result};

/// How to treat filter entries that don't name a dataset field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Ignore them.
    #[default]
    Permissive,
    /// Fail with [`Error::UnknownField`].
    Strict,
}

/// Equality filters keyed by column name. A `None` or empty value imposes
/// no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    entries: BTreeMap<String, Option<String>>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        self.entries.insert(field.into(), value);
    }

    /// Builder form of [`Filters::insert`] for a present value.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, Some(value.into()));
        self
    }

    /// The constraints that actually apply, as typed `(field, value)` pairs.
    pub fn resolve(&self, mode: FilterMode) -> Result<Vec<(Field, &str)>> {
        let mut predicates = Vec::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let field = match name.parse::<Field>() {
                Ok(field) => field,
                Err(_) if mode == FilterMode::Permissive => {
                    debug!(field = %name, "ignoring filter on unknown field");
                    continue;
                }
                Err(_) => return Err(Error::UnknownField(name.clone())),
            };
            match value.as_deref() {
                Some(v) if !v.is_empty() => predicates.push((field, v)),
                _ => {}
            }
        }
        Ok(predicates)
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for Filters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (k, v) in iter {
            filters.insert(k, v.map(Into::into));
        }
        filters
    }
}
