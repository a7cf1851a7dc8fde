// src/query/mod.rs

pub mod filter;

pub use filter::{FilterMode, Filters};

use std::collections::HashMap;
use tracing::trace;

use crate::dataset::{Field, Table};
use crate::error::Result;

/// Upper bound on the groups a single query returns.
pub const MAX_GROUPS: usize = 1000;

/// One aggregated group: its key values plus per-year sums aligned with the
/// table's year columns.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    pub keys: Vec<(Field, String)>,
    pub sums: Vec<f64>,
}

impl GroupedRow {
    pub fn key(&self, field: Field) -> Option<&str> {
        self.keys
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }
}

/// `group_keys` without duplicates, with `Unit` appended if absent so values
/// in different units never get summed together.
pub fn effective_group_key(group_keys: &[Field]) -> Vec<Field> {
    let mut key = Vec::with_capacity(group_keys.len() + 1);
    for &field in group_keys {
        if !key.contains(&field) {
            key.push(field);
        }
    }
    if !key.contains(&Field::Unit) {
        key.push(Field::Unit);
    }
    key
}

/// Filter, group and sum `table` in one pass.
///
/// Groups come out in order of first appearance. At most [`MAX_GROUPS`] are
/// kept: once the cap is reached rows opening a new group are dropped, while
/// rows of groups already kept still accumulate.
pub fn query(
    table: &Table,
    group_keys: &[Field],
    filters: &Filters,
    mode: FilterMode,
) -> Result<Vec<GroupedRow>> {
    let predicates = filters.resolve(mode)?;
    let key_fields = effective_group_key(group_keys);
    let width = table.year_columns().len();

    let mut slots: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut groups: Vec<GroupedRow> = Vec::new();

    let matching = table
        .rows()
        .iter()
        .filter(|row| predicates.iter().all(|(f, v)| row.field(*f) == *v));

    for row in matching {
        let key: Vec<&str> = key_fields.iter().map(|f| row.field(*f)).collect();
        let existing = slots.get(&key).copied();
        let slot = match existing {
            Some(slot) => slot,
            None if groups.len() >= MAX_GROUPS => continue,
            None => {
                groups.push(GroupedRow {
                    keys: key_fields
                        .iter()
                        .zip(&key)
                        .map(|(f, v)| (*f, v.to_string()))
                        .collect(),
                    sums: vec![0.0; width],
                });
                slots.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        for (sum, value) in groups[slot].sums.iter_mut().zip(&row.years) {
            *sum += value;
        }
    }

    trace!(
        predicates = predicates.len(),
        groups = groups.len(),
        "query complete"
    );
    Ok(groups)
}
