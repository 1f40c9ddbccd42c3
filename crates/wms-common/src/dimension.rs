//! Layer dimensions (TIME, ELEVATION, custom) and their value lists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::time::expand_period;

/// Upper bound on the number of values one TIME dimension may expand to.
pub const MAX_EXPANDED_VALUES: usize = 100_000;

/// A named axis of selectable layer state with its enumerated values.
///
/// TIME values are always explicit ISO instants; periodic shorthand is
/// expanded when the dimension is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

impl Dimension {
    /// Build a dimension from its declared name and raw value strings.
    ///
    /// Each raw string is a comma separated list; the results of all raw
    /// strings are concatenated in order.
    pub fn from_declaration(
        name: &str,
        raw_values: &[String],
        default: Option<String>,
        units: Option<String>,
    ) -> Self {
        let name = name.trim().to_uppercase();
        let values = if name == "TIME" {
            raw_values.iter().flat_map(|raw| expand_time_values(raw)).collect()
        } else {
            raw_values.iter().flat_map(|raw| split_values(raw)).collect()
        };

        Self {
            name,
            values,
            default,
            units,
        }
    }

    pub fn is_time(&self) -> bool {
        self.name == "TIME"
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// Split a comma separated value list without further interpretation.
pub fn split_values(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand a TIME value list: `start/end/period` tokens become every instant
/// of the period, single instants are kept as written.
pub fn expand_time_values(raw: &str) -> Vec<String> {
    let mut values = Vec::new();
    for token in split_values(raw) {
        let parts: Vec<&str> = token.split('/').collect();
        if parts.len() == 3 {
            match expand_period(parts[0], parts[1], parts[2], MAX_EXPANDED_VALUES) {
                Ok(expanded) => values.extend(expanded),
                Err(e) => {
                    warn!(token = %token, error = %e, "Keeping unexpandable TIME period as literal");
                    values.push(token);
                }
            }
        } else {
            values.push(token);
        }
    }
    values
}

/// Reconcile caller-requested dimension values with the declared dimensions.
///
/// A requested value survives only if the dimension lists it; otherwise the
/// server default takes its place, or the key is left unset. Requested keys
/// are matched case-insensitively and returned upper-cased; keys that name
/// no declared dimension are passed through untouched.
pub fn apply_defaults(
    dimensions: &BTreeMap<String, Dimension>,
    requested: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut resolved: BTreeMap<String, String> = requested
        .iter()
        .map(|(k, v)| (k.to_uppercase(), v.clone()))
        .collect();

    for (name, dimension) in dimensions {
        let keep = resolved
            .get(name)
            .map(|value| dimension.contains(value))
            .unwrap_or(false);
        if keep {
            continue;
        }
        resolved.remove(name);
        if let Some(default) = &dimension.default {
            resolved.insert(name.clone(), default.clone());
        }
    }

    resolved
}
