// Data rows for bar/line graphs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub const FIELD_PERIOD: &str = "period";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_SECONDARY_AMOUNT: &str = "secondaryAmount";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_SECONDARY_TYPE: &str = "secondaryType";

/// One record per category per time period.
///
/// Fields other than the five core ones (a color override, a custom order
/// column, legend label columns) live in `extra` and are addressed by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_amount: Option<f64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub secondary_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataPoint {
    pub fn new(
        period: impl Into<String>,
        amount: f64,
        secondary_amount: f64,
        kind: impl Into<String>,
        secondary_type: impl Into<String>,
    ) -> Self {
        DataPoint {
            period: period.into(),
            amount: Some(amount),
            secondary_amount: Some(secondary_amount),
            kind: kind.into(),
            secondary_type: secondary_type.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra field (builder style).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(field.into(), value.into());
        self
    }

    /// Look up a field by its serialized name.
    /// Returns `None` when the row has no value for it.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            FIELD_PERIOD => Some(Value::String(self.period.clone())),
            FIELD_AMOUNT => self.amount.map(Value::from),
            FIELD_SECONDARY_AMOUNT => self.secondary_amount.map(Value::from),
            FIELD_TYPE => Some(Value::String(self.kind.clone())),
            FIELD_SECONDARY_TYPE => Some(Value::String(self.secondary_type.clone())),
            _ => self.extra.get(name).filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Set a field by its serialized name. Core numeric fields accept numbers only.
    pub fn set_field(&mut self, name: &str, value: Value) {
        match name {
            FIELD_PERIOD => self.period = value_to_key(&value),
            FIELD_AMOUNT => self.amount = value.as_f64(),
            FIELD_SECONDARY_AMOUNT => self.secondary_amount = value.as_f64(),
            FIELD_TYPE => self.kind = value_to_key(&value),
            FIELD_SECONDARY_TYPE => self.secondary_type = value_to_key(&value),
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }
}

/// Stable string key for grouping by a field value.
pub fn value_to_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Total order over optional field values used for row sorting.
/// Missing values sort first, numbers before strings, numbers numerically.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => value_to_key(a).cmp(&value_to_key(b)),
        },
    }
}
