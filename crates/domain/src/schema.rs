//! Field schema shared by the wizard forms and the API.
//!
//! Every step payload declares a static table of [`FieldSpec`] rows mapping
//! its canonical (wire) field name to the UI control that edits it, along with
//! the field's kind, default and range. Defaults, clamping, step rounding and
//! conditional visibility are all applied through [`normalize_values`], so the
//! form, the save path and the server agree on what a value means.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type FormValues = BTreeMap<String, FieldValue>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Flag(b) => Value::Bool(*b),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// Inclusive numeric range with an increment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl NumericRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Clamp into `[min, max]` and snap to the nearest multiple of `step`.
    /// Non-finite input counts as zero.
    pub fn normalize(&self, value: f64) -> f64 {
        let value = if value.is_finite() { value } else { 0.0 };
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return tidy(clamped);
        }

        let mut snapped = (clamped / self.step).round() * self.step;
        if snapped > self.max {
            snapped -= self.step;
        }
        if snapped < self.min {
            snapped += self.step;
        }
        tidy(snapped)
    }

    pub fn increment(&self, value: f64) -> f64 {
        self.normalize(self.normalize(value) + self.step)
    }

    pub fn decrement(&self, value: f64) -> f64 {
        self.normalize(self.normalize(value) - self.step)
    }

    pub fn is_on_step(&self, value: f64) -> bool {
        if self.step <= 0.0 {
            return true;
        }
        let ratio = value / self.step;
        (ratio - ratio.round()).abs() < 1e-6
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

// Strips accumulated float noise (0.1 * 3) and negative zero.
fn tidy(value: f64) -> f64 {
    let t = (value * 1e6).round() / 1e6;
    if t == 0.0 {
        0.0
    } else {
        t
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldKind {
    Number { range: NumericRange, default: f64 },
    Flag { default: bool },
    Choice {
        options: &'static [&'static str],
        default: &'static str,
    },
    Text,
}

/// When a control is shown, in terms of an earlier choice field's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Always,
    When {
        key: &'static str,
        equals: &'static str,
    },
    Unless {
        key: &'static str,
        equals: &'static str,
    },
}

impl Visibility {
    pub fn is_visible(&self, values: &FormValues) -> bool {
        match self {
            Visibility::Always => true,
            Visibility::When { key, equals } => {
                values.get(*key).and_then(FieldValue::as_str) == Some(*equals)
            }
            Visibility::Unless { key, equals } => {
                values.get(*key).and_then(FieldValue::as_str) != Some(*equals)
            }
        }
    }

    fn governing_key(&self) -> Option<&'static str> {
        match self {
            Visibility::Always => None,
            Visibility::When { key, .. } | Visibility::Unless { key, .. } => Some(key),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSpec {
    /// Canonical wire name.
    pub key: &'static str,
    /// UI control id.
    pub control: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub visible: Visibility,
}

impl FieldSpec {
    pub const fn number(
        key: &'static str,
        control: &'static str,
        label: &'static str,
        range: NumericRange,
        default: f64,
    ) -> Self {
        Self {
            key,
            control,
            label,
            kind: FieldKind::Number { range, default },
            visible: Visibility::Always,
        }
    }

    pub const fn flag(
        key: &'static str,
        control: &'static str,
        label: &'static str,
        default: bool,
    ) -> Self {
        Self {
            key,
            control,
            label,
            kind: FieldKind::Flag { default },
            visible: Visibility::Always,
        }
    }

    pub const fn choice(
        key: &'static str,
        control: &'static str,
        label: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            key,
            control,
            label,
            kind: FieldKind::Choice { options, default },
            visible: Visibility::Always,
        }
    }

    pub const fn text(key: &'static str, control: &'static str, label: &'static str) -> Self {
        Self {
            key,
            control,
            label,
            kind: FieldKind::Text,
            visible: Visibility::Always,
        }
    }

    pub const fn shown_when(mut self, key: &'static str, equals: &'static str) -> Self {
        self.visible = Visibility::When { key, equals };
        self
    }

    pub const fn hidden_when(mut self, key: &'static str, equals: &'static str) -> Self {
        self.visible = Visibility::Unless { key, equals };
        self
    }

    pub fn range(&self) -> Option<NumericRange> {
        match self.kind {
            FieldKind::Number { range, .. } => Some(range),
            _ => None,
        }
    }

    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Number { default, .. } => FieldValue::Number(default),
            FieldKind::Flag { default } => FieldValue::Flag(default),
            FieldKind::Choice { default, .. } => FieldValue::Text(default.to_string()),
            FieldKind::Text => FieldValue::Text(String::new()),
        }
    }

    /// Bring an already-typed value in line with this field's rules.
    pub fn normalize(&self, value: &FieldValue) -> FieldValue {
        match (self.kind, value) {
            (FieldKind::Number { range, .. }, FieldValue::Number(n)) => {
                FieldValue::Number(range.normalize(*n))
            }
            (FieldKind::Number { .. }, FieldValue::Text(raw)) => self.parse_input(raw),
            (FieldKind::Flag { .. }, FieldValue::Flag(b)) => FieldValue::Flag(*b),
            (FieldKind::Choice { options, default }, FieldValue::Text(s)) => {
                if options.contains(&s.as_str()) {
                    FieldValue::Text(s.clone())
                } else {
                    FieldValue::Text(default.to_string())
                }
            }
            (FieldKind::Text, FieldValue::Text(s)) => FieldValue::Text(s.clone()),
            (FieldKind::Text, FieldValue::Number(n)) => FieldValue::Text(n.to_string()),
            _ => self.default_value(),
        }
    }

    /// Read a loosely typed JSON value (as returned by the API) into this
    /// field's canonical form. Missing or null values take the default.
    pub fn coerce(&self, raw: Option<&Value>) -> FieldValue {
        let Some(raw) = raw else {
            return self.default_value();
        };

        let value = match (self.kind, raw) {
            (_, Value::Null) => return self.default_value(),
            (FieldKind::Number { .. }, Value::Number(n)) => match n.as_f64() {
                Some(n) => FieldValue::Number(n),
                None => return self.default_value(),
            },
            (FieldKind::Number { .. }, Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) => FieldValue::Number(n),
                Err(_) => return self.default_value(),
            },
            (FieldKind::Flag { .. }, Value::Bool(b)) => FieldValue::Flag(*b),
            (FieldKind::Flag { .. }, Value::String(s)) => FieldValue::Flag(parse_flag(s)),
            (FieldKind::Flag { .. }, Value::Number(n)) => {
                FieldValue::Flag(n.as_f64().is_some_and(|n| n != 0.0))
            }
            (FieldKind::Choice { .. } | FieldKind::Text, Value::String(s)) => {
                FieldValue::Text(s.clone())
            }
            (FieldKind::Text, Value::Number(n)) => FieldValue::Text(n.to_string()),
            _ => return self.default_value(),
        };

        self.normalize(&value)
    }

    /// Interpret raw control text the way a browser form would.
    pub fn parse_input(&self, raw: &str) -> FieldValue {
        match self.kind {
            FieldKind::Number { range, .. } => {
                let parsed = raw.trim().parse::<f64>().unwrap_or(0.0);
                FieldValue::Number(range.normalize(parsed))
            }
            FieldKind::Flag { .. } => FieldValue::Flag(parse_flag(raw)),
            FieldKind::Choice { .. } => self.normalize(&FieldValue::Text(raw.to_string())),
            FieldKind::Text => FieldValue::Text(raw.to_string()),
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes" | "checked"
    )
}

pub fn find<'a>(fields: &'a [FieldSpec], key: &str) -> Option<&'a FieldSpec> {
    fields.iter().find(|f| f.key == key)
}

pub fn find_control<'a>(fields: &'a [FieldSpec], control: &str) -> Option<&'a FieldSpec> {
    fields.iter().find(|f| f.control == control)
}

pub fn defaults(fields: &[FieldSpec]) -> FormValues {
    normalize_values(fields, &FormValues::new())
}

/// Apply defaults, clamping, rounding and visibility in declaration order.
/// Fields hidden by their visibility rule fall back to their default; keys
/// outside the schema are dropped.
pub fn normalize_values(fields: &[FieldSpec], values: &FormValues) -> FormValues {
    let mut out = FormValues::new();
    for field in fields {
        let value = match values.get(field.key) {
            Some(v) => field.normalize(v),
            None => field.default_value(),
        };
        let value = if field.visible.is_visible(&out) {
            value
        } else {
            field.default_value()
        };
        out.insert(field.key.to_string(), value);
    }
    out
}

/// Read a JSON object into normalized form values.
pub fn values_from_json(fields: &[FieldSpec], object: &Value) -> FormValues {
    let raw: FormValues = fields
        .iter()
        .map(|f| (f.key.to_string(), f.coerce(object.get(f.key))))
        .collect();
    normalize_values(fields, &raw)
}

pub fn values_to_json(values: &FormValues) -> serde_json::Map<String, Value> {
    values
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate field key {0}")]
    DuplicateKey(&'static str),

    #[error("duplicate control id {0}")]
    DuplicateControl(&'static str),

    #[error("field {0} has an empty or inverted range")]
    InvalidRange(&'static str),

    #[error("field {0} default is outside its range or off-step")]
    InvalidDefault(&'static str),

    #[error("field {key} depends on {depends_on}, which is not an earlier choice field")]
    InvalidVisibility {
        key: &'static str,
        depends_on: &'static str,
    },
}

/// Check a field table once at initialization.
pub fn validate_schema(fields: &[FieldSpec]) -> Result<(), SchemaError> {
    let mut keys = HashSet::new();
    let mut controls = HashSet::new();

    for (index, field) in fields.iter().enumerate() {
        if !keys.insert(field.key) {
            return Err(SchemaError::DuplicateKey(field.key));
        }
        if !controls.insert(field.control) {
            return Err(SchemaError::DuplicateControl(field.control));
        }

        match field.kind {
            FieldKind::Number { range, default } => {
                if !(range.min <= range.max) || range.step < 0.0 {
                    return Err(SchemaError::InvalidRange(field.key));
                }
                if !range.is_on_step(range.min) || !range.is_on_step(range.max) {
                    return Err(SchemaError::InvalidRange(field.key));
                }
                if !range.contains(default) || !range.is_on_step(default) {
                    return Err(SchemaError::InvalidDefault(field.key));
                }
            }
            FieldKind::Choice { options, default } => {
                if !options.contains(&default) {
                    return Err(SchemaError::InvalidDefault(field.key));
                }
            }
            FieldKind::Flag { .. } | FieldKind::Text => {}
        }

        if let Some(depends_on) = field.visible.governing_key() {
            let governed_by_earlier_choice = fields[..index]
                .iter()
                .any(|f| f.key == depends_on && matches!(f.kind, FieldKind::Choice { .. }));
            if !governed_by_earlier_choice {
                return Err(SchemaError::InvalidVisibility {
                    key: field.key,
                    depends_on,
                });
            }
        }
    }

    Ok(())
}
