//! The mounted step's controls, keyed by control id.

use domain::payloads::{Foot, ScanFile};
use domain::schema::{self, FieldKind, FieldSpec, FieldValue, FormValues};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, WizardError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A control as the UI renders it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Control {
    pub id: &'static str,
    pub key: &'static str,
    pub label: &'static str,
    pub value: FieldValue,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct FormState {
    fields: &'static [FieldSpec],
    values: FormValues,
    selected_patient: Option<String>,
    left_scan: Option<ScanFile>,
    right_scan: Option<ScanFile>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebind to a step's field table, resetting every control to its default.
    pub fn bind(&mut self, fields: &'static [FieldSpec]) -> Result<()> {
        schema::validate_schema(fields).map_err(|e| WizardError::Validation(e.to_string()))?;
        *self = Self {
            fields,
            values: schema::defaults(fields),
            ..Self::default()
        };
        Ok(())
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Normalized values keyed by wire name.
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn apply(&mut self, values: &FormValues) {
        self.values = schema::normalize_values(self.fields, values);
    }

    pub fn value(&self, control: &str) -> Option<&FieldValue> {
        let field = schema::find_control(self.fields, control)?;
        self.values.get(field.key)
    }

    pub fn is_visible(&self, control: &str) -> Option<bool> {
        schema::find_control(self.fields, control).map(|f| f.visible.is_visible(&self.values))
    }

    pub fn controls(&self) -> Vec<Control> {
        self.fields
            .iter()
            .map(|field| Control {
                id: field.control,
                key: field.key,
                label: field.label,
                value: self
                    .values
                    .get(field.key)
                    .cloned()
                    .unwrap_or_else(|| field.default_value()),
                visible: field.visible.is_visible(&self.values),
            })
            .collect()
    }

    /// Set a control and re-evaluate visibility. Returns the stored value.
    pub fn set(&mut self, control: &str, value: FieldValue) -> Result<FieldValue> {
        let field = self.field(control)?;
        let mut values = self.values.clone();
        values.insert(field.key.to_string(), field.normalize(&value));
        self.apply(&values);
        Ok(self.values.get(field.key).cloned().unwrap_or_else(|| field.default_value()))
    }

    /// Raw text as typed into the control.
    pub fn set_input(&mut self, control: &str, raw: &str) -> Result<FieldValue> {
        let field = self.field(control)?;
        self.set(control, field.parse_input(raw))
    }

    /// Increment or decrement a numeric control by its step, saturating at
    /// the range bounds.
    pub fn step_control(&mut self, control: &str, direction: Direction) -> Result<f64> {
        let field = self.field(control)?;
        let FieldKind::Number { range, .. } = field.kind else {
            return Err(WizardError::Validation(format!("{control} is not numeric")));
        };
        let current = self
            .values
            .get(field.key)
            .and_then(FieldValue::as_f64)
            .unwrap_or(0.0);
        let next = match direction {
            Direction::Up => range.increment(current),
            Direction::Down => range.decrement(current),
        };
        debug!("{} {:?}: {} -> {}", control, direction, current, next);
        self.set(control, FieldValue::Number(next))
            .map(|v| v.as_f64().unwrap_or(next))
    }

    pub fn select_patient(&mut self, patient_id: impl Into<String>) {
        self.selected_patient = Some(patient_id.into());
    }

    pub fn selected_patient(&self) -> Option<&str> {
        self.selected_patient.as_deref()
    }

    pub fn choose_scan(&mut self, foot: Foot, file: ScanFile) {
        match foot {
            Foot::Left => self.left_scan = Some(file),
            Foot::Right => self.right_scan = Some(file),
        }
    }

    pub fn scan(&self, foot: Foot) -> Option<&ScanFile> {
        match foot {
            Foot::Left => self.left_scan.as_ref(),
            Foot::Right => self.right_scan.as_ref(),
        }
    }

    fn field(&self, control: &str) -> Result<&'static FieldSpec> {
        schema::find_control(self.fields, control)
            .ok_or_else(|| WizardError::Validation(format!("Unknown control {control}")))
    }
}
