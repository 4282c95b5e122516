use serde::{Deserialize, Serialize};

use crate::schema::{FieldSpec, NumericRange};
use crate::steps::StepId;

use super::StepPayload;

const EXPANSION: NumericRange = NumericRange::new(0.0, 10.0, 0.5);
const INCLINATION: NumericRange = NumericRange::new(0.0, 45.0, 1.0);

const SKIVE_TYPES: &[&str] = &["none", "medial", "lateral"];
const SKIVE_INCLINATIONS: &[&str] = &["maximum", "zero", "specific"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("left_arch_height", "leftArchHeight", "Left arch height", EXPANSION, 0.0),
    FieldSpec::number("left_arch_length", "leftArchLength", "Left arch length", EXPANSION, 0.0),
    FieldSpec::number("left_arch_width", "leftArchWidth", "Left arch width", EXPANSION, 0.0),
    FieldSpec::number("left_heel_medial", "leftHeelMedial", "Left heel medial", EXPANSION, 0.0),
    FieldSpec::number("left_heel_lateral", "leftHeelLateral", "Left heel lateral", EXPANSION, 0.0),
    FieldSpec::choice("left_skive_type", "leftSkiveType", "Left skive", SKIVE_TYPES, "none"),
    FieldSpec::choice(
        "left_skive_inclination",
        "leftSkiveInclination",
        "Left skive inclination",
        SKIVE_INCLINATIONS,
        "zero",
    )
    .hidden_when("left_skive_type", "none"),
    FieldSpec::number(
        "left_skive_specific_inclination",
        "leftSkiveSpecificInclination",
        "Left specific inclination",
        INCLINATION,
        0.0,
    )
    .shown_when("left_skive_inclination", "specific"),
    FieldSpec::text("left_notes", "leftNotes", "Left notes"),
    FieldSpec::number("right_arch_height", "rightArchHeight", "Right arch height", EXPANSION, 0.0),
    FieldSpec::number("right_arch_length", "rightArchLength", "Right arch length", EXPANSION, 0.0),
    FieldSpec::number("right_arch_width", "rightArchWidth", "Right arch width", EXPANSION, 0.0),
    FieldSpec::number("right_heel_medial", "rightHeelMedial", "Right heel medial", EXPANSION, 0.0),
    FieldSpec::number("right_heel_lateral", "rightHeelLateral", "Right heel lateral", EXPANSION, 0.0),
    FieldSpec::choice("right_skive_type", "rightSkiveType", "Right skive", SKIVE_TYPES, "none"),
    FieldSpec::choice(
        "right_skive_inclination",
        "rightSkiveInclination",
        "Right skive inclination",
        SKIVE_INCLINATIONS,
        "zero",
    )
    .hidden_when("right_skive_type", "none"),
    FieldSpec::number(
        "right_skive_specific_inclination",
        "rightSkiveSpecificInclination",
        "Right specific inclination",
        INCLINATION,
        0.0,
    )
    .shown_when("right_skive_inclination", "specific"),
    FieldSpec::text("right_notes", "rightNotes", "Right notes"),
    FieldSpec::text("adjustment_notes", "adjustmentNotes", "Adjustment notes"),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkiveType {
    #[default]
    None,
    Medial,
    Lateral,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkiveInclination {
    Maximum,
    #[default]
    Zero,
    Specific,
}

/// Shell expansion and skive settings, in mm (inclination in degrees).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicAdjustments {
    pub prescription_id: String,
    pub left_arch_height: f64,
    pub left_arch_length: f64,
    pub left_arch_width: f64,
    pub left_heel_medial: f64,
    pub left_heel_lateral: f64,
    pub left_skive_type: SkiveType,
    pub left_skive_inclination: SkiveInclination,
    pub left_skive_specific_inclination: f64,
    pub left_notes: String,
    pub right_arch_height: f64,
    pub right_arch_length: f64,
    pub right_arch_width: f64,
    pub right_heel_medial: f64,
    pub right_heel_lateral: f64,
    pub right_skive_type: SkiveType,
    pub right_skive_inclination: SkiveInclination,
    pub right_skive_specific_inclination: f64,
    pub right_notes: String,
    pub adjustment_notes: String,
}

impl StepPayload for IntrinsicAdjustments {
    const STEP: StepId = StepId::Intrinsic;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn prescription_id(&self) -> &str {
        &self.prescription_id
    }
}
