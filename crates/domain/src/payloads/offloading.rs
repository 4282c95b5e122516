use serde::{Deserialize, Serialize};

use crate::schema::{FieldSpec, NumericRange};
use crate::steps::StepId;

use super::StepPayload;

const HEIGHT: NumericRange = NumericRange::new(0.0, 10.0, 0.5);
const WIDTH: NumericRange = NumericRange::new(0.0, 30.0, 1.0);

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("left_cuboid_height", "leftCuboidHeight", "Left cuboid height", HEIGHT, 0.0),
    FieldSpec::number("left_cuboid_width", "leftCuboidWidth", "Left cuboid width", WIDTH, 0.0),
    FieldSpec::number("left_styloid_height", "leftStyloidHeight", "Left styloid height", HEIGHT, 0.0),
    FieldSpec::number("left_styloid_width", "leftStyloidWidth", "Left styloid width", WIDTH, 0.0),
    FieldSpec::number("left_navicular_height", "leftNavicularHeight", "Left navicular height", HEIGHT, 0.0),
    FieldSpec::number("left_navicular_width", "leftNavicularWidth", "Left navicular width", WIDTH, 0.0),
    FieldSpec::text("left_notes", "leftNotes", "Left notes"),
    FieldSpec::number("right_cuboid_height", "rightCuboidHeight", "Right cuboid height", HEIGHT, 0.0),
    FieldSpec::number("right_cuboid_width", "rightCuboidWidth", "Right cuboid width", WIDTH, 0.0),
    FieldSpec::number("right_styloid_height", "rightStyloidHeight", "Right styloid height", HEIGHT, 0.0),
    FieldSpec::number("right_styloid_width", "rightStyloidWidth", "Right styloid width", WIDTH, 0.0),
    FieldSpec::number("right_navicular_height", "rightNavicularHeight", "Right navicular height", HEIGHT, 0.0),
    FieldSpec::number("right_navicular_width", "rightNavicularWidth", "Right navicular width", WIDTH, 0.0),
    FieldSpec::text("right_notes", "rightNotes", "Right notes"),
    FieldSpec::text("offloading_notes", "offloadingNotes", "Off-loading notes"),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offloading {
    pub prescription_id: String,
    pub left_cuboid_height: f64,
    pub left_cuboid_width: f64,
    pub left_styloid_height: f64,
    pub left_styloid_width: f64,
    pub left_navicular_height: f64,
    pub left_navicular_width: f64,
    pub left_notes: String,
    pub right_cuboid_height: f64,
    pub right_cuboid_width: f64,
    pub right_styloid_height: f64,
    pub right_styloid_width: f64,
    pub right_navicular_height: f64,
    pub right_navicular_width: f64,
    pub right_notes: String,
    pub offloading_notes: String,
}

impl StepPayload for Offloading {
    const STEP: StepId = StepId::Offloading;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn prescription_id(&self) -> &str {
        &self.prescription_id
    }
}
