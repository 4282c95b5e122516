use serde::{Deserialize, Serialize};

use crate::schema::{FieldSpec, NumericRange};
use crate::steps::StepId;

use super::StepPayload;

/// Whole millimetres, capped at 100.
const MODIFIER: NumericRange = NumericRange::new(0.0, 100.0, 1.0);

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("left_y_rib", "leftYRib", "Left Y-rib", MODIFIER, 0.0),
    FieldSpec::number("left_k_rib", "leftKRib", "Left K-rib", MODIFIER, 0.0),
    FieldSpec::number("left_cuboid", "leftCuboid", "Left cuboid", MODIFIER, 0.0),
    FieldSpec::number("left_styloid", "leftStyloid", "Left styloid", MODIFIER, 0.0),
    FieldSpec::number("left_navicular", "leftNavicular", "Left navicular", MODIFIER, 0.0),
    FieldSpec::number("left_first_ray", "left1stRay", "Left 1st ray", MODIFIER, 0.0),
    FieldSpec::number("left_fifth_ray", "left5thRay", "Left 5th ray", MODIFIER, 0.0),
    FieldSpec::number("right_y_rib", "rightYRib", "Right Y-rib", MODIFIER, 0.0),
    FieldSpec::number("right_k_rib", "rightKRib", "Right K-rib", MODIFIER, 0.0),
    FieldSpec::number("right_cuboid", "rightCuboid", "Right cuboid", MODIFIER, 0.0),
    FieldSpec::number("right_styloid", "rightStyloid", "Right styloid", MODIFIER, 0.0),
    FieldSpec::number("right_navicular", "rightNavicular", "Right navicular", MODIFIER, 0.0),
    FieldSpec::number("right_first_ray", "right1stRay", "Right 1st ray", MODIFIER, 0.0),
    FieldSpec::number("right_fifth_ray", "right5thRay", "Right 5th ray", MODIFIER, 0.0),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantarModifiers {
    pub prescription_id: String,
    pub left_y_rib: f64,
    pub left_k_rib: f64,
    pub left_cuboid: f64,
    pub left_styloid: f64,
    pub left_navicular: f64,
    pub left_first_ray: f64,
    pub left_fifth_ray: f64,
    pub right_y_rib: f64,
    pub right_k_rib: f64,
    pub right_cuboid: f64,
    pub right_styloid: f64,
    pub right_navicular: f64,
    pub right_first_ray: f64,
    pub right_fifth_ray: f64,
}

impl StepPayload for PlantarModifiers {
    const STEP: StepId = StepId::Plantar;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn prescription_id(&self) -> &str {
        &self.prescription_id
    }
}
