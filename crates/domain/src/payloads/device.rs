use serde::{Deserialize, Serialize};

use crate::schema::{FieldSpec, NumericRange};
use crate::steps::StepId;

use super::StepPayload;

const DIMENSION: NumericRange = NumericRange::new(0.0, 100.0, 1.0);

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("left_medial_arch_height", "leftMedialArchHeight", "Left medial arch height", DIMENSION, 0.0),
    FieldSpec::number("left_lateral_arch_height", "leftLateralArchHeight", "Left lateral arch height", DIMENSION, 0.0),
    FieldSpec::number("left_medial_heel_height", "leftMedialHeelHeight", "Left medial heel height", DIMENSION, 0.0),
    FieldSpec::number("left_lateral_heel_height", "leftLateralHeelHeight", "Left lateral heel height", DIMENSION, 0.0),
    FieldSpec::number("left_heel_width", "leftHeelWidth", "Left heel width", DIMENSION, 0.0),
    FieldSpec::number("left_midfoot_width", "leftMidfootWidth", "Left midfoot width", DIMENSION, 0.0),
    FieldSpec::number("left_forefoot_width", "leftForefootWidth", "Left forefoot width", DIMENSION, 0.0),
    FieldSpec::number("right_medial_arch_height", "rightMedialArchHeight", "Right medial arch height", DIMENSION, 0.0),
    FieldSpec::number("right_lateral_arch_height", "rightLateralArchHeight", "Right lateral arch height", DIMENSION, 0.0),
    FieldSpec::number("right_medial_heel_height", "rightMedialHeelHeight", "Right medial heel height", DIMENSION, 0.0),
    FieldSpec::number("right_lateral_heel_height", "rightLateralHeelHeight", "Right lateral heel height", DIMENSION, 0.0),
    FieldSpec::number("right_heel_width", "rightHeelWidth", "Right heel width", DIMENSION, 0.0),
    FieldSpec::number("right_midfoot_width", "rightMidfootWidth", "Right midfoot width", DIMENSION, 0.0),
    FieldSpec::number("right_forefoot_width", "rightForefootWidth", "Right forefoot width", DIMENSION, 0.0),
];

/// Device dimensions in mm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceOptions {
    pub prescription_id: String,
    pub left_medial_arch_height: f64,
    pub left_lateral_arch_height: f64,
    pub left_medial_heel_height: f64,
    pub left_lateral_heel_height: f64,
    pub left_heel_width: f64,
    pub left_midfoot_width: f64,
    pub left_forefoot_width: f64,
    pub right_medial_arch_height: f64,
    pub right_lateral_arch_height: f64,
    pub right_medial_heel_height: f64,
    pub right_lateral_heel_height: f64,
    pub right_heel_width: f64,
    pub right_midfoot_width: f64,
    pub right_forefoot_width: f64,
}

impl StepPayload for DeviceOptions {
    const STEP: StepId = StepId::Device;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn prescription_id(&self) -> &str {
        &self.prescription_id
    }
}
