use serde::{Deserialize, Serialize};

use crate::schema::{FieldSpec, NumericRange};
use crate::steps::StepId;

use super::StepPayload;

const ALIGNMENT: NumericRange = NumericRange::new(-30.0, 30.0, 0.5);
const HEEL_HEIGHT: NumericRange = NumericRange::new(0.0, 50.0, 1.0);

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("left_scan_vv", "leftScanVv", "Left scan VV", ALIGNMENT, 0.0),
    FieldSpec::number("left_scan_dp", "leftScanDp", "Left scan DP", ALIGNMENT, 0.0),
    FieldSpec::number("left_forefoot_vv", "leftForefootVv", "Left forefoot VV", ALIGNMENT, 0.0),
    FieldSpec::number("left_heel_vv", "leftHeelVv", "Left heel VV", ALIGNMENT, 0.0),
    FieldSpec::number("left_heel_height", "leftHeelHeight", "Left heel height", HEEL_HEIGHT, 0.0),
    FieldSpec::text("left_notes", "leftNotes", "Left notes"),
    FieldSpec::number("right_scan_vv", "rightScanVv", "Right scan VV", ALIGNMENT, 0.0),
    FieldSpec::number("right_scan_dp", "rightScanDp", "Right scan DP", ALIGNMENT, 0.0),
    FieldSpec::number("right_forefoot_vv", "rightForefootVv", "Right forefoot VV", ALIGNMENT, 0.0),
    FieldSpec::number("right_heel_vv", "rightHeelVv", "Right heel VV", ALIGNMENT, 0.0),
    FieldSpec::number("right_heel_height", "rightHeelHeight", "Right heel height", HEEL_HEIGHT, 0.0),
    FieldSpec::text("right_notes", "rightNotes", "Right notes"),
    FieldSpec::text("clinical_notes", "clinicalNotes", "Clinical notes"),
];

/// Foot alignment measured from the scans, in degrees (heel height in mm).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClinicalMeasures {
    pub prescription_id: String,
    pub left_scan_vv: f64,
    pub left_scan_dp: f64,
    pub left_forefoot_vv: f64,
    pub left_heel_vv: f64,
    pub left_heel_height: f64,
    pub left_notes: String,
    pub right_scan_vv: f64,
    pub right_scan_dp: f64,
    pub right_forefoot_vv: f64,
    pub right_heel_vv: f64,
    pub right_heel_height: f64,
    pub right_notes: String,
    pub clinical_notes: String,
}

impl StepPayload for ClinicalMeasures {
    const STEP: StepId = StepId::Clinical;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn prescription_id(&self) -> &str {
        &self.prescription_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldValue;

    #[test]
    fn heel_height_uses_whole_millimetres_and_angles_half_degrees() {
        let mut values = ClinicalMeasures::defaults("rx").unwrap().to_values();
        values.insert("left_heel_height".into(), FieldValue::Number(12.4));
        values.insert("left_heel_vv".into(), FieldValue::Number(-3.3));

        let measures = ClinicalMeasures::from_values("rx", &values).unwrap();
        assert_eq!(measures.left_heel_height, 12.0);
        assert_eq!(measures.left_heel_vv, -3.5);
    }
}
