use serde::{Deserialize, Serialize};

use crate::schema::{FieldSpec, NumericRange};
use crate::steps::StepId;

use super::StepPayload;

/// Posting inputs move in whole units. The portal shipped a second variant
/// with 1.5 increments; this table is the single place to change if that one
/// is confirmed instead.
pub(crate) const POSTING: NumericRange = NumericRange::new(0.0, 100.0, 1.0);

const HEEL_POST_WIDTHS: &[&str] = &["none", "half_width", "full_width"];
const FOREFOOT_POST_WIDTHS: &[&str] = &["none", "full_width", "half_width", "quarterly_width"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("left_heel_post_width", "leftHeelPostWidth", "Left heel post width", HEEL_POST_WIDTHS, "none"),
    FieldSpec::number("left_heel_post_angle", "leftHeelPostAngle", "Left heel post angle", POSTING, 0.0),
    FieldSpec::number("left_heel_post_pitch", "leftHeelPostPitch", "Left heel post pitch", POSTING, 0.0),
    FieldSpec::number("left_heel_post_raise", "leftHeelPostRaise", "Left heel post raise", POSTING, 0.0),
    FieldSpec::number("left_heel_post_taper", "leftHeelPostTaper", "Left heel post taper", POSTING, 0.0),
    FieldSpec::choice("left_forefoot_post_width", "leftForefootPostWidth", "Left forefoot post width", FOREFOOT_POST_WIDTHS, "none"),
    FieldSpec::flag("left_forefoot_post_medial", "leftForefootPostMedial", "Left forefoot post medial", false),
    FieldSpec::flag("left_forefoot_post_lateral", "leftForefootPostLateral", "Left forefoot post lateral", false),
    FieldSpec::number("left_forefoot_post_angle", "leftForefootPostAngle", "Left forefoot post angle", POSTING, 0.0),
    FieldSpec::choice("right_heel_post_width", "rightHeelPostWidth", "Right heel post width", HEEL_POST_WIDTHS, "none"),
    FieldSpec::number("right_heel_post_angle", "rightHeelPostAngle", "Right heel post angle", POSTING, 0.0),
    FieldSpec::number("right_heel_post_pitch", "rightHeelPostPitch", "Right heel post pitch", POSTING, 0.0),
    FieldSpec::number("right_heel_post_raise", "rightHeelPostRaise", "Right heel post raise", POSTING, 0.0),
    FieldSpec::number("right_heel_post_taper", "rightHeelPostTaper", "Right heel post taper", POSTING, 0.0),
    FieldSpec::choice("right_forefoot_post_width", "rightForefootPostWidth", "Right forefoot post width", FOREFOOT_POST_WIDTHS, "none"),
    FieldSpec::flag("right_forefoot_post_medial", "rightForefootPostMedial", "Right forefoot post medial", false),
    FieldSpec::flag("right_forefoot_post_lateral", "rightForefootPostLateral", "Right forefoot post lateral", false),
    FieldSpec::number("right_forefoot_post_angle", "rightForefootPostAngle", "Right forefoot post angle", POSTING, 0.0),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub prescription_id: String,
    pub left_heel_post_width: String,
    pub left_heel_post_angle: f64,
    pub left_heel_post_pitch: f64,
    pub left_heel_post_raise: f64,
    pub left_heel_post_taper: f64,
    pub left_forefoot_post_width: String,
    pub left_forefoot_post_medial: bool,
    pub left_forefoot_post_lateral: bool,
    pub left_forefoot_post_angle: f64,
    pub right_heel_post_width: String,
    pub right_heel_post_angle: f64,
    pub right_heel_post_pitch: f64,
    pub right_heel_post_raise: f64,
    pub right_heel_post_taper: f64,
    pub right_forefoot_post_width: String,
    pub right_forefoot_post_medial: bool,
    pub right_forefoot_post_lateral: bool,
    pub right_forefoot_post_angle: f64,
}

impl StepPayload for Posting {
    const STEP: StepId = StepId::Posting;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn prescription_id(&self) -> &str {
        &self.prescription_id
    }
}
