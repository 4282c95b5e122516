use serde::{Deserialize, Serialize};

use crate::schema::FieldSpec;
use crate::steps::StepId;

use super::StepPayload;

const SHELL_MATERIALS: &[&str] = &["pa11_nylon"];
const SHELL_THICKNESSES: &[&str] = &["2.0mm", "2.5mm", "3.0mm", "4.0mm", "4.5mm"];
const COVERS: &[&str] = &[
    "eva_120_black_2mm",
    "eva_120_black_3mm",
    "eva_120_red_2mm",
    "eva_120_red_3mm",
    "eva_120_jelly_bean",
    "microfibre_black",
    "microfibre_blue",
    "ppt_poron_1_6mm",
    "ppt_poron_3_2mm",
    "poron_general",
    "slow_release_poron",
    "none",
];
const PLANTAR_COVERS: &[&str] = &["none", "cambrille"];
const COVER_LENGTHS: &[&str] = &["full", "sulcus", "met"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("shell_material", "shellMaterial", "Shell material", SHELL_MATERIALS, "pa11_nylon"),
    FieldSpec::choice("shell_thickness", "shellThickness", "Shell thickness", SHELL_THICKNESSES, "3.0mm"),
    FieldSpec::choice("top_cover", "topCover", "Top cover", COVERS, "eva_120_black_2mm"),
    FieldSpec::choice("second_cover", "secondCover", "Second cover", COVERS, "none"),
    FieldSpec::choice("third_cover", "thirdCover", "Third cover", COVERS, "none"),
    FieldSpec::choice(
        "full_length_plantar_cover",
        "fullLengthPlantarCover",
        "Full length plantar cover",
        PLANTAR_COVERS,
        "none",
    ),
    FieldSpec::choice("cover_length", "coverLength", "Cover length", COVER_LENGTHS, "full"),
    FieldSpec::flag("extension_forefoot", "extensionForefoot", "Forefoot extension", false),
    FieldSpec::flag("extension_midfoot_medial", "extensionMidfootMedial", "Midfoot medial extension", false),
    FieldSpec::flag("extension_midfoot_lateral", "extensionMidfootLateral", "Midfoot lateral extension", false),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialSelection {
    pub prescription_id: String,
    pub shell_material: String,
    pub shell_thickness: String,
    pub top_cover: String,
    pub second_cover: String,
    pub third_cover: String,
    pub full_length_plantar_cover: String,
    pub cover_length: String,
    pub extension_forefoot: bool,
    pub extension_midfoot_medial: bool,
    pub extension_midfoot_lateral: bool,
}

impl StepPayload for MaterialSelection {
    const STEP: StepId = StepId::Material;

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

    #[test]
    fn unknown_cover_falls_back_to_the_default() {
        let material = MaterialSelection::from_json(&serde_json::json!({
            "prescription_id": "rx",
            "top_cover": "unobtainium",
            "second_cover": "microfibre_blue",
            "extension_forefoot": true,
        }))
        .unwrap();

        assert_eq!(material.top_cover, "eva_120_black_2mm");
        assert_eq!(material.second_cover, "microfibre_blue");
        assert_eq!(material.shell_thickness, "3.0mm");
        assert!(material.extension_forefoot);
    }
}
