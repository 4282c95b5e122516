//! Step registry: the one ordered sequence of wizard steps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Wizard step identifiers, declared in traversal order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
    Patient,
    Scans,
    Clinical,
    Intrinsic,
    Offloading,
    Plantar,
    Posting,
    Material,
    Shoe,
    Device,
    Notes,
}

/// HTTP verb a step's save adapter uses against its resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveMethod {
    Post,
    Put,
}

/// Immutable registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub id: StepId,
    pub title: &'static str,
    pub order: usize,
}

pub const STEPS: [Step; 11] = [
    Step { id: StepId::Patient, title: "Patient Selection", order: 0 },
    Step { id: StepId::Scans, title: "Scan Upload", order: 1 },
    Step { id: StepId::Clinical, title: "Clinical Measures", order: 2 },
    Step { id: StepId::Intrinsic, title: "Intrinsic Adjustments", order: 3 },
    Step { id: StepId::Offloading, title: "Off-loading", order: 4 },
    Step { id: StepId::Plantar, title: "Plantar Modifiers", order: 5 },
    Step { id: StepId::Posting, title: "Posting", order: 6 },
    Step { id: StepId::Material, title: "Material Selection", order: 7 },
    Step { id: StepId::Shoe, title: "Shoe Fitting", order: 8 },
    Step { id: StepId::Device, title: "Device Options", order: 9 },
    Step { id: StepId::Notes, title: "Notes & Attachments", order: 10 },
];

pub fn steps() -> &'static [Step] {
    &STEPS
}

pub fn first() -> StepId {
    STEPS[0].id
}

pub fn last() -> StepId {
    STEPS[STEPS.len() - 1].id
}

/// Zero-based position of a step id given in its wire form.
pub fn position(id: &str) -> Result<usize, Error> {
    id.parse::<StepId>().map(StepId::position)
}

pub fn title(id: StepId) -> &'static str {
    id.step().title
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Patient => "patient",
            StepId::Scans => "scans",
            StepId::Clinical => "clinical",
            StepId::Intrinsic => "intrinsic",
            StepId::Offloading => "offloading",
            StepId::Plantar => "plantar",
            StepId::Posting => "posting",
            StepId::Material => "material",
            StepId::Shoe => "shoe",
            StepId::Device => "device",
            StepId::Notes => "notes",
        }
    }

    pub fn step(self) -> &'static Step {
        &STEPS[self.position()]
    }

    pub fn position(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        self.step().title
    }

    pub fn next(self) -> Option<StepId> {
        STEPS.get(self.position() + 1).map(|s| s.id)
    }

    pub fn prev(self) -> Option<StepId> {
        self.position()
            .checked_sub(1)
            .and_then(|p| STEPS.get(p))
            .map(|s| s.id)
    }

    pub fn is_first(self) -> bool {
        self == first()
    }

    pub fn is_last(self) -> bool {
        self == last()
    }

    /// Element id of the step's dialog.
    pub fn modal_id(self) -> &'static str {
        match self {
            StepId::Patient => "patientModal",
            StepId::Scans => "scanUploadModal",
            StepId::Clinical => "clinicalMeasuresModal",
            StepId::Intrinsic => "intrinsicAdjustmentsModal",
            StepId::Offloading => "offloadingModal",
            StepId::Plantar => "plantarModifiersModal",
            StepId::Posting => "postingModal",
            StepId::Material => "materialSelectionModal",
            StepId::Shoe => "shoeFittingModal",
            StepId::Device => "deviceOptionsModal",
            StepId::Notes => "notesAttachmentsModal",
        }
    }

    /// Gateway resource scoped under `prescriptions/<id>/`. `None` means the
    /// step reads and writes the prescription record itself.
    pub fn resource(self) -> Option<&'static str> {
        match self {
            StepId::Patient | StepId::Notes => None,
            StepId::Scans => Some("scans"),
            StepId::Clinical => Some("clinical_measures"),
            StepId::Intrinsic => Some("intrinsic_adjustments"),
            StepId::Offloading => Some("off_loadings"),
            StepId::Plantar => Some("plantar-modifiers"),
            StepId::Posting => Some("postings"),
            StepId::Material => Some("material_selection"),
            StepId::Shoe => Some("shoe_fitting"),
            StepId::Device => Some("device_options"),
        }
    }

    pub fn from_resource(resource: &str) -> Option<StepId> {
        STEPS
            .iter()
            .map(|s| s.id)
            .find(|id| id.resource() == Some(resource))
    }

    pub fn save_method(self) -> SaveMethod {
        match self {
            StepId::Patient
            | StepId::Scans
            | StepId::Clinical
            | StepId::Intrinsic
            | StepId::Offloading
            | StepId::Plantar => SaveMethod::Post,
            StepId::Posting
            | StepId::Material
            | StepId::Shoe
            | StepId::Device
            | StepId::Notes => SaveMethod::Put,
        }
    }
}

impl FromStr for StepId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STEPS
            .iter()
            .map(|step| step.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| Error::UnknownStep { id: s.to_string() })
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_order_matches_declaration_order() {
        for (i, step) in STEPS.iter().enumerate() {
            assert_eq!(step.order, i);
            assert_eq!(step.id.position(), i);
        }
    }

    #[test]
    fn ids_modals_and_resources_are_unique() {
        let ids: HashSet<_> = STEPS.iter().map(|s| s.id.as_str()).collect();
        let modals: HashSet<_> = STEPS.iter().map(|s| s.id.modal_id()).collect();
        let resources: Vec<_> = STEPS.iter().filter_map(|s| s.id.resource()).collect();
        let unique_resources: HashSet<_> = resources.iter().collect();

        assert_eq!(ids.len(), STEPS.len());
        assert_eq!(modals.len(), STEPS.len());
        assert_eq!(unique_resources.len(), resources.len());
    }

    #[test]
    fn position_of_unknown_step_is_an_error() {
        assert_eq!(position("posting"), Ok(6));
        assert_eq!(
            position("billing"),
            Err(Error::UnknownStep {
                id: "billing".to_string()
            })
        );
    }

    #[test]
    fn next_and_prev_stop_at_the_boundaries() {
        assert_eq!(first(), StepId::Patient);
        assert_eq!(last(), StepId::Notes);
        assert_eq!(StepId::Patient.prev(), None);
        assert_eq!(StepId::Notes.next(), None);
        assert_eq!(StepId::Posting.next(), Some(StepId::Material));
        assert_eq!(StepId::Posting.prev(), Some(StepId::Plantar));
    }

    #[test]
    fn wire_names_round_trip() {
        for step in steps() {
            assert_eq!(step.id.as_str().parse::<StepId>(), Ok(step.id));
            let json = serde_json::to_string(&step.id).unwrap();
            assert_eq!(json, format!("\"{}\"", step.id.as_str()));
        }
        assert_eq!(StepId::from_resource("postings"), Some(StepId::Posting));
        assert_eq!(StepId::from_resource("nope"), None);
        assert_eq!(title(StepId::Shoe), "Shoe Fitting");
    }
}
