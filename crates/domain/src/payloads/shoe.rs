use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{FieldSpec, NumericRange};
use crate::steps::StepId;

use super::StepPayload;

const ORTHOSIS_SIZE: NumericRange = NumericRange::new(4.0, 15.0, 0.5);
const SIZING_STYLES: &[&str] = &["mens", "womens", "womens_address"];

const REFER_TO_INSOLE: &str = "refer-to-insole";
const SHOE_PROVIDED: &str = "shoe-provided";
const NO_FIT: &str = "none";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("sizing_style", "sizingStyle", "Sizing style", SIZING_STYLES, "mens"),
    FieldSpec::number("orthosis_size", "orthosisSize", "Orthosis size", ORTHOSIS_SIZE, 8.0),
    FieldSpec::flag("refer_to_insole", "referToInsole", "Refer to insole", false),
    FieldSpec::flag("shoe_provided", "shoeProvided", "Shoe provided", false),
];

/// On the wire the two "to fit shoe" flags travel as one comma list,
/// `refer-to-insole,shoe-provided`, or `none` when neither is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShoeFitting {
    pub prescription_id: String,
    pub sizing_style: String,
    pub orthosis_size: f64,
    pub refer_to_insole: bool,
    pub shoe_provided: bool,
}

impl ShoeFitting {
    pub fn to_fit_shoe(&self) -> String {
        encode_to_fit(self.refer_to_insole, self.shoe_provided)
    }
}

fn encode_to_fit(refer_to_insole: bool, shoe_provided: bool) -> String {
    let parts: Vec<&str> = [
        (refer_to_insole, REFER_TO_INSOLE),
        (shoe_provided, SHOE_PROVIDED),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();

    if parts.is_empty() {
        NO_FIT.to_string()
    } else {
        parts.join(",")
    }
}

impl StepPayload for ShoeFitting {
    const STEP: StepId = StepId::Shoe;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn prescription_id(&self) -> &str {
        &self.prescription_id
    }

    fn wire_to_form(mut wire: Value) -> Value {
        if let Some(object) = wire.as_object_mut() {
            if let Some(Value::String(list)) = object.remove("to_fit_shoe") {
                let has = |name: &str| list.split(',').any(|part| part.trim() == name);
                object.insert("refer_to_insole".into(), Value::Bool(has(REFER_TO_INSOLE)));
                object.insert("shoe_provided".into(), Value::Bool(has(SHOE_PROVIDED)));
            }
        }
        wire
    }

    fn form_to_wire(mut form: Value) -> Value {
        if let Some(object) = form.as_object_mut() {
            let refer = object.remove("refer_to_insole").and_then(|v| v.as_bool());
            let provided = object.remove("shoe_provided").and_then(|v| v.as_bool());
            object.insert(
                "to_fit_shoe".into(),
                Value::String(encode_to_fit(
                    refer.unwrap_or(false),
                    provided.unwrap_or(false),
                )),
            );
        }
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn to_fit_shoe_is_a_comma_list_on_the_wire() {
        let shoe = ShoeFitting::from_json(&json!({
            "prescription_id": "rx",
            "orthosis_size": "9.3",
            "to_fit_shoe": "refer-to-insole,shoe-provided",
        }))
        .unwrap();

        assert!(shoe.refer_to_insole && shoe.shoe_provided);
        assert_eq!(shoe.orthosis_size, 9.5);
        assert_eq!(
            shoe.to_wire().unwrap(),
            json!({
                "prescription_id": "rx",
                "sizing_style": "mens",
                "orthosis_size": 9.5,
                "to_fit_shoe": "refer-to-insole,shoe-provided",
            })
        );
    }

    #[test]
    fn no_flags_means_none() {
        let shoe = ShoeFitting::defaults("rx").unwrap();
        assert_eq!(shoe.orthosis_size, 8.0);
        assert_eq!(shoe.to_fit_shoe(), "none");

        let parsed = ShoeFitting::from_json(&json!({
            "prescription_id": "rx",
            "to_fit_shoe": "none",
        }))
        .unwrap();
        assert_eq!(parsed, shoe);
    }
}
