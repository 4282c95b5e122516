//! Step fragments: the controls of each step rendered from its field table.

use std::fmt::Write;

use axum::extract::Path;
use axum::response::Html;
use domain::payloads::{fields_for, Foot, ACCEPTED_SCAN_EXTENSIONS};
use domain::schema::{FieldKind, FieldSpec, Visibility};
use domain::StepId;

use crate::error::{ApiError, ApiResult};

pub async fn step(Path(file): Path<String>) -> ApiResult<Html<String>> {
    let step = file
        .strip_suffix(".html")
        .and_then(|id| id.parse::<StepId>().ok())
        .ok_or_else(|| ApiError::not_found(format!("Step content {file}")))?;
    Ok(Html(render(step)))
}

pub fn render(step: StepId) -> String {
    let mut html = String::new();
    let _ = writeln!(
        html,
        r#"<div class="modal" id="{}" data-step="{}">"#,
        step.modal_id(),
        step.as_str()
    );
    let _ = writeln!(html, "<h2>{}</h2>", escape(step.title()));
    html.push_str("<form>\n");

    match fields_for(step) {
        Some(fields) => fields.iter().for_each(|field| control(&mut html, field)),
        None if step == StepId::Patient => {
            html.push_str(
                r#"<input type="search" id="patientSearch" name="q" placeholder="Search patients">"#,
            );
            html.push_str("\n<select id=\"patientSelect\" name=\"patient_id\"></select>\n");
        }
        None => {
            let accept = ACCEPTED_SCAN_EXTENSIONS
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(",");
            for foot in [Foot::Left, Foot::Right] {
                let _ = writeln!(
                    html,
                    r#"<label>{} foot scan <input type="file" name="{}" accept="{}"></label>"#,
                    capitalize(foot.as_str()),
                    foot.form_field(),
                    accept
                );
            }
        }
    }

    html.push_str("</form>\n</div>\n");
    html
}

fn control(html: &mut String, field: &FieldSpec) {
    let visibility = match field.visible {
        Visibility::Always => String::new(),
        Visibility::When { key, equals } => {
            format!(r#" data-shown-when="{key}={}""#, escape(equals))
        }
        Visibility::Unless { key, equals } => {
            format!(r#" data-hidden-when="{key}={}""#, escape(equals))
        }
    };
    let _ = write!(
        html,
        r#"<label for="{}"{}>{} "#,
        field.control,
        visibility,
        escape(field.label)
    );

    let _ = match field.kind {
        FieldKind::Number { range, default } => write!(
            html,
            r#"<input type="number" id="{}" name="{}" min="{}" max="{}" step="{}" value="{}">"#,
            field.control, field.key, range.min, range.max, range.step, default
        ),
        FieldKind::Flag { default } => write!(
            html,
            r#"<input type="checkbox" id="{}" name="{}"{}>"#,
            field.control,
            field.key,
            if default { " checked" } else { "" }
        ),
        FieldKind::Choice { options, default } => {
            let _ = write!(html, r#"<select id="{}" name="{}">"#, field.control, field.key);
            for option in options {
                let _ = write!(
                    html,
                    r#"<option value="{0}"{1}>{0}</option>"#,
                    escape(option),
                    if *option == default { " selected" } else { "" }
                );
            }
            write!(html, "</select>")
        }
        FieldKind::Text => write!(
            html,
            r#"<textarea id="{}" name="{}"></textarea>"#,
            field.control, field.key
        ),
    };
    html.push_str("</label>\n");
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posting_fragment_lists_its_numeric_controls() {
        let html = render(StepId::Posting);
        assert!(html.contains(r#"id="postingModal""#));
        assert!(html.contains(r#"type="number""#));
    }

    #[test]
    fn scans_fragment_offers_both_feet() {
        let html = render(StepId::Scans);
        assert!(html.contains(r#"name="left_foot""#));
        assert!(html.contains(r#"name="right_foot""#));
        assert!(html.contains(".stl"));
    }

    #[test]
    fn dependent_controls_carry_their_condition() {
        let html = render(StepId::Intrinsic);
        assert!(html.contains("data-shown-when") || html.contains("data-hidden-when"));
    }
}
