use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

pub const ACCEPTED_SCAN_EXTENSIONS: &[&str] = &["stl", "wrl", "jpg", "jpeg", "png"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Foot {
    Left,
    Right,
}

impl Foot {
    pub fn as_str(self) -> &'static str {
        match self {
            Foot::Left => "left",
            Foot::Right => "right",
        }
    }

    /// Multipart field name carrying this foot's scan.
    pub fn form_field(self) -> &'static str {
        match self {
            Foot::Left => "left_foot",
            Foot::Right => "right_foot",
        }
    }

    pub fn from_form_field(name: &str) -> Option<Foot> {
        match name {
            "left_foot" => Some(Foot::Left),
            "right_foot" => Some(Foot::Right),
            _ => None,
        }
    }
}

/// A scan picked in the browser, not yet uploaded. Raw bytes never enter the
/// event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanFile {
    pub file_name: String,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ScanFile {
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    pub fn validate(&self, foot: Foot) -> Result<(), Error> {
        match self.extension() {
            Some(ext) if ACCEPTED_SCAN_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(Error::validation(format!(
                "{} foot scan {} must be one of: {}",
                foot.as_str(),
                self.file_name,
                ACCEPTED_SCAN_EXTENSIONS.join(", ")
            ))),
        }
    }

    /// Files are stored as `<prescription>_<foot>.<ext>`.
    pub fn stored_name(&self, prescription_id: &str, foot: Foot) -> String {
        match self.extension() {
            Some(ext) => format!("{prescription_id}_{}.{ext}", foot.as_str()),
            None => format!("{prescription_id}_{}", foot.as_str()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanUpload {
    pub prescription_id: String,
    pub left: Option<ScanFile>,
    pub right: Option<ScanFile>,
}

impl ScanUpload {
    /// Both feet are required and must carry an accepted extension.
    pub fn validate(&self) -> Result<(), Error> {
        for (foot, file) in self.files() {
            match file {
                Some(file) => file.validate(foot)?,
                None => {
                    return Err(Error::validation(format!(
                        "Please select a {} foot scan",
                        foot.as_str()
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn files(&self) -> [(Foot, Option<&ScanFile>); 2] {
        [
            (Foot::Left, self.left.as_ref()),
            (Foot::Right, self.right.as_ref()),
        ]
    }
}

/// A stored scan as listed by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub foot: Foot,
    pub file_name: String,
    pub original_name: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}
