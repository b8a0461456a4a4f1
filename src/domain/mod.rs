use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Template map key that matches any requested version.
pub const ANY_VERSION: &str = "any";

/// A versioned artifact package attributed to a client, carrying the raw
/// list of constituent file paths as written at delivery time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Option<Uuid>,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub creation_date: DateTime<Utc>,
    pub author: String,
    pub comment: String,
    /// Raw file list text: tokens separated by newlines and/or semicolons.
    pub file_list: String,
    /// Tag root joined onto separator-containing file tokens during resolution.
    pub tag_root: String,
    pub business_status: Option<String>,
    pub flag_uploaded: bool,
    pub flag_approved: bool,
    pub flag_failed: bool,
}

impl Delivery {
    /// Display name shown to clients and matched by the `project` filter.
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.artifact_id, self.version)
    }

    /// group:artifact:version coordinate.
    pub fn gav(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }

    /// Status text synthesized from the lifecycle flags when no business
    /// status is recorded. The most advanced state wins.
    pub fn flags_description(&self) -> String {
        let text = if self.flag_failed {
            "Delivery failed"
        } else if self.flag_uploaded {
            "Delivery uploaded"
        } else if self.flag_approved {
            "Delivery approved"
        } else {
            "Delivery created"
        };
        text.to_string()
    }
}

/// Classification of a file type, with path-matching templates per version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentType {
    pub code: String,
    pub name: String,
    /// Path regex templates keyed by version string; the [`ANY_VERSION`]
    /// entry is the fallback for versions with no template of their own.
    pub templates: BTreeMap<String, String>,
}

impl ComponentType {
    /// Template for the requested version, falling back to the
    /// [`ANY_VERSION`] entry. An empty version goes straight to the fallback.
    pub fn template_for(&self, version: &str) -> Option<&str> {
        if !version.is_empty() {
            if let Some(template) = self.templates.get(version) {
                return Some(template.as_str());
            }
        }
        self.templates.get(ANY_VERSION).map(String::as_str)
    }
}

/// Named collection of component type codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentGroup {
    pub code: String,
    /// Member type codes in declared order; expansion preserves this order.
    pub members: Vec<String>,
}

/// One row of the location registry. A single shape covers both tiers:
/// `historical` selects the point-in-time tier, and `effective_date` is the
/// history date there or the input date on the current tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    pub path: String,
    pub citype_code: String,
    pub citype_name: String,
    pub location_kind: String,
    pub effective_date: DateTime<Utc>,
    pub historical: bool,
}

/// A file path from a delivery, with provenance when the registry knew it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(flatten)]
    pub provenance: Option<FileProvenance>,
}

/// Resolved classification and location metadata for a file path. Either
/// all four fields are present on an entry or none are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProvenance {
    pub full_path: String,
    pub citype: String,
    pub citype_desc: String,
    pub location_type: String,
}

impl FileEntry {
    /// Entry for a path the registry does not know.
    pub fn bare(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            provenance: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: Option<Uuid>,
    pub code: String,
    pub country: String,
    pub language: Option<String>,
    pub is_active: bool,
}
