//! Response shaping for the two delivery output schemas.

use crate::domain::{Delivery, FileEntry};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const DISPLAY_DATE_FORMAT: &str = "%b %d %Y %H:%M:%S";
const MACHINE_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

pub const CSV_HEADER: &str = "name,gav,author,creation_date,status,files";

/// Delivery row in the legacy response shape. `files` is the raw file
/// list text with newlines collapsed to semicolons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V1Record {
    pub name: String,
    pub gav: String,
    pub author: String,
    pub creation_date: String,
    pub status: String,
    pub files: String,
}

/// Delivery row in the v2 response shape: machine-readable creation date,
/// lifecycle-aware status, and registry-resolved file entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2Record {
    pub name: String,
    pub gav: String,
    pub author: String,
    pub creation_date: String,
    pub creation_date_mr: String,
    pub status: String,
    pub files: Vec<FileEntry>,
}

pub fn format_v1(delivery: &Delivery, tz: Tz) -> V1Record {
    let local = delivery.creation_date.with_timezone(&tz);
    V1Record {
        name: delivery.display_name(),
        gav: delivery.gav(),
        author: delivery.author.clone(),
        creation_date: local.format(DISPLAY_DATE_FORMAT).to_string(),
        status: delivery.comment.clone(),
        files: delivery.file_list.replace('\n', ";"),
    }
}

pub fn format_v2(delivery: &Delivery, files: Vec<FileEntry>, tz: Tz) -> V2Record {
    let local = delivery.creation_date.with_timezone(&tz);
    V2Record {
        name: delivery.display_name(),
        gav: delivery.gav(),
        author: delivery.author.clone(),
        creation_date: local.format(DISPLAY_DATE_FORMAT).to_string(),
        creation_date_mr: local.format(MACHINE_DATE_FORMAT).to_string(),
        status: delivery
            .business_status
            .clone()
            .unwrap_or_else(|| delivery.flags_description()),
        files,
    }
}

/// Renders v1 records as CSV. No records means an empty body, not a lone
/// header row.
pub fn to_csv(records: &[V1Record]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(records.len() * 80);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in records {
        let fields = [
            record.name.as_str(),
            record.gav.as_str(),
            record.author.as_str(),
            record.creation_date.as_str(),
            record.status.as_str(),
            record.files.as_str(),
        ];
        let row: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

// Minimal quoting: only fields carrying a delimiter, quote, or line break
// are wrapped, with embedded quotes doubled.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
