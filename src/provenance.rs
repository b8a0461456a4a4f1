use crate::domain::{Delivery, FileEntry, FileProvenance};
use crate::error::Result;
use crate::storage::LocationRegistry;
use std::sync::Arc;
use tracing::debug;

/// Resolves a delivery's raw file list against the location registry.
///
/// Lookups go to the point-in-time tier first, scoped to the delivery's
/// creation date, and fall back to the current tier. Paths neither tier
/// knows come back as bare entries.
pub struct FileResolver {
    registry: Arc<dyn LocationRegistry>,
}

impl FileResolver {
    pub fn new(registry: Arc<dyn LocationRegistry>) -> Self {
        Self { registry }
    }

    /// Splits raw file list text into trimmed tokens. Newlines and
    /// semicolons both separate; blank segments are dropped.
    pub fn tokenize(file_list: &str) -> Vec<&str> {
        file_list
            .trim()
            .split(['\n', ';'])
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect()
    }

    /// Resolves every file token of `delivery`, preserving token order.
    pub async fn resolve(&self, delivery: &Delivery) -> Result<Vec<FileEntry>> {
        let tokens = Self::tokenize(&delivery.file_list);
        if tokens.is_empty() {
            debug!("Delivery [{}] lists no files", delivery.display_name());
            return Ok(Vec::new());
        }

        let mut entries = Vec::with_capacity(tokens.len());
        for token in tokens {
            entries.push(self.resolve_entry(token, delivery).await?);
        }
        Ok(entries)
    }

    async fn resolve_entry(&self, token: &str, delivery: &Delivery) -> Result<FileEntry> {
        // Separator-carrying tokens are tag-relative paths; everything else
        // (artifact coordinates) is already a registry key.
        let full_path = if token.contains('/') {
            format!("{}/{}", delivery.tag_root, token)
        } else {
            token.to_string()
        };

        let record = match self
            .registry
            .find_historical(&full_path, delivery.creation_date)
            .await?
        {
            Some(record) => Some(record),
            None => {
                debug!("No historical location for [{full_path}], trying current tier");
                self.registry.find_current(&full_path).await?
            }
        };

        Ok(match record {
            Some(record) => FileEntry {
                path: token.to_string(),
                provenance: Some(FileProvenance {
                    full_path,
                    citype: record.citype_code,
                    citype_desc: record.citype_name,
                    location_type: record.location_kind,
                }),
            },
            None => {
                debug!("No location record for [{full_path}], returning bare path");
                FileEntry::bare(token)
            }
        })
    }
}
