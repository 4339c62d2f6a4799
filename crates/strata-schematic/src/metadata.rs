//! Structure metadata: identity, provenance, and summary statistics.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use strata_math::BlockPos;

/// Descriptive and statistical metadata carried alongside a structure's
/// regions. Timestamps are milliseconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    pub time_created: i64,
    pub time_modified: i64,
    pub region_count: i32,
    pub total_volume: i64,
    pub total_blocks: i64,
    pub enclosing_size: BlockPos,
    /// True when in-memory edits have not been written back to a file.
    pub modified_since_saved: bool,
}

impl StructureMetadata {
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            name: name.into(),
            author: author.into(),
            description: String::new(),
            time_created: now,
            time_modified: now,
            region_count: 0,
            total_volume: 0,
            total_blocks: 0,
            enclosing_size: BlockPos::ZERO,
            modified_since_saved: false,
        }
    }

    /// Records an edit: bumps the modification timestamp and dirty flag.
    pub fn touch(&mut self) {
        self.time_modified = now_millis();
        self.modified_since_saved = true;
    }

    /// Marks the current in-memory state as persisted.
    pub fn mark_saved(&mut self) {
        self.modified_since_saved = false;
    }
}

/// Milliseconds since the Unix epoch, saturating at zero for clocks set
/// before it.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_sets_dirty_flag() {
        let mut meta = StructureMetadata::new("castle", "alice");
        assert!(!meta.modified_since_saved);
        meta.touch();
        assert!(meta.modified_since_saved);
        assert!(meta.time_modified >= meta.time_created);
        meta.mark_saved();
        assert!(!meta.modified_since_saved);
    }

    #[test]
    fn test_new_metadata_has_matching_timestamps() {
        let meta = StructureMetadata::new("hut", "bob");
        assert_eq!(meta.time_created, meta.time_modified);
        assert_eq!(meta.total_blocks, 0);
    }
}
