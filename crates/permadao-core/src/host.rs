//! In-memory host implementations.
//!
//! [`FixedBlock`] pins the step and interaction id; [`MemoryTagResolver`]
//! answers reference lookups from a map. Both back the CLI and the tests;
//! a real deployment supplies its own [`BlockContext`] and [`TagResolver`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{CONTENT_TYPE_TAG, MANIFEST_CONTENT_TYPE};
use crate::error::HostError;
use crate::traits::{BlockContext, TagResolver};
use crate::types::Tag;

/// A block context with a fixed height and interaction id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedBlock {
    pub height: u64,
    pub transaction_id: String,
}

impl FixedBlock {
    pub fn new(height: u64, transaction_id: impl Into<String>) -> Self {
        Self {
            height,
            transaction_id: transaction_id.into(),
        }
    }
}

impl BlockContext for FixedBlock {
    fn height(&self) -> u64 {
        self.height
    }

    fn transaction_id(&self) -> &str {
        &self.transaction_id
    }
}

/// Reference → tags lookup table.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct MemoryTagResolver {
    tags: BTreeMap<String, Vec<Tag>>,
}

impl MemoryTagResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tags for `reference`, replacing any previous entry.
    pub fn insert(&mut self, reference: impl Into<String>, tags: Vec<Tag>) {
        self.tags.insert(reference.into(), tags);
    }

    /// Record `reference` as a well-formed content manifest.
    pub fn insert_manifest(&mut self, reference: impl Into<String>) {
        self.insert(
            reference,
            vec![Tag::new(CONTENT_TYPE_TAG, MANIFEST_CONTENT_TYPE)],
        );
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl TagResolver for MemoryTagResolver {
    fn resolve_tags(&self, reference: &str) -> Result<Vec<Tag>, HostError> {
        self.tags
            .get(reference)
            .cloned()
            .ok_or_else(|| HostError::ReferenceNotFound(reference.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_block_reports_values() {
        let b = FixedBlock::new(42, "tx-1");
        assert_eq!(b.height(), 42);
        assert_eq!(b.transaction_id(), "tx-1");
    }

    #[test]
    fn resolver_returns_recorded_tags() {
        let mut r = MemoryTagResolver::new();
        r.insert_manifest("ref");
        let tags = r.resolve_tags("ref").unwrap();
        assert_eq!(tags, vec![Tag::new(CONTENT_TYPE_TAG, MANIFEST_CONTENT_TYPE)]);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn resolver_unknown_reference_is_error() {
        let r = MemoryTagResolver::new();
        assert!(r.is_empty());
        assert_eq!(
            r.resolve_tags("nope"),
            Err(HostError::ReferenceNotFound("nope".into()))
        );
    }

    #[test]
    fn resolver_loads_from_json() {
        let json = r#"{"ref": [{"name": "Content-Type", "value": "text/html"}]}"#;
        let r: MemoryTagResolver = serde_json::from_str(json).unwrap();
        assert_eq!(r.resolve_tags("ref").unwrap()[0].value, "text/html");
    }
}
