//! Translation records and cross-source consolidation.

use serde::{Deserialize, Serialize};

/// One translated UI string, keyed by a model-generated identifier.
///
/// Keys are snake_case and unique within a single model response, but
/// independent responses can mint different keys for the same text, so
/// consolidation works on content rather than keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationRecord {
    pub key: String,
    pub en_text: String,
    pub ar_text: String,
}

impl TranslationRecord {
    /// Content identity used for de-duplication across model calls.
    ///
    /// Falls back to the Arabic text for records whose English side is
    /// empty or whitespace.
    pub fn normalized_identity(&self) -> String {
        let en = self.en_text.trim();
        if en.is_empty() {
            self.ar_text.trim().to_string()
        } else {
            en.to_lowercase()
        }
    }
}

/// De-duplicate records by normalized content identity.
///
/// The first record seen per identity wins, in encounter order; the
/// surviving records are then ordered by key for deterministic output.
pub fn consolidate(records: Vec<TranslationRecord>) -> Vec<TranslationRecord> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<TranslationRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.normalized_identity()))
        .collect();
    unique.sort_by(|a, b| a.key.cmp(&b.key));
    unique
}
