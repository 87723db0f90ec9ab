use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Settings
// ============================================================================

/// One row of the flat key/value settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Setting {
    pub key: String,
    pub value: String,
}
