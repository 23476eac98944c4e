use serde::{Deserialize, Serialize};

/// Deepest allowed nesting level. Levels are 0 (root), 1, 2 — three tiers.
pub const MAX_ACTIVITY_LEVEL: i64 = 2;

/// A node in the business-activity taxonomy tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub level: i64,
}
