use serde::{Deserialize, Serialize};

/// A phone number owned by exactly one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub id: i64,
    pub number: String,
    pub organization_id: i64,
}
