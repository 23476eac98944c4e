use serde::{Deserialize, Serialize};

use super::{Activity, Building, Phone};

/// An organization row as stored: name plus its building reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
}

/// An organization with all relationships populated: the building it sits in,
/// its owned phones, and the activities it is classified under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationDetails {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
    pub building: Building,
    pub phones: Vec<Phone>,
    pub activities: Vec<Activity>,
}
