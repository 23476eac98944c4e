use serde::{Deserialize, Serialize};

/// A physical location with geographic coordinates, housing organizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Building {
    /// True when both coordinates are within valid decimal-degree ranges.
    pub fn coordinates_valid(latitude: f64, longitude: f64) -> bool {
        (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
    }
}
