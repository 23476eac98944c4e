//! Catalog service: query and mutation operations over the directory store.

use std::collections::HashSet;

use thiserror::Error;

use crate::db::Database;
use crate::models::{Activity, Building, Organization, OrganizationDetails, MAX_ACTIVITY_LEVEL};

pub mod geo;

/// Page size used when a listing request does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn validation(msg: impl Into<String>) -> CatalogError {
    CatalogError::Validation(msg.into())
}

/// The catalog service. Borrows the store it was given so tests can run it
/// against an in-memory database.
pub struct Catalog<'a> {
    db: &'a Database,
}

impl<'a> Catalog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // ==================== READ / SEARCH ====================

    /// Page of buildings in insertion order. Out-of-range skip yields an
    /// empty page, never an error.
    pub fn list_buildings(&self, skip: i64, limit: i64) -> Result<Vec<Building>, CatalogError> {
        let skip = skip.max(0);
        let limit = limit.max(0);
        Ok(self.db.list_buildings(limit, skip)?)
    }

    pub fn get_building(&self, id: i64) -> Result<Building, CatalogError> {
        self.db
            .get_building(id)?
            .ok_or(CatalogError::NotFound("building"))
    }

    pub fn get_organization(&self, id: i64) -> Result<OrganizationDetails, CatalogError> {
        let org = self
            .db
            .get_organization(id)?
            .ok_or(CatalogError::NotFound("organization"))?;
        self.details(org)
    }

    pub fn organizations_in_building(
        &self,
        building_id: i64,
    ) -> Result<Vec<OrganizationDetails>, CatalogError> {
        let orgs = self.db.organizations_in_building(building_id)?;
        orgs.into_iter().map(|o| self.details(o)).collect()
    }

    /// Organizations classified under the given activity or any of its
    /// descendants. An unknown activity id yields an empty result.
    ///
    /// The subtree is expanded with an explicit worklist and a visited set,
    /// so the traversal stays bounded even if the data ever violated the
    /// tree invariant.
    pub fn organizations_by_activity(
        &self,
        activity_id: i64,
    ) -> Result<Vec<OrganizationDetails>, CatalogError> {
        if self.db.get_activity(activity_id)?.is_none() {
            return Ok(Vec::new());
        }

        let mut stack = vec![activity_id];
        let mut visited = HashSet::new();
        let mut closure = Vec::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            closure.push(id);
            stack.extend(self.db.child_activity_ids(id)?);
        }

        let orgs = self.db.organizations_linked_to_activities(&closure)?;
        orgs.into_iter().map(|o| self.details(o)).collect()
    }

    /// Case-insensitive substring search on organization name. An empty
    /// needle matches every organization.
    pub fn organizations_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<OrganizationDetails>, CatalogError> {
        let orgs = self.db.organizations_by_name(name)?;
        orgs.into_iter().map(|o| self.details(o)).collect()
    }

    /// Organizations housed in buildings within `radius_km` of the given
    /// point (inclusive boundary). A negative radius yields an empty result.
    pub fn organizations_by_radius(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
    ) -> Result<Vec<OrganizationDetails>, CatalogError> {
        if radius_km < 0.0 {
            return Ok(Vec::new());
        }

        let building_ids: Vec<i64> = self
            .db
            .all_buildings()?
            .into_iter()
            .filter(|b| geo::distance_km(lat, lon, b.latitude, b.longitude) <= radius_km)
            .map(|b| b.id)
            .collect();

        let orgs = self.db.organizations_in_buildings(&building_ids)?;
        orgs.into_iter().map(|o| self.details(o)).collect()
    }

    /// Organizations housed in buildings inside the inclusive lat/lon
    /// rectangle. No wraparound handling for longitude.
    pub fn organizations_by_bbox(
        &self,
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) -> Result<Vec<OrganizationDetails>, CatalogError> {
        let building_ids: Vec<i64> = self
            .db
            .buildings_in_bbox(min_lat, max_lat, min_lon, max_lon)?
            .into_iter()
            .map(|b| b.id)
            .collect();

        let orgs = self.db.organizations_in_buildings(&building_ids)?;
        orgs.into_iter().map(|o| self.details(o)).collect()
    }

    // ==================== CREATE ====================

    pub fn create_building(
        &self,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Building, CatalogError> {
        if !Building::coordinates_valid(latitude, longitude) {
            return Err(validation(
                "latitude must be in [-90, 90] and longitude in [-180, 180]",
            ));
        }
        Ok(self.db.insert_building(address, latitude, longitude)?)
    }

    /// Create an activity, computing its level from the parent. The tree is
    /// capped at three tiers; nothing is persisted on a failed check.
    pub fn create_activity(
        &self,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<Activity, CatalogError> {
        let level = match parent_id {
            Some(pid) => {
                let parent = self
                    .db
                    .get_activity(pid)?
                    .ok_or_else(|| validation("parent activity not found"))?;
                let level = parent.level + 1;
                if level > MAX_ACTIVITY_LEVEL {
                    return Err(validation("maximum nesting level is 3"));
                }
                level
            }
            None => 0,
        };

        Ok(self.db.insert_activity(name, parent_id, level)?)
    }

    /// Create an organization with its phones and activity links. The
    /// building must exist; activity ids that do not resolve are silently
    /// dropped, which is a documented contract rather than an oversight.
    pub fn create_organization(
        &self,
        name: &str,
        building_id: i64,
        phone_numbers: &[String],
        activity_ids: &[i64],
    ) -> Result<OrganizationDetails, CatalogError> {
        if self.db.get_building(building_id)?.is_none() {
            return Err(validation("building not found"));
        }

        let resolved = self.db.existing_activity_ids(activity_ids)?;
        let org = self
            .db
            .insert_organization(name, building_id, phone_numbers, &resolved)?;
        self.details(org)
    }

    fn details(&self, org: Organization) -> Result<OrganizationDetails, CatalogError> {
        let building = self.db.get_building(org.building_id)?.ok_or_else(|| {
            CatalogError::Storage(anyhow::anyhow!(
                "organization {} references missing building {}",
                org.id,
                org.building_id
            ))
        })?;
        let phones = self.db.phones_for_organization(org.id)?;
        let activities = self.db.activities_for_organization(org.id)?;

        Ok(OrganizationDetails {
            id: org.id,
            name: org.name,
            building_id: org.building_id,
            building,
            phones,
            activities,
        })
    }
}
