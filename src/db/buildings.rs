use anyhow::Result;
use rusqlite::{params, Row};

use super::Database;
use crate::models::Building;

fn row_to_building(row: &Row) -> rusqlite::Result<Building> {
    Ok(Building {
        id: row.get(0)?,
        address: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
    })
}

impl Database {
    pub fn insert_building(&self, address: &str, latitude: f64, longitude: f64) -> Result<Building> {
        self.conn().execute(
            "INSERT INTO buildings (address, latitude, longitude) VALUES (?, ?, ?)",
            params![address, latitude, longitude],
        )?;
        let id = self.conn().last_insert_rowid();
        Ok(Building {
            id,
            address: address.to_string(),
            latitude,
            longitude,
        })
    }

    pub fn get_building(&self, id: i64) -> Result<Option<Building>> {
        let result = self.conn().query_row(
            "SELECT id, address, latitude, longitude FROM buildings WHERE id = ?",
            [id],
            row_to_building,
        );

        match result {
            Ok(building) => Ok(Some(building)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Page of buildings in insertion (id) order.
    pub fn list_buildings(&self, limit: i64, offset: i64) -> Result<Vec<Building>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, address, latitude, longitude FROM buildings ORDER BY id ASC LIMIT ? OFFSET ?",
        )?;

        let buildings = stmt
            .query_map([limit, offset], row_to_building)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(buildings)
    }

    /// Every building. The radius search scans all of them and filters by
    /// distance in the service layer.
    pub fn all_buildings(&self) -> Result<Vec<Building>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, address, latitude, longitude FROM buildings ORDER BY id ASC")?;

        let buildings = stmt
            .query_map([], row_to_building)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(buildings)
    }

    /// Buildings whose coordinates fall inside the inclusive lat/lon rectangle.
    pub fn buildings_in_bbox(
        &self,
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) -> Result<Vec<Building>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, address, latitude, longitude FROM buildings
             WHERE latitude >= ? AND latitude <= ? AND longitude >= ? AND longitude <= ?
             ORDER BY id ASC",
        )?;

        let buildings = stmt
            .query_map(params![min_lat, max_lat, min_lon, max_lon], row_to_building)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(buildings)
    }

    pub fn count_buildings(&self) -> Result<i64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM buildings", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[test]
    fn insert_and_get_building() {
        let db = Database::open_memory().unwrap();
        let b = db.insert_building("Main St 1", 55.75, 37.61).unwrap();
        assert!(b.id > 0);

        let fetched = db.get_building(b.id).unwrap().unwrap();
        assert_eq!(fetched, b);
        assert!(db.get_building(b.id + 1000).unwrap().is_none());
    }

    #[test]
    fn list_buildings_pagination() {
        let db = Database::open_memory().unwrap();
        for i in 0..5 {
            db.insert_building(&format!("Addr {}", i), 0.0, 0.0).unwrap();
        }

        let page = db.list_buildings(2, 0).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].address, "Addr 0");

        let page = db.list_buildings(2, 4).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].address, "Addr 4");

        // Out-of-range offset is not an error
        assert!(db.list_buildings(2, 100).unwrap().is_empty());
    }

    #[test]
    fn bbox_filter_is_inclusive() {
        let db = Database::open_memory().unwrap();
        let inside = db.insert_building("in", 10.0, 20.0).unwrap();
        db.insert_building("out", 10.0, 20.5).unwrap();

        let hits = db.buildings_in_bbox(10.0, 10.0, 20.0, 20.0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, inside.id);
    }
}
