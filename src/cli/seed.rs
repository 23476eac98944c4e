use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::catalog::Catalog;
use crate::db::Database;

/// Load demo fixtures. Skips when the database already holds buildings.
pub fn run_seed(db_path: Option<PathBuf>) -> Result<()> {
    let db = match db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };

    if db.count_buildings()? > 0 {
        info!("database already seeded, nothing to do");
        return Ok(());
    }

    let catalog = Catalog::new(&db);

    let moscow = catalog.create_building("г. Москва, ул. Ленина 1, офис 3", 55.7558, 37.6176)?;
    let spb = catalog.create_building("г. Санкт-Петербург, ул. Блюхера 32/1", 59.9343, 30.3351)?;
    info!(moscow = moscow.id, spb = spb.id, "buildings created");

    let food = catalog.create_activity("Еда", None)?;
    let meat = catalog.create_activity("Мясная продукция", Some(food.id))?;
    let dairy = catalog.create_activity("Молочная продукция", Some(food.id))?;

    let cars = catalog.create_activity("Автомобили", None)?;
    let passenger = catalog.create_activity("Легковые", Some(cars.id))?;
    let parts = catalog.create_activity("Запчасти", Some(passenger.id))?;
    info!("activity taxonomy created");

    let org1 = catalog.create_organization(
        "ООО Рога и Копыта",
        moscow.id,
        &["2-222-222".to_string(), "8-923-666-13-13".to_string()],
        &[meat.id, dairy.id],
    )?;
    let org2 = catalog.create_organization(
        "Автосервис Скорость",
        spb.id,
        &["3-333-333".to_string()],
        &[parts.id],
    )?;
    info!(org1 = org1.id, org2 = org2.id, "organizations created");

    info!("seed data loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn seed_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");

        run_seed(Some(path.clone())).unwrap();
        let db = Database::open_at(path.clone()).unwrap();
        let buildings = db.count_buildings().unwrap();
        let activities = db.count_activities().unwrap();
        assert_eq!(buildings, 2);
        assert_eq!(activities, 6);
        drop(db);

        // Second run must not duplicate anything
        run_seed(Some(path.clone())).unwrap();
        let db = Database::open_at(path).unwrap();
        assert_eq!(db.count_buildings().unwrap(), buildings);
        assert_eq!(db.count_activities().unwrap(), activities);
    }

    #[test]
    fn seeded_taxonomy_answers_root_queries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");
        run_seed(Some(path.clone())).unwrap();

        let db = Database::open_at(path).unwrap();
        let catalog = Catalog::new(&db);

        // The food organization is linked to children of the taxonomy root,
        // so a root-level query must still find it
        let hits = catalog.organizations_by_name("рога").unwrap();
        assert_eq!(hits.len(), 1);

        let by_activity = catalog
            .organizations_by_activity(hits[0].activities[0].parent_id.unwrap())
            .unwrap();
        assert_eq!(by_activity.len(), 1);
        assert_eq!(by_activity[0].name, "ООО Рога и Копыта");
    }
}
