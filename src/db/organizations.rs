use anyhow::Result;
use rusqlite::{params, params_from_iter, Row};

use super::Database;
use crate::models::{Activity, Organization, Phone};

fn row_to_organization(row: &Row) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: row.get(0)?,
        name: row.get(1)?,
        building_id: row.get(2)?,
    })
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl Database {
    /// Insert an organization together with its phones and activity links in
    /// one transaction. The caller has already resolved `activity_ids` to
    /// existing activities.
    pub fn insert_organization(
        &self,
        name: &str,
        building_id: i64,
        phone_numbers: &[String],
        activity_ids: &[i64],
    ) -> Result<Organization> {
        let tx = self.conn().unchecked_transaction()?;

        tx.execute(
            "INSERT INTO organizations (name, search_name, building_id) VALUES (?, ?, ?)",
            params![name, name.to_lowercase(), building_id],
        )?;
        let org_id = tx.last_insert_rowid();

        for number in phone_numbers {
            tx.execute(
                "INSERT INTO phones (number, organization_id) VALUES (?, ?)",
                params![number, org_id],
            )?;
        }

        for activity_id in activity_ids {
            tx.execute(
                "INSERT INTO organization_activity (organization_id, activity_id) VALUES (?, ?)",
                params![org_id, activity_id],
            )?;
        }

        tx.commit()?;

        Ok(Organization {
            id: org_id,
            name: name.to_string(),
            building_id,
        })
    }

    pub fn get_organization(&self, id: i64) -> Result<Option<Organization>> {
        let result = self.conn().query_row(
            "SELECT id, name, building_id FROM organizations WHERE id = ?",
            [id],
            row_to_organization,
        );

        match result {
            Ok(org) => Ok(Some(org)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn organizations_in_building(&self, building_id: i64) -> Result<Vec<Organization>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, building_id FROM organizations WHERE building_id = ? ORDER BY id ASC",
        )?;

        let orgs = stmt
            .query_map([building_id], row_to_organization)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(orgs)
    }

    pub fn organizations_in_buildings(&self, building_ids: &[i64]) -> Result<Vec<Organization>> {
        if building_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, name, building_id FROM organizations WHERE building_id IN ({}) ORDER BY id ASC",
            placeholders(building_ids.len())
        );
        let mut stmt = self.conn().prepare(&sql)?;

        let orgs = stmt
            .query_map(params_from_iter(building_ids.iter()), row_to_organization)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(orgs)
    }

    /// Organizations linked to any of the given activities, deduplicated.
    pub fn organizations_linked_to_activities(
        &self,
        activity_ids: &[i64],
    ) -> Result<Vec<Organization>> {
        if activity_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT DISTINCT o.id, o.name, o.building_id
             FROM organizations o
             JOIN organization_activity oa ON oa.organization_id = o.id
             WHERE oa.activity_id IN ({})
             ORDER BY o.id ASC",
            placeholders(activity_ids.len())
        );
        let mut stmt = self.conn().prepare(&sql)?;

        let orgs = stmt
            .query_map(params_from_iter(activity_ids.iter()), row_to_organization)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(orgs)
    }

    /// Case-insensitive substring match on name. An empty needle matches all.
    pub fn organizations_by_name(&self, needle: &str) -> Result<Vec<Organization>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, building_id FROM organizations
             WHERE search_name LIKE '%' || ? || '%' ORDER BY id ASC",
        )?;

        let orgs = stmt
            .query_map([needle.to_lowercase()], row_to_organization)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(orgs)
    }

    pub fn phones_for_organization(&self, organization_id: i64) -> Result<Vec<Phone>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, number, organization_id FROM phones WHERE organization_id = ? ORDER BY id ASC",
        )?;

        let phones = stmt
            .query_map([organization_id], |row| {
                Ok(Phone {
                    id: row.get(0)?,
                    number: row.get(1)?,
                    organization_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(phones)
    }

    pub fn activities_for_organization(&self, organization_id: i64) -> Result<Vec<Activity>> {
        let mut stmt = self.conn().prepare(
            "SELECT a.id, a.name, a.parent_id, a.level
             FROM activities a
             JOIN organization_activity oa ON oa.activity_id = a.id
             WHERE oa.organization_id = ?
             ORDER BY a.id ASC",
        )?;

        let activities = stmt
            .query_map([organization_id], |row| {
                Ok(Activity {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    parent_id: row.get(2)?,
                    level: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(activities)
    }

    pub fn count_organizations(&self) -> Result<i64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM organizations", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[test]
    fn insert_organization_with_phones_and_links() {
        let db = Database::open_memory().unwrap();
        let b = db.insert_building("HQ", 0.0, 0.0).unwrap();
        let food = db.insert_activity("Food", None, 0).unwrap();

        let org = db
            .insert_organization(
                "Acme",
                b.id,
                &["123".to_string(), "456".to_string()],
                &[food.id],
            )
            .unwrap();

        let phones = db.phones_for_organization(org.id).unwrap();
        assert_eq!(phones.len(), 2);
        assert_eq!(phones[0].number, "123");

        let activities = db.activities_for_organization(org.id).unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].id, food.id);
    }

    #[test]
    fn insert_organization_rejects_unknown_building() {
        let db = Database::open_memory().unwrap();
        // foreign_keys is ON, so the row must not land
        assert!(db.insert_organization("Ghost", 42, &[], &[]).is_err());
        assert_eq!(db.count_organizations().unwrap(), 0);
    }

    #[test]
    fn name_search_is_case_insensitive_for_unicode() {
        let db = Database::open_memory().unwrap();
        let b = db.insert_building("HQ", 0.0, 0.0).unwrap();
        db.insert_organization("ООО Рога и Копыта", b.id, &[], &[])
            .unwrap();
        db.insert_organization("Autoservice", b.id, &[], &[]).unwrap();

        let hits = db.organizations_by_name("рога").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "ООО Рога и Копыта");

        // Empty needle matches everything
        assert_eq!(db.organizations_by_name("").unwrap().len(), 2);
    }

    #[test]
    fn linked_organizations_are_deduplicated() {
        let db = Database::open_memory().unwrap();
        let b = db.insert_building("HQ", 0.0, 0.0).unwrap();
        let meat = db.insert_activity("Meat", None, 0).unwrap();
        let dairy = db.insert_activity("Dairy", None, 0).unwrap();

        let org = db
            .insert_organization("Both", b.id, &[], &[meat.id, dairy.id])
            .unwrap();

        let orgs = db
            .organizations_linked_to_activities(&[meat.id, dairy.id])
            .unwrap();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].id, org.id);
    }
}
