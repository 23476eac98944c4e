use anyhow::Result;
use rusqlite::{params, Row};

use super::Database;
use crate::models::Activity;

fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        level: row.get(3)?,
    })
}

impl Database {
    pub fn insert_activity(&self, name: &str, parent_id: Option<i64>, level: i64) -> Result<Activity> {
        self.conn().execute(
            "INSERT INTO activities (name, parent_id, level) VALUES (?, ?, ?)",
            params![name, parent_id, level],
        )?;
        let id = self.conn().last_insert_rowid();
        Ok(Activity {
            id,
            name: name.to_string(),
            parent_id,
            level,
        })
    }

    pub fn get_activity(&self, id: i64) -> Result<Option<Activity>> {
        let result = self.conn().query_row(
            "SELECT id, name, parent_id, level FROM activities WHERE id = ?",
            [id],
            row_to_activity,
        );

        match result {
            Ok(activity) => Ok(Some(activity)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Ids of the direct children of an activity.
    pub fn child_activity_ids(&self, parent_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id FROM activities WHERE parent_id = ? ORDER BY id ASC")?;

        let ids = stmt
            .query_map([parent_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ids)
    }

    /// Filter the given ids down to those that exist, preserving input order
    /// and dropping duplicates.
    pub fn existing_activity_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT 1 FROM activities WHERE id = ?")?;

        let mut resolved = Vec::new();
        for &id in ids {
            if resolved.contains(&id) {
                continue;
            }
            if stmt.exists([id])? {
                resolved.push(id);
            }
        }
        Ok(resolved)
    }

    pub fn count_activities(&self) -> Result<i64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[test]
    fn insert_and_get_activity() {
        let db = Database::open_memory().unwrap();
        let root = db.insert_activity("Food", None, 0).unwrap();
        let child = db.insert_activity("Meat", Some(root.id), 1).unwrap();

        let fetched = db.get_activity(child.id).unwrap().unwrap();
        assert_eq!(fetched.parent_id, Some(root.id));
        assert_eq!(fetched.level, 1);
    }

    #[test]
    fn child_ids_only_direct_children() {
        let db = Database::open_memory().unwrap();
        let root = db.insert_activity("Food", None, 0).unwrap();
        let meat = db.insert_activity("Meat", Some(root.id), 1).unwrap();
        let dairy = db.insert_activity("Dairy", Some(root.id), 1).unwrap();
        let beef = db.insert_activity("Beef", Some(meat.id), 2).unwrap();

        assert_eq!(db.child_activity_ids(root.id).unwrap(), vec![meat.id, dairy.id]);
        assert_eq!(db.child_activity_ids(meat.id).unwrap(), vec![beef.id]);
        assert!(db.child_activity_ids(beef.id).unwrap().is_empty());
    }

    #[test]
    fn existing_ids_drops_unknown_and_duplicates() {
        let db = Database::open_memory().unwrap();
        let a = db.insert_activity("A", None, 0).unwrap();
        let b = db.insert_activity("B", None, 0).unwrap();

        let resolved = db
            .existing_activity_ids(&[b.id, 999, a.id, b.id])
            .unwrap();
        assert_eq!(resolved, vec![b.id, a.id]);
    }
}
