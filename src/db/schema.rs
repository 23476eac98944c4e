pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA_V1: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS buildings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL
);

-- Activity taxonomy: self-referential tree, levels 0..=2
CREATE TABLE IF NOT EXISTS activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    parent_id INTEGER,
    level INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (parent_id) REFERENCES activities(id)
);

-- search_name holds the lowercased name so substring search stays
-- case-insensitive for non-ASCII text (SQLite LIKE only folds ASCII)
CREATE TABLE IF NOT EXISTS organizations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    search_name TEXT NOT NULL,
    building_id INTEGER NOT NULL,
    FOREIGN KEY (building_id) REFERENCES buildings(id)
);

CREATE TABLE IF NOT EXISTS phones (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    number TEXT NOT NULL,
    organization_id INTEGER NOT NULL,
    FOREIGN KEY (organization_id) REFERENCES organizations(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS organization_activity (
    organization_id INTEGER NOT NULL,
    activity_id INTEGER NOT NULL,
    PRIMARY KEY (organization_id, activity_id),
    FOREIGN KEY (organization_id) REFERENCES organizations(id) ON DELETE CASCADE,
    FOREIGN KEY (activity_id) REFERENCES activities(id)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_activity_parent ON activities(parent_id);
CREATE INDEX IF NOT EXISTS idx_org_building ON organizations(building_id);
CREATE INDEX IF NOT EXISTS idx_org_search ON organizations(search_name);
CREATE INDEX IF NOT EXISTS idx_phone_org ON phones(organization_id);
CREATE INDEX IF NOT EXISTS idx_link_activity ON organization_activity(activity_id);
"#;
