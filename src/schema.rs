pub const CURRENT_SCHEMA_VERSION: &str = "1";

pub const CREATE_SCHEMA_SQL: &str = r#"
BEGIN TRANSACTION;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', '1');

-- Alerts are appended on every refresh that flags them; duplicates are expected
CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    alert TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    source TEXT,                    -- 'gdacs', 'usgs', or NULL
    created_at INTEGER NOT NULL     -- unix seconds, UTC
);

COMMIT;
"#;
