/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per comparison harvest
CREATE TABLE IF NOT EXISTS harvest_runs (
    id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    completed_at TEXT
);

-- Phases with values from both ab initio and peer-reviewed sources
CREATE TABLE IF NOT EXISTS compared_phases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL REFERENCES harvest_runs(id),
    property TEXT NOT NULL,
    phase_id INTEGER NOT NULL,
    formula TEXT NOT NULL,
    crystal_system TEXT NOT NULL,
    ab_values TEXT NOT NULL,
    pr_values TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_compared_phases_run ON compared_phases(run_id);
CREATE INDEX IF NOT EXISTS idx_compared_phases_run_property ON compared_phases(run_id, property);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: MIGRATION_001,
}];
