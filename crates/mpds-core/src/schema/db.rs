use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::Connection;
use std::path::Path;

use crate::chem::CrystalSystem;
use crate::compare::{ComparedPhase, PhaseLabel};
use crate::error::{Error, Result};
use crate::ids::RunId;

use super::migrations::MIGRATIONS;

/// Compared phases grouped by property, in harvesting order.
pub type PropertyPairs = Vec<(String, Vec<ComparedPhase>)>;

/// Cache of harvested ab initio vs. peer-reviewed comparisons.
#[derive(Debug)]
pub struct HarvestCache {
    conn: Connection,
}

impl HarvestCache {
    /// Open (or create) a cache at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.apply_migrations()?;
        Ok(cache)
    }

    /// Open an in-memory cache (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.apply_migrations()?;
        Ok(cache)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Runs
impl HarvestCache {
    /// Register a new harvest run.
    pub fn start_run(&self) -> Result<RunId> {
        let run = RunId::new();
        self.conn.execute(
            "INSERT INTO harvest_runs (id, started_at) VALUES (?1, ?2)",
            rusqlite::params![run.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(run)
    }

    /// Mark a run as complete; only complete runs are served from cache.
    pub fn complete_run(&self, run: RunId) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE harvest_runs SET completed_at = ?2 WHERE id = ?1",
            rusqlite::params![run.to_string(), Utc::now().to_rfc3339()],
        )?;
        if updated == 0 {
            return Err(Error::NotFound {
                entity: "harvest run",
                id: run.to_string(),
            });
        }
        Ok(())
    }

    /// The most recently started complete run.
    pub fn latest_complete_run(&self) -> Result<Option<RunId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM harvest_runs
             WHERE completed_at IS NOT NULL
             ORDER BY started_at DESC, rowid DESC
             LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let id: String = row.get(0)?;
        id.parse::<RunId>()
            .map(Some)
            .map_err(|e| Error::InvalidData(format!("bad run id {id}: {e}")))
    }
}

// Compared phases
impl HarvestCache {
    /// Store the compared phases of one property.
    pub fn store_pairs(&self, run: RunId, property: &str, pairs: &[ComparedPhase]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for pair in pairs {
            tx.execute(
                "INSERT INTO compared_phases (
                    run_id, property, phase_id, formula, crystal_system, ab_values, pr_values
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    run.to_string(),
                    property,
                    pair.phase_id,
                    pair.label.formula,
                    pair.label.crystal_system.to_string(),
                    serde_json::to_string(&pair.ab_values)?,
                    serde_json::to_string(&pair.pr_values)?,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// All compared phases of a run, grouped by property in insertion order.
    pub fn pairs_for_run(&self, run: RunId) -> Result<PropertyPairs> {
        let mut stmt = self.conn.prepare(
            "SELECT property, phase_id, formula, crystal_system, ab_values, pr_values
             FROM compared_phases
             WHERE run_id = ?1
             ORDER BY id",
        )?;

        let rows = stmt
            .query_map([run.to_string()], |row| {
                let property: String = row.get(0)?;
                Ok((property, Self::row_to_pair(row)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut grouped: PropertyPairs = Vec::new();
        for (property, pair) in rows {
            if let Some((last, pairs)) = grouped.last_mut() {
                if *last == property {
                    pairs.push(pair);
                    continue;
                }
            }
            grouped.push((property, vec![pair]));
        }
        Ok(grouped)
    }

    fn row_to_pair(row: &rusqlite::Row) -> rusqlite::Result<ComparedPhase> {
        let crystal_system: String = row.get(3)?;
        let ab_values: String = row.get(4)?;
        let pr_values: String = row.get(5)?;

        Ok(ComparedPhase {
            phase_id: row.get(1)?,
            label: PhaseLabel {
                formula: row.get(2)?,
                crystal_system: parse_crystal_system(3, &crystal_system)?,
            },
            ab_values: serde_json::from_str(&ab_values)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
            pr_values: serde_json::from_str(&pr_values)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        })
    }
}

fn parse_crystal_system(idx: usize, label: &str) -> rusqlite::Result<CrystalSystem> {
    const ALL: [CrystalSystem; 7] = [
        CrystalSystem::Triclinic,
        CrystalSystem::Monoclinic,
        CrystalSystem::Orthorhombic,
        CrystalSystem::Tetragonal,
        CrystalSystem::Trigonal,
        CrystalSystem::Hexagonal,
        CrystalSystem::Cubic,
    ];
    ALL.into_iter()
        .find(|cs| cs.label() == label)
        .ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                format!("unknown crystal system {label:?}").into(),
            )
        })
}
