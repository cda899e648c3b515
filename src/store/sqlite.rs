//! SQLite-backed drug store.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Result, StoreError};
use crate::model::{Drug, InteractionVerdict, LookupRecord, PairKey, ResolutionSource, RiskRating};
use crate::store::{DrugStore, StoreStats};

/// Embedded schema, applied idempotently on open.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS drugs (
    id               TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    category         TEXT NOT NULL,
    origin           TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    last_resolved_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS drug_details (
    drug_id             TEXT PRIMARY KEY REFERENCES drugs(id),
    indications         TEXT NOT NULL,
    warnings            TEXT NOT NULL,
    mechanism_of_action TEXT NOT NULL,
    dosage              TEXT NOT NULL,
    contraindications   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS interaction_verdicts (
    drug1_id   TEXT NOT NULL,
    drug2_id   TEXT NOT NULL,
    summary    TEXT NOT NULL,
    details    TEXT NOT NULL,
    rating     TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (drug1_id, drug2_id)
);

CREATE TABLE IF NOT EXISTS lookup_log (
    id         TEXT PRIMARY KEY,
    drug_id    TEXT NOT NULL,
    hit_cache  INTEGER NOT NULL,
    elapsed_ms INTEGER NOT NULL,
    logged_at  TEXT NOT NULL
);
"#;

/// SQLite-backed implementation of [`DrugStore`].
///
/// The connection is guarded by a mutex; all statements are short and run
/// without suspension points while the lock is held.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database. Used by tests and throwaway CLI runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: ":memory:".to_string(),
            source: e,
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StoreError::Sqlite)?;
        conn.execute_batch(SCHEMA_SQL).map_err(StoreError::Sqlite)?;
        tracing::debug!("Drug store schema initialized");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

const DRUG_COLUMNS: &str = "d.id, d.name, d.category, d.last_resolved_at, \
     dd.indications, dd.warnings, dd.mechanism_of_action, dd.dosage, dd.contraindications";

fn drug_from_row(row: &Row<'_>) -> rusqlite::Result<(Drug, String, String, String)> {
    let drug = Drug {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        indications: Vec::new(),
        warnings: Vec::new(),
        mechanism_of_action: row.get(6)?,
        dosage: row.get(7)?,
        contraindications: Vec::new(),
        source: ResolutionSource::Cached,
        last_resolved_at: row.get::<_, DateTime<Utc>>(3)?,
    };
    // The JSON columns are decoded outside the row closure so a corrupt
    // row maps to StoreError::CorruptRow instead of a SQLite error.
    Ok((drug, row.get(4)?, row.get(5)?, row.get(8)?))
}

fn decode_list(column: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| StoreError::CorruptRow(format!("{column}: {e}")).into())
}

fn finish_drug(parts: (Drug, String, String, String)) -> Result<Drug> {
    let (mut drug, indications, warnings, contraindications) = parts;
    drug.indications = decode_list("indications", &indications)?;
    drug.warnings = decode_list("warnings", &warnings)?;
    drug.contraindications = decode_list("contraindications", &contraindications)?;
    Ok(drug)
}

#[async_trait]
impl DrugStore for SqliteStore {
    async fn find_drug_by_name_fragment(&self, normalized: &str) -> Result<Option<Drug>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {DRUG_COLUMNS} FROM drugs d \
             JOIN drug_details dd ON dd.drug_id = d.id \
             WHERE instr(lower(trim(d.name)), ?1) > 0 \
             ORDER BY d.rowid LIMIT 1"
        );
        let parts = conn
            .query_row(&sql, params![normalized], drug_from_row)
            .optional()
            .map_err(StoreError::Sqlite)?;
        parts.map(finish_drug).transpose()
    }

    async fn insert_drug(&self, drug: &Drug) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(StoreError::Sqlite)?;
        let now = Utc::now();

        tx.execute(
            "INSERT INTO drugs (id, name, category, origin, created_at, updated_at, last_resolved_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6)",
            params![
                drug.id,
                drug.name,
                drug.category,
                "openfda",
                now,
                drug.last_resolved_at,
            ],
        )
        .map_err(StoreError::Sqlite)?;

        tx.execute(
            "INSERT INTO drug_details \
             (drug_id, indications, warnings, mechanism_of_action, dosage, contraindications) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                drug.id,
                serde_json::to_string(&drug.indications)?,
                serde_json::to_string(&drug.warnings)?,
                drug.mechanism_of_action,
                drug.dosage,
                serde_json::to_string(&drug.contraindications)?,
            ],
        )
        .map_err(StoreError::Sqlite)?;

        tx.commit().map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn touch_last_resolved(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE drugs SET last_resolved_at = ?1 WHERE id = ?2",
            params![Utc::now(), id],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn drugs_by_ids(&self, ids: &[String]) -> Result<Vec<Drug>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {DRUG_COLUMNS} FROM drugs d \
             JOIN drug_details dd ON dd.drug_id = d.id \
             WHERE d.id = ?1"
        );
        let mut drugs = Vec::with_capacity(ids.len());
        for id in ids {
            let parts = conn
                .query_row(&sql, params![id], drug_from_row)
                .optional()
                .map_err(StoreError::Sqlite)?;
            if let Some(parts) = parts {
                drugs.push(finish_drug(parts)?);
            }
        }
        Ok(drugs)
    }

    async fn names_by_ids(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.conn.lock();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT id, name FROM drugs WHERE id IN ({placeholders})");
        let mut stmt = conn.prepare(&sql).map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(StoreError::Sqlite)?;

        let mut names = HashMap::new();
        for row in rows {
            let (id, name) = row.map_err(StoreError::Sqlite)?;
            names.insert(id, name);
        }
        Ok(names)
    }

    async fn find_verdict(&self, pair: &PairKey) -> Result<Option<InteractionVerdict>> {
        let conn = self.conn.lock();
        let verdict = conn
            .query_row(
                "SELECT summary, details, rating, created_at, updated_at \
                 FROM interaction_verdicts WHERE drug1_id = ?1 AND drug2_id = ?2",
                params![pair.first(), pair.second()],
                |row| {
                    Ok(InteractionVerdict {
                        pair: pair.clone(),
                        summary: row.get(0)?,
                        details: row.get(1)?,
                        rating: RiskRating::parse(&row.get::<_, String>(2)?),
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        Ok(verdict)
    }

    async fn upsert_verdict(&self, verdict: &InteractionVerdict) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO interaction_verdicts \
             (drug1_id, drug2_id, summary, details, rating, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT (drug1_id, drug2_id) DO UPDATE SET \
             summary = excluded.summary, details = excluded.details, \
             rating = excluded.rating, updated_at = excluded.updated_at",
            params![
                verdict.pair.first(),
                verdict.pair.second(),
                verdict.summary,
                verdict.details,
                verdict.rating.as_str(),
                verdict.created_at,
                verdict.updated_at,
            ],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn matching_names(&self, fragment: &str, limit: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT name FROM drugs WHERE instr(lower(name), ?1) > 0 \
                 ORDER BY name LIMIT ?2",
            )
            .map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map(params![fragment, limit as i64], |row| {
                row.get::<_, String>(0)
            })
            .map_err(StoreError::Sqlite)?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row.map_err(StoreError::Sqlite)?);
        }
        Ok(names)
    }

    async fn record_lookup(&self, record: &LookupRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO lookup_log (id, drug_id, hit_cache, elapsed_ms, logged_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.drug_id,
                record.hit_cache,
                record.elapsed_ms as i64,
                record.logged_at,
            ],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn
                .query_row(sql, [], |row| row.get(0))
                .map_err(StoreError::Sqlite)?;
            Ok(n as usize)
        };
        Ok(StoreStats {
            drug_count: count("SELECT COUNT(*) FROM drugs")?,
            verdict_count: count("SELECT COUNT(*) FROM interaction_verdicts")?,
            lookup_count: count("SELECT COUNT(*) FROM lookup_log")?,
        })
    }
}
