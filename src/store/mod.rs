//! Append-only persistence for integration results.
//!
//! Records are grouped into batches by calendar month. Appending a batch and
//! recomputing its aggregate statistics is a read-modify-write sequence, so
//! both happen under one connection lock. An in-memory index keyed by
//! knowledge id lives for the process lifetime so lookups never reload from
//! storage.

mod schema;

pub use schema::{get_schema_version, initialize_schema, is_initialized, SCHEMA_VERSION};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::error::{Error, Result};
use crate::knowledge::{IntegratedKnowledge, KnowledgeId};

/// Aggregate statistics for one calendar period's batch.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationStats {
    /// Calendar period, `YYYY-MM`
    pub period: String,
    pub total_count: u64,
    pub cross_session_count: u64,
    pub temporal_evolution_count: u64,
    pub concept_synthesis_count: u64,
    pub mean_confidence: f64,
    pub last_updated: DateTime<Utc>,
}

/// SQLite-backed store for integrated knowledge records.
pub struct IntegrationStore {
    conn: Arc<Mutex<Connection>>,
    index: Mutex<HashMap<KnowledgeId, IntegratedKnowledge>>,
}

impl IntegrationStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| Error::Storage(e.to_string()))?;
        if !is_initialized(&conn) {
            initialize_schema(&conn).map_err(|e| Error::Storage(e.to_string()))?;
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            index: Mutex::new(HashMap::new()),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Storage(e.to_string()))?;
        initialize_schema(&conn).map_err(|e| Error::Storage(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            index: Mutex::new(HashMap::new()),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::Internal(format!("failed to lock connection: {e}")))?;
        f(&conn).map_err(|e| Error::Storage(e.to_string()))
    }

    /// Append records to their calendar batches and recompute statistics.
    ///
    /// Returns the statistics of the period the newest record landed in.
    /// Any failure here is a hard failure of the run.
    pub fn append(&self, records: &[IntegratedKnowledge]) -> Result<Option<IntegrationStats>> {
        if records.is_empty() {
            return Ok(None);
        }

        // Serialize up front so a bad record fails the run before anything
        // is written, rather than persisting a corrupt payload.
        let payloads = records
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut latest_period = String::new();
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            for (record, payload) in records.iter().zip(&payloads) {
                let period = period_of(record.created_at);
                tx.execute(
                    "INSERT OR IGNORE INTO integration_batches (period) VALUES (?1)",
                    params![period],
                )?;
                tx.execute(
                    "INSERT INTO integrated_knowledge (
                        id, period, kind, method, confidence, novelty, created_at, record
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        record.id.to_string(),
                        period,
                        record.kind.to_string(),
                        record.method.to_string(),
                        record.confidence_score,
                        record.novelty_score,
                        record.created_at.to_rfc3339(),
                        payload,
                    ],
                )?;
                Self::recompute_stats(&tx, &period)?;
                latest_period = period;
            }

            tx.commit()
        })?;

        let mut index = self
            .index
            .lock()
            .map_err(|e| Error::Internal(format!("failed to lock index: {e}")))?;
        for record in records {
            index.insert(record.id.clone(), record.clone());
        }

        info!("persisted {} integration record(s)", records.len());
        self.stats(&latest_period)
    }

    fn recompute_stats(conn: &Connection, period: &str) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE integration_batches SET
                total_count = (SELECT COUNT(*) FROM integrated_knowledge WHERE period = ?1),
                cross_session_count = (SELECT COUNT(*) FROM integrated_knowledge
                    WHERE period = ?1 AND kind = 'cross_session'),
                temporal_evolution_count = (SELECT COUNT(*) FROM integrated_knowledge
                    WHERE period = ?1 AND kind = 'temporal_evolution'),
                concept_synthesis_count = (SELECT COUNT(*) FROM integrated_knowledge
                    WHERE period = ?1 AND kind = 'concept_synthesis'),
                mean_confidence = (SELECT COALESCE(AVG(confidence), 0.0)
                    FROM integrated_knowledge WHERE period = ?1),
                last_updated = ?2
             WHERE period = ?1",
            params![period, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Statistics for one period's batch.
    pub fn stats(&self, period: &str) -> Result<Option<IntegrationStats>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT period, total_count, cross_session_count, temporal_evolution_count,
                        concept_synthesis_count, mean_confidence, last_updated
                 FROM integration_batches WHERE period = ?1",
                params![period],
                |row| {
                    let last_updated: String = row.get(6)?;
                    Ok(IntegrationStats {
                        period: row.get(0)?,
                        total_count: row.get::<_, i64>(1)? as u64,
                        cross_session_count: row.get::<_, i64>(2)? as u64,
                        temporal_evolution_count: row.get::<_, i64>(3)? as u64,
                        concept_synthesis_count: row.get::<_, i64>(4)? as u64,
                        mean_confidence: row.get(5)?,
                        last_updated: DateTime::parse_from_rfc3339(&last_updated)
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                    })
                },
            )
            .optional()
        })
    }

    /// Load all persisted records for one period, newest first.
    pub fn load_period(&self, period: &str) -> Result<Vec<IntegratedKnowledge>> {
        let payloads: Vec<String> = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT record FROM integrated_knowledge
                 WHERE period = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map(params![period], |row| row.get(0))?;
            rows.collect()
        })?;

        payloads
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(Error::from))
            .collect()
    }

    /// Look up a record by id from the in-memory index.
    pub fn get(&self, id: &KnowledgeId) -> Option<IntegratedKnowledge> {
        self.index.lock().ok()?.get(id).cloned()
    }

    /// Records sharing at least one related concept with the given record.
    ///
    /// Served entirely from the in-memory index; no storage reload.
    pub fn related_to(&self, id: &KnowledgeId) -> Vec<IntegratedKnowledge> {
        let index = match self.index.lock() {
            Ok(index) => index,
            Err(_) => return Vec::new(),
        };
        let Some(target) = index.get(id) else {
            return Vec::new();
        };

        index
            .values()
            .filter(|other| {
                other.id != *id
                    && other
                        .related_concepts
                        .iter()
                        .any(|c| target.related_concepts.contains(c))
            })
            .cloned()
            .collect()
    }

    /// Number of records currently indexed in memory.
    pub fn indexed_count(&self) -> usize {
        self.index.lock().map(|index| index.len()).unwrap_or(0)
    }
}

fn period_of(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m").to_string()
}
