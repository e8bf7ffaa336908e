//! SQLite-backed [`GraphStore`] (spec §4.1).
//!
//! Grounded on the teacher's `storage::sqlite::SqliteStore`: WAL mode,
//! `PRAGMA data_version` as a cheap cross-instance cache-coherence signal,
//! and a `Mutex<Connection>` guarding a single connection per store (the
//! teacher additionally tracks per-context "baselines" for incremental
//! upsert of a whole in-memory graph; this store has no equivalent
//! in-memory mirror to reconcile, so plain `INSERT OR REPLACE` suffices).
//!
//! Per spec §9 REDESIGN FLAGS ("Embeddings stored as JSON arrays for
//! portability"), dense vectors are stored as contiguous little-endian
//! float32 BLOBs, not JSON arrays — JSON is used only at the (illustrative)
//! external interface boundary, never here.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::traits::{
    FtsMatch, GraphStore, OpenStore, ResourceFilter, ResourcePatch, StorageError, StorageResult,
};
use crate::model::{
    Citation, CitationId, CitationType, DiscoveryHypothesis, HypothesisId, HypothesisType,
    IngestionStatus, QualityDimensions, Resource, ResourceFormat, ResourceId, Subject, SubjectId,
    TaxonomyNode, TaxonomyNodeId, Validation,
};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Reinterpret a `&[f32]` slice as bytes for BLOB storage (see teacher's
/// `storage::sqlite_vec::f32_slice_as_bytes`).
fn f32_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

impl SqliteStore {
    fn init_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        // `resources_fts` is an external-content FTS5 table: rows created
        // before the table existed (or any drift from a crash mid-write)
        // aren't indexed until told to rebuild. Cheap at this scale (a
        // personal library, not a multi-tenant corpus) and idempotent, so it
        // runs on every open rather than needing its own migration gate.
        conn.execute_batch("INSERT INTO resources_fts(resources_fts) VALUES ('rebuild');")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_resource(row: &rusqlite::Row) -> rusqlite::Result<Resource> {
        let id: String = row.get("id")?;
        let subjects_json: String = row.get("subjects")?;
        let creators_json: String = row.get("creators")?;
        let taxonomy_json: String = row.get("taxonomy_nodes")?;
        let embedding_blob: Option<Vec<u8>> = row.get("embedding")?;
        let format_str: String = row.get("format")?;
        let status_str: String = row.get("ingestion_status")?;

        let subjects: std::collections::BTreeSet<String> =
            serde_json::from_str(&subjects_json).unwrap_or_default();
        let creators: Vec<String> = serde_json::from_str(&creators_json).unwrap_or_default();
        let taxonomy_nodes: Vec<(String, f32)> =
            serde_json::from_str(&taxonomy_json).unwrap_or_default();

        Ok(Resource {
            id: ResourceId::from_string(id),
            source_url: row.get("source_url")?,
            title: row.get("title")?,
            description: row.get("description")?,
            content_text: row.get("content_text")?,
            summary: row.get("summary")?,
            format: format_str.parse().unwrap_or(ResourceFormat::Text),
            language: row.get("language")?,
            subjects,
            creators,
            publication_year: row.get("publication_year")?,
            embedding: embedding_blob.map(|b| bytes_to_f32(&b)),
            sparse_embedding: None,
            classification_code: row.get("classification_code")?,
            taxonomy_nodes,
            quality: QualityDimensions {
                accuracy: row.get("q_accuracy")?,
                completeness: row.get("q_completeness")?,
                consistency: row.get("q_consistency")?,
                timeliness: row.get("q_timeliness")?,
                relevance: row.get("q_relevance")?,
            },
            quality_overall: row.get("quality_overall")?,
            needs_review: row.get::<_, i64>("needs_review")? != 0,
            ingestion_status: parse_status(&status_str),
            ingestion_error: row.get("ingestion_error")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            ingested_at: row.get("ingested_at")?,
            scholarly: None,
        })
    }
}

fn parse_status(s: &str) -> IngestionStatus {
    match s {
        "extracting" => IngestionStatus::Extracting,
        "enriching" => IngestionStatus::Enriching,
        "ready" => IngestionStatus::Ready,
        "failed" => IngestionStatus::Failed,
        _ => IngestionStatus::Pending,
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS resources (
    id TEXT PRIMARY KEY,
    source_url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    content_text TEXT NOT NULL DEFAULT '',
    summary TEXT NOT NULL DEFAULT '',
    format TEXT NOT NULL DEFAULT 'text',
    language TEXT,
    subjects TEXT NOT NULL DEFAULT '[]',
    creators TEXT NOT NULL DEFAULT '[]',
    publication_year INTEGER,
    embedding BLOB,
    classification_code TEXT,
    taxonomy_nodes TEXT NOT NULL DEFAULT '[]',
    q_accuracy REAL NOT NULL DEFAULT 0,
    q_completeness REAL NOT NULL DEFAULT 0,
    q_consistency REAL NOT NULL DEFAULT 0,
    q_timeliness REAL NOT NULL DEFAULT 0,
    q_relevance REAL NOT NULL DEFAULT 0,
    quality_overall REAL NOT NULL DEFAULT 0,
    needs_review INTEGER NOT NULL DEFAULT 0,
    ingestion_status TEXT NOT NULL DEFAULT 'pending',
    ingestion_error TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    ingested_at TEXT
);

CREATE VIRTUAL TABLE IF NOT EXISTS resources_fts USING fts5(
    title, description, summary, content_text,
    content='resources',
    content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS resources_fts_ai AFTER INSERT ON resources BEGIN
    INSERT INTO resources_fts(rowid, title, description, summary, content_text)
    VALUES (NEW.rowid, NEW.title, NEW.description, NEW.summary, NEW.content_text);
END;

CREATE TRIGGER IF NOT EXISTS resources_fts_ad AFTER DELETE ON resources BEGIN
    INSERT INTO resources_fts(resources_fts, rowid, title, description, summary, content_text)
    VALUES ('delete', OLD.rowid, OLD.title, OLD.description, OLD.summary, OLD.content_text);
END;

CREATE TRIGGER IF NOT EXISTS resources_fts_au AFTER UPDATE ON resources BEGIN
    INSERT INTO resources_fts(resources_fts, rowid, title, description, summary, content_text)
    VALUES ('delete', OLD.rowid, OLD.title, OLD.description, OLD.summary, OLD.content_text);
    INSERT INTO resources_fts(rowid, title, description, summary, content_text)
    VALUES (NEW.rowid, NEW.title, NEW.description, NEW.summary, NEW.content_text);
END;

CREATE TABLE IF NOT EXISTS authority_subjects (
    id TEXT PRIMARY KEY,
    canonical_form TEXT NOT NULL UNIQUE,
    variants TEXT NOT NULL DEFAULT '[]',
    usage_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS taxonomy_nodes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    parent_id TEXT,
    description TEXT NOT NULL DEFAULT '',
    keywords TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS citations (
    id TEXT PRIMARY KEY,
    source_resource_id TEXT NOT NULL,
    target_url TEXT NOT NULL,
    target_resource_id TEXT,
    citation_type TEXT NOT NULL DEFAULT 'general',
    context_snippet TEXT NOT NULL DEFAULT '',
    position INTEGER NOT NULL DEFAULT 0,
    importance_score REAL NOT NULL DEFAULT 0,
    UNIQUE(source_resource_id, target_url, position)
);

CREATE TABLE IF NOT EXISTS discovery_hypotheses (
    id TEXT PRIMARY KEY,
    a_resource_id TEXT NOT NULL,
    c_resource_id TEXT NOT NULL,
    b_resource_ids TEXT NOT NULL DEFAULT '[]',
    hypothesis_type TEXT NOT NULL,
    path_strength REAL NOT NULL DEFAULT 0,
    semantic_similarity REAL NOT NULL DEFAULT 0,
    common_neighbors INTEGER NOT NULL DEFAULT 0,
    plausibility_score REAL NOT NULL DEFAULT 0,
    is_validated TEXT NOT NULL DEFAULT 'unset',
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS graph_edge_overrides (
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    edge_type TEXT NOT NULL,
    multiplier REAL NOT NULL DEFAULT 1.0,
    PRIMARY KEY (source_id, target_id, edge_type)
);
";

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }
}

impl GraphStore for SqliteStore {
    fn create_resource(&self, resource: &Resource) -> StorageResult<ResourceId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO resources (
                id, source_url, title, description, content_text, summary, format, language,
                subjects, creators, publication_year, embedding, classification_code,
                taxonomy_nodes, q_accuracy, q_completeness, q_consistency, q_timeliness,
                q_relevance, quality_overall, needs_review, ingestion_status, ingestion_error,
                created_at, updated_at, ingested_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23,?24,?25,?26)",
            params![
                resource.id.as_str(),
                resource.source_url,
                resource.title,
                resource.description,
                resource.content_text,
                resource.summary,
                resource.format.to_string(),
                resource.language,
                serde_json::to_string(&resource.subjects)?,
                serde_json::to_string(&resource.creators)?,
                resource.publication_year,
                resource.embedding.as_ref().map(|v| f32_to_bytes(v)),
                resource.classification_code,
                serde_json::to_string(&resource.taxonomy_nodes)?,
                resource.quality.accuracy,
                resource.quality.completeness,
                resource.quality.consistency,
                resource.quality.timeliness,
                resource.quality.relevance,
                resource.quality_overall,
                resource.needs_review as i64,
                resource.ingestion_status.to_string(),
                resource.ingestion_error,
                resource.created_at,
                resource.updated_at,
                resource.ingested_at,
            ],
        )?;
        Ok(resource.id.clone())
    }

    fn update_resource(&self, id: &ResourceId, patch: &ResourcePatch) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let existing = conn
            .query_row(
                "SELECT 1 FROM resources WHERE id = ?1",
                params![id.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        if existing.is_none() {
            return Err(StorageError::NotFound(id.to_string()));
        }

        macro_rules! apply {
            ($col:literal, $val:expr) => {
                conn.execute(
                    concat!("UPDATE resources SET ", $col, " = ?1 WHERE id = ?2"),
                    params![$val, id.as_str()],
                )?;
            };
        }

        if let Some(v) = &patch.title {
            apply!("title", v);
        }
        if let Some(v) = &patch.description {
            apply!("description", v);
        }
        if let Some(v) = &patch.content_text {
            apply!("content_text", v);
        }
        if let Some(v) = &patch.summary {
            apply!("summary", v);
        }
        if let Some(v) = &patch.subjects {
            apply!("subjects", serde_json::to_string(v)?);
        }
        if let Some(v) = &patch.embedding {
            let blob = v.as_ref().map(|e| f32_to_bytes(e));
            apply!("embedding", blob);
        }
        if let Some(v) = &patch.classification_code {
            apply!("classification_code", v);
        }
        if let Some(v) = &patch.ingestion_status {
            apply!("ingestion_status", v.to_string());
        }
        if let Some(v) = &patch.ingestion_error {
            apply!("ingestion_error", v);
        }
        if let Some(v) = &patch.quality {
            conn.execute(
                "UPDATE resources SET q_accuracy=?1, q_completeness=?2, q_consistency=?3, q_timeliness=?4, q_relevance=?5 WHERE id=?6",
                params![v.accuracy, v.completeness, v.consistency, v.timeliness, v.relevance, id.as_str()],
            )?;
        }
        if let Some(v) = &patch.quality_overall {
            apply!("quality_overall", v);
        }
        if let Some(v) = &patch.needs_review {
            apply!("needs_review", *v as i64);
        }
        if let Some(v) = &patch.ingested_at {
            apply!("ingested_at", v);
        }
        conn.execute(
            "UPDATE resources SET updated_at = ?1 WHERE id = ?2",
            params![chrono::Utc::now(), id.as_str()],
        )?;
        Ok(())
    }

    fn get_resource(&self, id: &ResourceId) -> StorageResult<Option<Resource>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM resources WHERE id = ?1",
            params![id.as_str()],
            Self::row_to_resource,
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn find_resource_by_canonical_url(&self, canonical_url: &str) -> StorageResult<Option<Resource>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM resources WHERE source_url = ?1",
            params![canonical_url],
            Self::row_to_resource,
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn delete_resource(&self, id: &ResourceId) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM citations WHERE source_resource_id = ?1",
            params![id.as_str()],
        )?;
        conn.execute(
            "UPDATE citations SET target_resource_id = NULL WHERE target_resource_id = ?1",
            params![id.as_str()],
        )?;
        let n = conn.execute("DELETE FROM resources WHERE id = ?1", params![id.as_str()])?;
        Ok(n > 0)
    }

    fn search_fts(&self, query_text: &str, filter: &ResourceFilter, limit: usize) -> StorageResult<Vec<FtsMatch>> {
        let conn = self.conn.lock().unwrap();
        let fts_query = sanitize_fts5_query(query_text);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        // `bm25()` weights follow spec §4.1's weighted-field contract
        // (title=3, description=2, summary=1.5, content=1) and are applied
        // in `resources_fts`'s declared column order. bm25 scores are
        // negative-is-better; negate so higher `raw_rank_score` means a
        // better match, matching the rest of this trait's convention.
        let mut stmt = conn.prepare(
            "SELECT r.*, -bm25(resources_fts, 3.0, 2.0, 1.5, 1.0) AS rank
             FROM resources_fts
             JOIN resources r ON r.rowid = resources_fts.rowid
             WHERE resources_fts MATCH ?1",
        )?;
        let rows = stmt.query_map(params![fts_query], |row| {
            let resource = Self::row_to_resource(row)?;
            let rank: f64 = row.get("rank")?;
            Ok((resource, rank as f32))
        })?;

        let mut matches = Vec::new();
        for row in rows {
            let (resource, rank) = row?;
            if !resource_passes_filter(&resource, filter) {
                continue;
            }
            matches.push(FtsMatch {
                id: resource.id,
                raw_rank_score: rank,
            });
        }

        matches.sort_by(|a, b| b.raw_rank_score.partial_cmp(&a.raw_rank_score).unwrap());
        matches.truncate(limit);
        Ok(matches)
    }

    fn resources_with_embedding(&self, filter: &ResourceFilter) -> StorageResult<Vec<(ResourceId, Vec<f32>)>> {
        let all = self.all_resources()?;
        Ok(all
            .into_iter()
            .filter(|r| resource_passes_filter(r, filter))
            .filter_map(|r| r.embedding.clone().map(|e| (r.id.clone(), e)))
            .collect())
    }

    fn bulk_get(&self, ids: &[ResourceId]) -> StorageResult<Vec<Resource>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(r) = self.get_resource(id)? {
                out.push(r);
            }
        }
        Ok(out)
    }

    fn all_resources(&self) -> StorageResult<Vec<Resource>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM resources")?;
        let rows = stmt.query_map([], Self::row_to_resource)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    fn upsert_subject(&self, subject: &Subject) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO authority_subjects (id, canonical_form, variants, usage_count)
             VALUES (?1,?2,?3,?4)
             ON CONFLICT(canonical_form) DO UPDATE SET
                variants = excluded.variants, usage_count = excluded.usage_count",
            params![
                subject.id.as_str(),
                subject.canonical_form,
                serde_json::to_string(&subject.variants)?,
                subject.usage_count as i64,
            ],
        )?;
        Ok(())
    }

    fn get_subject_by_canonical(&self, canonical_form: &str) -> StorageResult<Option<Subject>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, canonical_form, variants, usage_count FROM authority_subjects WHERE canonical_form = ?1",
            params![canonical_form],
            |row| {
                let id: String = row.get(0)?;
                let canonical_form: String = row.get(1)?;
                let variants_json: String = row.get(2)?;
                let usage_count: i64 = row.get(3)?;
                Ok(Subject {
                    id: SubjectId::from_string(id),
                    canonical_form,
                    variants: serde_json::from_str(&variants_json).unwrap_or_default(),
                    usage_count: usage_count as u64,
                })
            },
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn all_subjects(&self) -> StorageResult<Vec<Subject>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, canonical_form, variants, usage_count FROM authority_subjects")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let canonical_form: String = row.get(1)?;
            let variants_json: String = row.get(2)?;
            let usage_count: i64 = row.get(3)?;
            Ok(Subject {
                id: SubjectId::from_string(id),
                canonical_form,
                variants: serde_json::from_str(&variants_json).unwrap_or_default(),
                usage_count: usage_count as u64,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    fn upsert_taxonomy_node(&self, node: &TaxonomyNode) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO taxonomy_nodes (id, name, parent_id, description, keywords)
             VALUES (?1,?2,?3,?4,?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name, parent_id = excluded.parent_id,
                description = excluded.description, keywords = excluded.keywords",
            params![
                node.id.as_str(),
                node.name,
                node.parent_id.as_ref().map(|p| p.to_string()),
                node.description,
                serde_json::to_string(&node.keywords)?,
            ],
        )?;
        Ok(())
    }

    fn get_taxonomy_node(&self, id: &TaxonomyNodeId) -> StorageResult<Option<TaxonomyNode>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, name, parent_id, description, keywords FROM taxonomy_nodes WHERE id = ?1",
            params![id.as_str()],
            row_to_taxonomy_node,
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn all_taxonomy_nodes(&self) -> StorageResult<Vec<TaxonomyNode>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, name, parent_id, description, keywords FROM taxonomy_nodes")?;
        let rows = stmt.query_map([], row_to_taxonomy_node)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    fn create_citation(&self, citation: &Citation) -> StorageResult<CitationId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO citations (
                id, source_resource_id, target_url, target_resource_id, citation_type,
                context_snippet, position, importance_score
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                citation.id.as_str(),
                citation.source_resource_id.as_str(),
                citation.target_url,
                citation.target_resource_id.as_ref().map(|t| t.to_string()),
                citation.citation_type.to_string(),
                citation.context_snippet,
                citation.position,
                citation.importance_score,
            ],
        )?;
        Ok(citation.id.clone())
    }

    fn update_citation_resolution(&self, id: &CitationId, target_resource_id: &ResourceId) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE citations SET target_resource_id = ?1 WHERE id = ?2",
            params![target_resource_id.as_str(), id.as_str()],
        )?;
        Ok(())
    }

    fn update_citation_importance(&self, id: &CitationId, importance_score: f32) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE citations SET importance_score = ?1 WHERE id = ?2",
            params![importance_score, id.as_str()],
        )?;
        Ok(())
    }

    fn citations_by_source(&self, source_resource_id: &ResourceId) -> StorageResult<Vec<Citation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM citations WHERE source_resource_id = ?1 ORDER BY position")?;
        let rows = stmt.query_map(params![source_resource_id.as_str()], row_to_citation)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    fn citations_by_target(&self, target_resource_id: &ResourceId) -> StorageResult<Vec<Citation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM citations WHERE target_resource_id = ?1")?;
        let rows = stmt.query_map(params![target_resource_id.as_str()], row_to_citation)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    fn unresolved_citations(&self) -> StorageResult<Vec<Citation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM citations WHERE target_resource_id IS NULL")?;
        let rows = stmt.query_map([], row_to_citation)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    fn all_citations(&self) -> StorageResult<Vec<Citation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM citations")?;
        let rows = stmt.query_map([], row_to_citation)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    fn upsert_hypothesis(&self, hypothesis: &DiscoveryHypothesis) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let type_str = match hypothesis.hypothesis_type {
            HypothesisType::Open => "open",
            HypothesisType::Closed => "closed",
        };
        let validated_str = match hypothesis.is_validated {
            Validation::Unset => "unset",
            Validation::True => "true",
            Validation::False => "false",
        };
        conn.execute(
            "INSERT INTO discovery_hypotheses (
                id, a_resource_id, c_resource_id, b_resource_ids, hypothesis_type,
                path_strength, semantic_similarity, common_neighbors, plausibility_score,
                is_validated, notes, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)
             ON CONFLICT(id) DO UPDATE SET
                path_strength = excluded.path_strength,
                semantic_similarity = excluded.semantic_similarity,
                common_neighbors = excluded.common_neighbors,
                plausibility_score = excluded.plausibility_score,
                is_validated = excluded.is_validated,
                notes = excluded.notes",
            params![
                hypothesis.id.as_str(),
                hypothesis.a_resource_id.as_str(),
                hypothesis.c_resource_id.as_str(),
                serde_json::to_string(
                    &hypothesis.b_resource_ids.iter().map(|r| r.to_string()).collect::<Vec<_>>()
                )?,
                type_str,
                hypothesis.path_strength,
                hypothesis.semantic_similarity,
                hypothesis.common_neighbors,
                hypothesis.plausibility_score,
                validated_str,
                hypothesis.notes,
                hypothesis.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_hypothesis(&self, id: &HypothesisId) -> StorageResult<Option<DiscoveryHypothesis>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM discovery_hypotheses WHERE id = ?1",
            params![id.as_str()],
            row_to_hypothesis,
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn all_hypotheses(&self) -> StorageResult<Vec<DiscoveryHypothesis>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM discovery_hypotheses")?;
        let rows = stmt.query_map([], row_to_hypothesis)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    fn get_edge_weight_override(&self, source: &ResourceId, target: &ResourceId, edge_type: &str) -> StorageResult<Option<f32>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT multiplier FROM graph_edge_overrides WHERE source_id = ?1 AND target_id = ?2 AND edge_type = ?3",
            params![source.as_str(), target.as_str(), edge_type],
            |row| row.get(0),
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn set_edge_weight_override(&self, source: &ResourceId, target: &ResourceId, edge_type: &str, delta_multiplier: f32) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let current: f32 = conn
            .query_row(
                "SELECT multiplier FROM graph_edge_overrides WHERE source_id = ?1 AND target_id = ?2 AND edge_type = ?3",
                params![source.as_str(), target.as_str(), edge_type],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(1.0);
        let updated = (current * delta_multiplier).clamp(0.0, 1.0);
        conn.execute(
            "INSERT INTO graph_edge_overrides (source_id, target_id, edge_type, multiplier)
             VALUES (?1,?2,?3,?4)
             ON CONFLICT(source_id, target_id, edge_type) DO UPDATE SET multiplier = excluded.multiplier",
            params![source.as_str(), target.as_str(), edge_type, updated],
        )?;
        Ok(())
    }

    fn data_version(&self) -> StorageResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("PRAGMA data_version", [], |row| row.get(0))
            .map_err(StorageError::from)
    }
}

/// Builds an FTS5 `MATCH` query (prefix OR of each alphanumeric token) from
/// free-form user input. Splitting on non-alphanumeric characters before
/// reassembling the query means no FTS5 operator syntax (`"`, `^`, `:`, `-`,
/// `*`) from the original text ever reaches the query string unescaped.
fn sanitize_fts5_query(query_text: &str) -> String {
    query_text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| !tok.is_empty())
        .map(|tok| format!("{tok}*"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn resource_passes_filter(r: &Resource, filter: &ResourceFilter) -> bool {
    if let Some(lang) = &filter.language {
        if r.language.as_deref() != Some(lang.as_str()) {
            return false;
        }
    }
    if let Some((lo, hi)) = filter.year_range {
        match r.publication_year {
            Some(y) if y >= lo && y <= hi => {}
            _ => return false,
        }
    }
    if let Some(code) = &filter.classification_code {
        if r.classification_code.as_deref() != Some(code.as_str()) {
            return false;
        }
    }
    if let Some((lo, hi)) = filter.quality_range {
        if r.quality_overall < lo || r.quality_overall > hi {
            return false;
        }
    }
    if !filter.subjects_any.is_empty() && !filter.subjects_any.iter().any(|s| r.subjects.contains(s)) {
        return false;
    }
    if !filter.subjects_all.is_empty() && !filter.subjects_all.iter().all(|s| r.subjects.contains(s)) {
        return false;
    }
    true
}

fn row_to_taxonomy_node(row: &rusqlite::Row) -> rusqlite::Result<TaxonomyNode> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let parent_id: Option<String> = row.get(2)?;
    let description: String = row.get(3)?;
    let keywords_json: String = row.get(4)?;
    Ok(TaxonomyNode {
        id: TaxonomyNodeId::from_string(id),
        name,
        parent_id: parent_id.map(TaxonomyNodeId::from_string),
        description,
        keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
    })
}

fn row_to_citation(row: &rusqlite::Row) -> rusqlite::Result<Citation> {
    let id: String = row.get("id")?;
    let source: String = row.get("source_resource_id")?;
    let target_url: String = row.get("target_url")?;
    let target_resource_id: Option<String> = row.get("target_resource_id")?;
    let citation_type: String = row.get("citation_type")?;
    Ok(Citation {
        id: CitationId::from_string(id),
        source_resource_id: ResourceId::from_string(source),
        target_url,
        target_resource_id: target_resource_id.map(ResourceId::from_string),
        citation_type: match citation_type.as_str() {
            "dataset" => CitationType::Dataset,
            "code" => CitationType::Code,
            "reference" => CitationType::Reference,
            _ => CitationType::General,
        },
        context_snippet: row.get("context_snippet")?,
        position: row.get::<_, i64>("position")? as u32,
        importance_score: row.get("importance_score")?,
    })
}

fn row_to_hypothesis(row: &rusqlite::Row) -> rusqlite::Result<DiscoveryHypothesis> {
    let id: String = row.get("id")?;
    let a: String = row.get("a_resource_id")?;
    let c: String = row.get("c_resource_id")?;
    let b_json: String = row.get("b_resource_ids")?;
    let type_str: String = row.get("hypothesis_type")?;
    let validated_str: String = row.get("is_validated")?;
    let b_ids: Vec<String> = serde_json::from_str(&b_json).unwrap_or_default();
    Ok(DiscoveryHypothesis {
        id: HypothesisId::from_string(id),
        a_resource_id: ResourceId::from_string(a),
        c_resource_id: ResourceId::from_string(c),
        b_resource_ids: b_ids.into_iter().map(ResourceId::from_string).collect(),
        hypothesis_type: if type_str == "closed" {
            HypothesisType::Closed
        } else {
            HypothesisType::Open
        },
        path_strength: row.get("path_strength")?,
        semantic_similarity: row.get("semantic_similarity")?,
        common_neighbors: row.get::<_, i64>("common_neighbors")? as u32,
        plausibility_score: row.get("plausibility_score")?,
        is_validated: match validated_str.as_str() {
            "true" => Validation::True,
            "false" => Validation::False,
            _ => Validation::Unset,
        },
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}
