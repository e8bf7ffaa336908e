//! Persistent vector index via sqlite-vec, behind the `embeddings` feature
//! (spec §4.1, §4.8 — ANN candidate retrieval for hybrid search).
//!
//! Grounded on the teacher's `storage::sqlite_vec::SqliteVecStore`: a vec0
//! virtual table, vectors L2-normalized on insert so KNN's L2 distance
//! converts to cosine similarity (`sim = 1 - dist²/2`), and its own
//! connection separate from the main [`super::sqlite::SqliteStore`]
//! connection to avoid lock contention between the graph/document store and
//! the ANN index. The teacher partitions by `context_id`; this store has a
//! single flat corpus, so that partition key is dropped.

#[cfg(feature = "embeddings")]
mod inner {
    use std::path::Path;
    use std::sync::Mutex;

    use rusqlite::Connection;
    use sqlite_vec::sqlite3_vec_init;

    use crate::model::ResourceId;

    pub struct SqliteVecStore {
        conn: Mutex<Connection>,
        dimensions: usize,
    }

    fn register_vec_extension() {
        use std::sync::Once;
        static INIT: Once = Once::new();
        INIT.call_once(|| unsafe {
            rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite3_vec_init as *const (),
            )));
        });
    }

    impl SqliteVecStore {
        pub fn open(path: &Path, dimensions: usize) -> Result<Self, String> {
            register_vec_extension();
            let conn = Connection::open(path).map_err(|e| e.to_string())?;
            Self::init_connection(conn, dimensions)
        }

        pub fn open_in_memory(dimensions: usize) -> Result<Self, String> {
            register_vec_extension();
            let conn = Connection::open_in_memory().map_err(|e| e.to_string())?;
            Self::init_connection(conn, dimensions)
        }

        fn init_connection(conn: Connection, dimensions: usize) -> Result<Self, String> {
            conn.execute_batch("PRAGMA journal_mode=WAL;")
                .map_err(|e| e.to_string())?;
            let create_sql = format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS vec_embeddings USING vec0(\
                     resource_id TEXT,\
                     embedding float[{}]\
                 )",
                dimensions
            );
            conn.execute_batch(&create_sql).map_err(|e| e.to_string())?;
            Ok(Self {
                conn: Mutex::new(conn),
                dimensions,
            })
        }

        pub fn dimensions(&self) -> usize {
            self.dimensions
        }

        /// Insert or replace the vector for `resource_id`. Vectors are
        /// L2-normalized on write (spec invariant #1: embeddings are unit
        /// vectors), matching the normalization [`crate::model::Resource`]
        /// itself assumes.
        pub fn store(&self, resource_id: &ResourceId, vector: Vec<f32>) {
            let mut normalized = vector;
            l2_normalize(&mut normalized);
            let conn = self.conn.lock().unwrap();
            let bytes = f32_slice_as_bytes(&normalized);
            conn.execute(
                "DELETE FROM vec_embeddings WHERE resource_id = ?1",
                rusqlite::params![resource_id.as_str()],
            )
            .expect("vec_embeddings DELETE failed");
            conn.execute(
                "INSERT INTO vec_embeddings(resource_id, embedding) VALUES (?1, ?2)",
                rusqlite::params![resource_id.as_str(), bytes],
            )
            .expect("vec_embeddings INSERT failed");
        }

        pub fn has(&self, resource_id: &ResourceId) -> bool {
            let conn = self.conn.lock().unwrap();
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM vec_embeddings WHERE resource_id = ?1",
                    rusqlite::params![resource_id.as_str()],
                    |row| row.get(0),
                )
                .unwrap_or(0);
            count > 0
        }

        /// K-nearest-neighbor cosine search, pre-threshold filtering applied
        /// by the caller (spec §4.8 candidate retrieval stage).
        pub fn find_similar(&self, query: &[f32], k: usize) -> Vec<(ResourceId, f32)> {
            let mut normalized_query = query.to_vec();
            l2_normalize(&mut normalized_query);
            let conn = self.conn.lock().unwrap();
            let bytes = f32_slice_as_bytes(&normalized_query);

            let mut stmt = conn
                .prepare(
                    "SELECT resource_id, distance FROM vec_embeddings \
                     WHERE embedding MATCH ?1 AND k = ?2",
                )
                .expect("vec_embeddings KNN prepare failed");

            stmt.query_map(rusqlite::params![bytes, k as i64], |row| {
                let rid: String = row.get(0)?;
                let distance: f32 = row.get(1)?;
                Ok((rid, distance))
            })
            .expect("vec_embeddings KNN query failed")
            .filter_map(|r| r.ok())
            .map(|(rid, distance)| {
                let similarity = 1.0 - (distance * distance) / 2.0;
                (ResourceId::from_string(rid), similarity)
            })
            .collect()
        }
    }

    fn f32_slice_as_bytes(slice: &[f32]) -> &[u8] {
        unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, slice.len() * 4) }
    }

    fn l2_normalize(v: &mut [f32]) {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn store_and_has_round_trip() {
            let store = SqliteVecStore::open_in_memory(3).expect("should open in-memory store");
            let id = ResourceId::new();

            assert!(!store.has(&id));
            store.store(&id, vec![0.9, 0.3, 0.1]);
            assert!(store.has(&id));
        }

        #[test]
        fn find_similar_ranks_nearest_first() {
            let store = SqliteVecStore::open_in_memory(3).expect("should open in-memory store");
            let travel = ResourceId::new();
            let journey = ResourceId::new();
            let democracy = ResourceId::new();

            store.store(&travel, vec![0.9, 0.3, 0.1]);
            store.store(&journey, vec![0.85, 0.35, 0.15]);
            store.store(&democracy, vec![0.1, 0.2, 0.95]);

            let results = store.find_similar(&[0.9, 0.3, 0.1], 2);
            assert_eq!(results.len(), 2);
            assert_eq!(results[0].0, travel);
            assert_eq!(results[1].0, journey);
        }

        #[test]
        fn replacing_vector_for_same_resource_does_not_duplicate() {
            let store = SqliteVecStore::open_in_memory(3).expect("should open in-memory store");
            let id = ResourceId::new();
            store.store(&id, vec![0.9, 0.3, 0.1]);
            store.store(&id, vec![0.1, 0.3, 0.9]);

            let results = store.find_similar(&[0.1, 0.3, 0.9], 10);
            assert_eq!(results.len(), 1);
        }
    }
}

#[cfg(feature = "embeddings")]
pub use inner::SqliteVecStore;
