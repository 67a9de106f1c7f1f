use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use super::record::{bind_row, map_from_row, map_to_row};
use super::schema_gen::{
    data_column_list, generate_create_table, generate_indexes, generate_insert, generate_update,
};
use crate::error::StoreError;
use crate::map::CanonicalMap;
use crate::schema::{TableSchema, ALL_TABLES, MAPS};
use crate::sync::{MapStore, StoredMap};

/// Map catalogue backed by a SQLite database
pub struct SqliteMapStore {
    conn: Connection,
}

impl SqliteMapStore {
    /// Open (or create) the catalogue at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Self::with_connection(conn)
    }

    /// In-memory catalogue, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        store.create_tables(ALL_TABLES)?;
        Ok(store)
    }

    /// Create all tables for the given schemas if they do not exist yet
    fn create_tables(&self, schemas: &[&TableSchema]) -> Result<(), StoreError> {
        for schema in schemas {
            self.conn.execute(&generate_create_table(schema), [])?;

            for index_sql in generate_indexes(schema) {
                self.conn.execute(&index_sql, [])?;
            }
        }
        Ok(())
    }

    fn select_sql(filter: &str) -> String {
        format!(
            "SELECT id, {} FROM {} {}",
            data_column_list(&MAPS),
            MAPS.name,
            filter
        )
    }
}

impl MapStore for SqliteMapStore {
    fn find_by_script_name(&self, script_name: &str) -> Result<Option<StoredMap>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached(&Self::select_sql("WHERE script_name = ?1"))?;

        let row = stmt
            .query_row([script_name], |row| Ok((row.get::<_, i64>("id")?, map_from_row(row))))
            .optional()?;

        match row {
            Some((id, map)) => Ok(Some(StoredMap { id, map: map? })),
            None => Ok(None),
        }
    }

    fn insert(&mut self, map: &CanonicalMap) -> Result<i64, StoreError> {
        let row = map_to_row(map)?;
        let mut stmt = self.conn.prepare_cached(&generate_insert(&MAPS))?;
        bind_row(&mut stmt, &MAPS, &row)?;
        stmt.raw_execute()?;

        let id = self.conn.last_insert_rowid();
        debug!(id, script_name = %map.script_name, "Inserted map");
        Ok(id)
    }

    fn update(&mut self, id: i64, map: &CanonicalMap) -> Result<(), StoreError> {
        let row = map_to_row(map)?;
        let mut stmt = self.conn.prepare_cached(&generate_update(&MAPS))?;
        let bound = bind_row(&mut stmt, &MAPS, &row)?;
        stmt.raw_bind_parameter(bound + 1, id)?;
        stmt.raw_execute()?;

        debug!(id, script_name = %map.script_name, "Updated map");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<StoredMap>, StoreError> {
        let mut stmt = self.conn.prepare_cached(&Self::select_sql("ORDER BY id"))?;
        let mut rows = stmt.query([])?;

        let mut maps = Vec::new();
        while let Some(row) = rows.next()? {
            maps.push(StoredMap {
                id: row.get("id")?,
                map: map_from_row(row)?,
            });
        }
        Ok(maps)
    }
}
