//! SQLite-backed sync store.
//!
//! Connections come from a bounded `r2d2` pool; every operation checks one
//! out and hands it back on drop, whatever the outcome. At most
//! `max_idle_connections` stay open once handed back.

use super::models::{SyncRecord, UserRecord};
use super::pool::{IdleCappedManager, SyncPool};
use super::schema::{SYNC_DATA_TABLE_V_0, SYNC_VERSIONED_SCHEMAS, USERS_TABLE_V_0};
use super::trait_def::SyncStore;
use crate::config::DbPoolSettings;
use crate::sqlite_persistence::ensure_schema;
use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct SqliteSyncStore {
    pool: Arc<SyncPool>,
    db_path: PathBuf,
}

impl SqliteSyncStore {
    /// Opens (creating if needed) the sync database at `db_path`.
    ///
    /// A new file gets the latest schema; an existing one is validated and
    /// migrated. Connections are opened on demand.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_settings: &DbPoolSettings) -> Result<Self> {
        pool_settings.validate()?;
        let db_path = db_path.as_ref().to_path_buf();

        let busy_timeout = Duration::from_millis(pool_settings.busy_timeout_ms);
        let manager = SqliteConnectionManager::file(&db_path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            Ok(())
        });

        let manager = IdleCappedManager::new(manager, pool_settings.max_idle_connections);
        let builder = Pool::builder()
            .max_size(pool_settings.max_open_connections)
            .min_idle(Some(0))
            .max_lifetime(Some(Duration::from_secs(
                pool_settings.connection_max_lifetime_secs,
            )))
            .connection_timeout(Duration::from_secs(pool_settings.acquire_timeout_secs));
        let pool = manager
            .into_pool(builder)
            .with_context(|| format!("Failed to open sync database at {:?}", db_path))?;

        {
            let mut conn = pool
                .get()
                .context("Failed to acquire connection for schema setup")?;
            let version = ensure_schema(&mut conn, SYNC_VERSIONED_SCHEMAS)?;
            info!(
                "Opened sync database {:?} at schema version {}",
                db_path, version
            );
        }

        Ok(SqliteSyncStore { pool, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn max_connections(&self) -> u32 {
        self.pool.max_size()
    }

    fn conn(&self) -> Result<PooledConnection<IdleCappedManager>> {
        self.pool
            .get()
            .context("Failed to acquire sync database connection")
    }
}

impl Drop for SqliteSyncStore {
    fn drop(&mut self) {
        info!("Closing sync database {:?}", self.db_path);
    }
}

impl SyncStore for SqliteSyncStore {
    fn upsert_user(&self, uid: &str, username: &str, last_seen_at: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (uid, username, last_seen_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(uid) DO UPDATE SET
                    username = excluded.username,
                    last_seen_at = excluded.last_seen_at",
                USERS_TABLE_V_0.name
            ),
            params![uid, username, last_seen_at],
        )
        .with_context(|| format!("Failed to upsert user {}", uid))?;
        Ok(())
    }

    fn get_user(&self, uid: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn()?;
        match conn.query_row(
            &format!(
                "SELECT uid, username, last_seen_at FROM {} WHERE uid = ?1",
                USERS_TABLE_V_0.name
            ),
            params![uid],
            |row| {
                Ok(UserRecord {
                    uid: row.get(0)?,
                    username: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    last_seen_at: row.get(2)?,
                })
            },
        ) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read user {}", uid)),
        }
    }

    fn upsert_sync_record(&self, uid: &str, record: &SyncRecord) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (
                    uid, favorites_json, fm_favorites_json, playlists_json,
                    favorites_updated_at, fm_favorites_updated_at, playlists_updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(uid) DO UPDATE SET
                    favorites_json = excluded.favorites_json,
                    fm_favorites_json = excluded.fm_favorites_json,
                    playlists_json = excluded.playlists_json,
                    favorites_updated_at = excluded.favorites_updated_at,
                    fm_favorites_updated_at = excluded.fm_favorites_updated_at,
                    playlists_updated_at = excluded.playlists_updated_at",
                SYNC_DATA_TABLE_V_0.name
            ),
            params![
                uid,
                record.favorites,
                record.fm_favorites,
                record.playlists,
                record.favorites_updated_at,
                record.fm_favorites_updated_at,
                record.playlists_updated_at,
            ],
        )
        .with_context(|| format!("Failed to upsert sync data for {}", uid))?;
        debug!("Stored sync data for {}", uid);
        Ok(())
    }

    fn get_sync_record(&self, uid: &str) -> Result<Option<SyncRecord>> {
        let conn = self.conn()?;
        match conn.query_row(
            &format!(
                "SELECT favorites_json, fm_favorites_json, playlists_json,
                        favorites_updated_at, fm_favorites_updated_at, playlists_updated_at
                 FROM {} WHERE uid = ?1",
                SYNC_DATA_TABLE_V_0.name
            ),
            params![uid],
            |row| {
                Ok(SyncRecord {
                    favorites: row.get(0)?,
                    fm_favorites: row.get(1)?,
                    playlists: row.get(2)?,
                    favorites_updated_at: row.get(3)?,
                    fm_favorites_updated_at: row.get(4)?,
                    playlists_updated_at: row.get(5)?,
                })
            },
        ) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read sync data for {}", uid)),
        }
    }

    fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .context("Sync database ping failed")?;
        Ok(())
    }
}
