//! Connection manager that keeps the pool's idle set bounded.
//!
//! r2d2 only knows a minimum idle count, so returned connections are
//! checked against the ceiling here and closed instead of being parked when
//! enough are already idle.

use r2d2::{ManageConnection, Pool};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::sync::{Arc, OnceLock, Weak};

pub type SyncPool = Pool<IdleCappedManager>;

pub struct IdleCappedManager {
    inner: SqliteConnectionManager,
    max_idle: u32,
    pool: Arc<OnceLock<Weak<SyncPool>>>,
}

impl IdleCappedManager {
    pub fn new(inner: SqliteConnectionManager, max_idle: u32) -> Self {
        IdleCappedManager {
            inner,
            max_idle,
            pool: Arc::new(OnceLock::new()),
        }
    }

    /// Builds the pool and hands the manager a weak handle to it.
    pub fn into_pool(self, builder: r2d2::Builder<Self>) -> Result<Arc<SyncPool>, r2d2::Error> {
        let slot = self.pool.clone();
        let pool = Arc::new(builder.build(self)?);
        let _ = slot.set(Arc::downgrade(&pool));
        Ok(pool)
    }

    fn idle_is_full(&self) -> bool {
        match self.pool.get().and_then(Weak::upgrade) {
            Some(pool) => pool.state().idle_connections >= self.max_idle,
            // Pool is shutting down.
            None => true,
        }
    }
}

impl ManageConnection for IdleCappedManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> rusqlite::Result<Connection> {
        self.inner.connect()
    }

    fn is_valid(&self, conn: &mut Connection) -> rusqlite::Result<()> {
        self.inner.is_valid(conn)
    }

    /// Called by r2d2 on check-in, before it takes its internal lock. A
    /// connection reported broken is closed rather than parked.
    fn has_broken(&self, conn: &mut Connection) -> bool {
        self.inner.has_broken(conn) || self.idle_is_full()
    }
}
