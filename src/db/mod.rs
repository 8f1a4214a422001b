pub mod from_row;
pub mod queries;
mod schema;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::Result;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Open a pool on `path`, with foreign keys enforced on every connection.
pub fn create_pool(path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    Ok(Pool::builder().build(manager)?)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(schema::SCHEMA)?;
    Ok(())
}
