//! Database layer for the Switchboard platform.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and the tables behind sessions, their event log,
//! and the caller rate-limit records.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: the whole service is a single process; WAL
//!   allows concurrent readers with a single writer, which matches the
//!   access pattern of many watching browsers and one conversation step at a
//!   time per call.
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, ensuring migrations ship with the server and cannot
//!   drift from the code that depends on them.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
