/// PostgreSQL plumbing for the document store
///
/// - `pool`: connection pool creation and health checks
/// - `migrations`: schema migrations for the `documents` table
///
/// The document-level API lives in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
