//! Persistence layer (sqlx / Postgres).
//!
//! Functions that participate in multi-step writes take `&mut PgConnection`
//! so the caller owns the transaction boundary; read paths take the pool.

pub mod cart;
pub mod inventory;
pub mod orders;
