//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Transactions
//!
//! Writes go through a transaction so that a failed request leaves nothing
//! behind; read-only handlers may use a pooled connection directly:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = Bookings::new(&mut tx);
//! // ... operations ...
//! tx.commit().await?;
//!
//! let mut conn = pool.acquire().await?;
//! let featured = Cocktails::new(&mut conn).featured(6).await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are embedded into the binary; see
//! [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
