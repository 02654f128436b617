//! # storage-adapters
//!
//! Implementations of the persistence and media ports.
//!
//! - [`memory::MemoryStore`]: always compiled, backs tests and database-less runs
//! - [`postgres::PgStore`]: feature `db-postgres`
//! - [`media_local::LocalMediaStorage`]: feature `media-local`

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

#[cfg(feature = "media-local")]
pub mod media_local;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;

#[cfg(feature = "media-local")]
pub use media_local::LocalMediaStorage;
