// core/src/store/mod.rs

//! Transactional store backends.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;
