//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweep: purges expired documents from a [`MemoryStore`](crate::store::MemoryStore)

mod sweeper;

pub use sweeper::spawn_expiry_sweeper;
