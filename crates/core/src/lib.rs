//! `stockdash-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage or UI concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ItemId, UserId};
