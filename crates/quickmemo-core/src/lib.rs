//! # quickmemo-core
//!
//! Core types, traits, and abstractions for quickmemo.
//!
//! This crate provides the persisted [`Config`] record, the normalized remote
//! entities ([`Memo`], [`ResourceRef`]), the shared [`Error`] taxonomy and the
//! two seams every other crate plugs into: [`ConfigStore`] (persistence) and
//! [`MemoService`] (the memo server).

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
