//! Core types, traits and error definitions

pub mod error;
pub mod traits;
pub mod types;

pub use self::error::{BmrmError, Result};
pub use self::traits::*;
pub use self::types::*;
