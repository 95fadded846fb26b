//! Inner quadratic-program machinery
//!
//! This module holds the dense Gram matrix over cutting planes and the
//! generalized SMO solver that optimizes plane weights against it.

pub mod gram;
pub mod gsmo;

pub use self::gram::*;
pub use self::gsmo::*;
