//! Bundle-method machinery
//!
//! The cutting-plane pool owns the subgradient storage; the driver runs the
//! outer BMRM loop on top of it and the inner QP solver.

pub mod driver;
pub mod pool;

pub use self::driver::*;
pub use self::pool::*;
