//! Types library for the OHLCV chart feed
//!
//! This library provides the core type definitions shared by the chart feed
//! pipeline: dataset identifiers, request generation tokens, the raw and
//! normalized record shapes, window requests and the error taxonomy.
//!
//! # Modules
//! - `ids`: Identifiers (DatasetId, Generation, RequestId)
//! - `record`: Raw OHLCV records and chart-ready points
//! - `window`: Windowed fetch requests and their wire body
//! - `account`: Account collaborator request bodies
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod record;
pub mod window;
pub mod account;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::record::*;
    pub use crate::window::*;
    pub use crate::account::*;
    pub use crate::errors::*;
}
