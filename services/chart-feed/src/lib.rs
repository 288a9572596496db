//! Chart Feed
//!
//! Lets a user pick a dataset from a remote catalog, fetches bounded
//! windows of OHLCV records for it and hands a chronologically sorted,
//! chart-ready sequence to a render sink.
//!
//! # Architecture
//!
//! ```text
//!  GET /dropdown-options
//!        │
//!   ┌────▼────┐
//!   │ Catalog │  ← strips the header row, picks the initial dataset
//!   └────┬────┘
//!        │ select / step
//!   ┌────▼────────────┐      ┌─────────────────┐
//!   │ Session         │─────►│ Window Fetcher  │ ← POST /HomeScreen
//!   │ (dataset,       │      └────────┬────────┘
//!   │  offset,        │               │ response + generation
//!   │  generation)    │◄──────────────┘
//!   └────┬────────────┘  stale generations are discarded
//!        │ normalize
//!   ┌────▼─────┐
//!   │ Snapshot │ → render sink (watch channel)
//!   └──────────┘
//! ```
//!
//! All state lives in one `ChartSession`; the `FeedDriver` serializes
//! every mutation through a single event loop.

pub mod account;
pub mod catalog;
pub mod config;
pub mod driver;
pub mod fetcher;
pub mod normalizer;
pub mod offset;
pub mod session;
pub mod source;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
