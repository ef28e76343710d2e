//! # Transport Layer
//!
//! Thin HTTP glue around the codec:
//!
//! - [`storage`]: scratch directory for uploads, files removed on drop
//! - [`core`]: bounded worker pool running codec operations off the async runtime
//! - [`routes`]: axum router, multipart handling and JSON errors

pub mod core;
pub mod routes;
pub mod storage;

pub use self::core::StegoCore;
pub use routes::{router, AppState};
pub use storage::{ScratchDir, ScratchFile};
