//! Shared utilities for cosign.

pub mod format;
pub mod logging;
pub mod time;

pub use format::{clean_provider_error, truncate_address};
pub use logging::{init_logging, LogFormat};
pub use time::format_wait;
