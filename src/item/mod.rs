/// In-memory list reader.
pub mod list;

/// Writer forwarding each chunk to several writers in order.
pub mod composite;

/// Processor dropping items whose key was already seen during the run.
pub mod dedupe;

#[cfg(feature = "logger")]
/// This module provides a logger item writer, useful to trace chunks.
pub mod logger;

#[cfg(feature = "csv")]
/// This module provides a CSV item reader and writer implementation.
pub mod csv;

#[cfg(feature = "rdbc")]
/// This module provides an RDBC (SQLite) item writer implementation.
pub mod rdbc;
