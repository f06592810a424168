//! Utility modules.

/// Log sanitization utilities to keep credentials and long value lists out of logs.
pub mod log_sanitizer;
