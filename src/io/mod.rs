//! Dataset input parsing and CSV result export.

pub mod export;
pub mod reader;
