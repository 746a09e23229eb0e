//! Flash memory access
//!
//! This module provides the byte-source abstraction the decoders read through and
//! an in-memory implementation backed by a saved flash image.

pub mod cursor;
pub mod reader;

pub use cursor::{ByteSource, Cursor, Position};
pub use reader::FlashDump;
