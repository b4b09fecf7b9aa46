//! Tree serialization.
//!
//! - [`text`]: lossless `key=value` format, read and write
//! - [`json`]: nested JSON document, write only

pub mod json;
pub mod text;

pub use json::{InternalNodeJson, JsonError, JsonWriteOptions, LeafJson, NodeJson, TreeJson};
pub use text::ParseError;
