//! # Tether Serde
//! Byte-oriented wire serialization shared between the tether crates.
//!
//! Fixed-width primitives are written as raw little-endian bytes with no
//! length prefix; integers that are usually small go through the packed
//! encoding in [`packed`], which spends 1-9 bytes depending on magnitude.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod error;
mod packed;
mod serde;

pub use byte_reader::ByteReader;
pub use byte_writer::ByteWriter;
pub use error::SerdeErr;
pub use serde::Serde;
