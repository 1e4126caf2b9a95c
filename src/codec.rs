// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! MessagePack codec for the cold-tier boundary.
//!
//! The hot tier and the recency index hold typed values and never touch this
//! module. Only demotion, cold reads and cold deletes convert keys and values
//! to bytes.
//!
//! Structs are written as maps keyed by field name, so adding an optional
//! field to a value type does not invalidate entries already on disk.
//!
//! # Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use tiered_cache::codec;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Session { user: String, hits: u32 }
//!
//! let bytes = codec::encode(&Session { user: "ada".into(), hits: 3 }).unwrap();
//! let back: Session = codec::decode(&bytes).unwrap();
//! assert_eq!(back, Session { user: "ada".into(), hits: 3 });
//! ```

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("Decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Encode a value into a MessagePack byte buffer.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode a value from a MessagePack byte buffer.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Encode a value straight into a writer.
pub fn encode_to<W, T>(writer: &mut W, value: &T) -> Result<(), CodecError>
where
    W: Write,
    T: Serialize,
{
    rmp_serde::encode::write_named(writer, value)?;
    Ok(())
}

/// Decode one value from a reader. Bytes after the value are left unread.
pub fn decode_from<R: Read, T: DeserializeOwned>(reader: R) -> Result<T, CodecError> {
    Ok(rmp_serde::decode::from_read(reader)?)
}
