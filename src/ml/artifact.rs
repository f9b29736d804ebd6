//! Framed binary model files.
//!
//! Layout (little-endian):
//!
//! ```text
//! +----------+---------+-------------+-----------+-----------------+
//! | magic 8B | ver u32 | payload u64 | crc32 u32 | bincode payload |
//! +----------+---------+-------------+-----------+-----------------+
//! ```
//!
//! The checksum covers the payload only. Readers reject foreign files,
//! unknown versions, truncated payloads and checksum mismatches before
//! decoding anything.

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, TriageError};

/// File signature.
pub const MAGIC: &[u8; 8] = b"TRIAGEMD";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 8 + 4 + 8 + 4;

/// Serialize a value into a framed byte buffer.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(value)
        .map_err(|e| TriageError::serialization(format!("Failed to encode model: {e}")))?;

    let mut buffer = Vec::with_capacity(HEADER_LEN + payload.len());
    buffer.write_all(MAGIC)?;
    buffer.write_u32::<LittleEndian>(FORMAT_VERSION)?;
    buffer.write_u64::<LittleEndian>(payload.len() as u64)?;
    buffer.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
    buffer.write_all(&payload)?;
    Ok(buffer)
}

/// Check the frame and deserialize its payload.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN {
        return Err(TriageError::serialization(format!(
            "model file too short: {} bytes",
            bytes.len()
        )));
    }

    let mut reader = Cursor::new(bytes);
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(TriageError::serialization("not a triage model file"));
    }

    let version = reader.read_u32::<LittleEndian>()?;
    if version != FORMAT_VERSION {
        return Err(TriageError::serialization(format!(
            "unsupported model format version {version}"
        )));
    }

    let payload_len = reader.read_u64::<LittleEndian>()?;
    let expected_crc = reader.read_u32::<LittleEndian>()?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() as u64 != payload_len {
        return Err(TriageError::serialization(format!(
            "payload length {} does not match header {payload_len}",
            payload.len()
        )));
    }

    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(TriageError::serialization(format!(
            "checksum mismatch: expected {expected_crc:08x}, got {actual_crc:08x}"
        )));
    }

    bincode::deserialize(payload)
        .map_err(|e| TriageError::serialization(format!("Failed to decode model: {e}")))
}

/// Write a framed value to a file.
pub fn write_artifact<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let bytes = encode(value)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;

    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Read a framed value from a file.
pub fn read_artifact<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(TriageError::missing_input(path));
    }

    let bytes = std::fs::read(path)?;
    decode(&bytes)
}
