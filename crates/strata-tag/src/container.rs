//! LZ4 file container for tag documents.
//!
//! A sealed container is `magic (4 bytes) + flag (1 byte) + body`. The flag
//! records how the body is stored; documents are always written compressed,
//! but the uncompressed flag is accepted on read for tooling convenience.

use lz4_flex::{compress_prepend_size, decompress_size_prepended};

/// File magic identifying a sealed tag container.
pub const MAGIC: [u8; 4] = *b"STRA";

/// Body flag: raw document bytes.
pub const FLAG_RAW: u8 = 0x00;

/// Body flag: LZ4-compressed document bytes (size-prepended).
pub const FLAG_LZ4: u8 = 0x01;

/// Errors produced while opening a sealed container.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// The input is too short to hold magic and flag.
    #[error("container truncated: {0} bytes")]
    Truncated(usize),
    /// The magic bytes did not match.
    #[error("not a tag container (magic {0:02x?})")]
    BadMagic([u8; 4]),
    /// An unknown body flag byte was encountered.
    #[error("unknown container flag: 0x{0:02X}")]
    UnknownFlag(u8),
    /// LZ4 decompression failed.
    #[error("LZ4 decompression failed: {0}")]
    Decompress(String),
}

/// Seals serialized document bytes into a compressed container.
pub fn seal(document: &[u8]) -> Vec<u8> {
    let compressed = compress_prepend_size(document);
    let mut out = Vec::with_capacity(5 + compressed.len());
    out.extend_from_slice(&MAGIC);
    out.push(FLAG_LZ4);
    out.extend_from_slice(&compressed);
    out
}

/// Opens a sealed container, returning the document bytes.
pub fn open(data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    if data.len() < 5 {
        return Err(ContainerError::Truncated(data.len()));
    }
    let magic: [u8; 4] = data[..4].try_into().unwrap();
    if magic != MAGIC {
        return Err(ContainerError::BadMagic(magic));
    }
    match data[4] {
        FLAG_RAW => Ok(data[5..].to_vec()),
        FLAG_LZ4 => decompress_size_prepended(&data[5..])
            .map_err(|e| ContainerError::Decompress(e.to_string())),
        flag => Err(ContainerError::UnknownFlag(flag)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
