//! Journal record types and framing.
//!
//! Every record is framed as:
//!
//! ```text
//! | magic "RSJ1" (4) | version u16 LE | kind u8 | len u32 LE | CBOR payload | crc32 LE (4) |
//! ```
//!
//! The CRC covers the payload only.

use crate::error::{CoreError, CoreResult};
use crate::record::Syncable;
use crate::types::{EntityKind, LocalId};
use ciborium::Value;
use serde::{Deserialize, Serialize};

/// Magic bytes identifying a journal record.
pub const JOURNAL_MAGIC: [u8; 4] = *b"RSJ1";

/// Current journal format version.
pub const JOURNAL_VERSION: u16 = 1;

/// Size of the fixed record header.
pub const HEADER_SIZE: usize = 11;

/// Size of the trailing checksum.
pub const CRC_SIZE: usize = 4;

/// Type tag of a journal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    /// Full row image.
    Upsert = 1,
    /// Physical removal of a row.
    Remove = 2,
}

impl RecordKind {
    /// Converts a byte to a record kind.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Upsert),
            2 => Some(Self::Remove),
            _ => None,
        }
    }
}

/// A logged change to one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// The row now looks exactly like `row`.
    Upsert {
        /// Table of the row.
        entity: EntityKind,
        /// Local id of the row.
        local_id: LocalId,
        /// Row image.
        row: Value,
    },
    /// The row no longer exists.
    Remove {
        /// Table of the row.
        entity: EntityKind,
        /// Local id of the removed row.
        local_id: LocalId,
    },
}

impl JournalEntry {
    /// Builds an upsert entry from a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be encoded.
    pub fn upsert<R: Syncable>(row: &R) -> CoreResult<Self> {
        Ok(Self::Upsert {
            entity: R::KIND,
            local_id: row.local_id(),
            row: Value::serialized(row).map_err(CoreError::codec)?,
        })
    }

    /// Builds a removal entry.
    #[must_use]
    pub fn remove<R: Syncable>(local_id: LocalId) -> Self {
        Self::Remove {
            entity: R::KIND,
            local_id,
        }
    }

    /// Returns the record kind.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Upsert { .. } => RecordKind::Upsert,
            Self::Remove { .. } => RecordKind::Remove,
        }
    }

    /// Returns the table this entry touches.
    #[must_use]
    pub fn entity(&self) -> EntityKind {
        match self {
            Self::Upsert { entity, .. } | Self::Remove { entity, .. } => *entity,
        }
    }

    /// Returns the local id this entry touches.
    #[must_use]
    pub fn local_id(&self) -> LocalId {
        match self {
            Self::Upsert { local_id, .. } | Self::Remove { local_id, .. } => *local_id,
        }
    }

    /// Decodes the row image of an upsert.
    ///
    /// # Errors
    ///
    /// Returns an error if this is not an upsert or the image does not decode as `R`.
    pub fn decode_row<R: Syncable>(&self) -> CoreResult<R> {
        match self {
            Self::Upsert { row, .. } => row.deserialized().map_err(CoreError::codec),
            Self::Remove { local_id, .. } => Err(CoreError::invalid_format(format!(
                "remove record for {local_id} carries no row"
            ))),
        }
    }

    /// Encodes the entry as one framed record.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut payload = Vec::new();
        ciborium::into_writer(self, &mut payload).map_err(CoreError::codec)?;
        let len = u32::try_from(payload.len())
            .map_err(|_| CoreError::invalid_format("journal payload exceeds 4 GiB"))?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
        buf.extend_from_slice(&JOURNAL_MAGIC);
        buf.extend_from_slice(&JOURNAL_VERSION.to_le_bytes());
        buf.push(self.kind() as u8);
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(&compute_crc32(&payload).to_le_bytes());
        Ok(buf)
    }
}

/// Outcome of decoding the record at one offset.
#[derive(Debug)]
pub enum Frame {
    /// A valid record and the offset of the next one.
    Record(JournalEntry, u64),
    /// The log ends inside this record (interrupted write).
    Torn,
}

/// Decodes the record starting at `offset` in `bytes`.
///
/// # Errors
///
/// Returns [`CoreError::JournalCorruption`] for a complete record that fails
/// validation. An incomplete trailing record is reported as [`Frame::Torn`].
pub fn decode_frame(bytes: &[u8], offset: u64) -> CoreResult<Frame> {
    let start = offset as usize;
    let rest = &bytes[start.min(bytes.len())..];
    if rest.len() < HEADER_SIZE {
        return Ok(Frame::Torn);
    }
    if rest[0..4] != JOURNAL_MAGIC {
        return Err(CoreError::journal_corruption(offset, "bad magic"));
    }
    let version = u16::from_le_bytes([rest[4], rest[5]]);
    if version != JOURNAL_VERSION {
        return Err(CoreError::journal_corruption(
            offset,
            format!("unsupported version {version}"),
        ));
    }
    let kind = RecordKind::from_byte(rest[6])
        .ok_or_else(|| CoreError::journal_corruption(offset, format!("unknown kind {}", rest[6])))?;
    let len = u32::from_le_bytes([rest[7], rest[8], rest[9], rest[10]]) as usize;

    let total = HEADER_SIZE + len + CRC_SIZE;
    if rest.len() < total {
        return Ok(Frame::Torn);
    }

    let payload = &rest[HEADER_SIZE..HEADER_SIZE + len];
    let crc_bytes = &rest[HEADER_SIZE + len..total];
    let stored_crc = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    if compute_crc32(payload) != stored_crc {
        // A bad checksum on the very last record is an interrupted write.
        if rest.len() == total {
            return Ok(Frame::Torn);
        }
        return Err(CoreError::journal_corruption(offset, "checksum mismatch"));
    }

    let entry: JournalEntry = ciborium::from_reader(payload)
        .map_err(|e| CoreError::journal_corruption(offset, e.to_string()))?;
    if entry.kind() != kind {
        return Err(CoreError::journal_corruption(
            offset,
            "record kind does not match payload",
        ));
    }

    Ok(Frame::Record(entry, offset + total as u64))
}

/// Computes the IEEE CRC32 of `data`.
#[must_use]
pub fn compute_crc32(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        crc = (crc >> 8) ^ TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize];
    }
    !crc
}
