//! Persistence for digest keys: full snapshots and append-only log
//! records. Both carry the exact bytes of [`crate::digest::wire`]: one
//! encode/decode routine for every path that touches disk or the wire.
//!
//! Snapshot container (little-endian):
//!
//!   0..4  : magic = b"TDKS"
//!   4     : container version (u8) = 1
//!   5..9  : entry count (u32)
//!   per entry:
//!     [key_len: u32][key bytes (UTF-8)]
//!     [payload_len: u32][digest codec payload]
//!
//! The snapshot carries digest keys only; other value kinds are the host
//! engine's to persist. Keys are written in sorted order so identical
//! keyspaces serialize to identical bytes.

use tracing::debug;

use super::{Keyspace, Value};
use crate::digest::wire;
use crate::error::{Error, Result};

const SNAPSHOT_MAGIC: &[u8; 4] = b"TDKS";
const SNAPSHOT_VERSION: u8 = 1;

/// Keys and payloads past these sizes indicate corruption, not data.
const MAX_KEY_LEN: u32 = 1 << 16;
const MAX_PAYLOAD_LEN: u32 = 1 << 28;

/// One append-only log entry: "reconstruct `key` from `payload`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub key: String,
    pub payload: Vec<u8>,
}

#[inline]
fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

#[inline]
fn read_u32(bytes: &[u8], offset: &mut usize) -> Result<u32> {
    let end = *offset + 4;
    if end > bytes.len() {
        return Err(Error::CorruptEncoding {
            what: "truncated snapshot length field",
        });
    }
    let mut arr = [0u8; 4];
    arr.copy_from_slice(&bytes[*offset..end]);
    *offset = end;
    Ok(u32::from_le_bytes(arr))
}

fn read_chunk<'a>(bytes: &'a [u8], offset: &mut usize, len: u32, bound: u32) -> Result<&'a [u8]> {
    if len > bound {
        return Err(Error::CorruptEncoding {
            what: "snapshot field exceeds sane bound",
        });
    }
    let end = *offset + len as usize;
    if end > bytes.len() {
        return Err(Error::CorruptEncoding {
            what: "truncated snapshot entry",
        });
    }
    let chunk = &bytes[*offset..end];
    *offset = end;
    Ok(chunk)
}

impl Keyspace {
    /// Serialize every digest key into a snapshot. Flushes each digest
    /// first (via the codec), so the bytes never carry unmerged points.
    pub fn snapshot_to_bytes(&mut self) -> Vec<u8> {
        let mut entries: Vec<(&String, &mut crate::digest::Digest)> = self
            .slots
            .iter_mut()
            .filter_map(|(k, v)| match v {
                Value::Digest(d) => Some((k, d)),
                _ => None,
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut buf = Vec::new();
        buf.extend_from_slice(SNAPSHOT_MAGIC);
        buf.push(SNAPSHOT_VERSION);
        write_u32(&mut buf, entries.len() as u32);
        let count = entries.len();
        for (key, digest) in entries {
            let payload = wire::encode(digest);
            write_u32(&mut buf, key.len() as u32);
            buf.extend_from_slice(key.as_bytes());
            write_u32(&mut buf, payload.len() as u32);
            buf.extend_from_slice(&payload);
        }
        debug!(entries = count, bytes = buf.len(), "snapshot written");
        buf
    }

    /// Rebuild a keyspace from snapshot bytes. Any malformed byte,
    /// container framing or digest payload alike, fails the whole load; there
    /// is no partial or best-effort recovery.
    pub fn load_snapshot(bytes: &[u8]) -> Result<Keyspace> {
        if bytes.len() < 9 {
            return Err(Error::CorruptEncoding {
                what: "snapshot shorter than header",
            });
        }
        if &bytes[0..4] != SNAPSHOT_MAGIC {
            return Err(Error::CorruptEncoding {
                what: "bad snapshot magic",
            });
        }
        if bytes[4] != SNAPSHOT_VERSION {
            return Err(Error::CorruptEncoding {
                what: "unsupported snapshot version",
            });
        }

        let mut offset = 5;
        let entries = read_u32(bytes, &mut offset)?;
        let mut ks = Keyspace::new();
        for _ in 0..entries {
            let key_len = read_u32(bytes, &mut offset)?;
            let key_bytes = read_chunk(bytes, &mut offset, key_len, MAX_KEY_LEN)?;
            let key = std::str::from_utf8(key_bytes).map_err(|_| Error::CorruptEncoding {
                what: "snapshot key is not UTF-8",
            })?;
            let payload_len = read_u32(bytes, &mut offset)?;
            let payload = read_chunk(bytes, &mut offset, payload_len, MAX_PAYLOAD_LEN)?;
            if ks.contains(key) {
                return Err(Error::CorruptEncoding {
                    what: "duplicate snapshot key",
                });
            }
            let digest = wire::decode(payload)?;
            ks.insert_digest(key, digest);
        }
        if offset != bytes.len() {
            return Err(Error::CorruptEncoding {
                what: "trailing bytes after snapshot entries",
            });
        }
        debug!(entries, "snapshot loaded");
        Ok(ks)
    }

    /// Emit one self-contained log record per digest key, compacting the
    /// log the way a snapshot would while keeping the record-per-key
    /// replay shape.
    pub fn log_rewrite(&mut self) -> Vec<LogRecord> {
        let mut entries: Vec<(&String, &mut crate::digest::Digest)> = self
            .slots
            .iter_mut()
            .filter_map(|(k, v)| match v {
                Value::Digest(d) => Some((k, d)),
                _ => None,
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut records = Vec::with_capacity(entries.len());
        for (key, digest) in entries {
            let payload = wire::encode(digest);
            records.push(LogRecord {
                key: key.clone(),
                payload,
            });
        }
        debug!(records = records.len(), "log rewritten");
        records
    }

    /// Replay one log record: reconstruct the key from its payload,
    /// replacing any digest already there. A key occupied by another
    /// value type is the host engine's data; refuse rather than clobber.
    pub fn apply_log_record(&mut self, record: &LogRecord) -> Result<()> {
        if let Some(Value::Bytes(_)) = self.slot(&record.key) {
            return Err(Error::WrongType {
                key: record.key.clone(),
            });
        }
        let digest = wire::decode(&record.payload)?;
        self.insert_digest(&record.key, digest);
        debug!(key = %record.key, "log record applied");
        Ok(())
    }
}
