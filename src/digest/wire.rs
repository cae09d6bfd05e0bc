// src/digest/wire.rs
//
// Canonical digest binary codec.
//
// Layout (little-endian):
//
//   0      : format_version (u8) = 1
//   1..9   : compression     (f64)
//   9..13  : centroid_count  (u32)
//   13..   : centroid_count × (mean: f64, weight: f64)
//
// Encoding always flushes first, so persisted digests never carry
// unmerged points. Decoding validates everything it reads (version,
// exact payload length, centroid count bound, finite fields, ordered
// means) and re-derives the total weight from the decoded centroids
// rather than trusting a stored total. Both the snapshot and the change
// log go through these two functions and nothing else.

use crate::digest::centroid::Centroid;
use crate::digest::{Digest, MIN_COMPRESSION};
use crate::error::{Error, Result};

pub(crate) const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 1 + 8 + 4;
const CENTROID_LEN: usize = 16;

/// Upper bound on an acceptable decoded centroid count. Real stores hold
/// `O(compression)` centroids; anything near this bound is corruption.
pub(crate) const MAX_CENTROIDS: u32 = 1 << 22;

/// Exact encoded size of a digest with `centroid_count` centroids.
#[inline]
pub fn encoded_len(centroid_count: usize) -> usize {
    HEADER_LEN + CENTROID_LEN * centroid_count
}

/* ============================
 * Small helpers
 * ============================ */

#[inline]
fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

#[inline]
fn write_f64(buf: &mut Vec<u8>, v: f64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

#[inline]
fn read_u32(bytes: &[u8], offset: &mut usize) -> Result<u32> {
    let end = *offset + 4;
    if end > bytes.len() {
        return Err(Error::CorruptEncoding {
            what: "truncated u32",
        });
    }
    let mut arr = [0u8; 4];
    arr.copy_from_slice(&bytes[*offset..end]);
    *offset = end;
    Ok(u32::from_le_bytes(arr))
}

#[inline]
fn read_f64(bytes: &[u8], offset: &mut usize) -> Result<f64> {
    let end = *offset + 8;
    if end > bytes.len() {
        return Err(Error::CorruptEncoding {
            what: "truncated f64",
        });
    }
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&bytes[*offset..end]);
    *offset = end;
    Ok(f64::from_le_bytes(arr))
}

/* ============================
 * Encode
 * ============================ */

/// Serialize the digest. Flushes pending points first.
pub fn encode(digest: &mut Digest) -> Vec<u8> {
    digest.flush();
    let cents = digest.centroids();
    debug_assert!(cents.len() <= MAX_CENTROIDS as usize);

    let mut buf = Vec::with_capacity(encoded_len(cents.len()));
    buf.push(FORMAT_VERSION);
    write_f64(&mut buf, digest.compression());
    write_u32(&mut buf, cents.len() as u32);
    for c in cents {
        write_f64(&mut buf, c.mean());
        write_f64(&mut buf, c.weight());
    }
    buf
}

/* ============================
 * Decode
 * ============================ */

/// Reconstruct a digest from its encoded bytes.
pub fn decode(bytes: &[u8]) -> Result<Digest> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::CorruptEncoding {
            what: "buffer shorter than header",
        });
    }
    if bytes[0] != FORMAT_VERSION {
        return Err(Error::CorruptEncoding {
            what: "unsupported format version",
        });
    }

    let mut offset = 1;
    let compression = read_f64(bytes, &mut offset)?;
    if !compression.is_finite() || compression < MIN_COMPRESSION {
        return Err(Error::CorruptEncoding {
            what: "compression out of range",
        });
    }

    let centroid_count = read_u32(bytes, &mut offset)?;
    if centroid_count > MAX_CENTROIDS {
        return Err(Error::CorruptEncoding {
            what: "centroid count exceeds sane bound",
        });
    }
    let centroid_count = centroid_count as usize;
    if bytes.len() != encoded_len(centroid_count) {
        return Err(Error::CorruptEncoding {
            what: "payload length mismatch",
        });
    }

    let mut centroids = Vec::with_capacity(centroid_count);
    let mut total_weight = 0.0_f64;
    let mut prev_mean = f64::NEG_INFINITY;
    for _ in 0..centroid_count {
        let mean = read_f64(bytes, &mut offset)?;
        let weight = read_f64(bytes, &mut offset)?;
        if !mean.is_finite() {
            return Err(Error::CorruptEncoding {
                what: "non-finite centroid mean",
            });
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::CorruptEncoding {
                what: "invalid centroid weight",
            });
        }
        if mean < prev_mean {
            return Err(Error::CorruptEncoding {
                what: "centroid means out of order",
            });
        }
        prev_mean = mean;
        total_weight += weight;
        centroids.push(Centroid::new(mean, weight));
    }

    Ok(Digest::from_parts(compression, centroids, total_weight))
}
