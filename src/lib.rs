//! Streaming approximate-quantile digests as a storage-engine value type.
//!
//! A [`Digest`] absorbs weighted numeric observations into a bounded set of
//! (mean, weight) centroids and answers approximate quantile and CDF
//! queries over them. Memory stays `O(compression)` no matter how many
//! points are ingested; relative error is tightest near the distribution's
//! tails.
//!
//! The [`Keyspace`] layer is the boundary to a host key-value engine:
//! digests live in typed key slots next to the engine's other value kinds,
//! are driven through a small command surface (create / add / merge /
//! quantile / cdf / info), and persist through a single versioned binary
//! codec shared by full snapshots and incremental log records.

pub mod digest;
pub mod error;
pub mod store;

pub use digest::{Centroid, Digest, DEFAULT_COMPRESSION};
pub use error::{Error, Result};
pub use store::commands::DigestInfo;
pub use store::persist::LogRecord;
pub use store::{Keyspace, Value};
