#![warn(missing_docs)]

//! Statistical profiler for the keyspace of a running
//! [Redis](https://redis.io/) server.
//!
//! The profiler draws a configurable number of random keys, classifies
//! each one by value type and by naming prefix (the part of the key
//! before the first `:`), and accumulates frequency tables over types,
//! expires, collection sizes and element sizes. The finished tables are
//! condensed into per-prefix reports with sorted frequency breakdowns,
//! power-of-two histograms and mean/standard-deviation summaries.
//!
//! Everything is read-only and intentionally approximate: instead of
//! scanning whole collections, a single representative element is
//! sampled per collection, which keeps the query cost per key small.
//!
//! ## Usage example
//!
//! ```no_run
//! use redis_sampler::{render::render_report, RedisKeyStore, Sampler};
//!
//! # async fn run() -> eyre::Result<()> {
//! let client = redis::Client::open("redis://127.0.0.1:6379/0")?;
//! let con = client.get_multiplexed_async_connection().await?;
//!
//! let mut sampler = Sampler::new(RedisKeyStore::new(con), 1000);
//! sampler.run().await?;
//!
//! print!("{}", render_report(sampler.tables(), 1000));
//! # Ok(())
//! # }
//! ```

use std::{error::Error, fmt::Display};

pub mod client;
pub mod freq;
pub mod render;
pub mod report;
pub mod sampler;

pub use client::{KeyStore, RedisKeyStore};
pub use freq::{Bucket, FreqTable, KeyspaceTables};
pub use sampler::Sampler;

/// The value types a sampled key can have.
///
/// The five recognized variants drive the per-type probes of the
/// sampler. Any other type reply is carried verbatim in [`Other`] and
/// triggers no further queries.
///
/// [`Other`]: Self::Other
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyType {
    /// Plain string value.
    String,
    /// List of elements.
    List,
    /// Unordered set of unique members.
    Set,
    /// Set of unique members ordered by score.
    SortedSet,
    /// Field-to-value map.
    Hash,
    /// A type reply outside the recognized set, kept verbatim.
    Other(String),
}

impl KeyType {
    /// Parses a `TYPE` reply.
    pub fn from_wire(name: &str) -> Self {
        match name {
            "string" => Self::String,
            "list" => Self::List,
            "set" => Self::Set,
            "zset" => Self::SortedSet,
            "hash" => Self::Hash,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::List => write!(f, "list"),
            Self::Set => write!(f, "set"),
            Self::SortedSet => write!(f, "zset"),
            Self::Hash => write!(f, "hash"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Errors that abort a sampling run.
///
/// No failure is recoverable: the sampler performs no retries and
/// discards the in-progress sample when a probe fails.
#[derive(Debug)]
pub enum SampleError {
    /// The store contains no keys to draw from.
    EmptyStore,
    /// A query or the underlying connection failed.
    Connection(redis::RedisError),
}

impl Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStore => write!(f, "The store contains no keys to sample."),
            Self::Connection(err) => write!(f, "Query failed: {}", err),
        }
    }
}

impl Error for SampleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyStore => None,
            Self::Connection(err) => Some(err),
        }
    }
}

impl From<redis::RedisError> for SampleError {
    fn from(err: redis::RedisError) -> Self {
        Self::Connection(err)
    }
}
