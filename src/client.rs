//! Access to the sampled key-value store.
//!
//! The [`KeyStore`] trait captures the handful of read-only point
//! queries the sampler needs. [`RedisKeyStore`] implements them
//! against a live connection, pairing related queries into a single
//! pipeline round trip each so both values are read from the key's
//! state at the same instant.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::{KeyType, SampleError};

/// Read-only probe interface against a key-value store.
///
/// None of the operations mutate store state. The cardinality probes
/// return the collection size together with one sampled element, both
/// obtained in the same round trip.
#[async_trait]
pub trait KeyStore {
    /// Picks one random key.
    ///
    /// Fails with [`SampleError::EmptyStore`] when the keyspace holds
    /// no keys at all.
    async fn random_key(&mut self) -> Result<String, SampleError>;

    /// Reads the value type and the remaining TTL of `key` together.
    ///
    /// The TTL is reported in seconds, with the store's `-1` sentinel
    /// for keys that have no expire set.
    async fn type_and_ttl(&mut self, key: &str) -> Result<(KeyType, i64), SampleError>;

    /// Reads a sorted set's cardinality together with its
    /// lowest-scored element.
    async fn zset_card_and_first(
        &mut self,
        key: &str,
    ) -> Result<(u64, Option<Vec<u8>>), SampleError>;

    /// Reads a set's cardinality together with one random member.
    async fn set_card_and_random(
        &mut self,
        key: &str,
    ) -> Result<(u64, Option<Vec<u8>>), SampleError>;

    /// Reads a list's length together with its first element.
    async fn list_len_and_first(
        &mut self,
        key: &str,
    ) -> Result<(u64, Option<Vec<u8>>), SampleError>;

    /// Reads the number of fields of a hash.
    async fn hash_len(&mut self, key: &str) -> Result<u64, SampleError>;

    /// Reads the field names of a hash.
    async fn hash_fields(&mut self, key: &str) -> Result<Vec<String>, SampleError>;

    /// Reads one field's value from a hash, if the field still exists.
    async fn hash_value(&mut self, key: &str, field: &str)
        -> Result<Option<Vec<u8>>, SampleError>;

    /// Reads the byte length of a string value.
    async fn string_len(&mut self, key: &str) -> Result<u64, SampleError>;
}

/// [`KeyStore`] implementation over a live Redis connection.
pub struct RedisKeyStore {
    con: MultiplexedConnection,
}

impl RedisKeyStore {
    /// Wraps an established connection.
    pub fn new(con: MultiplexedConnection) -> Self {
        Self { con }
    }
}

#[async_trait]
impl KeyStore for RedisKeyStore {
    async fn random_key(&mut self) -> Result<String, SampleError> {
        let key: Option<String> = redis::cmd("RANDOMKEY").query_async(&mut self.con).await?;
        key.ok_or(SampleError::EmptyStore)
    }

    async fn type_and_ttl(&mut self, key: &str) -> Result<(KeyType, i64), SampleError> {
        let (ty, ttl): (String, i64) = redis::pipe()
            .cmd("TYPE")
            .arg(key)
            .cmd("TTL")
            .arg(key)
            .query_async(&mut self.con)
            .await?;
        Ok((KeyType::from_wire(&ty), ttl))
    }

    async fn zset_card_and_first(
        &mut self,
        key: &str,
    ) -> Result<(u64, Option<Vec<u8>>), SampleError> {
        let (card, range): (u64, Vec<Vec<u8>>) = redis::pipe()
            .cmd("ZCARD")
            .arg(key)
            .cmd("ZRANGE")
            .arg(key)
            .arg(0)
            .arg(0)
            .query_async(&mut self.con)
            .await?;
        Ok((card, range.into_iter().next()))
    }

    async fn set_card_and_random(
        &mut self,
        key: &str,
    ) -> Result<(u64, Option<Vec<u8>>), SampleError> {
        let (card, member): (u64, Option<Vec<u8>>) = redis::pipe()
            .cmd("SCARD")
            .arg(key)
            .cmd("SRANDMEMBER")
            .arg(key)
            .query_async(&mut self.con)
            .await?;
        Ok((card, member))
    }

    async fn list_len_and_first(
        &mut self,
        key: &str,
    ) -> Result<(u64, Option<Vec<u8>>), SampleError> {
        let (len, range): (u64, Vec<Vec<u8>>) = redis::pipe()
            .cmd("LLEN")
            .arg(key)
            .cmd("LRANGE")
            .arg(key)
            .arg(0)
            .arg(0)
            .query_async(&mut self.con)
            .await?;
        Ok((len, range.into_iter().next()))
    }

    async fn hash_len(&mut self, key: &str) -> Result<u64, SampleError> {
        let len = redis::cmd("HLEN")
            .arg(key)
            .query_async(&mut self.con)
            .await?;
        Ok(len)
    }

    async fn hash_fields(&mut self, key: &str) -> Result<Vec<String>, SampleError> {
        let fields = redis::cmd("HKEYS")
            .arg(key)
            .query_async(&mut self.con)
            .await?;
        Ok(fields)
    }

    async fn hash_value(
        &mut self,
        key: &str,
        field: &str,
    ) -> Result<Option<Vec<u8>>, SampleError> {
        let value = redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut self.con)
            .await?;
        Ok(value)
    }

    async fn string_len(&mut self, key: &str) -> Result<u64, SampleError> {
        let len = redis::cmd("STRLEN")
            .arg(key)
            .query_async(&mut self.con)
            .await?;
        Ok(len)
    }
}
