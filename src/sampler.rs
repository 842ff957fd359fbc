//! Random-key sampling and per-prefix classification.

use log::{debug, info};

use crate::{
    client::KeyStore,
    freq::{key_prefix, Bucket, KeyspaceTables},
    KeyType, SampleError,
};

/// TTL reply marking a key without an expire.
const TTL_NO_EXPIRE: i64 = -1;

/// Draws random keys from a store and accumulates per-prefix frequency
/// tables over their types, expires, sizes and cardinalities.
///
/// Each drawn key costs one round trip for the type/TTL pair plus at
/// most one more for the recognized container types; hashes take two
/// extra round trips for the sampled field and its value. A probe
/// failure aborts the whole run and the tables collected so far are
/// dropped with the sampler.
pub struct Sampler<C> {
    store: C,
    sample_size: usize,
    tables: KeyspaceTables,
}

impl<C: KeyStore> Sampler<C> {
    /// Creates a sampler that will draw `sample_size` random keys from
    /// `store`.
    pub fn new(store: C, sample_size: usize) -> Self {
        Self {
            store,
            sample_size,
            tables: KeyspaceTables::default(),
        }
    }

    /// The configured number of keys to draw.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// The frequency tables collected so far.
    pub fn tables(&self) -> &KeyspaceTables {
        &self.tables
    }

    /// Draws and classifies `sample_size` random keys, one after the
    /// other.
    pub async fn run(&mut self) -> Result<(), SampleError> {
        info!("sampling {} random keys", self.sample_size);
        for _ in 0..self.sample_size {
            self.sample_one().await?;
        }
        Ok(())
    }

    async fn sample_one(&mut self) -> Result<(), SampleError> {
        let key = self.store.random_key().await?;
        let (ty, ttl) = self.store.type_and_ttl(&key).await?;
        let prefix = key_prefix(&key).to_owned();
        debug!("sampled `{}` (type {}, prefix `{}`)", key, ty, prefix);

        let expire = if ttl == TTL_NO_EXPIRE {
            Bucket::Unknown
        } else {
            Bucket::Value(ttl)
        };
        self.tables.types.increment(&prefix, ty.clone());
        self.tables.expires.increment(&prefix, expire);

        match ty {
            KeyType::SortedSet => {
                let (card, element) = self.store.zset_card_and_first(&key).await?;
                if card != 0 {
                    self.tables
                        .zset_card
                        .increment(&prefix, Bucket::Value(card as i64));
                }
                if let Some(element) = element {
                    self.tables
                        .zset_elem_size
                        .increment(&prefix, Bucket::Value(element.len() as i64));
                }
            }
            KeyType::Set => {
                let (card, member) = self.store.set_card_and_random(&key).await?;
                if card != 0 {
                    self.tables
                        .set_card
                        .increment(&prefix, Bucket::Value(card as i64));
                }
                if let Some(member) = member {
                    self.tables
                        .set_elem_size
                        .increment(&prefix, Bucket::Value(member.len() as i64));
                }
            }
            KeyType::List => {
                let (len, element) = self.store.list_len_and_first(&key).await?;
                if len != 0 {
                    self.tables
                        .list_len
                        .increment(&prefix, Bucket::Value(len as i64));
                }
                if let Some(element) = element {
                    self.tables
                        .list_elem_size
                        .increment(&prefix, Bucket::Value(element.len() as i64));
                }
            }
            KeyType::Hash => {
                let len = self.store.hash_len(&key).await?;
                if len == 0 {
                    // No field to measure; the size metrics still get
                    // one observation each so the per-prefix counts
                    // stay in step with the sampled keys.
                    self.tables.hash_field_size.increment(&prefix, Bucket::Unknown);
                    self.tables.hash_value_size.increment(&prefix, Bucket::Unknown);
                } else {
                    self.tables
                        .hash_len
                        .increment(&prefix, Bucket::Value(len as i64));
                    if let Some(field) = self.store.hash_fields(&key).await?.into_iter().next() {
                        self.tables
                            .hash_field_size
                            .increment(&prefix, Bucket::Value(field.len() as i64));
                        if let Some(value) = self.store.hash_value(&key, &field).await? {
                            self.tables
                                .hash_value_size
                                .increment(&prefix, Bucket::Value(value.len() as i64));
                        }
                    }
                }
            }
            KeyType::String => {
                // Recorded even for empty values; a zero-length string
                // is a meaningful observation.
                let len = self.store.string_len(&key).await?;
                self.tables
                    .string_size
                    .increment(&prefix, Bucket::Value(len as i64));
            }
            KeyType::Other(_) => {}
        }
        Ok(())
    }
}
