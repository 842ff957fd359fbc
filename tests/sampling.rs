use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use redis_sampler::{Bucket, KeyStore, KeyType, SampleError, Sampler};

/// In-memory stand-in for a live server.
///
/// `random_key` hands out the fixture keys round-robin, so a run of
/// `keys.len()` samples touches every key exactly once and a run of
/// `2 * keys.len()` samples touches every key exactly twice.
struct FixtureStore {
    keys: Vec<String>,
    next: usize,
    values: HashMap<String, Value>,
    ttls: HashMap<String, i64>,
}

enum Value {
    Str(Vec<u8>),
    List(Vec<Vec<u8>>),
    Set(Vec<Vec<u8>>),
    SortedSet(Vec<Vec<u8>>),
    Hash(Vec<(String, Vec<u8>)>),
    /// A type the sampler does not recognize; probing it is a test
    /// failure.
    Foreign(&'static str),
}

impl FixtureStore {
    fn new(entries: Vec<(&str, Value)>) -> Self {
        Self {
            keys: entries.iter().map(|(key, _)| key.to_string()).collect(),
            next: 0,
            values: entries
                .into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
            ttls: HashMap::new(),
        }
    }

    fn with_ttl(mut self, key: &str, ttl: i64) -> Self {
        self.ttls.insert(key.to_owned(), ttl);
        self
    }

    fn value(&self, key: &str) -> &Value {
        &self.values[key]
    }
}

#[async_trait]
impl KeyStore for FixtureStore {
    async fn random_key(&mut self) -> Result<String, SampleError> {
        if self.keys.is_empty() {
            return Err(SampleError::EmptyStore);
        }
        let key = self.keys[self.next % self.keys.len()].clone();
        self.next += 1;
        Ok(key)
    }

    async fn type_and_ttl(&mut self, key: &str) -> Result<(KeyType, i64), SampleError> {
        let ty = match self.value(key) {
            Value::Str(_) => KeyType::String,
            Value::List(_) => KeyType::List,
            Value::Set(_) => KeyType::Set,
            Value::SortedSet(_) => KeyType::SortedSet,
            Value::Hash(_) => KeyType::Hash,
            Value::Foreign(name) => KeyType::Other(name.to_string()),
        };
        Ok((ty, self.ttls.get(key).copied().unwrap_or(-1)))
    }

    async fn zset_card_and_first(
        &mut self,
        key: &str,
    ) -> Result<(u64, Option<Vec<u8>>), SampleError> {
        match self.value(key) {
            Value::SortedSet(members) => {
                Ok((members.len() as u64, members.first().cloned()))
            }
            _ => panic!("zset probe on non-zset key `{}`", key),
        }
    }

    async fn set_card_and_random(
        &mut self,
        key: &str,
    ) -> Result<(u64, Option<Vec<u8>>), SampleError> {
        match self.value(key) {
            Value::Set(members) => Ok((members.len() as u64, members.first().cloned())),
            _ => panic!("set probe on non-set key `{}`", key),
        }
    }

    async fn list_len_and_first(
        &mut self,
        key: &str,
    ) -> Result<(u64, Option<Vec<u8>>), SampleError> {
        match self.value(key) {
            Value::List(elements) => Ok((elements.len() as u64, elements.first().cloned())),
            _ => panic!("list probe on non-list key `{}`", key),
        }
    }

    async fn hash_len(&mut self, key: &str) -> Result<u64, SampleError> {
        match self.value(key) {
            Value::Hash(fields) => Ok(fields.len() as u64),
            _ => panic!("hash probe on non-hash key `{}`", key),
        }
    }

    async fn hash_fields(&mut self, key: &str) -> Result<Vec<String>, SampleError> {
        match self.value(key) {
            Value::Hash(fields) => Ok(fields.iter().map(|(name, _)| name.clone()).collect()),
            _ => panic!("hash probe on non-hash key `{}`", key),
        }
    }

    async fn hash_value(
        &mut self,
        key: &str,
        field: &str,
    ) -> Result<Option<Vec<u8>>, SampleError> {
        match self.value(key) {
            Value::Hash(fields) => Ok(fields
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| value.clone())),
            _ => panic!("hash probe on non-hash key `{}`", key),
        }
    }

    async fn string_len(&mut self, key: &str) -> Result<u64, SampleError> {
        match self.value(key) {
            Value::Str(value) => Ok(value.len() as u64),
            _ => panic!("string probe on non-string key `{}`", key),
        }
    }
}

fn buckets(entries: &[(Bucket, u64)]) -> BTreeMap<Bucket, u64> {
    entries.iter().cloned().collect()
}

#[tokio::test]
async fn samples_strings_and_an_empty_hash() {
    let store = FixtureStore::new(vec![
        ("user:1", Value::Str(b"hello".to_vec())),
        ("user:2", Value::Str(b"goodbye".to_vec())),
        ("session:9", Value::Hash(Vec::new())),
    ]);

    let mut sampler = Sampler::new(store, 3);
    sampler.run().await.unwrap();
    let tables = sampler.tables();

    let mut user_types = BTreeMap::new();
    user_types.insert(KeyType::String, 2);
    assert_eq!(tables.types.get("user"), Some(&user_types));

    let mut session_types = BTreeMap::new();
    session_types.insert(KeyType::Hash, 1);
    assert_eq!(tables.types.get("session"), Some(&session_types));

    assert_eq!(
        tables.string_size.get("user"),
        Some(&buckets(&[(Bucket::Value(5), 1), (Bucket::Value(7), 1)]))
    );

    // The empty hash contributes an `unknown` observation to both
    // size metrics and nothing to the field-count metric.
    assert_eq!(
        tables.hash_field_size.get("session"),
        Some(&buckets(&[(Bucket::Unknown, 1)]))
    );
    assert_eq!(
        tables.hash_value_size.get("session"),
        Some(&buckets(&[(Bucket::Unknown, 1)]))
    );
    assert!(tables.hash_len.is_empty());

    assert_eq!(
        tables.expires.get("user"),
        Some(&buckets(&[(Bucket::Unknown, 2)]))
    );
    assert_eq!(
        tables.expires.get("session"),
        Some(&buckets(&[(Bucket::Unknown, 1)]))
    );
}

#[tokio::test]
async fn empty_store_aborts_the_run() {
    let mut sampler = Sampler::new(FixtureStore::new(Vec::new()), 5);
    let err = sampler.run().await.unwrap_err();
    assert!(matches!(err, SampleError::EmptyStore));
    assert!(sampler.tables().types.is_empty());
}

#[tokio::test]
async fn collections_record_cardinality_and_sampled_element_size() {
    let store = FixtureStore::new(vec![
        (
            "board:1",
            Value::SortedSet(vec![b"ab".to_vec(), b"cdef".to_vec(), b"g".to_vec()]),
        ),
        ("tags:1", Value::Set(vec![b"red".to_vec(), b"blue".to_vec()])),
        ("queue:1", Value::List(vec![b"payload".to_vec()])),
        (
            "profile:1",
            Value::Hash(vec![
                ("name".to_owned(), b"arthur".to_vec()),
                ("city".to_owned(), b"london".to_vec()),
            ]),
        ),
    ])
    .with_ttl("queue:1", 30);

    // Two full passes over the fixture.
    let mut sampler = Sampler::new(store, 8);
    sampler.run().await.unwrap();
    let tables = sampler.tables();

    assert_eq!(
        tables.zset_card.get("board"),
        Some(&buckets(&[(Bucket::Value(3), 2)]))
    );
    assert_eq!(
        tables.zset_elem_size.get("board"),
        Some(&buckets(&[(Bucket::Value(2), 2)]))
    );

    assert_eq!(
        tables.set_card.get("tags"),
        Some(&buckets(&[(Bucket::Value(2), 2)]))
    );
    assert_eq!(
        tables.set_elem_size.get("tags"),
        Some(&buckets(&[(Bucket::Value(3), 2)]))
    );

    assert_eq!(
        tables.list_len.get("queue"),
        Some(&buckets(&[(Bucket::Value(1), 2)]))
    );
    assert_eq!(
        tables.list_elem_size.get("queue"),
        Some(&buckets(&[(Bucket::Value(7), 2)]))
    );

    // The first hash field is sampled: 4-byte name, 6-byte value.
    assert_eq!(
        tables.hash_len.get("profile"),
        Some(&buckets(&[(Bucket::Value(2), 2)]))
    );
    assert_eq!(
        tables.hash_field_size.get("profile"),
        Some(&buckets(&[(Bucket::Value(4), 2)]))
    );
    assert_eq!(
        tables.hash_value_size.get("profile"),
        Some(&buckets(&[(Bucket::Value(6), 2)]))
    );

    assert_eq!(
        tables.expires.get("queue"),
        Some(&buckets(&[(Bucket::Value(30), 2)]))
    );
}

#[tokio::test]
async fn per_prefix_type_counts_sum_to_the_sample_size() {
    let store = FixtureStore::new(vec![
        ("user:1", Value::Str(b"a".to_vec())),
        ("user:2", Value::Str(b"bb".to_vec())),
        ("user:3", Value::List(vec![b"x".to_vec()])),
        ("session:1", Value::Hash(vec![("f".to_owned(), b"v".to_vec())])),
        ("counter", Value::Str(Vec::new())),
    ]);

    let sample_size = 10;
    let mut sampler = Sampler::new(store, sample_size);
    sampler.run().await.unwrap();
    let tables = sampler.tables();

    let total_typed: u64 = ["user", "session", "counter"]
        .iter()
        .filter_map(|prefix| tables.types.get(prefix))
        .flat_map(|buckets| buckets.values())
        .sum();
    assert_eq!(total_typed, sample_size as u64);

    let total_expires: u64 = ["user", "session", "counter"]
        .iter()
        .filter_map(|prefix| tables.expires.get(prefix))
        .flat_map(|buckets| buckets.values())
        .sum();
    assert_eq!(total_expires, sample_size as u64);

    // A zero-length string is still recorded.
    assert_eq!(
        tables.string_size.get("counter"),
        Some(&buckets(&[(Bucket::Value(0), 2)]))
    );
}

#[tokio::test]
async fn unrecognized_types_are_counted_but_not_probed() {
    let store = FixtureStore::new(vec![
        ("events:1", Value::Foreign("stream")),
        ("user:1", Value::Str(b"abc".to_vec())),
    ]);

    let mut sampler = Sampler::new(store, 2);
    // A probe against the foreign key would panic in the fixture; the
    // run completing proves none was issued.
    sampler.run().await.unwrap();
    let tables = sampler.tables();

    let mut expected = BTreeMap::new();
    expected.insert(KeyType::Other("stream".to_owned()), 1);
    assert_eq!(tables.types.get("events"), Some(&expected));
    assert_eq!(
        tables.expires.get("events"),
        Some(&buckets(&[(Bucket::Unknown, 1)]))
    );
}
