use {
    serde_json::Map,
    sha2::{
        Digest,
        Sha256,
    },
    std::fmt,
};

pub type Namespace = String;
pub type EntityKey = String;

/// Structured value held by the cache: a tagged union of scalars, sequences and mappings.
pub type Value = serde_json::Value;
pub type Arguments = Map<String, Value>;

/// Content hash used to deduplicate concurrent operations.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Deterministic serialization of a value into a hasher.
///
/// Equal logical inputs must feed identical bytes, independent of map insertion order.
/// Every variant is prefixed with a tag and every variable-length item with its length,
/// so distinct inputs cannot collide by concatenation.
pub trait CanonicalHash {
    fn feed(&self, hasher: &mut Sha256);

    fn content_hash(&self) -> ContentHash {
        let mut hasher = Sha256::new();
        self.feed(&mut hasher);
        ContentHash(hasher.finalize().into())
    }
}

fn feed_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

impl CanonicalHash for str {
    fn feed(&self, hasher: &mut Sha256) {
        hasher.update([b's']);
        feed_bytes(hasher, self.as_bytes());
    }
}

impl CanonicalHash for String {
    fn feed(&self, hasher: &mut Sha256) {
        self.as_str().feed(hasher)
    }
}

impl CanonicalHash for u64 {
    fn feed(&self, hasher: &mut Sha256) {
        hasher.update([b'u']);
        hasher.update(self.to_be_bytes());
    }
}

impl CanonicalHash for Map<String, Value> {
    fn feed(&self, hasher: &mut Sha256) {
        let mut entries: Vec<(&String, &Value)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        hasher.update([b'm']);
        hasher.update((entries.len() as u64).to_be_bytes());
        for (key, value) in entries {
            key.feed(hasher);
            value.feed(hasher);
        }
    }
}

impl CanonicalHash for Value {
    fn feed(&self, hasher: &mut Sha256) {
        match self {
            Value::Null => hasher.update([b'n']),
            Value::Bool(value) => hasher.update([b'b', *value as u8]),
            // Number's textual form is canonical for a given numeric variant.
            Value::Number(number) => {
                hasher.update([b'#']);
                feed_bytes(hasher, number.to_string().as_bytes());
            }
            Value::String(value) => value.feed(hasher),
            Value::Array(values) => {
                hasher.update([b'a']);
                hasher.update((values.len() as u64).to_be_bytes());
                for value in values {
                    value.feed(hasher);
                }
            }
            Value::Object(map) => map.feed(hasher),
        }
    }
}

impl<A: CanonicalHash, B: CanonicalHash> CanonicalHash for (A, B) {
    fn feed(&self, hasher: &mut Sha256) {
        self.0.feed(hasher);
        self.1.feed(hasher);
    }
}

impl<A: CanonicalHash, B: CanonicalHash, C: CanonicalHash> CanonicalHash for (A, B, C) {
    fn feed(&self, hasher: &mut Sha256) {
        self.0.feed(hasher);
        self.1.feed(hasher);
        self.2.feed(hasher);
    }
}
