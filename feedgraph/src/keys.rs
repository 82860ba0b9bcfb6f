/// Key-construction helpers for the Redis-backed document store.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str) -> Self {
        Self { prefix }
    }

    /// JSON body of one document.
    pub fn document(&self, collection: &str, entity_id: &str) -> String {
        format!("{}:{}:{}", self.prefix, collection, entity_id)
    }

    /// Sorted set of document ids scored by insertion sequence.
    pub fn index(&self, collection: &str) -> String {
        format!("{}:{}:_index", self.prefix, collection)
    }

    /// Monotonic counter feeding the insertion sequence.
    pub fn sequence(&self, collection: &str) -> String {
        format!("{}:{}:_seq", self.prefix, collection)
    }

    /// Pattern matching every key of the namespace (for cleanup).
    pub fn namespace_pattern(&self) -> String {
        format!("{}:*", self.prefix)
    }
}
