use serde::{Deserialize, Serialize};

/// Response header map.
///
/// Keys are stored lower-cased and values trimmed. Insertion order is kept;
/// inserting an existing key overwrites the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw header block.
    ///
    /// The first line is the status line and is skipped. Lines without a colon
    /// are ignored, duplicate names resolve to the last value.
    pub fn parse(block: &str) -> Self {
        let mut headers = Headers::new();
        for line in block.lines().skip(1) {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            headers.insert(key, value.trim());
        }
        headers
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        let key = key.to_lowercase();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.0.push((key, value.to_string())),
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
