use std::collections::HashMap;
use std::sync::Arc;

/// A named key/value lookup table usable as `{MapName:key}` in templates.
///
/// Keys compare case-insensitively.
#[derive(Debug, Clone)]
pub struct RewriteMap {
    name: String,
    default_value: Option<String>,
    entries: HashMap<String, String>,
}

impl RewriteMap {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_value: None,
            entries: HashMap::new(),
        }
    }

    /// Value returned for keys that are not in the map.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn entry(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_lowercase(), value.into());
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key`, falling back to the default value, then to empty text.
    #[must_use]
    pub fn lookup(&self, key: &str) -> &str {
        self.entries
            .get(&key.to_lowercase())
            .or(self.default_value.as_ref())
            .map_or("", String::as_str)
    }
}

/// The rewrite maps declared by a rule set, keyed case-insensitively by name.
#[derive(Debug, Clone, Default)]
pub struct RewriteMaps {
    maps: HashMap<String, Arc<RewriteMap>>,
}

impl RewriteMaps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a map, replacing any earlier map with the same name.
    pub fn add(&mut self, map: RewriteMap) {
        self.maps
            .insert(map.name().to_ascii_lowercase(), Arc::new(map));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<RewriteMap>> {
        self.maps.get(&name.to_ascii_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let map = RewriteMap::new("Legacy").entry("/About.aspx", "/about");
        assert_eq!(map.lookup("/about.ASPX"), "/about");
    }

    #[test]
    fn missing_key_uses_default_then_empty() {
        let map = RewriteMap::new("m").entry("a", "1");
        assert_eq!(map.lookup("b"), "");

        let map = map.default_value("/fallback");
        assert_eq!(map.lookup("b"), "/fallback");
        assert_eq!(map.lookup("a"), "1");
    }

    #[test]
    fn maps_by_name() {
        let mut maps = RewriteMaps::new();
        maps.add(RewriteMap::new("StaticRewrites"));
        assert!(maps.get("staticrewrites").is_some());
        assert!(maps.get("other").is_none());
        assert_eq!(maps.len(), 1);
    }
}
