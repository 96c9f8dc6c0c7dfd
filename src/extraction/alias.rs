//! Case-insensitive, prioritized field lookup.
//!
//! Build an [`AliasIndex`] once over a set of named values such as HTTP
//! headers and resolve fields by trying a list of aliases in priority
//! order.

use std::collections::HashMap;

/// Lowercased key -> value index. The first value seen for a key wins.
#[derive(Debug, Clone)]
pub struct AliasIndex<'a, V: ?Sized> {
    by_key: HashMap<String, &'a V>,
}

impl<'a, V: ?Sized> AliasIndex<'a, V> {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, &'a V)>,
        K: AsRef<str>,
    {
        let mut by_key = HashMap::new();
        for (key, value) in pairs {
            by_key
                .entry(key.as_ref().to_ascii_lowercase())
                .or_insert(value);
        }
        Self { by_key }
    }

    /// First alias present, in the order given.
    pub fn lookup(&self, aliases: &[&str]) -> Option<&'a V> {
        aliases
            .iter()
            .find_map(|alias| self.by_key.get(&alias.to_ascii_lowercase()).copied())
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl<'a> AliasIndex<'a, str> {
    /// Index `(name, value)` string pairs such as HTTP headers.
    pub fn from_headers(headers: &'a [(String, String)]) -> Self {
        Self::from_pairs(headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let headers = vec![
            ("x-sitrep-timestamp".to_string(), "1700000000".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        let index = AliasIndex::from_headers(&headers);
        assert_eq!(index.lookup(&["X-SITREP-TIMESTAMP"]), Some("1700000000"));
        assert_eq!(index.lookup(&["content-type"]), Some("application/json"));
        assert_eq!(index.lookup(&["x-missing"]), None);
    }

    #[test]
    fn test_alias_priority() {
        let headers = vec![
            ("X-Real-IP".to_string(), "3.3.3.3".to_string()),
            ("x-forwarded-for".to_string(), "4.4.4.4".to_string()),
        ];
        let index = AliasIndex::from_headers(&headers);
        assert_eq!(
            index.lookup(&["X-Forwarded-For", "x-real-ip"]),
            Some("4.4.4.4")
        );
        assert_eq!(
            index.lookup(&["x-missing", "X-REAL-IP", "x-forwarded-for"]),
            Some("3.3.3.3")
        );
    }

    #[test]
    fn test_first_duplicate_wins() {
        let headers = vec![
            ("X-Forwarded-For".to_string(), "1.1.1.1".to_string()),
            ("x-forwarded-for".to_string(), "2.2.2.2".to_string()),
        ];
        let index = AliasIndex::from_headers(&headers);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(&["x-forwarded-for"]), Some("1.1.1.1"));
    }
}
