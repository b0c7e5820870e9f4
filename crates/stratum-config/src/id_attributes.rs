//! Merge keys for repeatable elements.

use indexmap::IndexMap;

/// Maps an element path to the attribute that identifies repeatable elements
/// at that path.
///
/// Paths are slash-separated local element names starting at the document
/// element, without predicates: `/config/type` or `/config/type/argument`.
/// The map is built once and never changes afterwards; readers share it
/// behind an `Arc`.
///
/// ```rust
/// use stratum_config::IdAttributes;
///
/// let ids: IdAttributes = [("/config/type", "name"), ("config/preference/", "for")]
///     .into_iter()
///     .collect();
/// assert_eq!(ids.get("/config/type"), Some("name"));
/// assert_eq!(ids.get("/config/preference"), Some("for"));
/// assert_eq!(ids.get("/config"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAttributes {
    attributes: IndexMap<String, String>,
}

impl IdAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute name identifying elements at `path`, if any.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.attributes
            .get(normalize_path(path).as_str())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(path, attr)| (path.as_str(), attr.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for IdAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let attributes = iter
            .into_iter()
            .map(|(path, attr)| (normalize_path(path.as_ref()), attr.into()))
            .collect();
        Self { attributes }
    }
}

/// Ensure a leading slash and strip trailing ones.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    format!("/{}", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_entries_override_earlier() {
        let ids: IdAttributes = [("/config/type", "name"), ("/config/type", "id")]
            .into_iter()
            .collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get("/config/type"), Some("id"));
    }

    #[test]
    fn test_empty() {
        let ids = IdAttributes::new();
        assert!(ids.is_empty());
        assert_eq!(ids.get("/config"), None);
    }
}
