use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;

/// Value of a problem extension member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtensionValue {
    Text(String),
    List(Vec<String>),
}

impl From<String> for ExtensionValue {
    fn from(value: String) -> Self {
        ExtensionValue::Text(value)
    }
}

impl From<&str> for ExtensionValue {
    fn from(value: &str) -> Self {
        ExtensionValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for ExtensionValue {
    fn from(values: Vec<String>) -> Self {
        ExtensionValue::List(values)
    }
}

/// Insertion-ordered extension members.
///
/// Re-inserting a key replaces its value in place, keeping the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions(Vec<(String, ExtensionValue)>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ExtensionValue>) {
        let key = key.into();
        let value = value.into();

        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ExtensionValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Extensions
where
    K: Into<String>,
    V: Into<ExtensionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut extensions = Extensions::new();
        for (key, value) in iter {
            extensions.insert(key, value);
        }
        extensions
    }
}

impl Serialize for Extensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let extensions: Extensions = [("zeta", "1"), ("alpha", "2"), ("mid", "3")]
            .into_iter()
            .collect();

        assert_eq!(
            extensions.keys().collect::<Vec<_>>(),
            vec!["zeta", "alpha", "mid"]
        );
        assert_eq!(
            serde_json::to_string(&extensions).unwrap(),
            r#"{"zeta":"1","alpha":"2","mid":"3"}"#
        );
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut extensions = Extensions::new();
        extensions.insert("a", "first");
        extensions.insert("b", "second");
        extensions.insert("a", vec!["x".to_string(), "y".to_string()]);

        assert_eq!(extensions.len(), 2);
        assert_eq!(extensions.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            extensions.get("a"),
            Some(&ExtensionValue::List(vec!["x".to_string(), "y".to_string()]))
        );
    }
}
