use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;

use crate::extensions::Extensions;

/// Media type of a serialized [`ProblemDocument`].
pub const PROBLEM_JSON_CONTENT_TYPE: &str = "application/problem+json";

/// RFC 7807 problem details.
///
/// Extension members are flattened into the top-level object after the
/// standard members, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDocument {
    pub type_url: String,
    pub title: String,
    pub detail: Option<String>,
    pub status: u16,
    pub instance: String,
    pub extensions: Extensions,
}

impl ProblemDocument {
    pub(crate) const RESERVED_MEMBERS: [&'static str; 5] =
        ["type", "title", "detail", "status", "instance"];
}

impl Serialize for ProblemDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.type_url)?;
        map.serialize_entry("title", &self.title)?;
        if let Some(detail) = &self.detail {
            map.serialize_entry("detail", detail)?;
        }
        map.serialize_entry("status", &self.status)?;
        map.serialize_entry("instance", &self.instance)?;
        for (key, value) in self.extensions.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
