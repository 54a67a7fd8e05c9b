//! Document records held by the engine.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A corpus document.
/// Immutable once accepted; identity is `id`, unique within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub title: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub author: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub content: String,
}

impl Document {
    /// Validate one raw record.
    ///
    /// # Arguments
    /// * `position` - index of the record in its batch, reported on failure
    /// * `value` - the raw record
    pub fn from_value(position: usize, value: &Value) -> Result<Self> {
        let doc = Document::deserialize(value).map_err(|e| Error::DocumentValidation {
            position,
            reason: e.to_string(),
        })?;
        if doc.id.trim().is_empty() {
            return Err(Error::DocumentValidation { position, reason: "`id` must not be blank".into() });
        }
        Ok(doc)
    }

    /// Text that gets indexed for this document.
    pub fn indexable_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

/// A document returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: Document,
    /// Position of the document in the trained collection.
    /// This is the index accepted by relevance feedback.
    pub index: usize,
    pub relevancy: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(x) => x.to_string(),
        }
    }
}

/// Numbers are accepted where text is expected and kept in their decimal form.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(String::from)
}

pub(crate) fn optional_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

/// Same as `string_or_number`, for a list of ids.
pub(crate) fn strings_or_numbers<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Vec::<Scalar>::deserialize(deserializer)?;
    Ok(ids.into_iter().map(String::from).collect())
}
