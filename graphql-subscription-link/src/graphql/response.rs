use serde::Deserialize;
use serde::Serialize;

use crate::graphql::Error;
use crate::json_ext::Object;
use crate::json_ext::Value;

/// A GraphQL response, as emitted on a result stream.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Response {
    /// The response data.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// The optional graphql errors encountered.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Error>,

    /// The optional graphql extensions.
    #[serde(skip_serializing_if = "Object::is_empty", default)]
    pub extensions: Object,
}

impl Response {
    /// A response carrying only data.
    pub fn from_data(data: impl Into<Value>) -> Self {
        Self {
            data: Some(data.into()),
            ..Default::default()
        }
    }

    /// Add an extension entry.
    pub fn with_extension(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extensions.insert(key, value.into());
        self
    }

    /// Whether this looks like a GraphQL response at all.
    ///
    /// A body with neither `data` nor `errors` is not a GraphQL response, even if it is valid JSON.
    pub(crate) fn is_graphql(&self) -> bool {
        self.data.is_some() || !self.errors.is_empty()
    }
}
