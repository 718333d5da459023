use serde::Deserialize;
use serde::Serialize;

use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::json_ext::ValueExt;

/// The body of a GraphQL request as sent over HTTP.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Request {
    /// The GraphQL operation (e.g., query, mutation) string.
    ///
    /// For historical purposes, the term "query" is commonly used to refer to
    /// *any* GraphQL operation which might be, e.g., a `mutation`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub query: Option<String>,

    /// The (optional) GraphQL operation name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operation_name: Option<String>,

    /// The (optional) GraphQL variables in the form of a JSON object.
    #[serde(
        skip_serializing_if = "Object::is_empty",
        default,
        deserialize_with = "deserialize_object_or_default"
    )]
    pub variables: Object,

    /// The (optional) GraphQL `extensions` of a GraphQL request.
    #[serde(
        skip_serializing_if = "Object::is_empty",
        default,
        deserialize_with = "deserialize_object_or_default"
    )]
    pub extensions: Object,
}

// NOTE: `null` and non-object values are read as an empty object.
fn deserialize_object_or_default<'de, D>(deserializer: D) -> Result<Object, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(ValueExt::into_object_or_default)
}

impl Request {
    pub(crate) fn new(
        query: String,
        operation_name: Option<String>,
        variables: Object,
        extensions: Object,
    ) -> Self {
        Self {
            query: Some(query),
            operation_name,
            variables,
            extensions,
        }
    }
}
