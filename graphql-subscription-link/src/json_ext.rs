//! JSON helpers shared by requests, responses and the request context.

use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
pub use serde_json_bytes::Value;

/// A JSON object.
pub type Object = Map<ByteString, Value>;

/// Extension trait for [`Value`].
pub trait ValueExt {
    /// Returns the value as an [`Object`], treating anything that is not an object as empty.
    ///
    /// GraphQL variables and extensions are objects on the wire, but producers are known to send
    /// `null` or leave them out entirely. Both mean "nothing was sent".
    fn into_object_or_default(self) -> Object;
}

impl ValueExt for Value {
    fn into_object_or_default(self) -> Object {
        match self {
            Value::Object(object) => object,
            _ => Object::new(),
        }
    }
}
