//! Link errors.
use displaydoc::Display;
use serde::Serialize;
use thiserror::Error;

pub use crate::configuration::ConfigurationError;
use crate::graphql;
use crate::json_ext::Object;
use crate::json_ext::Value;
pub use crate::spec::SpecError;

/// Error types for the results fetcher.
///
/// These travel on the error channel of a result stream. A GraphQL response carrying `errors` is
/// not a fetch error.
#[derive(Error, Display, Debug, Clone, Serialize, Eq, PartialEq)]
#[serde(untagged)]
#[ignore_extra_doc_attributes]
#[non_exhaustive]
pub enum FetchError {
    /// service '{service}' response was malformed: {reason}
    SubrequestMalformedResponse {
        /// The service that responded with the malformed response.
        service: String,

        /// The reason the serialization failed.
        reason: String,
    },

    /// HTTP fetch failed from '{service}': {reason}
    ///
    /// note that this relates to a transport error and not a GraphQL error
    SubrequestHttpError {
        /// The HTTP status, when the server answered at all.
        status_code: Option<u16>,

        /// The service failed.
        service: String,

        /// The reason the fetch failed.
        reason: String,
    },
}

impl FetchError {
    /// The machine readable code for this error, as found in GraphQL error extensions.
    pub fn extension_code(&self) -> &'static str {
        match self {
            FetchError::SubrequestMalformedResponse { .. } => "SUBREQUEST_MALFORMED_RESPONSE",
            FetchError::SubrequestHttpError { .. } => "SUBREQUEST_HTTP_ERROR",
        }
    }

    /// Convert the fetch error to a GraphQL error.
    pub fn to_graphql_error(&self) -> graphql::Error {
        let mut extensions = match serde_json_bytes::to_value(self) {
            Ok(Value::Object(object)) => object,
            _ => Object::new(),
        };
        extensions
            .entry("code")
            .or_insert_with(|| self.extension_code().into());
        if let FetchError::SubrequestHttpError { status_code, .. } = self {
            extensions.remove("status_code");
            if let Some(status_code) = status_code {
                extensions.insert("http", serde_json_bytes::json!({ "status": status_code }));
            }
        }

        graphql::Error {
            message: self.to_string(),
            extensions,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn http_error_extensions() {
        let error = FetchError::SubrequestHttpError {
            status_code: Some(502),
            service: "https://example/graphql".to_string(),
            reason: "bad gateway".to_string(),
        };
        let graphql_error = error.to_graphql_error();

        assert_eq!(
            graphql_error.message,
            "HTTP fetch failed from 'https://example/graphql': bad gateway"
        );
        assert_eq!(
            graphql_error.extensions.get("code"),
            Some(&json!("SUBREQUEST_HTTP_ERROR"))
        );
        assert_eq!(
            graphql_error.extensions.get("http"),
            Some(&json!({ "status": 502 }))
        );
        assert!(graphql_error.extensions.get("status_code").is_none());
    }
}
