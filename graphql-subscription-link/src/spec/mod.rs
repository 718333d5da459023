//! GraphQL document handling.
//!
//! Parsing and main-definition lookup for the documents carried by operations. The link only
//! needs to know what kind of operation a document holds; validation against a schema is the
//! server's business.

mod document;

use displaydoc::Display;
use thiserror::Error;

pub use self::document::Document;
pub use self::document::MainDefinition;
pub use self::document::OperationKind;
pub use self::document::main_definition;

/// GraphQL document errors.
#[derive(Error, Debug, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpecError {
    /// the request has no query
    MissingQuery,
    /// parsing error: {0}
    ParseError(String),
    /// definitions other than operations and fragments are not allowed in queries, found {0}
    NonExecutableDefinition(String),
    /// ambiguous GraphQL document: contains {0} operations
    AmbiguousDocument(usize),
    /// expected a parsed GraphQL query with a query, mutation, subscription, or a fragment
    NoMainDefinition,
}
