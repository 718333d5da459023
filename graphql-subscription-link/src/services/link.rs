//! The types that flow through a link chain.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use futures::future::ready;
use futures::stream::BoxStream;
use futures::stream::once;
use static_assertions::assert_impl_all;
use tokio_util::sync::CancellationToken;
use tower::BoxError;

use crate::Context;
use crate::graphql;
use crate::json_ext::Object;
use crate::spec::Document;
use crate::spec::SpecError;

/// The results of one operation.
///
/// `Err` items are the error channel of the stream: transport faults travel there unchanged.
pub type ResultStream = BoxStream<'static, Result<graphql::Response, BoxError>>;

/// A stage of the pipeline.
///
/// Links are cheap to clone; a clone is taken for every operation, so that operations never share
/// per-call state.
pub type Link = tower::util::BoxCloneSyncService<Request, Response, BoxError>;

/// One GraphQL operation: its document, name, variables and extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    /// The parsed document, shared between clones.
    pub document: Arc<Document>,

    /// The (optional) GraphQL operation name.
    pub operation_name: Option<String>,

    /// The GraphQL variables. A request without variables has an empty map here.
    pub variables: Object,

    /// The GraphQL `extensions` of the request.
    pub extensions: Object,
}

impl Operation {
    pub fn new(document: Arc<Document>) -> Self {
        Self {
            document,
            operation_name: None,
            variables: Object::new(),
            extensions: Object::new(),
        }
    }

    /// Parse `query` into a new operation.
    pub fn parse(query: impl Into<String>) -> Result<Self, SpecError> {
        Ok(Self::new(Document::parse(query)?))
    }

    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    pub fn with_variables(mut self, variables: Object) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_extensions(mut self, extensions: Object) -> Self {
        self.extensions = extensions;
        self
    }

    /// The request body to send to a GraphQL server.
    pub fn to_graphql_request(&self) -> graphql::Request {
        graphql::Request::new(
            self.document.source().to_string(),
            self.operation_name.clone(),
            self.variables.clone(),
            self.extensions.clone(),
        )
    }
}

impl TryFrom<graphql::Request> for Operation {
    type Error = SpecError;

    fn try_from(request: graphql::Request) -> Result<Self, Self::Error> {
        let query = request.query.ok_or(SpecError::MissingQuery)?;
        Ok(Self {
            document: Document::parse(query)?,
            operation_name: request.operation_name,
            variables: request.variables,
            extensions: request.extensions,
        })
    }
}

assert_impl_all!(Request: Send, Sync);
/// The input of every link.
///
/// A request owns its [`Context`]: stages that learn something about the operation record it
/// there for the stages after them.
#[derive(Clone, Debug)]
pub struct Request {
    pub operation: Operation,

    /// Metadata accumulated by earlier stages.
    pub context: Context,

    /// Cancelled when the caller is no longer interested in results.
    pub cancellation: CancellationToken,
}

impl Request {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            context: Context::new(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// The output of every link: a lazy stream of results.
pub struct Response {
    pub response: ResultStream,
}

impl Response {
    pub fn new(response: ResultStream) -> Self {
        Self { response }
    }

    /// A response emitting exactly one result.
    pub fn once(response: graphql::Response) -> Self {
        Self::new(once(ready(Ok(response))).boxed())
    }

    /// A response whose only item is `error`, on the error channel.
    pub fn error(error: impl Into<BoxError>) -> Self {
        Self::new(once(ready(Err(error.into()))).boxed())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response").finish_non_exhaustive()
    }
}
