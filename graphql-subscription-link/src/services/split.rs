//! Routes each operation to the subscription link or to the results link.

use std::task::Poll;

use futures::future::BoxFuture;
use tower::BoxError;
use tower::Service;
use tower::ServiceExt;

use crate::services::link::Link;
use crate::services::link::Request;
use crate::services::link::Response;
use crate::spec::Document;
use crate::spec::MainDefinition;
use crate::spec::OperationKind;
use crate::spec::SpecError;
use crate::spec::main_definition;

/// Whether the main definition of `document` is a subscription operation.
///
/// Errors from resolving the main definition are returned as is.
pub fn is_subscription(document: &Document) -> Result<bool, SpecError> {
    Ok(matches!(
        main_definition(document)?,
        MainDefinition::Operation(OperationKind::Subscription)
    ))
}

/// Sends subscriptions to one link and every other operation to another.
///
/// The decision is taken again for every operation.
#[derive(Clone)]
pub struct SplitService {
    subscriptions: Link,
    results: Link,
}

impl SplitService {
    pub fn new(subscriptions: Link, results: Link) -> Self {
        Self {
            subscriptions,
            results,
        }
    }
}

impl Service<Request> for SplitService {
    type Response = Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Each call drives a fresh clone of the selected link to readiness.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let subscription = match is_subscription(&request.operation.document) {
            Ok(subscription) => subscription,
            Err(err) => return Box::pin(async move { Err(BoxError::from(err)) }),
        };
        tracing::debug!(
            operation.name = request.operation.operation_name.as_deref().unwrap_or_default(),
            subscription,
            "routing operation"
        );
        let link = if subscription {
            self.subscriptions.clone()
        } else {
            self.results.clone()
        };
        Box::pin(link.oneshot(request))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde_json_bytes::json;
    use tower::service_fn;

    use super::*;
    use crate::graphql;
    use crate::services::link::Operation;

    fn named(name: &'static str) -> Link {
        Link::new(service_fn(move |_request: Request| async move {
            Ok::<_, BoxError>(Response::once(graphql::Response::from_data(json!(name))))
        }))
    }

    async fn route(query: &str) -> Result<graphql::Response, BoxError> {
        let split = SplitService::new(named("subscriptions"), named("results"));
        let request = Request::new(Operation::parse(query).unwrap());
        let mut response = split.oneshot(request).await?.response;
        response.next().await.unwrap()
    }

    #[test]
    fn selector_classifies_documents() {
        let classify = |query: &str| is_subscription(&Document::parse(query).unwrap());
        assert_eq!(classify("{ me }"), Ok(false));
        assert_eq!(classify("mutation { like }"), Ok(false));
        assert_eq!(classify("subscription { liked }"), Ok(true));
        assert_eq!(classify("fragment F on User { id }"), Ok(false));
    }

    #[tokio::test]
    async fn routes_by_operation_kind() {
        let expected = [
            ("query Q { me }", "results"),
            ("mutation M { like }", "results"),
            ("subscription S { liked }", "subscriptions"),
        ];
        for (query, link) in expected {
            let response = route(query).await.unwrap();
            assert_eq!(response.data, Some(json!(link)), "{query}");
        }
    }

    #[tokio::test]
    async fn selector_errors_are_returned_unchanged() {
        let err = route("query A { a } query B { b }").await.unwrap_err();
        let err = err.downcast::<SpecError>().unwrap();
        assert_eq!(*err, SpecError::AmbiguousDocument(2));
    }
}
