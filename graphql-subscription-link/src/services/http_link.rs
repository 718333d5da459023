//! The HTTP results fetcher.

use std::sync::Arc;
use std::task::Poll;

use futures::StreamExt;
use futures::future;
use futures::future::ready;
use futures::stream::once;
use http::HeaderValue;
use http::header::ACCEPT;
use http::header::CONTENT_TYPE;
use tower::BoxError;
use tower::Service;
use tracing::Instrument;
use url::Url;

use crate::error::FetchError;
use crate::graphql;
use crate::services::link::Link;
use crate::services::link::Request;
use crate::services::link::Response;

static APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");
static ACCEPT_GRAPHQL_JSON: HeaderValue =
    HeaderValue::from_static("application/graphql-response+json, application/json");

/// Builds the link that fetches results for queries and mutations.
pub trait MakeHttpLink: Send + Sync + 'static {
    fn make(&self, uri: &Url) -> Link;
}

/// Makes [`HttpLink`]s sharing one HTTP client.
#[derive(Clone, Debug, Default)]
pub struct HttpLinkFactory {
    client: reqwest::Client,
}

impl HttpLinkFactory {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl MakeHttpLink for HttpLinkFactory {
    fn make(&self, uri: &Url) -> Link {
        Link::new(HttpLink::new(self.client.clone(), uri.clone()))
    }
}

/// Sends each operation as a GraphQL POST request and emits the single response.
///
/// Nothing is sent until the result stream is polled. Dropping the stream, or cancelling the
/// request's token, abandons the HTTP call.
#[derive(Clone, Debug)]
pub struct HttpLink {
    client: reqwest::Client,
    uri: Arc<Url>,
}

impl HttpLink {
    pub fn new(client: reqwest::Client, uri: Url) -> Self {
        Self {
            client,
            uri: Arc::new(uri),
        }
    }
}

impl Service<Request> for HttpLink {
    type Response = Response;
    type Error = BoxError;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.client.clone();
        let uri = self.uri.clone();
        let Request {
            operation,
            cancellation,
            ..
        } = request;
        let body = operation.to_graphql_request();
        let span = tracing::info_span!("http_link", uri = %uri);

        let result = async move {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    tracing::debug!("operation cancelled before the HTTP response arrived");
                    None
                }
                result = fetch(client, &uri, &body) => Some(result),
            }
        }
        .instrument(span);

        future::ok(Response::new(once(result).filter_map(ready).boxed()))
    }
}

async fn fetch(
    client: reqwest::Client,
    uri: &Url,
    body: &graphql::Request,
) -> Result<graphql::Response, BoxError> {
    let service = uri.to_string();
    tracing::debug!(operation.name = ?body.operation_name, "sending GraphQL request");

    let response = client
        .post(uri.clone())
        .header(CONTENT_TYPE, APPLICATION_JSON.clone())
        .header(ACCEPT, ACCEPT_GRAPHQL_JSON.clone())
        .json(body)
        .send()
        .await
        .map_err(|err| FetchError::SubrequestHttpError {
            status_code: err.status().map(|status| status.as_u16()),
            service: service.clone(),
            reason: err.to_string(),
        })?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| FetchError::SubrequestHttpError {
            status_code: Some(status.as_u16()),
            service: service.clone(),
            reason: err.to_string(),
        })?;

    match serde_json::from_slice::<graphql::Response>(&bytes) {
        // A GraphQL body wins over the status code: servers report GraphQL errors with 4xx/5xx too.
        Ok(response) if response.is_graphql() => Ok(response),
        _ if !status.is_success() => Err(FetchError::SubrequestHttpError {
            status_code: Some(status.as_u16()),
            service,
            reason: format!("{status}: {}", String::from_utf8_lossy(&bytes)),
        }
        .into()),
        Ok(_) => Err(FetchError::SubrequestMalformedResponse {
            service,
            reason: "the response has neither data nor errors".to_string(),
        }
        .into()),
        Err(err) => Err(FetchError::SubrequestMalformedResponse {
            service,
            reason: err.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::body_json;
    use wiremock::matchers::header;
    use wiremock::matchers::method;
    use wiremock::matchers::path;

    use super::*;
    use crate::json_ext::ValueExt;
    use crate::services::link::Operation;

    async fn http_link(server: &MockServer) -> Link {
        let uri = Url::parse(&format!("{}/graphql", server.uri())).unwrap();
        HttpLinkFactory::default().make(&uri)
    }

    fn request() -> Request {
        Request::new(
            Operation::parse("query Me { me { id } }")
                .unwrap()
                .with_operation_name("Me")
                .with_variables(json!({"a": 1}).into_object_or_default())
                .with_extensions(json!({"clientLibrary": "test"}).into_object_or_default()),
        )
    }

    #[test_log::test(tokio::test)]
    async fn posts_the_operation_and_emits_the_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "query": "query Me { me { id } }",
                "operationName": "Me",
                "variables": { "a": 1 },
                "extensions": { "clientLibrary": "test" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": { "me": { "id": "1" } } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut results = http_link(&server)
            .await
            .oneshot(request())
            .await
            .unwrap()
            .response;

        let response = results.next().await.unwrap().unwrap();
        assert_eq!(response.data, Some(json!({ "me": { "id": "1" } })));
        assert!(results.next().await.is_none());
    }

    #[tokio::test]
    async fn links_share_the_factory_client() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-client-name", "subscription-link"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "data": { "ok": true } })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let mut headers = http::HeaderMap::new();
        headers.insert("x-client-name", HeaderValue::from_static("subscription-link"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap();
        let factory = HttpLinkFactory::new(client);
        let uri = Url::parse(&format!("{}/graphql", server.uri())).unwrap();

        for link in [factory.make(&uri), factory.make(&uri)] {
            let mut results = link.oneshot(request()).await.unwrap().response;
            let response = results.next().await.unwrap().unwrap();
            assert_eq!(response.data, Some(json!({ "ok": true })));
        }
    }

    #[tokio::test]
    async fn graphql_errors_are_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({ "errors": [{ "message": "Cannot query field" }] }),
            ))
            .mount(&server)
            .await;

        let mut results = http_link(&server)
            .await
            .oneshot(request())
            .await
            .unwrap()
            .response;

        let response = results.next().await.unwrap().unwrap();
        assert_eq!(response.errors[0].message, "Cannot query field");
    }

    #[tokio::test]
    async fn transport_failures_use_the_error_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let mut results = http_link(&server)
            .await
            .oneshot(request())
            .await
            .unwrap()
            .response;

        let err = results.next().await.unwrap().unwrap_err();
        match *err.downcast::<FetchError>().unwrap() {
            FetchError::SubrequestHttpError {
                status_code,
                reason,
                ..
            } => {
                assert_eq!(status_code, Some(502));
                assert!(reason.contains("bad gateway"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_graphql_bodies_are_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
            .mount(&server)
            .await;

        let mut results = http_link(&server)
            .await
            .oneshot(request())
            .await
            .unwrap()
            .response;

        let err = results.next().await.unwrap().unwrap_err();
        assert!(matches!(
            *err.downcast::<FetchError>().unwrap(),
            FetchError::SubrequestMalformedResponse { .. }
        ));
    }

    #[tokio::test]
    async fn nothing_is_sent_until_polled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let response = http_link(&server).await.oneshot(request()).await.unwrap();
        drop(response);
    }

    #[tokio::test]
    async fn cancelled_requests_end_without_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let mut results = http_link(&server)
            .await
            .oneshot(request().with_cancellation(cancellation))
            .await
            .unwrap()
            .response;

        assert!(results.next().await.is_none());
    }
}
