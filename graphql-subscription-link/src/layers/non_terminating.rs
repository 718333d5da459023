//! Stages that learn something about an operation without terminating the chain.
//!
//! A [`NonTerminatingService`] runs a probe for the operation it receives. Every value the probe
//! emits is recorded in the request [`Context`](crate::Context) under the stage name, and the
//! request is forwarded to the next service once per value. The results of all forwarded calls
//! are merged into the stage's own result stream.

use std::fmt;
use std::task::Poll;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use tower::BoxError;
use tower::Layer;
use tower::Service;
use tower::ServiceExt;
use tower::util::BoxCloneSyncService;

use crate::json_ext::Value;
use crate::services::link::Link;
use crate::services::link::Request;
use crate::services::link::Response;
use crate::services::link::ResultStream;

/// A probe as stored by a [`NonTerminatingLayer`].
pub type BoxProbe = BoxCloneSyncService<Request, ProbeResponse, BoxError>;

/// What a probe hands back to its stage.
pub struct ProbeResponse {
    /// The request as the probe left it. Probes may rewrite the operation before it is forwarded.
    pub request: Request,

    /// The values to record, one forwarding per value.
    pub emissions: BoxStream<'static, Result<Value, BoxError>>,
}

impl fmt::Debug for ProbeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeResponse")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Uses a link as a probe.
///
/// The link is called with a copy of the request; each GraphQL response it emits is recorded as
/// JSON. The request itself is forwarded untouched.
///
/// Every response is a separate emission: a link answering twice makes the stage forward the
/// operation twice, so the next service is called once per response.
///
/// The link's result stream is owned by the stage's result stream. Dropping the latter drops the
/// former, along with whatever the link opened for it.
#[derive(Clone)]
pub struct LinkProbe {
    link: Link,
}

impl LinkProbe {
    pub fn new(link: Link) -> Self {
        Self { link }
    }
}

impl Service<Request> for LinkProbe {
    type Response = ProbeResponse;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let link = self.link.clone();
        Box::pin(async move {
            let response = link.oneshot(request.clone()).await?;
            let emissions = response
                .response
                .map(|result| {
                    result.and_then(|response| {
                        serde_json_bytes::to_value(response).map_err(BoxError::from)
                    })
                })
                .boxed();
            Ok(ProbeResponse { request, emissions })
        })
    }
}

/// [`Layer`] for [`NonTerminatingService`].
#[derive(Clone)]
pub struct NonTerminatingLayer {
    name: &'static str,
    probe: BoxProbe,
}

impl NonTerminatingLayer {
    pub fn new<P>(name: &'static str, probe: P) -> Self
    where
        P: Service<Request, Response = ProbeResponse, Error = BoxError>
            + Clone
            + Send
            + Sync
            + 'static,
        P::Future: Send + 'static,
    {
        Self {
            name,
            probe: BoxProbe::new(probe),
        }
    }
}

impl<S> Layer<S> for NonTerminatingLayer
where
    S: Service<Request, Response = Response, Error = BoxError> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Service = NonTerminatingService;

    fn layer(&self, next: S) -> Self::Service {
        NonTerminatingService {
            name: self.name,
            probe: self.probe.clone(),
            next: Link::new(next),
        }
    }
}

/// Runs a probe, records its emissions and forwards the operation.
#[derive(Clone)]
pub struct NonTerminatingService {
    name: &'static str,
    probe: BoxProbe,
    next: Link,
}

impl Service<Request> for NonTerminatingService {
    type Response = Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let name = self.name;
        let probe = self.probe.clone();
        let next = self.next.clone();

        Box::pin(async move {
            // The probe may rewrite the operation, so it runs to completion before anything is
            // forwarded.
            let ProbeResponse { request, emissions } = probe.oneshot(request).await?;
            let cancelled = request.cancellation.clone().cancelled_owned();

            let forwarded = emissions
                .then(move |emission| forward(name, next.clone(), request.clone(), emission))
                .flatten_unordered(None)
                .take_until(cancelled)
                .boxed();

            Ok(Response::new(forwarded))
        })
    }
}

async fn forward(
    name: &'static str,
    next: Link,
    mut request: Request,
    emission: Result<Value, BoxError>,
) -> ResultStream {
    let value = match emission {
        Ok(value) => value,
        Err(err) => return Response::error(err).response,
    };
    tracing::trace!(stage = name, "forwarding operation");
    request.context.insert_json_value(name, value);
    match next.oneshot(request).await {
        Ok(response) => response.response,
        Err(err) => Response::error(err).response,
    }
}
