//! Control events: out-of-band signals riding along with subscription variables.
//!
//! Producers of operations may put a value under [`CONTROL_EVENTS_KEY`] in the variables of a
//! subscription. It is not a GraphQL variable: the [`ControlEvents`] probe takes it out before the
//! operation goes any further, and the handshake link finds it in the request context instead.

use std::task::Poll;

use futures::StreamExt;
use futures::future;
use futures::future::ready;
use futures::stream::once;
use tower::BoxError;
use tower::Service;

use crate::Context;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::layers::non_terminating::ProbeResponse;
use crate::services::link::Request;

/// The variable under which operations carry control events.
///
/// This is part of the contract with operation producers and must not change.
pub const CONTROL_EVENTS_KEY: &str = "@@controlEvents";

/// Context key of the stage extracting control events.
pub const CONTROL_MESSAGES_KEY: &str = "controlMessages";

/// Context key of the stage probing the results fetcher for subscription information.
pub const SUBSCRIPTION_INFO_KEY: &str = "subsInfo";

/// Moves control events from the operation variables to the request context.
///
/// Always emits exactly one value, `{ "@@controlEvents": <events> }`, with `null` when the
/// operation carried none. Owns no resources.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlEvents;

impl Service<Request> for ControlEvents {
    type Response = ProbeResponse;
    type Error = BoxError;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let control_events = request.operation.variables.remove(CONTROL_EVENTS_KEY);
        tracing::trace!(
            found = control_events.is_some(),
            "extracted control events from variables"
        );

        let mut emitted = Object::new();
        emitted.insert(CONTROL_EVENTS_KEY, control_events.unwrap_or(Value::Null));

        future::ok(ProbeResponse {
            request,
            emissions: once(ready(Ok(Value::Object(emitted)))).boxed(),
        })
    }
}

/// The control events recorded for an operation, if the control events stage ran and found any.
pub fn control_events(context: &Context) -> Option<&Value> {
    context
        .get_json_value(CONTROL_MESSAGES_KEY)?
        .as_object()?
        .get(CONTROL_EVENTS_KEY)
        .filter(|events| !events.is_null())
}
