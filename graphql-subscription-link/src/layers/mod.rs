//! Reusable layers
use tower::BoxError;
use tower::Service;
use tower::ServiceBuilder;
use tower::layer::util::Stack;

use self::control_events::CONTROL_MESSAGES_KEY;
use self::control_events::ControlEvents;
use self::non_terminating::NonTerminatingLayer;
use self::non_terminating::ProbeResponse;
use crate::services::link::Request;

pub mod control_events;
pub mod non_terminating;

/// Extension to the [`ServiceBuilder`] trait to make it easy to add link specific stages to a
/// [`Service`].
pub trait ServiceBuilderExt<L>: Sized {
    /// Run `probe` for every operation, record what it emits in the request context under `name`
    /// and forward the operation to the rest of the chain.
    ///
    /// The probe does not terminate the chain: for each value it emits, the next service is
    /// called once with a request whose context holds that value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use tower::ServiceBuilder;
    /// # use graphql_subscription_link::Link;
    /// # use graphql_subscription_link::layers::ServiceBuilderExt;
    /// # use graphql_subscription_link::layers::non_terminating::LinkProbe;
    /// # fn test(results: Link, handshake: Link) {
    /// let _ = ServiceBuilder::new()
    ///     .non_terminating("subsInfo", LinkProbe::new(results))
    ///     .service(handshake);
    /// # }
    /// ```
    fn non_terminating<P>(
        self,
        name: &'static str,
        probe: P,
    ) -> ServiceBuilder<Stack<NonTerminatingLayer, L>>
    where
        P: Service<Request, Response = ProbeResponse, Error = BoxError>
            + Clone
            + Send
            + Sync
            + 'static,
        P::Future: Send + 'static,
    {
        self.layer(NonTerminatingLayer::new(name, probe))
    }

    /// Strip control events from the variables of every operation and record them in the request
    /// context under [`CONTROL_MESSAGES_KEY`].
    fn control_events(self) -> ServiceBuilder<Stack<NonTerminatingLayer, L>> {
        self.non_terminating(CONTROL_MESSAGES_KEY, ControlEvents)
    }

    /// Adds a new layer `T` into the [`ServiceBuilder`].
    fn layer<T>(self, layer: T) -> ServiceBuilder<Stack<T, L>>;
}

impl<L> ServiceBuilderExt<L> for ServiceBuilder<L> {
    fn layer<T>(self, layer: T) -> ServiceBuilder<Stack<T, L>> {
        ServiceBuilder::layer(self, layer)
    }
}
