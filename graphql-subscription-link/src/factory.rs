//! Builds the link that routes operations between the results fetcher and a subscription
//! handshake.

use std::sync::Arc;

use tower::ServiceBuilder;

use crate::configuration::LinkConfig;
use crate::configuration::RealtimeConfig;
use crate::layers::ServiceBuilderExt;
use crate::layers::control_events::SUBSCRIPTION_INFO_KEY;
use crate::layers::non_terminating::LinkProbe;
use crate::services::SplitService;
use crate::services::http_link::HttpLinkFactory;
use crate::services::http_link::MakeHttpLink;
use crate::services::link::Link;

/// Builds the generic subscription handshake link.
///
/// The link is built once per [`LinkFactory::create_link`] call. For every subscription it finds
/// the subscription information under `metadata_key` in the request context, and the control
/// events under [`CONTROL_MESSAGES_KEY`](crate::CONTROL_MESSAGES_KEY).
pub trait MakeHandshake: Send + Sync + 'static {
    fn make(&self, metadata_key: &'static str) -> Link;
}

/// Builds the real-time subscription handshake link from its configuration.
pub trait MakeRealtimeHandshake: Send + Sync + 'static {
    fn make(&self, config: &RealtimeConfig) -> Link;
}

/// Creates links.
#[derive(Clone)]
pub struct LinkFactory {
    http: Arc<dyn MakeHttpLink>,
    handshake: Arc<dyn MakeHandshake>,
    realtime_handshake: Arc<dyn MakeRealtimeHandshake>,
}

impl LinkFactory {
    /// A factory using `handshake` and `realtime_handshake` for subscriptions, and
    /// [`HttpLinkFactory`] for results when no results fetcher is given.
    pub fn new(
        handshake: impl MakeHandshake,
        realtime_handshake: impl MakeRealtimeHandshake,
    ) -> Self {
        Self {
            http: Arc::new(HttpLinkFactory::default()),
            handshake: Arc::new(handshake),
            realtime_handshake: Arc::new(realtime_handshake),
        }
    }

    /// Replace the default results fetcher constructor.
    pub fn with_http(mut self, http: impl MakeHttpLink) -> Self {
        self.http = Arc::new(http);
        self
    }

    /// Create the link for `config`.
    ///
    /// Queries and mutations go to `results_fetcher`, or to an HTTP link bound to the configured
    /// URL when none is given. Subscriptions go to:
    /// * for a bare URL, the control events stage, then the results fetcher as a probe recording
    ///   its response under [`SUBSCRIPTION_INFO_KEY`], then the generic handshake;
    /// * for a real-time configuration, the real-time handshake alone.
    ///
    /// No I/O happens here.
    pub fn create_link(
        &self,
        config: impl Into<LinkConfig>,
        results_fetcher: Option<Link>,
    ) -> Link {
        let config = config.into();
        let results_fetcher = results_fetcher.unwrap_or_else(|| self.http.make(config.url()));

        let subscriptions = match &config {
            LinkConfig::Url(url) => {
                tracing::debug!(%url, "creating the generic subscription handshake chain");
                Link::new(
                    ServiceBuilder::new()
                        .control_events()
                        .non_terminating(
                            SUBSCRIPTION_INFO_KEY,
                            LinkProbe::new(results_fetcher.clone()),
                        )
                        .service(self.handshake.make(SUBSCRIPTION_INFO_KEY)),
                )
            }
            LinkConfig::Realtime(realtime) => {
                tracing::debug!(
                    url = %realtime.url,
                    "creating the real-time subscription handshake"
                );
                self.realtime_handshake.make(realtime)
            }
        };

        Link::new(SplitService::new(subscriptions, results_fetcher))
    }
}
