//! Routes GraphQL operations between two transports.
//!
//! Queries and mutations are sent to a results fetcher (by default an HTTP link). Subscriptions
//! are handed to a stateful handshake transport, either through a generic chain that first strips
//! control events from the variables and probes the results fetcher for subscription metadata, or
//! directly to a real-time handshake link when a structured configuration is supplied.

#![warn(unreachable_pub)]

mod configuration;
mod context;
pub mod error;
mod factory;
pub mod graphql;
pub mod json_ext;
pub mod layers;
pub mod services;
pub mod spec;

pub use configuration::AuthOptions;
pub use configuration::LinkConfig;
pub use configuration::RealtimeConfig;
pub use configuration::generate_config_schema;
pub use context::Context;
pub use factory::LinkFactory;
pub use factory::MakeHandshake;
pub use factory::MakeRealtimeHandshake;
pub use layers::control_events::CONTROL_EVENTS_KEY;
pub use layers::control_events::CONTROL_MESSAGES_KEY;
pub use layers::control_events::SUBSCRIPTION_INFO_KEY;
pub use services::http_link::HttpLink;
pub use services::http_link::HttpLinkFactory;
pub use services::http_link::MakeHttpLink;
pub use services::link::Link;
pub use services::link::Operation;
