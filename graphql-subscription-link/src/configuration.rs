//! Link configuration.
//!
//! A link is configured either with a bare endpoint URL or with a structured real-time
//! configuration. In YAML or JSON the two shapes are told apart by their type alone: a string is a
//! URL, a mapping is a real-time configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not deserialize configuration: {0}
    DeserializeConfigError(#[from] serde_yaml::Error),
    /// invalid endpoint url: {0}
    InvalidUrl(#[from] url::ParseError),
}

/// How to reach the GraphQL endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum LinkConfig {
    /// Queries and mutations go to this URL over HTTP. Subscriptions use the generic handshake,
    /// fed with control events and the subscription information fetched from this URL.
    Url(Url),
    /// Subscriptions use the real-time handshake built from this configuration.
    Realtime(RealtimeConfig),
}

impl LinkConfig {
    /// The GraphQL endpoint, whatever the configuration shape.
    pub fn url(&self) -> &Url {
        match self {
            LinkConfig::Url(url) => url,
            LinkConfig::Realtime(config) => &config.url,
        }
    }

    /// Read a configuration from YAML (or JSON, which is a subset).
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl From<Url> for LinkConfig {
    fn from(url: Url) -> Self {
        LinkConfig::Url(url)
    }
}

impl From<RealtimeConfig> for LinkConfig {
    fn from(config: RealtimeConfig) -> Self {
        LinkConfig::Realtime(config)
    }
}

impl FromStr for LinkConfig {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(LinkConfig::Url(Url::parse(s)?))
    }
}

/// The JSON schema accepted by [`LinkConfig::from_yaml`], for editors and validation tooling.
pub fn generate_config_schema() -> RootSchema {
    schema_for!(LinkConfig)
}

/// Configuration of the real-time subscription handshake.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RealtimeConfig {
    /// The GraphQL endpoint. Queries and mutations are sent here over HTTP.
    pub url: Url,

    /// The region hosting the endpoint, used when signing requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// How the handshake authenticates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthOptions>,

    /// Close the connection when the server has not sent a keep-alive for this long.
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub keep_alive_timeout: Option<Duration>,
}

impl RealtimeConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            region: None,
            auth: None,
            keep_alive_timeout: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_auth(mut self, auth: AuthOptions) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_keep_alive_timeout(mut self, timeout: Duration) -> Self {
        self.keep_alive_timeout = Some(timeout);
        self
    }
}

/// Authentication of the real-time handshake.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthOptions {
    ApiKey { api_key: String },
    AwsIam,
    OpenidConnect { jwt_token: String },
    AmazonCognitoUserPools { jwt_token: String },
    AwsLambda { token: String },
}

// Secrets stay out of logs.
impl fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            AuthOptions::ApiKey { .. } => "ApiKey",
            AuthOptions::AwsIam => "AwsIam",
            AuthOptions::OpenidConnect { .. } => "OpenidConnect",
            AuthOptions::AmazonCognitoUserPools { .. } => "AmazonCognitoUserPools",
            AuthOptions::AwsLambda { .. } => "AwsLambda",
        };
        f.debug_tuple(kind).finish_non_exhaustive()
    }
}
