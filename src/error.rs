// Error types for vip-claim.
//
// Only configuration and bootstrap errors end the run. `ApiError` is always
// absorbed at the account boundary by the processor.

use thiserror::Error;

/// Problems with the `USERINFO` account list. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable USERINFO is not set")]
    MissingUserInfo,

    #[error("USERINFO could not be parsed: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("USERINFO must be a JSON array, got {found}")]
    NotAnArray { found: &'static str },
}

/// Failure to launch the auxiliary HTTP service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("service command is empty")]
    EmptyCommand,

    #[error("failed to start service '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// A call to the reward API that did not produce a decodable body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered with HTTP {status}")]
    Http { endpoint: &'static str, status: u16 },

    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
