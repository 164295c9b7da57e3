// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Custom application error with conversions from common Rust and 3rd-party errors.

use awc::error::{PayloadError, SendRequestError};
use derive_more::Display;
use log::error;

#[derive(Clone, Debug, Display, PartialEq)]
pub enum ServiceError {
    #[display("Serialization error: {_0}")]
    SerializationError(String),

    /// Transport error: connection refused, DNS failure or request timeout.
    #[display("Service unavailable: {_0}")]
    ServiceUnavailable(String),

    /// The media server responded with a non-success HTTP status code.
    #[display("Unexpected HTTP status: {_0}")]
    HttpStatus(u16),

    #[display("Invalid configuration: {_0}")]
    ConfigurationError(String),
}

impl std::error::Error for ServiceError {}

impl From<SendRequestError> for ServiceError {
    fn from(e: SendRequestError) -> Self {
        ServiceError::ServiceUnavailable(e.to_string())
    }
}

impl From<PayloadError> for ServiceError {
    fn from(e: PayloadError) -> Self {
        ServiceError::ServiceUnavailable(format!("Error reading response: {e}"))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        error!("{:?}", e);
        ServiceError::SerializationError(e.to_string())
    }
}

impl From<url::ParseError> for ServiceError {
    fn from(e: url::ParseError) -> Self {
        ServiceError::ConfigurationError(format!("Invalid server address: {e}"))
    }
}
