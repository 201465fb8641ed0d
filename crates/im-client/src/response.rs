//! Response envelope for IM REST API calls

use crate::error::{ImError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Result of a remote operation.
///
/// `Success` carries the payload of the call; `Failure` carries the message
/// the IM service returned along with a non-2xx status.
#[derive(Debug, Clone, PartialEq)]
pub enum ImResponse<T> {
    Success(T),
    Failure(String),
}

impl<T> ImResponse<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ImResponse::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ImResponse::Success(data) => Some(data),
            ImResponse::Failure(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ImResponse::Success(data) => Some(data),
            ImResponse::Failure(_) => None,
        }
    }

    /// Error message, present only on failure
    pub fn message(&self) -> Option<&str> {
        match self {
            ImResponse::Success(_) => None,
            ImResponse::Failure(message) => Some(message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ImResponse<U> {
        match self {
            ImResponse::Success(data) => ImResponse::Success(f(data)),
            ImResponse::Failure(message) => ImResponse::Failure(message),
        }
    }

    /// Like [`ImResponse::map`] for conversions that can fail locally.
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<ImResponse<U>> {
        Ok(match self {
            ImResponse::Success(data) => ImResponse::Success(f(data)?),
            ImResponse::Failure(message) => ImResponse::Failure(message),
        })
    }

    /// Turn a failure into [`ImError::Api`].
    pub fn into_result(self) -> Result<T> {
        match self {
            ImResponse::Success(data) => Ok(data),
            ImResponse::Failure(message) => Err(ImError::Api(message)),
        }
    }
}

impl ImResponse<String> {
    /// Decode a response whose success body is plain text.
    pub(crate) async fn from_text(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("IM responded {}", status);

        if status.is_success() {
            Ok(ImResponse::Success(body))
        } else {
            failure(&body)
        }
    }
}

impl<T: DeserializeOwned> ImResponse<T> {
    /// Decode a response whose body is JSON on both paths.
    pub(crate) async fn from_json(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("IM responded {}", status);

        if status.is_success() {
            Ok(ImResponse::Success(serde_json::from_str(&body)?))
        } else {
            failure(&body)
        }
    }
}

/// A failure body must be JSON; anything else is surfaced as a parse error.
fn failure<T>(body: &str) -> Result<ImResponse<T>> {
    let error: ApiError = serde_json::from_str(body)?;
    Ok(ImResponse::Failure(error.message))
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[allow(dead_code)]
    #[serde(default)]
    code: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UriList {
    #[serde(rename = "uri-list")]
    pub(crate) uri_list: Vec<UriEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UriEntry {
    pub(crate) uri: String,
}
