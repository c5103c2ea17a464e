//! Error types for gym_nav_core

use thiserror::Error;

use crate::polyline::PolylineError;

#[derive(Error, Debug)]
pub enum NavError {
    /// Location access is not authorized. The caller asks for it, never the core.
    #[error("location permission not granted")]
    PermissionDenied,

    /// Timeout, DNS or connection failure. Safe to retry.
    #[error("network error: {0}")]
    NetworkTransient(String),

    #[error("remote service rejected the request (HTTP {status})")]
    RemoteRejected { status: u16 },

    /// The response could not be parsed. Distinct from "no results".
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Non-success status reported inside an HTTP 200 body.
    #[error("service returned {status}: {}", .message.as_deref().unwrap_or("no details"))]
    ServiceError {
        status: String,
        message: Option<String>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid track: {0}")]
    Track(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NavError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, NavError::NetworkTransient(_))
    }

    /// Short, dismissible text stored in `NavigationState::error`.
    pub fn user_message(&self) -> String {
        match self {
            NavError::PermissionDenied => {
                "Location permission is required to start navigation.".to_string()
            }
            NavError::NetworkTransient(_) => {
                "Network problem, check your connection and try again.".to_string()
            }
            NavError::RemoteRejected { status } => {
                format!("The service is unavailable right now (HTTP {status}).")
            }
            NavError::MalformedResponse(_) => {
                "Received an unexpected response from the server.".to_string()
            }
            NavError::ConfigurationMissing(what) => format!("Navigation is not configured: {what}"),
            NavError::ServiceError { status, .. } => format!("Directions service error ({status})."),
            NavError::Config(_) | NavError::Track(_) | NavError::Io(_) => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for NavError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return NavError::RemoteRejected {
                status: status.as_u16(),
            };
        }
        if e.is_decode() {
            return NavError::MalformedResponse(e.to_string());
        }
        NavError::NetworkTransient(e.to_string())
    }
}

impl From<PolylineError> for NavError {
    fn from(e: PolylineError) -> Self {
        NavError::MalformedResponse(format!("route polyline: {e}"))
    }
}

impl From<csv::Error> for NavError {
    fn from(e: csv::Error) -> Self {
        NavError::Track(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
