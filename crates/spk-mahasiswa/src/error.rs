use crate::config::ConfigError;
use crate::snapshot::SnapshotError;
use crate::telemetry::TelemetryError;
use crate::workflows::potential::{ModelError, PotentialError};
use crate::workflows::saw::SawError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Failure categories reported to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputFormat,
    ModelUnavailable,
    CriteriaUnavailable,
    CredentialUnavailable,
    DuplicateKey,
    DownstreamPersist,
    SnapshotMissing,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InputFormat => StatusCode::BAD_REQUEST,
            ErrorKind::DuplicateKey => StatusCode::CONFLICT,
            ErrorKind::SnapshotMissing => StatusCode::NOT_FOUND,
            ErrorKind::CriteriaUnavailable
            | ErrorKind::CredentialUnavailable
            | ErrorKind::DownstreamPersist => StatusCode::BAD_GATEWAY,
            ErrorKind::ModelUnavailable | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON error body shared by every endpoint.
pub fn error_response(kind: ErrorKind, message: String) -> Response {
    let body = Json(json!({ "error": message, "kind": kind }));
    (kind.status(), body).into_response()
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Model(ModelError),
    Snapshot(SnapshotError),
    Potential(PotentialError),
    Saw(SawError),
    Output(serde_json::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Model(_) => ErrorKind::ModelUnavailable,
            AppError::Snapshot(err) => err.kind(),
            AppError::Potential(err) => err.kind(),
            AppError::Saw(err) => err.kind(),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Output(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Model(err) => write!(f, "model unavailable: {}", err),
            AppError::Snapshot(err) => write!(f, "{}", err),
            AppError::Potential(err) => write!(f, "classification failed: {}", err),
            AppError::Saw(err) => write!(f, "ranking failed: {}", err),
            AppError::Output(err) => write!(f, "unable to render output: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Model(err) => Some(err),
            AppError::Snapshot(err) => Some(err),
            AppError::Potential(err) => Some(err),
            AppError::Saw(err) => Some(err),
            AppError::Output(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ModelError> for AppError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

impl From<SnapshotError> for AppError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<PotentialError> for AppError {
    fn from(value: PotentialError) -> Self {
        Self::Potential(value)
    }
}

impl From<SawError> for AppError {
    fn from(value: SawError) -> Self {
        Self::Saw(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::potential::{DuplicateKeyError, JoinError, JoinSide};

    #[tokio::test]
    async fn duplicate_keys_render_as_conflict_with_kind() {
        let error = AppError::Potential(PotentialError::Join(JoinError::DuplicateKey(
            DuplicateKeyError {
                side: JoinSide::Roster,
                key: "123".to_string(),
            },
        )));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        assert_eq!(payload["kind"], "duplicate_key");
        assert!(payload["error"]
            .as_str()
            .expect("message")
            .contains("duplicate roster identifier '123'"));
    }

    #[test]
    fn gateway_kinds_map_to_bad_gateway() {
        for kind in [
            ErrorKind::CriteriaUnavailable,
            ErrorKind::CredentialUnavailable,
            ErrorKind::DownstreamPersist,
        ] {
            assert_eq!(kind.status(), StatusCode::BAD_GATEWAY);
        }
        assert_eq!(ErrorKind::InputFormat.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::SnapshotMissing.status(), StatusCode::NOT_FOUND);
    }
}
