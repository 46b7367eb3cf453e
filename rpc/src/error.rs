//! RPC error types and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use votatoon_votes::VoteError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Vote(#[from] VoteError),

    #[error("invalid contestant type: {0}")]
    InvalidContestantType(String),

    #[error("missing or empty x-client-id header")]
    MissingClientId,

    #[error("invalid x-client-id header: {0}")]
    InvalidClientId(String),

    #[error("client address could not be determined")]
    MissingClientAddress,

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl RpcError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Vote(e) => e.code(),
            Self::InvalidContestantType(_) => "INVALID_CONTESTANT_TYPE",
            Self::MissingClientId => "MISSING_CLIENT_ID",
            Self::InvalidClientId(_) => "INVALID_CLIENT_ID",
            Self::MissingClientAddress => "MISSING_CLIENT_ADDRESS",
            Self::Worker(_) | Self::Server(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Vote(VoteError::NoActiveRace)
            | Self::Vote(VoteError::NoActiveContestant(_))
            | Self::Vote(VoteError::RecordsInconsistent { .. }) => StatusCode::NOT_FOUND,
            Self::Vote(VoteError::DuplicateVote) => StatusCode::CONFLICT,
            Self::InvalidContestantType(_)
            | Self::MissingClientId
            | Self::InvalidClientId(_)
            | Self::MissingClientAddress => StatusCode::BAD_REQUEST,
            Self::Vote(VoteError::Internal(_)) | Self::Worker(_) | Self::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
