use std::time::Duration;

use aws_sdk_dynamodb::error::{BuildError, DisplayErrorContext, SdkError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    /// Every required field absent from a create request, in field order.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Item with ID {0} not found")]
    NotFound(String),

    #[error("{matches} items share ID {id}")]
    DuplicateId { id: String, matches: usize },

    #[error("DynamoDB error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("query did not finish after {pages} pages")]
    PaginationExhausted { pages: usize },

    #[error("query timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

/// Coarse classification used at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Backend,
    ResourceExhausted,
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::MissingFields(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PaginationExhausted { .. } | Self::Timeout { .. } => {
                ErrorKind::ResourceExhausted
            }
            Self::DuplicateId { .. }
            | Self::Backend(_)
            | Self::Serialization(_)
            | Self::Deserialization(_) => ErrorKind::Backend,
        }
    }

    /// True for errors the caller caused and can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::NotFound)
    }
}

impl<E, R> From<SdkError<E, R>> for StoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(err: SdkError<E, R>) -> Self {
        Self::Backend(DisplayErrorContext(&err).to_string())
    }
}

impl From<BuildError> for StoreError {
    fn from(err: BuildError) -> Self {
        Self::Backend(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
