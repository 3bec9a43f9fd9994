//! The fixed error taxonomy shared by every service in the platform.
//!
//! `ErrorKind` is carried across the gRPC boundary by identity: services attach it to a
//! `tonic::Status` as an `x-error-kind` metadata entry (in addition to the usual status code,
//! which is coarser) so that callers can recover the exact kind instead of pattern-matching on
//! `tonic::Code` alone.

use tonic::metadata::MetadataValue;
use tonic::Status;

/// Closed set of domain-level error conditions propagated across service boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidValue,
    InvalidToken,
    TokenExpired,
    SessionNotFound,
    UserExists,
    UserDoesntExists,
    ArticleExists,
    ArticleSkipped,
    ArticleNotAvailable,
    NoOfferedArticles,
    NoPublishedArticles,
    NoNewArticle,
    InvalidUrl,
    LinkExists,
    NoSources,
    NoLink,
    SourceNotFound,
    SourceExists,
    CacheEmpty,
    /// Anything that doesn't fit the closed taxonomy above; surfaces as a 500/Internal.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidValue => "InvalidValue",
            ErrorKind::InvalidToken => "InvalidToken",
            ErrorKind::TokenExpired => "TokenExpired",
            ErrorKind::SessionNotFound => "SessionNotFound",
            ErrorKind::UserExists => "UserExists",
            ErrorKind::UserDoesntExists => "UserDoesntExists",
            ErrorKind::ArticleExists => "ArticleExists",
            ErrorKind::ArticleSkipped => "ArticleSkipped",
            ErrorKind::ArticleNotAvailable => "ArticleNotAvailable",
            ErrorKind::NoOfferedArticles => "NoOfferedArticles",
            ErrorKind::NoPublishedArticles => "NoPublishedArticles",
            ErrorKind::NoNewArticle => "NoNewArticle",
            ErrorKind::InvalidUrl => "InvalidUrl",
            ErrorKind::LinkExists => "LinkExists",
            ErrorKind::NoSources => "NoSources",
            ErrorKind::NoLink => "NoLink",
            ErrorKind::SourceNotFound => "SourceNotFound",
            ErrorKind::SourceExists => "SourceExists",
            ErrorKind::CacheEmpty => "CacheEmpty",
            ErrorKind::Internal => "Internal",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "InvalidValue" => ErrorKind::InvalidValue,
            "InvalidToken" => ErrorKind::InvalidToken,
            "TokenExpired" => ErrorKind::TokenExpired,
            "SessionNotFound" => ErrorKind::SessionNotFound,
            "UserExists" => ErrorKind::UserExists,
            "UserDoesntExists" => ErrorKind::UserDoesntExists,
            "ArticleExists" => ErrorKind::ArticleExists,
            "ArticleSkipped" => ErrorKind::ArticleSkipped,
            "ArticleNotAvailable" => ErrorKind::ArticleNotAvailable,
            "NoOfferedArticles" => ErrorKind::NoOfferedArticles,
            "NoPublishedArticles" => ErrorKind::NoPublishedArticles,
            "NoNewArticle" => ErrorKind::NoNewArticle,
            "InvalidUrl" => ErrorKind::InvalidUrl,
            "LinkExists" => ErrorKind::LinkExists,
            "NoSources" => ErrorKind::NoSources,
            "NoLink" => ErrorKind::NoLink,
            "SourceNotFound" => ErrorKind::SourceNotFound,
            "SourceExists" => ErrorKind::SourceExists,
            "CacheEmpty" => ErrorKind::CacheEmpty,
            _ => ErrorKind::Internal,
        }
    }

    /// The `tonic::Code` a kind maps to when no more specific mapping applies at the call site.
    fn grpc_code(self) -> tonic::Code {
        match self {
            ErrorKind::InvalidValue | ErrorKind::InvalidToken | ErrorKind::ArticleSkipped => {
                tonic::Code::InvalidArgument
            }
            ErrorKind::UserExists | ErrorKind::ArticleExists | ErrorKind::SourceExists => {
                tonic::Code::AlreadyExists
            }
            ErrorKind::UserDoesntExists
            | ErrorKind::NoNewArticle
            | ErrorKind::SourceNotFound
            | ErrorKind::NoOfferedArticles
            | ErrorKind::NoPublishedArticles
            | ErrorKind::TokenExpired => tonic::Code::NotFound,
            ErrorKind::SessionNotFound => tonic::Code::Unauthenticated,
            ErrorKind::ArticleNotAvailable => tonic::Code::FailedPrecondition,
            ErrorKind::InvalidUrl => tonic::Code::InvalidArgument,
            ErrorKind::LinkExists | ErrorKind::NoSources | ErrorKind::NoLink | ErrorKind::CacheEmpty => {
                tonic::Code::Unknown
            }
            ErrorKind::Internal => tonic::Code::Internal,
        }
    }
}

/// A domain error carrying a fixed `ErrorKind` plus a human-readable message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind_str}: {message}", kind_str = kind.as_str())]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        let mut status = Status::new(err.kind.grpc_code(), err.message.clone());
        if let Ok(val) = MetadataValue::try_from(err.kind.as_str()) {
            status.metadata_mut().insert("x-error-kind", val);
        }
        status
    }
}

/// Recover the exact `ErrorKind` a `tonic::Status` was built from, falling back to a
/// code-based best guess when the metadata header is absent (e.g. errors raised by tonic
/// itself, such as connection failures, never carry it).
pub fn kind_from_status(status: &Status) -> ErrorKind {
    if let Some(val) = status.metadata().get("x-error-kind") {
        if let Ok(s) = val.to_str() {
            return ErrorKind::from_str(s);
        }
    }
    match status.code() {
        tonic::Code::NotFound => ErrorKind::NoNewArticle,
        tonic::Code::AlreadyExists => ErrorKind::ArticleExists,
        tonic::Code::InvalidArgument => ErrorKind::InvalidValue,
        tonic::Code::Unauthenticated => ErrorKind::SessionNotFound,
        tonic::Code::FailedPrecondition => ErrorKind::ArticleNotAvailable,
        _ => ErrorKind::Internal,
    }
}
