use std::fmt;

use validator::{ValidationError, ValidationErrors};

use crate::api::RemoteError;

/// Which foreign key failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Asset,
    Category,
    User,
    Request,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceKind::Asset => "Asset",
            ReferenceKind::Category => "Category",
            ReferenceKind::User => "User",
            ReferenceKind::Request => "Request",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Identity token missing or invalid")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{kind} not found!")]
    ReferenceNotFound { kind: ReferenceKind },

    #[error("Not available for this role: {0}")]
    AuthorizationDisplay(String),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn reference(kind: ReferenceKind) -> Self {
        AppError::ReferenceNotFound { kind }
    }

    /// Single-field validation failure.
    pub fn field(field: &'static str, code: &'static str, message: &'static str) -> Self {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());
        let mut errors = ValidationErrors::new();
        errors.add(field, error);
        AppError::Validation(errors)
    }

    /// Text for the one notification shown to the user per failed attempt.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(e) => {
                let mut messages: Vec<String> = e
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let msgs: Vec<&str> = errors
                            .iter()
                            .filter_map(|err| err.message.as_ref().map(|m| m.as_ref()))
                            .collect();
                        if msgs.is_empty() {
                            let codes: Vec<&str> =
                                errors.iter().map(|err| err.code.as_ref()).collect();
                            format!("{}: {}", field, codes.join(", "))
                        } else {
                            format!("{}: {}", field, msgs.join(", "))
                        }
                    })
                    .collect();
                messages.sort();
                messages.join("; ")
            }
            AppError::Remote(RemoteError::Status { status, .. }) => {
                format!("Server rejected the request (HTTP {})", status)
            }
            AppError::Remote(RemoteError::Request(_)) => "Could not reach the server".into(),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "Internal error".into()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
