use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use anyhow::Error as AnyhowError;
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum IssueErrors {
    #[error("{1}")]
    HttpError(u16, String),
    #[error("Issue validation failed")]
    Validation(HashMap<String, String>)
}

pub(crate) struct IssueArenaError {
    error: AnyhowError
}

impl Display for IssueArenaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.error)
    }
}

impl Debug for IssueArenaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.error)
    }
}

impl From<AnyhowError> for IssueArenaError {
    fn from(error: AnyhowError) -> Self {
        IssueArenaError { error }
    }
}

impl ResponseError for IssueArenaError {
    fn status_code(&self) -> StatusCode {
        if let Some(e) = self.error.downcast_ref::<IssueErrors>() {
            match e {
                IssueErrors::HttpError(status_code, _) => StatusCode::from_u16(*status_code).unwrap_or(StatusCode::IM_A_TEAPOT), // A programmer passed a invalid status code
                IssueErrors::Validation(_) => StatusCode::BAD_REQUEST
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!("Error occurred while handling route: {}", self.error.root_cause())
        }

        let json = match self.error.downcast_ref::<IssueErrors>() {
            Some(IssueErrors::Validation(errors)) => json!({
                "errors": errors
            }),
            Some(IssueErrors::HttpError(_, message)) => json!({
                "error": message
            }),
            None => json!({
                "error": "Internal server error occurred"
            })
        };

        HttpResponseBuilder::new(status_code).json(json)
    }
}

/// Builds an [anyhow Error](anyhow::Error) out of a [StatusCode](actix_web::http::StatusCode) constant name and a message.
#[macro_export]
macro_rules! err {
    ($status:ident, $message:expr) => {
        anyhow::Error::new($crate::error::IssueErrors::HttpError(actix_web::http::StatusCode::$status.as_u16(), $message.to_owned()))
    };
}

/// Returns early out of a handler with the given status code and message.
#[macro_export]
macro_rules! die {
    ($status:ident, $message:expr) => {
        return Err($crate::err!($status, $message))
    };
}

#[cfg(test)]
mod tests {
    use actix_web::error::ResponseError;
    use actix_web::http::StatusCode;
    use std::collections::HashMap;

    use super::{IssueArenaError, IssueErrors};

    #[test]
    fn http_errors_keep_their_status_code() {
        let error: IssueArenaError = crate::err!(NOT_FOUND, "Issue not found").into();
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let mut errors = HashMap::new();
        errors.insert("issue_title".to_owned(), "issue_title is required".to_owned());

        let error: IssueArenaError = anyhow::Error::new(IssueErrors::Validation(errors)).into();
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_errors_are_internal() {
        let error: IssueArenaError = anyhow::anyhow!("connection reset").into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
