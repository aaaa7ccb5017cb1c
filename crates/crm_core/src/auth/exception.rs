//! Typed auth errors with stable codes for caller branching.

use crate::db::DbError;
use crate::file::FileError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AuthResult<T> = Result<T, AuthError>;

/// Stable code attached to every domain auth failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthExceptionCode {
    InvalidInput,
    ForbiddenException,
    UserNotFound,
    InvalidData,
}

impl AuthExceptionCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::ForbiddenException => "FORBIDDEN_EXCEPTION",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidData => "INVALID_DATA",
        }
    }
}

/// Domain auth failure: a user-facing message plus its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthException {
    message: String,
    code: AuthExceptionCode,
}

impl AuthException {
    pub fn new(message: impl Into<String>, code: AuthExceptionCode) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(message, AuthExceptionCode::InvalidInput)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, AuthExceptionCode::ForbiddenException)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> AuthExceptionCode {
        self.code
    }
}

impl Display for AuthException {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code.as_str())
    }
}

impl Error for AuthException {}

/// Error returned by auth services.
#[derive(Debug)]
pub enum AuthError {
    /// Validation or authorization failure with a stable code.
    Exception(AuthException),
    Repo(RepoError),
    File(FileError),
}

impl AuthError {
    /// Code of a domain failure; infrastructure failures have none.
    pub fn code(&self) -> Option<AuthExceptionCode> {
        match self {
            Self::Exception(exception) => Some(exception.code()),
            Self::Repo(_) | Self::File(_) => None,
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exception(exception) => write!(f, "{exception}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::File(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Exception(exception) => Some(exception),
            Self::Repo(err) => Some(err),
            Self::File(err) => Some(err),
        }
    }
}

impl From<AuthException> for AuthError {
    fn from(value: AuthException) -> Self {
        Self::Exception(value)
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for AuthError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

impl From<FileError> for AuthError {
    fn from(value: FileError) -> Self {
        Self::File(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthError, AuthException, AuthExceptionCode};

    #[test]
    fn exception_code_is_exposed_through_error() {
        let err = AuthError::from(AuthException::forbidden("Wrong password"));
        assert_eq!(err.code(), Some(AuthExceptionCode::ForbiddenException));
        assert_eq!(err.to_string(), "Wrong password (FORBIDDEN_EXCEPTION)");
    }
}
