use derive_more::Display;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Display)]
pub struct UnknownError(BoxedError);

impl std::error::Error for UnknownError {}

impl UnknownError {
    pub fn new(err: BoxedError) -> Self {
        Self(err)
    }
}

impl From<sqlx::error::Error> for UnknownError {
    fn from(err: sqlx::error::Error) -> Self {
        Self::new(err.into())
    }
}

pub mod app {
    use salvo::{prelude::StatusError, writer::Json, Piece};
    use serde::Serialize;

    use super::{
        http::ErrorResponse,
        persistence::PersistenceError,
        resource::{ConflictError, NotFoundError, ValidationError},
    };

    #[derive(Debug, Serialize)]
    pub enum ApplicationError<R> {
        Validation(ValidationError<R>),
        NotFound(NotFoundError),
        Conflict(ConflictError<R>),
        Persistence(PersistenceError),
    }

    impl<R> std::fmt::Display for ApplicationError<R> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Validation(err) => err.fmt(f),
                Self::NotFound(err) => err.fmt(f),
                Self::Conflict(err) => err.fmt(f),
                Self::Persistence(err) => err.fmt(f),
            }
        }
    }

    impl<R: std::fmt::Debug> std::error::Error for ApplicationError<R> {}

    impl<R> From<ValidationError<R>> for ApplicationError<R> {
        fn from(err: ValidationError<R>) -> Self {
            Self::Validation(err)
        }
    }

    impl<R> From<NotFoundError> for ApplicationError<R> {
        fn from(err: NotFoundError) -> Self {
            Self::NotFound(err)
        }
    }

    impl<R> From<ConflictError<R>> for ApplicationError<R> {
        fn from(err: ConflictError<R>) -> Self {
            Self::Conflict(err)
        }
    }

    impl<R> From<PersistenceError> for ApplicationError<R> {
        fn from(err: PersistenceError) -> Self {
            Self::Persistence(err)
        }
    }

    impl<R: Serialize + Send> Piece for ApplicationError<R> {
        fn render(self, res: &mut salvo::Response) {
            let status = match &self {
                ApplicationError::Persistence(PersistenceError::NotFound) => {
                    StatusError::not_found()
                }
                ApplicationError::Persistence(err) => {
                    tracing::error!("persistence failure: {err}");
                    StatusError::service_unavailable()
                }
                ApplicationError::Validation(_) => StatusError::bad_request(),
                ApplicationError::NotFound(_) => StatusError::not_found(),
                ApplicationError::Conflict(_) => StatusError::conflict(),
            };
            res.render(Json(ErrorResponse::from_status_error(&status, self)));
            res.set_status_error(status);
        }
    }
}

pub mod service {
    use derive_more::Display;

    use crate::error::UnknownError;

    #[derive(Debug, Display)]
    pub enum DispatchError {
        #[display(fmt = "Dispatched operation timed out in {_0:?}")]
        Timeout(Option<std::time::Duration>),
        #[display(fmt = "IO error dispatching {_0}")]
        IO(std::io::Error),
        #[display(fmt = "Unknown dispatch error {_0}")]
        Unknown(UnknownError),
    }

    impl std::error::Error for DispatchError {}
}

pub mod persistence {
    use std::io;

    use derive_more::Display;
    use serde::Serialize;

    use super::{service::DispatchError, UnknownError};

    pub type SqlState = String;

    /// SQLSTATE raised by PostgreSQL on a unique constraint violation.
    pub const UNIQUE_VIOLATION: &str = "23505";
    /// SQLSTATE raised by PostgreSQL on a foreign key violation.
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";

    #[derive(Debug, Display)]
    pub enum PersistenceError {
        #[display(fmt = "database persistence error: SQLSTATE {_0:?}, constraint {_1:?}")]
        Database(Option<SqlState>, Option<String>),
        #[display(fmt = "persistence layer connection error: {_0}")]
        Connection(DispatchError),
        #[display(fmt = "PersistenceError data not found")]
        NotFound,
        #[display(fmt = "PersistenceError decoding data")]
        DecodeData,
        #[display(fmt = "PersistenceError data migration")]
        DataMigration,
        #[display(fmt = "unknown persistence error: {_0}")]
        Unknown(UnknownError),
    }

    impl PersistenceError {
        /// Name of the violated unique constraint, if that is what happened.
        pub fn unique_violation(&self) -> Option<&str> {
            match self {
                Self::Database(Some(code), constraint) if code == UNIQUE_VIOLATION => {
                    Some(constraint.as_deref().unwrap_or_default())
                }
                _ => None,
            }
        }

        pub fn constraint(&self) -> Option<&str> {
            match self {
                Self::Database(_, constraint) => constraint.as_deref(),
                _ => None,
            }
        }

        pub fn is_foreign_key_violation(&self) -> bool {
            matches!(self, Self::Database(Some(code), _) if code == FOREIGN_KEY_VIOLATION)
        }
    }

    impl std::error::Error for PersistenceError {}

    impl Serialize for PersistenceError {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.serialize_none()
        }
    }

    type SqlxError = sqlx::error::Error;

    impl From<SqlxError> for PersistenceError {
        fn from(err: SqlxError) -> Self {
            match err {
                SqlxError::Configuration(_) => {
                    Self::Connection(DispatchError::IO(io::ErrorKind::InvalidInput.into()))
                }
                SqlxError::Database(db) => Self::Database(
                    db.code().map(|code| code.into()),
                    db.constraint().map(String::from),
                ),
                SqlxError::Io(io) => Self::Connection(DispatchError::IO(io)),
                SqlxError::Tls(_) => {
                    Self::Connection(DispatchError::IO(io::ErrorKind::ConnectionRefused.into()))
                }
                SqlxError::Protocol(msg) => Self::Connection(DispatchError::IO(io::Error::new(
                    io::ErrorKind::InvalidData,
                    msg,
                ))),
                SqlxError::RowNotFound => Self::NotFound,
                SqlxError::TypeNotFound { .. } => Self::DecodeData,
                SqlxError::ColumnIndexOutOfBounds { .. } => Self::DecodeData,
                SqlxError::ColumnNotFound(_) => Self::DecodeData,
                SqlxError::ColumnDecode { .. } => Self::DecodeData,
                SqlxError::Decode(_) => Self::DecodeData,
                SqlxError::PoolTimedOut => Self::Connection(DispatchError::Timeout(None)),
                SqlxError::PoolClosed => {
                    Self::Connection(DispatchError::IO(io::ErrorKind::NotConnected.into()))
                }
                SqlxError::WorkerCrashed => {
                    tracing::error!("FATAL: sqlx background worker error, {err}");
                    Self::Connection(DispatchError::Unknown(err.into()))
                }
                SqlxError::Migrate(_) => Self::DataMigration,
                _ => PersistenceError::Unknown(err.into()),
            }
        }
    }
}

pub mod resource {
    use derive_more::Display;
    use serde::{Deserialize, Serialize};

    use crate::base::ResourceID;

    #[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum ValidationErrorKind {
        /// When a required property is missing or blank.
        Required,

        /// Maximum inclusive string length.
        MaxLength(u64),
        /// When the input doesn't match to a pattern.
        Pattern(String),

        /// Inclusive lower bound exceeded.
        Minimum(i64),
        /// Inclusive higher bound exceeded.
        Maximum(i64),

        /// The input value doesn't match any of specified options.
        UnknownVariant,
        /// The input value doesn't match one or multiple required types.
        InvalidType,
        /// Input value already exists.
        AlreadyExists,
        /// Input value was not found.
        NotFound,
    }

    impl std::error::Error for ValidationErrorKind {}

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
    pub struct ValidationError<R> {
        /// Resource value
        pub resource: R,
        /// Name of the resource
        pub resource_type: &'static str,
        /// Invalid resource fields
        pub fields: Vec<ValidationFieldError>,
    }

    impl<R> ValidationError<R> {
        pub fn from_resource(resource: R, fields: Vec<ValidationFieldError>) -> Self
        where
            R: ResourceID,
        {
            Self {
                resource,
                resource_type: R::resource_id(),
                fields,
            }
        }
    }

    impl<R> std::fmt::Display for ValidationError<R> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!(
                "Invalid resource {}, fields {:?}",
                self.resource_type, self.fields
            ))
        }
    }

    impl<R: std::fmt::Debug> std::error::Error for ValidationError<R> {}

    #[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize)]
    #[display(fmt = "{path}: {value:?}, {kinds:?}")]
    pub struct ValidationFieldError {
        /// Resource field path with invalid value
        pub path: String,
        /// Displayed invalid value
        pub value: String,
        /// Value type id
        pub type_id: &'static str,
        /// Kinds of validation errors
        pub kinds: Vec<ValidationErrorKind>,
    }

    impl std::error::Error for ValidationFieldError {}

    impl ValidationFieldError {
        pub fn from_resource<T>(
            value: String,
            path: String,
            kinds: Vec<ValidationErrorKind>,
        ) -> Self
        where
            T: ResourceID,
        {
            Self {
                path,
                type_id: T::resource_id(),
                value,
                kinds,
            }
        }

        pub fn new(
            type_id: &'static str,
            value: String,
            path: String,
            kinds: Vec<ValidationErrorKind>,
        ) -> Self {
            Self {
                path,
                type_id,
                value,
                kinds,
            }
        }

        /// Places the error at `path`, for field errors produced by a
        /// datatype parser that does not know where its input came from.
        pub fn at(mut self, path: &str) -> Self {
            self.path = path.into();
            self
        }
    }

    #[derive(Debug, Display, Clone, PartialEq, Eq, Serialize)]
    #[display(fmt = "Resource {resource_type} of id {resource_id} not found")]
    pub struct NotFoundError {
        /// Resource id
        pub resource_id: i32,
        /// Name of the resource
        pub resource_type: &'static str,
    }

    impl std::error::Error for NotFoundError {}

    impl NotFoundError {
        pub fn of<T: ResourceID>(resource_id: i32) -> Self {
            Self {
                resource_id,
                resource_type: T::resource_id(),
            }
        }
    }

    /// Storage rejected the resource because it collides with a stored one.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
    pub struct ConflictError<R> {
        /// Conflicting resource
        pub resource: R,
        /// Name of the resource
        pub resource_type: &'static str,
        /// Violated storage constraint
        pub constraint: Option<String>,
    }

    impl<R> ConflictError<R> {
        pub fn from_resource(resource: R, constraint: Option<String>) -> Self
        where
            R: ResourceID,
        {
            Self {
                resource,
                resource_type: R::resource_id(),
                constraint,
            }
        }
    }

    impl<R> std::fmt::Display for ConflictError<R> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(
                f,
                "Conflicting resource {}, constraint {:?}",
                self.resource_type, self.constraint
            )
        }
    }
}

pub mod http {
    use derive_more::{Display, Error};
    use salvo::{http::ParseError, prelude::StatusError, writer::Json, Piece, Response};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Display, Clone, Error, Serialize, Deserialize)]
    pub enum BadRequest {
        InvalidContent,
    }

    #[derive(Debug, Display, Clone, Serialize, Deserialize)]
    #[display(fmt = "Response error: {title}, {message}")]
    pub struct ErrorResponse<T> {
        pub title: String,
        pub message: String,
        pub error: T,
    }

    impl<T> ErrorResponse<T> {
        pub fn from_status_error(status: &StatusError, err: T) -> Self {
            Self {
                title: status.name.clone(),
                message: status
                    .summary
                    .clone()
                    .unwrap_or_else(|| status.name.clone()),
                error: err,
            }
        }
    }

    impl From<ParseError> for BadRequest {
        fn from(err: ParseError) -> Self {
            tracing::debug!("rejected request content: {err}");
            BadRequest::InvalidContent
        }
    }

    impl Piece for BadRequest {
        fn render(self, res: &mut Response) {
            let status = StatusError::bad_request();
            res.render(Json(ErrorResponse::from_status_error(&status, self)));
            res.set_status_error(status);
        }
    }
}
