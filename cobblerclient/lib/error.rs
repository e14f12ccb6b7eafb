use std::{
    error::Error,
    fmt::{self, Display},
};
use thiserror::Error;

use crate::{models::ItemKind, wire::WireValue};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a cobblerclient operation.
pub type CobblerResult<T> = Result<T, CobblerError>;

/// An error that occurred while talking to a Cobbler server.
#[derive(pretty_error_debug::Debug, Error)]
pub enum CobblerError {
    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),

    /// An error that occurred during an HTTP request.
    #[error("http request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// An error that occurred during an HTTP middleware operation.
    #[error("http middleware error: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// The request or response envelope could not be encoded or parsed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server reported a fault.
    #[error("server fault {code}: {message}")]
    Fault {
        /// The fault code reported by the server.
        code: i32,

        /// The fault message reported by the server, untouched.
        message: String,
    },

    /// The server answered a single-item fetch with the null sentinel.
    #[error("{kind} `{name}` not found")]
    NotFound {
        /// The kind of item that was requested.
        kind: ItemKind,

        /// The name that was requested.
        name: String,
    },

    /// A wire value could not be coerced into the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A client-side precondition failed before any call was issued.
    #[error("validation error: {0}")]
    Validation(String),

    /// The server refused to update a field.
    #[error("server rejected update of {kind} field `{field}`")]
    FieldRejected {
        /// The kind of item being updated.
        kind: ItemKind,

        /// The wire name of the rejected field.
        field: String,
    },

    /// A privileged call was attempted without logging in.
    #[error("not logged in")]
    NotLoggedIn,

    /// A call returned a value of an unexpected shape.
    #[error("unexpected response from `{method}`: {value}")]
    UnexpectedResponse {
        /// The method that was called.
        method: String,

        /// The value that came back.
        value: WireValue,
    },
}

/// An error raised while normalizing a wire value into a typed value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// A plain decoding failure.
    #[error("{0}")]
    Message(String),

    /// A decoding failure attributed to an entity field.
    #[error("field `{field}`: {source}")]
    Field {
        /// The wire name of the field.
        field: String,

        /// The underlying failure.
        #[source]
        source: Box<DecodeError>,
    },
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CobblerError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> CobblerError {
        CobblerError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// Returns `true` if the server reported this error as a fault.
    pub fn is_fault(&self) -> bool {
        matches!(self, CobblerError::Fault { .. })
    }

    /// Returns `true` if the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CobblerError::NotFound { .. })
    }

    /// Returns `true` if the error happened below the RPC layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CobblerError::HttpRequest(_)
                | CobblerError::HttpMiddleware(_)
                | CobblerError::Transport(_)
        )
    }
}

impl DecodeError {
    /// Attributes the error to the field with the given wire name.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        DecodeError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates an `Ok` `CobblerResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> CobblerResult<T> {
    Result::Ok(value)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl serde::de::Error for DecodeError {
    fn custom<T: Display>(msg: T) -> Self {
        DecodeError::Message(msg.to_string())
    }
}

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let fault = CobblerError::Fault {
            code: 1,
            message: "<class 'cobbler.cexceptions.CX'>:'login failed'".to_string(),
        };
        assert!(fault.is_fault());
        assert!(!fault.is_not_found());
        assert!(fault.to_string().contains("login failed"));

        let not_found = CobblerError::NotFound {
            kind: ItemKind::Distro,
            name: "missing".to_string(),
        };
        assert!(not_found.is_not_found());
        assert_eq!(not_found.to_string(), "distro `missing` not found");

        assert!(CobblerError::Transport("bad envelope".to_string()).is_transport());
    }

    #[test]
    fn test_decode_error_in_field() {
        let err = DecodeError::Message("invalid type".to_string()).in_field("depth");
        assert_eq!(err.to_string(), "field `depth`: invalid type");
    }
}
