use crate::record::RecordError;

/// Errors raised while flattening a callable's signature.
///
/// Every variant is a decoration-time failure: once [`Flattener::flatten`]
/// returns `Ok`, none of these can occur for that callable again.
///
/// [`Flattener::flatten`]: crate::Flattener::flatten
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlattenError {
    /// Two parameters of the flattened signature share a name.
    #[error("duplicate parameter name: '{name}'")]
    DuplicateParameter {
        /// The colliding name
        name: String,
    },

    /// A structured record was expected but some other type was supplied.
    #[error("expected a structured record type, got {type_name}")]
    NotARecord {
        /// Rendered name of the offending type
        type_name: String,
    },

    /// A record type declares fields that cannot be flattened.
    #[error("record {record} is malformed: {reason}")]
    InvalidRecord {
        /// The record's registered name
        record: String,
        /// What is wrong with its field list
        reason: String,
    },

    /// A closed choice could not be turned into an enumeration.
    #[error("cannot convert field '{field}' to an enumeration: {reason}")]
    Normalization {
        /// The field being normalized
        field: String,
        /// Why conversion failed
        reason: String,
    },
}

/// Result alias for decoration-time operations.
pub type FlattenResult<T> = Result<T, FlattenError>;

/// Errors raised when invoking a flattened callable.
///
/// `E` is the error type of the wrapped callable itself.
#[derive(Debug, thiserror::Error)]
pub enum CallError<E> {
    /// A keyword argument does not name any flattened parameter.
    #[error("unexpected keyword argument: '{name}'")]
    UnexpectedArgument {
        /// The unknown name
        name: String,
    },

    /// A required top-level parameter was not supplied.
    #[error("missing required argument: '{name}'")]
    MissingArgument {
        /// The missing parameter
        name: String,
    },

    /// A record's own constructor rejected the supplied field values.
    #[error(transparent)]
    Record(RecordError),

    /// The wrapped callable returned an error.
    #[error(transparent)]
    Callee(E),
}

impl<E> CallError<E> {
    /// Returns the record diagnostic if reconstruction failed.
    pub fn as_record_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            CallError::Record(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Errors raised when reading a value out of [`Arguments`].
///
/// [`Arguments`]: crate::Arguments
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    /// No argument was bound under this name.
    #[error("no argument named '{name}'")]
    Missing {
        /// The requested name
        name: String,
    },

    /// The argument is a record of a different type.
    #[error("argument '{name}' is not a {expected}")]
    WrongRecord {
        /// The requested name
        name: String,
        /// The record type that was asked for
        expected: &'static str,
    },

    /// The argument's value does not deserialize into the requested type.
    #[error("argument '{name}' has an invalid value: {source}")]
    Invalid {
        /// The requested name
        name: String,
        /// The deserialization failure
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_is_exact() {
        let err = FlattenError::DuplicateParameter {
            name: "argument".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate parameter name: 'argument'");
    }

    #[test]
    fn record_errors_display_unmodified() {
        let inner: RecordError = "port must be below 65536".into();
        let err: CallError<std::convert::Infallible> = CallError::Record(inner);

        assert_eq!(err.to_string(), "port must be below 65536");
        assert!(err.as_record_error().is_some());
    }
}
