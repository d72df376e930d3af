use std::any::{Any, TypeId};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::marker::Marker;
use crate::types::{DeclaredType, DefaultValue};

/// Flat keyword arguments, keyed by parameter name.
pub type Kwargs = Map<String, Value>;

/// Diagnostic produced by a record's own constructor.
pub type RecordError = Box<dyn std::error::Error + Send + Sync>;

/// A structured record that can be expanded into flat parameters.
///
/// Implementors register their fields explicitly and provide a validating
/// constructor. Field order in [`Record::fields`] is the order the fields
/// appear in a flattened signature.
///
/// # Examples
///
/// ```
/// use record_flatten::{deserialize_record, DeclaredType, FieldSpec, Kwargs, Marker, Record, RecordError};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Retry {
///     attempts: u32,
///     #[serde(default)]
///     jitter: bool,
/// }
///
/// impl Record for Retry {
///     fn fields() -> Vec<FieldSpec> {
///         vec![
///             FieldSpec::new("attempts", DeclaredType::Int).with_marker(Marker::option(["--attempts"])),
///             FieldSpec::new("jitter", DeclaredType::Bool).with_default(false),
///         ]
///     }
///
///     fn construct(values: Kwargs) -> Result<Self, RecordError> {
///         deserialize_record(values)
///     }
/// }
///
/// assert_eq!(Retry::record_name(), "Retry");
/// ```
pub trait Record: Any + Send + Sized {
    /// Name shown in diagnostics. Defaults to the unqualified type name,
    /// without generic arguments.
    fn record_name() -> &'static str {
        unqualified(std::any::type_name::<Self>())
    }

    /// Declared fields, in order.
    fn fields() -> Vec<FieldSpec>;

    /// Builds the record from field values keyed by field name.
    ///
    /// # Errors
    ///
    /// Returns the record's own diagnostic when a value is missing or invalid.
    fn construct(values: Kwargs) -> Result<Self, RecordError>;
}

/// `app::Wrapper<app::Inner>` becomes `Wrapper`.
fn unqualified(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

/// Constructs a serde-deserializable record from keyword values.
///
/// Lets a [`Record`] delegate validation and coercion to its `Deserialize`
/// implementation.
///
/// # Errors
///
/// Returns the `serde_json` error unchanged, boxed.
pub fn deserialize_record<T: DeserializeOwned>(values: Kwargs) -> Result<T, RecordError> {
    serde_json::from_value(Value::Object(values)).map_err(Into::into)
}

type ErasedConstructor = fn(Kwargs) -> Result<Box<dyn Any + Send>, RecordError>;

fn construct_erased<R: Record>(values: Kwargs) -> Result<Box<dyn Any + Send>, RecordError> {
    R::construct(values).map(|record| Box::new(record) as Box<dyn Any + Send>)
}

/// Type-erased handle to a [`Record`] implementation.
///
/// Equality is by Rust type identity.
#[derive(Clone, Copy)]
pub struct RecordType {
    type_id: TypeId,
    name: &'static str,
    fields: fn() -> Vec<FieldSpec>,
    construct: ErasedConstructor,
}

impl RecordType {
    /// Returns the handle for `R`.
    pub fn of<R: Record>() -> Self {
        Self {
            type_id: TypeId::of::<R>(),
            name: R::record_name(),
            fields: R::fields,
            construct: construct_erased::<R>,
        }
    }

    /// Returns the record's registered name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this handle was created for `R`.
    pub fn is<R: Record>(&self) -> bool {
        self.type_id == TypeId::of::<R>()
    }

    pub(crate) fn declared_fields(&self) -> Vec<FieldSpec> {
        (self.fields)()
    }

    pub(crate) fn construct(&self, values: Kwargs) -> Result<Box<dyn Any + Send>, RecordError> {
        (self.construct)(values)
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RecordType {}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordType").field(&self.name).finish()
    }
}

impl Serialize for RecordType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// A declared parameter of a callable, or a declared field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub(crate) name: String,
    pub(crate) declared_type: DeclaredType,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) markers: Vec<Marker>,
    pub(crate) description: Option<String>,
}

impl FieldSpec {
    /// Creates a required field of the given type.
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            default: None,
            markers: Vec::new(),
            description: None,
        }
    }

    /// Creates a parameter typed as the record `R`.
    pub fn record<R: Record>(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::Record(RecordType::of::<R>()))
    }

    /// Makes the field optional with the given default.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(default.into()));
        self
    }

    /// Attaches a frontend marker. Markers keep their insertion order.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Sets a human description, merged into help text when flattened.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    pub fn declared_type(&self) -> &DeclaredType {
        &self.declared_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Endpoint, Tuning};
    use serde_json::json;

    #[test]
    fn record_type_identity() {
        let endpoint = RecordType::of::<Endpoint>();

        assert_eq!(endpoint, RecordType::of::<Endpoint>());
        assert_ne!(endpoint, RecordType::of::<Tuning>());
        assert!(endpoint.is::<Endpoint>());
        assert_eq!(endpoint.name(), "Endpoint");
    }

    #[derive(Debug)]
    struct Wrapper<T>(std::marker::PhantomData<T>);

    impl<T: Send + 'static> Record for Wrapper<T> {
        fn fields() -> Vec<FieldSpec> {
            Vec::new()
        }

        fn construct(_values: Kwargs) -> Result<Self, RecordError> {
            Ok(Wrapper(std::marker::PhantomData))
        }
    }

    #[test]
    fn generic_record_name_drops_type_arguments() {
        assert_eq!(Wrapper::<Endpoint>::record_name(), "Wrapper");
        assert_eq!(RecordType::of::<Wrapper<Vec<Tuning>>>().name(), "Wrapper");
        assert_eq!(unqualified("app::cli::Options"), "Options");
        assert_eq!(unqualified("app::Wrapper<app::Inner>"), "Wrapper");
    }

    #[test]
    fn erased_construct_yields_the_record() {
        let mut values = Kwargs::new();
        values.insert("host".into(), json!("db.internal"));
        values.insert("port".into(), json!(5432));

        let built = RecordType::of::<Endpoint>()
            .construct(values)
            .expect("valid endpoint");
        let endpoint = built.downcast::<Endpoint>().expect("endpoint type");

        assert_eq!(endpoint.host, "db.internal");
        assert_eq!(endpoint.port, 5432);
    }

    #[test]
    fn deserialize_record_reports_missing_fields() {
        let err = deserialize_record::<Endpoint>(Kwargs::new()).unwrap_err();
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn field_spec_builder_accumulates() {
        let spec = FieldSpec::new("port", DeclaredType::Int)
            .with_default(8080)
            .with_marker(Marker::option(["--port"]))
            .with_description("Port to bind");

        assert_eq!(spec.default, Some(DefaultValue::Value(json!(8080))));
        assert_eq!(spec.markers.len(), 1);
        assert_eq!(spec.description.as_deref(), Some("Port to bind"));
    }
}
