use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::record::RecordType;

/// The declared type of a parameter or record field.
///
/// The transform only inspects two shapes: [`DeclaredType::Record`], which
/// gets expanded, and [`DeclaredType::Literal`], which the normalizer may turn
/// into an [`EnumType`]. Everything else is carried through for the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum DeclaredType {
    /// UTF-8 text.
    Str,
    /// Signed integer.
    Int,
    /// Floating point number.
    Float,
    /// Boolean flag.
    Bool,
    /// Filesystem path.
    Path,
    /// Untyped value.
    Any,
    /// Homogeneous list.
    List(Box<DeclaredType>),
    /// Value that may be absent.
    Optional(Box<DeclaredType>),
    /// Closed choice of literal values.
    Literal(Vec<Value>),
    /// Enumeration with named members.
    Enum(EnumType),
    /// Structured record, expanded into its fields when flattened.
    Record(RecordType),
}

impl DeclaredType {
    /// Shorthand for a closed choice of strings.
    ///
    /// ```
    /// use record_flatten::DeclaredType;
    ///
    /// let answer = DeclaredType::choice(["yes", "no"]);
    /// assert!(answer.is_string_choice());
    /// ```
    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DeclaredType::Literal(
            choices
                .into_iter()
                .map(|c| Value::String(c.into()))
                .collect(),
        )
    }

    /// Shorthand for `Optional(inner)`.
    pub fn optional(inner: DeclaredType) -> Self {
        DeclaredType::Optional(Box::new(inner))
    }

    /// Shorthand for `List(inner)`.
    pub fn list(inner: DeclaredType) -> Self {
        DeclaredType::List(Box::new(inner))
    }

    /// Returns the record type if this is a structured record.
    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            DeclaredType::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns `true` for a non-empty closed choice whose values are all strings.
    pub fn is_string_choice(&self) -> bool {
        match self {
            DeclaredType::Literal(values) => {
                !values.is_empty() && values.iter().all(Value::is_string)
            }
            _ => false,
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Str => write!(f, "str"),
            DeclaredType::Int => write!(f, "int"),
            DeclaredType::Float => write!(f, "float"),
            DeclaredType::Bool => write!(f, "bool"),
            DeclaredType::Path => write!(f, "path"),
            DeclaredType::Any => write!(f, "any"),
            DeclaredType::List(inner) => write!(f, "list[{}]", inner),
            DeclaredType::Optional(inner) => write!(f, "optional[{}]", inner),
            DeclaredType::Literal(values) => {
                write!(f, "literal[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            DeclaredType::Enum(enum_type) => write!(f, "enum {}", enum_type.name()),
            DeclaredType::Record(record) => write!(f, "record {}", record.name()),
        }
    }
}

/// A named enumeration with ordered members.
///
/// Generated by the normalizer from a closed choice of strings, or declared
/// directly by a record that already wants enumeration semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumType {
    name: String,
    members: Vec<EnumMember>,
}

impl EnumType {
    /// Creates an enumeration whose members are named after their values.
    pub fn from_values<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: values
                .into_iter()
                .map(|v| {
                    let value = v.into();
                    EnumMember {
                        name: value.clone(),
                        value,
                    }
                })
                .collect(),
        }
    }

    /// Returns the enumeration's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the members in declaration order.
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Looks up the member carrying `value`.
    pub fn member(&self, value: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.value == value)
    }
}

/// One member of an [`EnumType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnumMember {
    name: String,
    value: String,
}

impl EnumMember {
    /// Returns the member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the member value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl From<EnumMember> for Value {
    fn from(member: EnumMember) -> Self {
        Value::String(member.value)
    }
}

impl From<&EnumMember> for Value {
    fn from(member: &EnumMember) -> Self {
        Value::String(member.value.clone())
    }
}

/// Default value of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// A plain value.
    Value(Value),
    /// A member of the parameter's enumeration type.
    Member(EnumMember),
}

impl DefaultValue {
    /// Returns the value bound when the argument is omitted.
    pub fn to_value(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Member(member) => member.into(),
        }
    }

    /// Returns the enumeration member, if any.
    pub fn as_member(&self) -> Option<&EnumMember> {
        match self {
            DefaultValue::Member(member) => Some(member),
            DefaultValue::Value(_) => None,
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        DefaultValue::Value(value)
    }
}

impl From<EnumMember> for DefaultValue {
    fn from(member: EnumMember) -> Self {
        DefaultValue::Member(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_choice_detection() {
        assert!(DeclaredType::choice(["yes", "no"]).is_string_choice());
        assert!(!DeclaredType::Literal(vec![json!(1), json!("two")]).is_string_choice());
        assert!(!DeclaredType::Literal(vec![]).is_string_choice());
        assert!(!DeclaredType::Str.is_string_choice());
    }

    #[test]
    fn display_renders_nested_types() {
        let ty = DeclaredType::optional(DeclaredType::list(DeclaredType::Int));
        assert_eq!(ty.to_string(), "optional[list[int]]");
        assert_eq!(
            DeclaredType::choice(["a", "b"]).to_string(),
            r#"literal["a", "b"]"#
        );
    }

    #[test]
    fn enum_members_keep_declared_order() {
        let answer = EnumType::from_values("Answer", ["yes", "no"]);
        let names: Vec<&str> = answer.members().iter().map(EnumMember::name).collect();

        assert_eq!(names, ["yes", "no"]);
        assert_eq!(answer.member("no").map(EnumMember::value), Some("no"));
        assert!(answer.member("maybe").is_none());
    }

    #[test]
    fn member_default_binds_as_its_value() {
        let answer = EnumType::from_values("Answer", ["yes", "no"]);
        let default = DefaultValue::Member(answer.members()[0].clone());

        assert_eq!(default.to_value(), json!("yes"));
        assert!(default.as_member().is_some());
    }
}
