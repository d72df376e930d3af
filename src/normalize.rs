use serde_json::Value;

use crate::error::{FlattenError, FlattenResult};
use crate::signature::{Origin, ParameterDescriptor};
use crate::types::{DeclaredType, DefaultValue, EnumType};

/// Replaces a closed choice of strings with an equivalent enumeration.
///
/// The generated [`EnumType`] has one member per distinct literal, in
/// declared order, with member name and value both equal to the literal. Its
/// name is derived from the owning record's name, if any, and the field name,
/// so normalizing the same field twice yields equal types. A default is mapped onto the matching member.
/// Markers are kept as they are. Fields of any other type are returned
/// unchanged.
///
/// # Errors
///
/// Returns [`FlattenError::Normalization`] if the choice set is empty,
/// contains a non-string value, or the default is not one of the choices.
///
/// # Examples
///
/// ```
/// use record_flatten::{normalize_field, DeclaredType, FieldSpec, ParameterDescriptor};
///
/// let field = ParameterDescriptor::from_spec(
///     FieldSpec::new("answer", DeclaredType::choice(["yes", "no"])).with_default("yes"),
/// );
/// let field = normalize_field(field).unwrap();
///
/// let DeclaredType::Enum(answer) = field.declared_type() else { panic!("not an enum") };
/// assert_eq!(answer.name(), "AnswerChoice");
/// assert_eq!(field.default().and_then(|d| d.as_member()).map(|m| m.name()), Some("yes"));
/// ```
pub fn normalize_field(field: ParameterDescriptor) -> FlattenResult<ParameterDescriptor> {
    let DeclaredType::Literal(choices) = field.declared_type() else {
        return Ok(field);
    };

    let fail = |reason: String| FlattenError::Normalization {
        field: field.name().to_string(),
        reason,
    };

    if choices.is_empty() {
        return Err(fail("empty choice set".to_string()));
    }

    let mut literals: Vec<&str> = Vec::with_capacity(choices.len());
    for choice in choices {
        match choice {
            Value::String(literal) => {
                if !literals.contains(&literal.as_str()) {
                    literals.push(literal);
                }
            }
            other => return Err(fail(format!("choice {} is not a string", other))),
        }
    }

    let owner = match field.origin() {
        Origin::ModelField { owner } => Some(owner.name()),
        Origin::TopLevel => None,
    };
    let enum_type = EnumType::from_values(enum_name(owner, field.name()), literals);

    let default = match field.default() {
        None => None,
        Some(default) => {
            let value = default.to_value();
            let member = value
                .as_str()
                .and_then(|literal| enum_type.member(literal))
                .ok_or_else(|| fail(format!("default {} is not one of the choices", value)))?;
            Some(DefaultValue::Member(member.clone()))
        }
    };

    Ok(field.retyped(DeclaredType::Enum(enum_type), default))
}

/// `log_level` on `Logging` becomes `LoggingLogLevelChoice`.
///
/// Field names differing only in `_` versus `-` map to the same name.
fn enum_name(owner: Option<&str>, field: &str) -> String {
    let mut name = String::with_capacity(owner.map_or(0, str::len) + field.len() + 6);
    if let Some(owner) = owner {
        name.push_str(owner);
    }
    for part in field.split(['_', '-']).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name.push_str("Choice");
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{arb_choices, Endpoint, Tuning};
    use crate::{EnumMember, FieldSpec, Marker, RecordType};
    use proptest::prelude::*;
    use serde_json::json;

    fn literal_field(choices: DeclaredType) -> ParameterDescriptor {
        ParameterDescriptor::from_spec(
            FieldSpec::new("argument", choices).with_marker(Marker::option(["--argument"])),
        )
    }

    #[test]
    fn yes_no_becomes_enum_with_member_default() {
        let field = ParameterDescriptor::from_spec(
            FieldSpec::new("argument", DeclaredType::choice(["yes", "no"]))
                .with_default("yes")
                .with_marker(Marker::option(["--argument"])),
        );
        let normalized = normalize_field(field).expect("string choices normalize");

        let DeclaredType::Enum(enum_type) = normalized.declared_type() else {
            panic!("expected enum, got {}", normalized.declared_type());
        };
        let members: Vec<(&str, &str)> = enum_type
            .members()
            .iter()
            .map(|m| (m.name(), m.value()))
            .collect();

        assert_eq!(members, [("yes", "yes"), ("no", "no")]);
        assert_eq!(
            normalized.default().and_then(DefaultValue::as_member),
            enum_type.member("yes")
        );
        assert_eq!(normalized.metadata(), &[Marker::option(["--argument"])]);
    }

    #[test]
    fn non_literal_passes_through() {
        let field = ParameterDescriptor::from_spec(FieldSpec::new("count", DeclaredType::Int));
        let normalized = normalize_field(field.clone()).expect("pass through");
        assert_eq!(normalized, field);
    }

    #[test]
    fn duplicate_literals_collapse() {
        let field = literal_field(DeclaredType::choice(["a", "b", "a"]));
        let normalized = normalize_field(field).expect("normalizes");

        let DeclaredType::Enum(enum_type) = normalized.declared_type() else {
            panic!("expected enum");
        };
        assert_eq!(enum_type.members().len(), 2);
    }

    #[test]
    fn non_string_choice_fails() {
        let field = literal_field(DeclaredType::Literal(vec![json!("a"), json!(2)]));
        let err = normalize_field(field).unwrap_err();

        assert_eq!(
            err.to_string(),
            "cannot convert field 'argument' to an enumeration: choice 2 is not a string"
        );
    }

    #[test]
    fn empty_choice_fails() {
        let err = normalize_field(literal_field(DeclaredType::Literal(vec![]))).unwrap_err();
        assert!(matches!(err, FlattenError::Normalization { .. }));
    }

    #[test]
    fn default_outside_choices_fails() {
        let field = ParameterDescriptor::from_spec(
            FieldSpec::new("argument", DeclaredType::choice(["yes", "no"])).with_default("maybe"),
        );
        let err = normalize_field(field).unwrap_err();
        assert!(err.to_string().contains("\"maybe\" is not one of the choices"));
    }

    #[test]
    fn enum_names_are_pascal_case() {
        assert_eq!(enum_name(None, "log_level"), "LogLevelChoice");
        assert_eq!(enum_name(None, "output-format"), "OutputFormatChoice");
        assert_eq!(enum_name(Some("Tuning"), "mode"), "TuningModeChoice");
    }

    #[test]
    fn same_field_on_different_records_gets_distinct_enums() {
        let from = |owner: RecordType| {
            let field = ParameterDescriptor::model_field(
                FieldSpec::new("mode", DeclaredType::choice(["fast", "safe"])),
                owner,
            );
            match normalize_field(field).expect("normalizes").declared_type() {
                DeclaredType::Enum(enum_type) => enum_type.name().to_string(),
                other => panic!("expected enum, got {other}"),
            }
        };

        assert_eq!(from(RecordType::of::<Tuning>()), "TuningModeChoice");
        assert_eq!(from(RecordType::of::<Endpoint>()), "EndpointModeChoice");
    }

    proptest! {
        /// Property: normalizing the same choice set twice yields identical enums
        #[test]
        fn proptest_normalization_is_deterministic(choices in arb_choices(6)) {
            let first = normalize_field(literal_field(DeclaredType::choice(choices.clone())))
                .expect("string choices normalize");
            let second = normalize_field(literal_field(DeclaredType::choice(choices.clone())))
                .expect("string choices normalize");

            prop_assert_eq!(&first, &second);

            let DeclaredType::Enum(enum_type) = first.declared_type() else {
                return Err(TestCaseError::fail("expected enum"));
            };
            let names: Vec<&str> = enum_type.members().iter().map(EnumMember::name).collect();
            prop_assert_eq!(names, choices.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
