use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::config::FlattenOptions;
use crate::error::{FlattenError, FlattenResult};
use crate::extract::extract_record;
use crate::marker::{merge_description, Marker};
use crate::normalize::normalize_field;
use crate::record::{FieldSpec, RecordType};
use crate::types::{DeclaredType, DefaultValue};

/// Where a flattened parameter came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Origin {
    /// A parameter of the original callable.
    TopLevel,
    /// A field of a record parameter.
    ModelField {
        /// The record type owning the field
        owner: RecordType,
    },
}

/// One parameter of a flattened signature.
///
/// Descriptors are immutable once built; the normalizer produces a new
/// descriptor rather than editing one in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    name: String,
    declared_type: DeclaredType,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<DefaultValue>,
    metadata: Vec<Marker>,
    #[serde(flatten)]
    origin: Origin,
}

impl ParameterDescriptor {
    /// Builds a top-level descriptor from a declared parameter.
    ///
    /// A description is merged into the markers as help text unless an
    /// explicit [`Marker::Help`] is already attached.
    pub fn from_spec(spec: FieldSpec) -> Self {
        Self::with_origin(spec, Origin::TopLevel)
    }

    pub(crate) fn model_field(spec: FieldSpec, owner: RecordType) -> Self {
        Self::with_origin(spec, Origin::ModelField { owner })
    }

    fn with_origin(spec: FieldSpec, origin: Origin) -> Self {
        let FieldSpec {
            name,
            declared_type,
            default,
            mut markers,
            description,
        } = spec;
        merge_description(&mut markers, description.as_deref());

        Self {
            name,
            declared_type,
            default,
            metadata: markers,
            origin,
        }
    }

    pub(crate) fn retyped(self, declared_type: DeclaredType, default: Option<DefaultValue>) -> Self {
        Self {
            declared_type,
            default,
            ..self
        }
    }

    /// Returns the flattened parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type, after normalization if enabled.
    pub fn declared_type(&self) -> &DeclaredType {
        &self.declared_type
    }

    /// Returns the default, or `None` for required parameters.
    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Returns `true` if the parameter has no default.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Returns the frontend markers in declaration order.
    pub fn metadata(&self) -> &[Marker] {
        &self.metadata
    }

    /// Returns where the parameter came from.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

/// Maps a flattened parameter name back to a record field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMember {
    /// Name in the flattened signature
    pub flat_name: String,
    /// Name of the field on the record
    pub field_name: String,
}

/// The flattened fields that rebuild one record parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldGroup {
    owner_type: RecordType,
    parameter_name_in_original: String,
    member_field_names: Vec<FieldMember>,
}

impl FieldGroup {
    /// Returns the record type to construct.
    pub fn owner_type(&self) -> &RecordType {
        &self.owner_type
    }

    /// Returns the record parameter's name in the original callable.
    pub fn parameter_name_in_original(&self) -> &str {
        &self.parameter_name_in_original
    }

    /// Returns the member fields in record order.
    pub fn member_field_names(&self) -> &[FieldMember] {
        &self.member_field_names
    }
}

/// An ordered, flat parameter list plus the groups needed to undo it.
///
/// All parameter names are pairwise distinct, and every name is either a
/// top-level parameter or a member of exactly one [`FieldGroup`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlattenedSignature {
    parameters: Vec<ParameterDescriptor>,
    groups: Vec<FieldGroup>,
}

impl FlattenedSignature {
    /// Returns the parameters in flattened order.
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Returns one group per expanded record parameter, in original order.
    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups
    }

    /// Returns the parameter names in flattened order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(ParameterDescriptor::name)
    }

    /// Looks up a parameter by its flattened name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Returns the number of flattened parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns `true` if the signature has no parameters.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Checks that names are distinct and each belongs to exactly one place.
    pub fn is_consistent(&self) -> bool {
        let mut names = HashSet::with_capacity(self.parameters.len());
        if !self.parameters.iter().all(|p| names.insert(p.name.as_str())) {
            return false;
        }

        let mut covered = HashSet::with_capacity(names.len());
        for param in &self.parameters {
            if param.origin == Origin::TopLevel && !covered.insert(param.name.as_str()) {
                return false;
            }
        }
        for member in self.groups.iter().flat_map(|g| &g.member_field_names) {
            if !covered.insert(member.flat_name.as_str()) {
                return false;
            }
        }

        covered == names
    }
}

/// Builds a [`FlattenedSignature`] from a callable's declared parameters.
///
/// # Examples
///
/// ```
/// use record_flatten::{DeclaredType, FieldSpec, FlattenOptions, SignatureBuilder};
///
/// let signature = SignatureBuilder::new(FlattenOptions::default())
///     .build(&[FieldSpec::new("verbose", DeclaredType::Bool).with_default(false)])
///     .unwrap();
///
/// assert_eq!(signature.names().collect::<Vec<_>>(), ["verbose"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SignatureBuilder {
    options: FlattenOptions,
}

impl SignatureBuilder {
    /// Creates a builder with the given options.
    pub fn new(options: FlattenOptions) -> Self {
        Self { options }
    }

    /// Flattens `params` in declaration order.
    ///
    /// Plain parameters are copied. Record parameters are replaced in place by
    /// their fields, normalized when `literals_to_enums` is set, and recorded
    /// as a [`FieldGroup`].
    ///
    /// # Errors
    ///
    /// - [`FlattenError::DuplicateParameter`] on the first repeated name
    /// - any error from field extraction or normalization
    pub fn build(&self, params: &[FieldSpec]) -> FlattenResult<FlattenedSignature> {
        let mut flat_names: HashSet<String> = HashSet::new();
        let mut original_names: HashSet<&str> = HashSet::with_capacity(params.len());
        let mut parameters = Vec::with_capacity(params.len());
        let mut groups = Vec::new();

        for param in params {
            if !original_names.insert(param.name()) {
                return Err(duplicate(param.name()));
            }

            let Some(record) = param.declared_type().as_record() else {
                claim(&mut flat_names, param.name())?;
                parameters.push(ParameterDescriptor::from_spec(param.clone()));
                continue;
            };

            let fields = extract_record(record)?;
            let mut members = Vec::with_capacity(fields.len());
            for field in fields {
                let field = if self.options.literals_to_enums {
                    normalize_field(field)?
                } else {
                    field
                };
                claim(&mut flat_names, field.name())?;
                members.push(FieldMember {
                    flat_name: field.name().to_string(),
                    field_name: field.name().to_string(),
                });
                parameters.push(field);
            }

            debug!(
                record = record.name(),
                parameter = param.name(),
                fields = members.len(),
                "expanded record parameter"
            );
            groups.push(FieldGroup {
                owner_type: *record,
                parameter_name_in_original: param.name().to_string(),
                member_field_names: members,
            });
        }

        let signature = FlattenedSignature { parameters, groups };
        debug_assert!(signature.is_consistent());
        Ok(signature)
    }
}

fn claim(names: &mut HashSet<String>, name: &str) -> FlattenResult<()> {
    if names.insert(name.to_string()) {
        Ok(())
    } else {
        Err(duplicate(name))
    }
}

fn duplicate(name: &str) -> FlattenError {
    FlattenError::DuplicateParameter {
        name: name.to_string(),
    }
}
