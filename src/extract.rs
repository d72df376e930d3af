use std::collections::HashSet;

use crate::error::{FlattenError, FlattenResult};
use crate::record::RecordType;
use crate::signature::ParameterDescriptor;
use crate::types::DeclaredType;

/// Lists the fields of a structured record type as parameter descriptors.
///
/// Descriptors follow the record's declared field order and carry fresh
/// copies of each field's markers, so the same record can back any number of
/// flattened callables.
///
/// # Errors
///
/// - [`FlattenError::NotARecord`] if `declared` is not a record type
/// - [`FlattenError::InvalidRecord`] if the record declares an empty or
///   repeated field name
///
/// # Examples
///
/// ```
/// use record_flatten::{extract_fields, DeclaredType, FlattenError};
///
/// let err = extract_fields(&DeclaredType::Str).unwrap_err();
/// assert!(matches!(err, FlattenError::NotARecord { .. }));
/// ```
pub fn extract_fields(declared: &DeclaredType) -> FlattenResult<Vec<ParameterDescriptor>> {
    let record = declared
        .as_record()
        .ok_or_else(|| FlattenError::NotARecord {
            type_name: declared.to_string(),
        })?;
    extract_record(record)
}

pub(crate) fn extract_record(record: &RecordType) -> FlattenResult<Vec<ParameterDescriptor>> {
    let specs = record.declared_fields();
    let mut seen = HashSet::with_capacity(specs.len());
    let mut descriptors = Vec::with_capacity(specs.len());

    for spec in specs {
        if spec.name.is_empty() {
            return Err(FlattenError::InvalidRecord {
                record: record.name().to_string(),
                reason: "field with empty name".to_string(),
            });
        }
        if !seen.insert(spec.name.clone()) {
            return Err(FlattenError::InvalidRecord {
                record: record.name().to_string(),
                reason: format!("field '{}' declared more than once", spec.name),
            });
        }
        descriptors.push(ParameterDescriptor::model_field(spec, *record));
    }

    Ok(descriptors)
}
