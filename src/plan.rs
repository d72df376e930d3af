use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::error::{ArgumentError, CallError};
use crate::record::{Kwargs, Record, RecordType};
use crate::signature::{FieldMember, FlattenedSignature, Origin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Passthrough,
    Field,
}

#[derive(Debug)]
struct GroupPlan {
    owner: RecordType,
    parameter: String,
    members: Vec<FieldMember>,
}

/// Precomputed routing from flat keyword arguments back to original parameters.
///
/// Built once per flattened callable and read-only afterwards; binding a call
/// never mutates the plan.
#[derive(Debug)]
pub struct ReconstructionPlan {
    routes: HashMap<String, Route>,
    defaults: Vec<(String, Value)>,
    required: Vec<String>,
    groups: Vec<GroupPlan>,
}

impl ReconstructionPlan {
    /// Derives the plan for `signature`.
    pub fn new(signature: &FlattenedSignature) -> Self {
        let mut routes = HashMap::with_capacity(signature.len());
        let mut defaults = Vec::new();
        let mut required = Vec::new();

        for param in signature.parameters() {
            let route = match param.origin() {
                Origin::TopLevel => Route::Passthrough,
                Origin::ModelField { .. } => Route::Field,
            };
            routes.insert(param.name().to_string(), route);

            match param.default() {
                Some(default) => defaults.push((param.name().to_string(), default.to_value())),
                None if route == Route::Passthrough => required.push(param.name().to_string()),
                // Left to the record's constructor to report.
                None => {}
            }
        }

        let groups = signature
            .groups()
            .iter()
            .map(|group| GroupPlan {
                owner: *group.owner_type(),
                parameter: group.parameter_name_in_original().to_string(),
                members: group.member_field_names().to_vec(),
            })
            .collect();

        Self {
            routes,
            defaults,
            required,
            groups,
        }
    }

    /// Turns flat keyword arguments into the original callable's arguments.
    ///
    /// Absent parameters with a default are bound to it, each group's members
    /// are pulled out and handed to the record's constructor, and whatever
    /// remains passes through under its own name.
    ///
    /// # Errors
    ///
    /// - [`CallError::UnexpectedArgument`] for a name outside the signature
    /// - [`CallError::MissingArgument`] for an absent required top-level parameter
    /// - [`CallError::Record`] with the record's own diagnostic if construction fails
    pub fn bind<E>(&self, mut kwargs: Kwargs) -> Result<Arguments, CallError<E>> {
        if let Some(name) = kwargs.keys().find(|name| !self.routes.contains_key(*name)) {
            return Err(CallError::UnexpectedArgument { name: name.clone() });
        }

        for (name, value) in &self.defaults {
            if !kwargs.contains_key(name) {
                kwargs.insert(name.clone(), value.clone());
            }
        }

        if let Some(name) = self.required.iter().find(|name| !kwargs.contains_key(*name)) {
            return Err(CallError::MissingArgument { name: name.clone() });
        }

        let mut records = HashMap::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut values = Kwargs::new();
            for member in &group.members {
                if let Some(value) = kwargs.remove(&member.flat_name) {
                    values.insert(member.field_name.clone(), value);
                }
            }

            trace!(
                record = group.owner.name(),
                parameter = %group.parameter,
                fields = values.len(),
                "reconstructing record"
            );
            let record = group.owner.construct(values).map_err(CallError::Record)?;
            records.insert(group.parameter.clone(), record);
        }

        Ok(Arguments {
            values: kwargs,
            records,
        })
    }
}

/// Arguments delivered to the original callable, keyed by original parameter name.
///
/// Plain parameters hold JSON values; record parameters hold the constructed
/// record. Also usable directly to invoke a [`Callable`] in its original shape.
///
/// [`Callable`]: crate::Callable
///
/// # Examples
///
/// ```
/// use record_flatten::Arguments;
///
/// let args = Arguments::new().with_value("retries", 3);
/// assert_eq!(args.get::<u32>("retries").unwrap(), 3);
/// assert!(args.get::<u32>("timeout").is_err());
/// ```
#[derive(Default)]
pub struct Arguments {
    values: Kwargs,
    records: HashMap<String, Box<dyn Any + Send>>,
}

impl Arguments {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a plain value.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Binds a record value.
    pub fn with_record<R: Record>(mut self, name: impl Into<String>, record: R) -> Self {
        self.records.insert(name.into(), Box::new(record));
        self
    }

    /// Returns the raw value of a plain parameter.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Deserializes a plain parameter into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] if nothing is bound under `name`, or
    /// [`ArgumentError::Invalid`] if the value does not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArgumentError> {
        let value = self.values.get(name).ok_or_else(|| ArgumentError::Missing {
            name: name.to_string(),
        })?;
        T::deserialize(value).map_err(|source| ArgumentError::Invalid {
            name: name.to_string(),
            source,
        })
    }

    /// Borrows a reconstructed record.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] or [`ArgumentError::WrongRecord`].
    pub fn record<R: Record>(&self, name: &str) -> Result<&R, ArgumentError> {
        let record = self.records.get(name).ok_or_else(|| ArgumentError::Missing {
            name: name.to_string(),
        })?;
        record
            .downcast_ref::<R>()
            .ok_or_else(|| ArgumentError::WrongRecord {
                name: name.to_string(),
                expected: R::record_name(),
            })
    }

    /// Takes ownership of a reconstructed record.
    ///
    /// On a type mismatch the record stays bound.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] or [`ArgumentError::WrongRecord`].
    pub fn take_record<R: Record>(&mut self, name: &str) -> Result<R, ArgumentError> {
        let record = self.records.remove(name).ok_or_else(|| ArgumentError::Missing {
            name: name.to_string(),
        })?;
        match record.downcast::<R>() {
            Ok(record) => Ok(*record),
            Err(record) => {
                self.records.insert(name.to_string(), record);
                Err(ArgumentError::WrongRecord {
                    name: name.to_string(),
                    expected: R::record_name(),
                })
            }
        }
    }

    /// Returns `true` if a value or record is bound under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.records.contains_key(name)
    }

    /// Returns the number of bound arguments.
    pub fn len(&self) -> usize {
        self.values.len() + self.records.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.records.is_empty()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut records: Vec<&str> = self.records.keys().map(String::as_str).collect();
        records.sort_unstable();
        f.debug_struct("Arguments")
            .field("values", &self.values)
            .field("records", &records)
            .finish()
    }
}
