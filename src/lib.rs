//! Flatten structured-record parameters into a flat, named signature.
//!
//! Frontends such as CLI parsers or RPC stubs only understand a flat list of
//! named parameters. This crate lets a callable group related parameters into
//! reusable records while still presenting a flat surface:
//! - **Decoration**: [`Flattener::flatten`] expands every record parameter
//!   into its fields, in place, and rejects name collisions up front
//! - **Invocation**: [`FlatCallable::call`] takes flat keyword arguments,
//!   rebuilds each record through its own validating constructor, and calls
//!   the original function
//!
//! # Core Types
//!
//! - [`Record`]: Registration trait a structured record implements
//! - [`Callable`]: A function value plus its declared parameters
//! - [`Flattener`]: Builds and caches flattened signatures
//! - [`FlatCallable`]: The flat view of a callable, invocable by keyword
//! - [`FlattenedSignature`]: Ordered flat parameters plus reconstruction groups
//!
//! # Examples
//!
//! ```
//! use record_flatten::{
//!     deserialize_record, Arguments, Callable, DeclaredType, FieldSpec, Flattener, Kwargs,
//!     Marker, Record, RecordError,
//! };
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Debug, PartialEq, Deserialize)]
//! struct CliArgs {
//!     argument: String,
//! }
//!
//! impl Record for CliArgs {
//!     fn fields() -> Vec<FieldSpec> {
//!         vec![FieldSpec::new("argument", DeclaredType::Str)
//!             .with_marker(Marker::option(["--nested-arg"]))]
//!     }
//!
//!     fn construct(values: Kwargs) -> Result<Self, RecordError> {
//!         deserialize_record(values)
//!     }
//! }
//!
//! let command = Callable::new(
//!     "my_cli_function",
//!     vec![
//!         FieldSpec::new("cli_arg", DeclaredType::Str)
//!             .with_marker(Marker::option(["--first-level-arg"])),
//!         FieldSpec::record::<CliArgs>("cli_args_class"),
//!     ],
//!     |mut args: Arguments| {
//!         let cli_arg: String = args.get("cli_arg")?;
//!         let nested = args.take_record::<CliArgs>("cli_args_class")?;
//!         Ok::<_, record_flatten::ArgumentError>(format!("{cli_arg}/{}", nested.argument))
//!     },
//! );
//!
//! let flat = Flattener::default().flatten(&command).expect("no collisions");
//! assert_eq!(flat.signature().names().collect::<Vec<_>>(), ["cli_arg", "argument"]);
//!
//! let kwargs = json!({"cli_arg": "value2", "argument": "value"});
//! let out = flat.call(kwargs.as_object().cloned().unwrap()).unwrap();
//! assert_eq!(out, "value2/value");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod callable;
mod config;
mod error;
mod extract;
mod marker;
mod normalize;
mod plan;
mod record;
mod signature;
mod types;

#[cfg(test)]
mod test_utils;

pub use callable::{Callable, FlatCallable, Flattener};
pub use config::FlattenOptions;
pub use error::{ArgumentError, CallError, FlattenError, FlattenResult};
pub use extract::extract_fields;
pub use marker::Marker;
pub use normalize::normalize_field;
pub use plan::{Arguments, ReconstructionPlan};
pub use record::{deserialize_record, FieldSpec, Kwargs, Record, RecordError, RecordType};
pub use signature::{
    FieldGroup, FieldMember, FlattenedSignature, Origin, ParameterDescriptor, SignatureBuilder,
};
pub use types::{DeclaredType, DefaultValue, EnumMember, EnumType};
