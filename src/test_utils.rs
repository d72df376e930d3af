//! Shared fixtures and proptest strategies for unit tests.

use proptest::prelude::*;
use serde::Deserialize;

use crate::{deserialize_record, DeclaredType, FieldSpec, Kwargs, Marker, Record, RecordError};

/// Two-field record with its own validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Endpoint {
    pub(crate) host: String,
    #[serde(default = "default_port")]
    pub(crate) port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Record for Endpoint {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("host", DeclaredType::Str).with_marker(Marker::option(["--host"])),
            FieldSpec::new("port", DeclaredType::Int)
                .with_default(8080)
                .with_description("Port to connect to"),
        ]
    }

    fn construct(values: Kwargs) -> Result<Self, RecordError> {
        let endpoint: Endpoint = deserialize_record(values)?;
        if endpoint.port == 0 {
            return Err("port must be non-zero".into());
        }
        Ok(endpoint)
    }
}

/// Record with a closed string choice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Tuning {
    pub(crate) mode: String,
    pub(crate) retries: u32,
}

impl Record for Tuning {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("mode", DeclaredType::choice(["fast", "safe"]))
                .with_default("safe")
                .with_marker(Marker::option(["--mode"])),
            FieldSpec::new("retries", DeclaredType::Int).with_default(3),
        ]
    }

    fn construct(values: Kwargs) -> Result<Self, RecordError> {
        let tuning: Tuning = deserialize_record(values)?;
        if !matches!(tuning.mode.as_str(), "fast" | "safe") {
            return Err(format!("unknown mode '{}'", tuning.mode).into());
        }
        Ok(tuning)
    }
}

/// Record that declares the same field twice.
#[derive(Debug)]
pub(crate) struct Doubled;

impl Record for Doubled {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("value", DeclaredType::Str),
            FieldSpec::new("value", DeclaredType::Int),
        ]
    }

    fn construct(_values: Kwargs) -> Result<Self, RecordError> {
        Ok(Doubled)
    }
}

/// Generates identifier-like parameter names.
pub(crate) fn arb_param_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("valid regex")
}

/// Generates a non-empty list of distinct string choices.
pub(crate) fn arb_choices(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(
        prop::string::string_regex("[a-z]{1,8}").expect("valid regex"),
        1..=max,
    )
    .prop_map(|set| set.into_iter().collect())
}
