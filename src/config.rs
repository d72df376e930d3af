use serde::Deserialize;

/// Options controlling how a callable is flattened.
///
/// Deserializable so hosts can keep it alongside their own configuration;
/// missing keys fall back to [`Default`].
///
/// # Examples
///
/// ```
/// use record_flatten::FlattenOptions;
///
/// let options = FlattenOptions::default().with_literals_to_enums(true);
/// assert!(options.literals_to_enums);
///
/// let parsed: FlattenOptions = serde_json::from_str("{}").unwrap();
/// assert_eq!(parsed, FlattenOptions::default());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlattenOptions {
    /// Replace closed string choices on record fields with generated enumerations.
    pub literals_to_enums: bool,
}

impl FlattenOptions {
    /// Sets `literals_to_enums`.
    pub fn with_literals_to_enums(mut self, enabled: bool) -> Self {
        self.literals_to_enums = enabled;
        self
    }
}
