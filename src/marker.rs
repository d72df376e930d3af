use serde::Serialize;
use serde_json::Value;

/// Frontend metadata attached to a parameter or record field.
///
/// Markers are opaque to the flattening transform: they are carried from the
/// declaration onto the flattened parameter in order and never interpreted,
/// except that [`Marker::Help`] participates in description merging.
///
/// # Examples
///
/// ```
/// use record_flatten::Marker;
///
/// let marker = Marker::option(["--nested-arg"]);
/// assert_eq!(marker.option_flags(), Some(&["--nested-arg".to_string()][..]));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "marker", content = "value", rename_all = "snake_case")]
pub enum Marker {
    /// Render as a named option with the given flag spellings.
    Option {
        /// Flag spellings such as `--port` or `-p`
        flags: Vec<String>,
        /// Hide from generated help
        hidden: bool,
    },
    /// Render as a positional argument.
    Argument,
    /// Help text shown by the frontend.
    Help(String),
    /// Environment variable the frontend may read the value from.
    Envvar(String),
    /// Any other frontend-specific hint.
    Custom {
        /// Hint name
        key: String,
        /// Hint payload
        value: Value,
    },
}

impl Marker {
    /// Creates a visible option marker from flag spellings.
    pub fn option<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Marker::Option {
            flags: flags.into_iter().map(Into::into).collect(),
            hidden: false,
        }
    }

    /// Creates a help marker.
    pub fn help(text: impl Into<String>) -> Self {
        Marker::Help(text.into())
    }

    /// Creates a custom marker.
    pub fn custom(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Marker::Custom {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns the flag spellings if this is an option marker.
    pub fn option_flags(&self) -> Option<&[String]> {
        match self {
            Marker::Option { flags, .. } => Some(flags),
            _ => None,
        }
    }

    pub(crate) fn is_help(&self) -> bool {
        matches!(self, Marker::Help(_))
    }
}

/// Appends a help marker built from `description` unless one is already present.
///
/// Explicit markers always win over descriptions.
pub(crate) fn merge_description(markers: &mut Vec<Marker>, description: Option<&str>) {
    let Some(text) = description else {
        return;
    };
    if !markers.iter().any(Marker::is_help) {
        markers.push(Marker::help(text));
    }
}
