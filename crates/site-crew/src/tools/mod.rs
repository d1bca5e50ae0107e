//! Filesystem capabilities exposed to the reasoning service.
//!
//! Each capability implements [`Capability`] and is registered once in a
//! [`CapabilityRegistry`]. Capabilities are total: every failure, including
//! malformed arguments, is returned as a [`CapabilityOutcome::Failed`] value
//! rather than an `Err`, because the consumer of the result is a model that
//! can only react to what it reads back.

pub mod fs_tools;
pub mod registry;
pub mod rig_bridge;
pub mod toolbox;

use std::path::{Component, Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use registry::{CapabilityRegistry, RegistryError};
pub use toolbox::{ToolCall, Toolbox};

/// Prefix carried by every error-tagged text result.
pub const ERROR_MARKER: &str = "ERROR";

/// The nominal channel a capability answers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Text,
    Flag,
    Entries,
}

/// Tagged result of one capability invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum CapabilityOutcome {
    Text(String),
    Flag(bool),
    Entries(Vec<String>),
    Failed { kind: ResultKind, message: String },
}

impl CapabilityOutcome {
    pub fn failed(kind: ResultKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Render the outcome on the channel the model sees.
    ///
    /// Failures collapse into the nominal type of their kind: an `ERROR ...`
    /// string, `false`, or a one-element sequence holding the error text.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Flag(flag) => Value::Bool(*flag),
            Self::Entries(entries) => Value::from(entries.clone()),
            Self::Failed { kind, message } => match kind {
                ResultKind::Text => Value::String(message.clone()),
                ResultKind::Flag => Value::Bool(false),
                ResultKind::Entries => Value::from(vec![message.clone()]),
            },
        }
    }

    /// Short human-readable form for logs.
    pub fn summary(&self) -> String {
        match self {
            Self::Text(text) => format!("text ({} bytes)", text.len()),
            Self::Flag(flag) => format!("{flag}"),
            Self::Entries(entries) => format!("{} entries", entries.len()),
            Self::Failed { message, .. } => message.clone(),
        }
    }
}

/// A named, total filesystem operation with a fixed argument schema.
pub trait Capability: Send + Sync {
    /// Globally unique capability name.
    fn name(&self) -> &'static str;

    /// Description shown to the model alongside the schema.
    fn description(&self) -> &'static str;

    /// JSON schema of the argument object.
    fn parameters(&self) -> Value;

    fn result_kind(&self) -> ResultKind;

    /// Run the capability. Never panics and never returns out-of-band errors.
    fn invoke(&self, args: &Value) -> CapabilityOutcome;
}

/// Deserialize a capability's argument object, turning schema mismatches
/// into an error-tagged outcome.
pub(crate) fn parse_args<T: DeserializeOwned>(
    capability: &str,
    kind: ResultKind,
    args: &Value,
) -> Result<T, CapabilityOutcome> {
    serde_json::from_value(args.clone()).map_err(|e| {
        CapabilityOutcome::failed(
            kind,
            format!("{ERROR_MARKER} invalid arguments for {capability}: {e}"),
        )
    })
}

/// JSON schema for an argument record, without the meta-schema header.
pub(crate) fn args_schema<T: schemars::JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    if let Some(map) = value.as_object_mut() {
        map.remove("$schema");
        map.remove("title");
    }
    value
}

/// Resolves model-supplied paths against a base directory.
///
/// A leading `~` expands to the home directory, relative paths are joined to
/// `base`, and `.`/`..` components are folded lexically. No containment check
/// is applied: `..` may leave the base directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let base = std::path::absolute(&base).unwrap_or(base);
        Self {
            base: normalize_lexically(&base),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn resolve(&self, raw: &str) -> PathBuf {
        let expanded = expand_home(raw);
        let joined = if expanded.is_absolute() {
            expanded
        } else {
            self.base.join(expanded)
        };
        normalize_lexically(&joined)
    }
}

fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` stays at the root, as os-level resolution does.
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
