//! File system capabilities: create, write, append, inspect and list paths.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{
    args_schema, parse_args, Capability, CapabilityOutcome, PathResolver, ResultKind, ERROR_MARKER,
};

fn default_true() -> bool {
    true
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

/// Text encodings accepted by the reading capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "ascii" | "us-ascii" => Some(Self::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Some(Self::Latin1),
            _ => None,
        }
    }

    pub fn decode(self, bytes: Vec<u8>) -> Result<String, String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(|e| e.to_string()),
            Self::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(format!("byte 0x{:02x} at offset {pos} is not ascii", bytes[pos])),
                None => Ok(bytes.into_iter().map(char::from).collect()),
            },
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

fn read_with_encoding(path: &Path, label: &str) -> Result<String, String> {
    let encoding =
        TextEncoding::from_label(label).ok_or_else(|| format!("unsupported encoding '{label}'"))?;
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    encoding.decode(bytes)
}

fn ensure_parent(path: &Path, create_parents: bool) -> std::io::Result<()> {
    if !create_parents {
        return Ok(());
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// create_directory
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDirectoryArgs {
    /// Directory to create, relative to the working directory or absolute.
    pub path: String,
    /// Create missing intermediate directories (and accept an existing directory).
    #[serde(default = "default_true")]
    pub create_parents: bool,
}

/// Create a directory, optionally with its parents.
pub struct CreateDirectory {
    resolver: PathResolver,
}

impl CreateDirectory {
    pub const NAME: &'static str = "create_directory";

    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn run(&self, args: CreateDirectoryArgs) -> CapabilityOutcome {
        let full_path = self.resolver.resolve(&args.path);
        let created = if args.create_parents {
            fs::create_dir_all(&full_path)
        } else {
            fs::create_dir(&full_path)
        };
        match created {
            Ok(()) => CapabilityOutcome::Text(format!("Created directory: {}", full_path.display())),
            Err(e) => CapabilityOutcome::failed(
                ResultKind::Text,
                format!("{ERROR_MARKER} creating directory '{}': {e}", args.path),
            ),
        }
    }
}

impl Capability for CreateDirectory {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Create a directory. Parent directories are created unless create_parents is false."
    }

    fn parameters(&self) -> Value {
        args_schema::<CreateDirectoryArgs>()
    }

    fn result_kind(&self) -> ResultKind {
        ResultKind::Text
    }

    fn invoke(&self, args: &Value) -> CapabilityOutcome {
        match parse_args(Self::NAME, self.result_kind(), args) {
            Ok(args) => self.run(args),
            Err(outcome) => outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// write_text / append_text
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteTextArgs {
    /// File to write, relative to the working directory or absolute.
    pub path: String,
    /// Full text content. A missing value writes an empty file.
    #[serde(default)]
    pub content: Option<String>,
    /// Create missing parent directories first.
    #[serde(default = "default_true")]
    pub create_parents: bool,
}

/// Overwrite a file with UTF-8 text.
pub struct WriteText {
    resolver: PathResolver,
}

impl WriteText {
    pub const NAME: &'static str = "write_text";

    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn run(&self, args: WriteTextArgs) -> CapabilityOutcome {
        let full_path = self.resolver.resolve(&args.path);
        let content = args.content.unwrap_or_default();
        let written = ensure_parent(&full_path, args.create_parents)
            .and_then(|()| fs::write(&full_path, content.as_bytes()));
        match written {
            Ok(()) => CapabilityOutcome::Text(format!(
                "Wrote file: {} ({} bytes)",
                full_path.display(),
                content.len()
            )),
            Err(e) => CapabilityOutcome::failed(
                ResultKind::Text,
                format!("{ERROR_MARKER} writing file '{}': {e}", args.path),
            ),
        }
    }
}

impl Capability for WriteText {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Write text to a file, replacing any existing content. Creates parent directories by default."
    }

    fn parameters(&self) -> Value {
        args_schema::<WriteTextArgs>()
    }

    fn result_kind(&self) -> ResultKind {
        ResultKind::Text
    }

    fn invoke(&self, args: &Value) -> CapabilityOutcome {
        match parse_args(Self::NAME, self.result_kind(), args) {
            Ok(args) => self.run(args),
            Err(outcome) => outcome,
        }
    }
}

/// Append UTF-8 text to a file, creating it when missing.
pub struct AppendText {
    resolver: PathResolver,
}

impl AppendText {
    pub const NAME: &'static str = "append_text";

    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn run(&self, args: WriteTextArgs) -> CapabilityOutcome {
        let full_path = self.resolver.resolve(&args.path);
        let content = args.content.unwrap_or_default();
        let appended = ensure_parent(&full_path, args.create_parents).and_then(|()| {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&full_path)?;
            file.write_all(content.as_bytes())
        });
        match appended {
            Ok(()) => CapabilityOutcome::Text(format!(
                "Appended to file: {} (+{} bytes)",
                full_path.display(),
                content.len()
            )),
            Err(e) => CapabilityOutcome::failed(
                ResultKind::Text,
                format!("{ERROR_MARKER} appending to file '{}': {e}", args.path),
            ),
        }
    }
}

impl Capability for AppendText {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Append text to the end of a file, creating it (and its parents by default) if missing."
    }

    fn parameters(&self) -> Value {
        args_schema::<WriteTextArgs>()
    }

    fn result_kind(&self) -> ResultKind {
        ResultKind::Text
    }

    fn invoke(&self, args: &Value) -> CapabilityOutcome {
        match parse_args(Self::NAME, self.result_kind(), args) {
            Ok(args) => self.run(args),
            Err(outcome) => outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// path_exists
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PathArgs {
    /// Path to inspect, relative to the working directory or absolute.
    pub path: String,
}

/// Report whether a file or directory exists.
pub struct PathExists {
    resolver: PathResolver,
}

impl PathExists {
    pub const NAME: &'static str = "path_exists";

    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn run(&self, args: PathArgs) -> CapabilityOutcome {
        let full_path = self.resolver.resolve(&args.path);
        match full_path.try_exists() {
            Ok(exists) => CapabilityOutcome::Flag(exists),
            Err(e) => CapabilityOutcome::failed(
                ResultKind::Flag,
                format!("{ERROR_MARKER} checking path '{}': {e}", args.path),
            ),
        }
    }
}

impl Capability for PathExists {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Return true if the path exists (file or directory), false otherwise."
    }

    fn parameters(&self) -> Value {
        args_schema::<PathArgs>()
    }

    fn result_kind(&self) -> ResultKind {
        ResultKind::Flag
    }

    fn invoke(&self, args: &Value) -> CapabilityOutcome {
        match parse_args(Self::NAME, self.result_kind(), args) {
            Ok(args) => self.run(args),
            Err(outcome) => outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// read_text
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadTextArgs {
    /// File to read, relative to the working directory or absolute.
    pub path: String,
    /// Text encoding: utf-8, ascii or latin-1.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

/// Read a whole text file.
pub struct ReadText {
    resolver: PathResolver,
}

impl ReadText {
    pub const NAME: &'static str = "read_text";

    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn run(&self, args: ReadTextArgs) -> CapabilityOutcome {
        let full_path = self.resolver.resolve(&args.path);
        match read_with_encoding(&full_path, &args.encoding) {
            Ok(content) => CapabilityOutcome::Text(content),
            Err(e) => CapabilityOutcome::failed(
                ResultKind::Text,
                format!("{ERROR_MARKER} reading file '{}': {e}", args.path),
            ),
        }
    }
}

impl Capability for ReadText {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Read and return the full contents of a text file."
    }

    fn parameters(&self) -> Value {
        args_schema::<ReadTextArgs>()
    }

    fn result_kind(&self) -> ResultKind {
        ResultKind::Text
    }

    fn invoke(&self, args: &Value) -> CapabilityOutcome {
        match parse_args(Self::NAME, self.result_kind(), args) {
            Ok(args) => self.run(args),
            Err(outcome) => outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// list_entries
// ---------------------------------------------------------------------------

/// List the entry names of a directory in lexicographic order.
pub struct ListEntries {
    resolver: PathResolver,
}

impl ListEntries {
    pub const NAME: &'static str = "list_entries";

    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn run(&self, args: PathArgs) -> CapabilityOutcome {
        let full_path = self.resolver.resolve(&args.path);
        match read_entry_names(&full_path) {
            Ok(mut names) => {
                names.sort();
                CapabilityOutcome::Entries(names)
            }
            Err(e) => CapabilityOutcome::failed(
                ResultKind::Entries,
                format!("{ERROR_MARKER} listing directory '{}': {e}", args.path),
            ),
        }
    }
}

fn read_entry_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

impl Capability for ListEntries {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "List the names of the entries in a directory, sorted."
    }

    fn parameters(&self) -> Value {
        args_schema::<PathArgs>()
    }

    fn result_kind(&self) -> ResultKind {
        ResultKind::Entries
    }

    fn invoke(&self, args: &Value) -> CapabilityOutcome {
        match parse_args(Self::NAME, self.result_kind(), args) {
            Ok(args) => self.run(args),
            Err(outcome) => outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// contains_substring
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContainsSubstringArgs {
    /// File to search, relative to the working directory or absolute.
    pub path: String,
    /// Text to look for (plain substring match).
    #[serde(default)]
    pub text: Option<String>,
    /// Text encoding: utf-8, ascii or latin-1.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

/// Report whether a file contains a substring.
pub struct ContainsSubstring {
    resolver: PathResolver,
}

impl ContainsSubstring {
    pub const NAME: &'static str = "contains_substring";

    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn run(&self, args: ContainsSubstringArgs) -> CapabilityOutcome {
        let full_path = self.resolver.resolve(&args.path);
        if !full_path.is_file() {
            return CapabilityOutcome::Flag(false);
        }
        let needle = args.text.unwrap_or_default();
        match read_with_encoding(&full_path, &args.encoding) {
            Ok(content) => CapabilityOutcome::Flag(content.contains(&needle)),
            Err(e) => CapabilityOutcome::failed(
                ResultKind::Flag,
                format!("{ERROR_MARKER} searching file '{}': {e}", args.path),
            ),
        }
    }
}

impl Capability for ContainsSubstring {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Return true if the file exists and contains the given text, false otherwise."
    }

    fn parameters(&self) -> Value {
        args_schema::<ContainsSubstringArgs>()
    }

    fn result_kind(&self) -> ResultKind {
        ResultKind::Flag
    }

    fn invoke(&self, args: &Value) -> CapabilityOutcome {
        match parse_args(Self::NAME, self.result_kind(), args) {
            Ok(args) => self.run(args),
            Err(outcome) => outcome,
        }
    }
}

// ── Unit tests ──────────────────────────────────────────────────────
