//! Plugin manifest parsing.
//!
//! The manifest is a JSON array describing the plugins produced by a build.
//! Only three keys matter: `type`, `pname` and `version`. Everything else is
//! ignored, and the three recognised keys are read leniently: a missing key
//! or an explicit `null` yields an empty string rather than an error. A
//! top-level `null` document is an empty manifest.
//!
//! Keys match exactly first and then ignoring ASCII case, so `"PName"` fills
//! the program name. When a key repeats, the last non-null value wins.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Directory under the output root that holds plugin executables.
pub const BIN_DIR: &str = "bin";

/// Errors raised while parsing the plugin manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest is not a JSON array of plugin objects.
    #[error("failed to parse plugin manifest: {0}")]
    Parse(#[source] serde_json::Error),
}

/// One plugin entry from the manifest.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use vault_register_script::PluginDescriptor;
///
/// let plugin = PluginDescriptor::new("secret", "vault-plugin-kv", "0.16.1");
/// assert_eq!(plugin.command_name(), "vault-plugin-kv-0.16.1");
/// assert_eq!(
///     plugin.binary_path(Path::new("/nix/store/out")),
///     Path::new("/nix/store/out/bin/vault-plugin-kv-0.16.1"),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginDescriptor {
    kind: String,
    program_name: String,
    version: String,
}

/// Manifest keys the generator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Kind,
    ProgramName,
    Version,
}

impl Field {
    const KEYS: [(&'static str, Self); 3] = [
        ("type", Self::Kind),
        ("pname", Self::ProgramName),
        ("version", Self::Version),
    ];

    /// Resolves a manifest key, preferring an exact match over a
    /// case-insensitive one.
    fn for_key(key: &str) -> Option<Self> {
        Self::KEYS
            .iter()
            .find(|(name, _)| *name == key)
            .or_else(|| {
                Self::KEYS
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(key))
            })
            .map(|&(_, field)| field)
    }
}

impl<'de> Deserialize<'de> for PluginDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DescriptorVisitor)
    }
}

/// Accepts only JSON objects; arrays and scalars are type errors.
struct DescriptorVisitor;

impl<'de> Visitor<'de> for DescriptorVisitor {
    type Value = PluginDescriptor;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a plugin object")
    }

    fn visit_map<A>(self, mut entries: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut plugin = PluginDescriptor::default();
        while let Some(key) = entries.next_key::<String>()? {
            let Some(field) = Field::for_key(&key) else {
                entries.next_value::<IgnoredAny>()?;
                continue;
            };
            // `null` leaves the field as it was.
            if let Some(value) = entries.next_value::<Option<String>>()? {
                *plugin.field_mut(field) = value;
            }
        }
        Ok(plugin)
    }
}

impl PluginDescriptor {
    /// Creates a descriptor. An empty `version` means the binary is unversioned.
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        program_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            program_name: program_name.into(),
            version: version.into(),
        }
    }

    /// Returns the plugin type passed to `vault plugin register`.
    #[must_use]
    pub const fn kind(&self) -> &str {
        self.kind.as_str()
    }

    /// Returns the plugin's program name.
    #[must_use]
    pub const fn program_name(&self) -> &str {
        self.program_name.as_str()
    }

    /// Returns the plugin version, empty when unversioned.
    #[must_use]
    pub const fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Returns the version when one was given.
    #[must_use]
    pub fn non_empty_version(&self) -> Option<&str> {
        Some(self.version.as_str()).filter(|version| !version.is_empty())
    }

    /// Returns the executable file name: `pname`, or `pname-version` for
    /// versioned plugins.
    #[must_use]
    pub fn command_name(&self) -> String {
        match self.non_empty_version() {
            Some(version) => format!("{}-{version}", self.program_name),
            None => self.program_name.clone(),
        }
    }

    /// Returns where the executable is expected below `output_dir`.
    #[must_use]
    pub fn binary_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(BIN_DIR).join(self.command_name())
    }

    const fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Kind => &mut self.kind,
            Field::ProgramName => &mut self.program_name,
            Field::Version => &mut self.version,
        }
    }
}

/// Parses the raw manifest, preserving entry order.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] if `bytes` is not well-formed JSON, is
/// not an array of objects, or holds a non-string value in a recognised key.
///
/// # Example
///
/// ```
/// use vault_register_script::parse_manifest;
///
/// let plugins = parse_manifest(br#"[{"type": "auth", "pname": "oidc"}]"#)
///     .expect("valid manifest");
/// assert_eq!(plugins.len(), 1);
/// assert_eq!(plugins[0].command_name(), "oidc");
/// ```
pub fn parse_manifest(bytes: &[u8]) -> Result<Vec<PluginDescriptor>, ManifestError> {
    let plugins: Option<Vec<PluginDescriptor>> =
        serde_json::from_slice(bytes).map_err(ManifestError::Parse)?;
    Ok(plugins.unwrap_or_default())
}
