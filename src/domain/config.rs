use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for mapping rows onto outline items.
///
/// This struct names the columns that carry the artifact type, the
/// hierarchy address and the content of each row, and controls how
/// malformed addresses are treated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Column holding the artifact type (heading, requirement, ...).
    type_field: String,

    /// Column holding the hierarchy address, for example `1.15.1-2`.
    hierarchy_field: String,

    /// Column holding the free-text content.
    content_field: String,

    /// Column rewritten with the canonical numbering by `sanitize`.
    ///
    /// Defaults to the hierarchy column.
    numbering_field: Option<String>,

    /// Whether to read a trailing `.0-N` in the hierarchy column as `-N`.
    ///
    /// Exported documents often number the leaves under heading `a.b` as
    /// `a.b.0-N`. When `false` (default), such rows have an invalid address
    /// and are skipped.
    pub repair_zero_leaf_sections: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            type_field: default_type_field(),
            hierarchy_field: default_hierarchy_field(),
            content_field: default_content_field(),
            numbering_field: None,
            repair_zero_leaf_sections: false,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the name of the artifact type column.
    #[must_use]
    pub fn type_field(&self) -> &str {
        &self.type_field
    }

    /// Returns the name of the hierarchy column.
    #[must_use]
    pub fn hierarchy_field(&self) -> &str {
        &self.hierarchy_field
    }

    /// Returns the name of the content column.
    #[must_use]
    pub fn content_field(&self) -> &str {
        &self.content_field
    }

    /// Returns the name of the column that receives canonical numbering.
    #[must_use]
    pub fn numbering_field(&self) -> &str {
        self.numbering_field
            .as_deref()
            .unwrap_or(&self.hierarchy_field)
    }

    /// Sets the name of the column that receives canonical numbering.
    pub fn set_numbering_field(&mut self, column: impl Into<String>) {
        self.numbering_field = Some(column.into());
    }
}

fn default_type_field() -> String {
    "Artifact Type".to_string()
}

fn default_hierarchy_field() -> String {
    "section".to_string()
}

fn default_content_field() -> String {
    "Contents".to_string()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_type_field")]
        type_field: String,

        #[serde(default = "default_hierarchy_field")]
        hierarchy_field: String,

        #[serde(default = "default_content_field")]
        content_field: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        numbering_field: Option<String>,

        #[serde(default)]
        repair_zero_leaf_sections: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                type_field,
                hierarchy_field,
                content_field,
                numbering_field,
                repair_zero_leaf_sections,
            } => Self {
                type_field,
                hierarchy_field,
                content_field,
                numbering_field,
                repair_zero_leaf_sections,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            type_field: config.type_field,
            hierarchy_field: config.hierarchy_field,
            content_field: config.content_field,
            numbering_field: config.numbering_field,
            repair_zero_leaf_sections: config.repair_zero_leaf_sections,
        }
    }
}
