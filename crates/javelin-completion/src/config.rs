//! Formatting preferences and their loading
//!
//! Preferences are an immutable snapshot taken at invocation time and passed
//! into every call; nothing in the engine reads mutable global settings.
use crate::types::{CompletionError, CompletionResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How prefix matching treats letter case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseMode {
    /// The typed prefix must match candidate case exactly.
    #[default]
    Sensitive,
    /// Case is ignored entirely.
    Insensitive,
    /// Only the first character's case must match exactly.
    FirstLetter,
}

impl CaseMode {
    /// Resolve a spelling from a preferences file. Unknown spellings fall
    /// back to the fixed default instead of failing the whole snapshot.
    pub fn parse_lenient(value: &str) -> CaseMode {
        match value.to_ascii_lowercase().as_str() {
            "insensitive" | "none" => CaseMode::Insensitive,
            "first-letter" | "first_letter" | "firstletter" => CaseMode::FirstLetter,
            _ => CaseMode::Sensitive,
        }
    }
}

/// Editor formatting preferences the engine honors at insertion time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingPreferences {
    /// Append the closing half of bracket pairs on acceptance.
    pub auto_insert_pair_bracket: bool,
    /// A space between a call/statement keyword and its opening paren.
    pub space_before_parens: bool,
    /// Spaces just inside call parentheses.
    pub space_within_call_parens: bool,
    /// Prefix stripped from field names before hump matching.
    pub field_name_prefix: String,
    #[serde(deserialize_with = "lenient_case_mode")]
    pub case_sensitivity: CaseMode,
}

/// A misspelled case mode must not fail the whole snapshot; it resolves to
/// the fixed default through [`CaseMode::parse_lenient`].
fn lenient_case_mode<'de, D>(deserializer: D) -> Result<CaseMode, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let spelling = String::deserialize(deserializer)?;
    Ok(CaseMode::parse_lenient(&spelling))
}

impl Default for FormattingPreferences {
    fn default() -> Self {
        Self {
            auto_insert_pair_bracket: true,
            space_before_parens: false,
            space_within_call_parens: false,
            field_name_prefix: String::new(),
            case_sensitivity: CaseMode::Sensitive,
        }
    }
}

/// Preferences snapshot loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a preferences snapshot from a YAML file
    pub fn from_yaml_path(path: &Path) -> CompletionResult<FormattingPreferences> {
        let content = std::fs::read_to_string(path)?;
        let prefs: FormattingPreferences = serde_yaml::from_str(&content)?;
        Self::validate(&prefs)?;
        Ok(prefs)
    }

    /// Load a preferences snapshot from a JSON file
    pub fn from_json_path(path: &Path) -> CompletionResult<FormattingPreferences> {
        let content = std::fs::read_to_string(path)?;
        let prefs: FormattingPreferences = serde_json::from_str(&content)?;
        Self::validate(&prefs)?;
        Ok(prefs)
    }

    /// Load a preferences snapshot from a string
    pub fn from_str(content: &str, format: ConfigFormat) -> CompletionResult<FormattingPreferences> {
        let prefs = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Self::validate(&prefs)?;
        Ok(prefs)
    }

    /// Validate a preferences snapshot
    fn validate(prefs: &FormattingPreferences) -> CompletionResult<()> {
        if prefs
            .field_name_prefix
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && c != '_')
        {
            return Err(CompletionError::Config(format!(
                "field name prefix must be an identifier fragment, got {:?}",
                prefs.field_name_prefix
            )));
        }
        Ok(())
    }
}

/// Preferences file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}
