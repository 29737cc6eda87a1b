//! Configuration model for path redirection.
//!
//! The recognized document shape, in TOML:
//!
//! ```toml
//! log_level = 2
//!
//! [definitions]
//! DataDir = "%FOLDERID::Documents%\\AppData"
//!
//! [rules.MyRule]
//! origin_directory = "C:\\Games\\SaveData"
//! target_directory = "%CONF::DataDir%\\Saves"
//! file_patterns = ["*.sav"]
//! redirect_mode = "Overlay"
//! ```
//!
//! `definitions` feeds the `CONF` reference domain; each `[rules.<name>]`
//! table describes one filesystem rule. Values may embed `%DOMAIN::NAME%`
//! references, expanded when the rules are added to a builder.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::rules::RedirectMode;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verbosity of the embedding application's log output.
    pub log_level: Option<u32>,

    /// Name-to-string pairs backing the `CONF` reference domain. Values may
    /// themselves contain references.
    pub definitions: IndexMap<String, String>,

    /// Filesystem rule sections, keyed by rule name. Order is preserved.
    pub rules: IndexMap<String, RuleConfig>,
}

impl Config {
    /// Parses a configuration document from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML or does not match the
    /// configuration shape.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text).map_err(Box::new)?)
    }
}

/// One filesystem rule section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Required. The directory the application refers to.
    pub origin_directory: Option<String>,

    /// Required. The directory files actually live at.
    pub target_directory: Option<String>,

    /// Optional glob patterns narrowing the rule to matching file names. A
    /// single string is accepted in place of a list.
    #[serde(deserialize_with = "one_or_many")]
    pub file_patterns: Vec<String>,

    /// Optional. Defaults to `Simple`.
    pub redirect_mode: Option<RedirectMode>,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(pattern) => vec![pattern],
        OneOrMany::Many(patterns) => patterns,
    })
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
