//! Feed Templates Configuration
//!
//! Defines the status-message templates used by the feed wizard. A default
//! set is embedded in the binary; a YAML file can replace it.

use loan_desk_core::OrderedTable;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const EMBEDDED_TEMPLATES: &str = include_str!("../templates/feed_templates.yaml");

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// Feed templates keyed by kind, in wizard order
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedTemplatesConfig {
    #[serde(default)]
    pub templates: OrderedTable<String>,
}

impl FeedTemplatesConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FeedTemplatesConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FeedTemplatesConfigError::FileNotFound(
                path.as_ref().display().to_string(),
                e.to_string(),
            )
        })?;

        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, FeedTemplatesConfigError> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| FeedTemplatesConfigError::ParseError(e.to_string()))?;

        if config.templates.is_empty() {
            return Err(FeedTemplatesConfigError::ParseError(
                "no templates defined".to_string(),
            ));
        }
        Ok(config)
    }

    /// Templates compiled into the binary
    pub fn embedded() -> Result<Self, FeedTemplatesConfigError> {
        Self::from_yaml_str(EMBEDDED_TEMPLATES)
    }

    /// Load `path` when given, otherwise the embedded set
    pub fn load_or_embedded(path: Option<&Path>) -> Result<Self, FeedTemplatesConfigError> {
        match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading feed templates");
                Self::load(path)
            }
            None => Self::embedded(),
        }
    }

    pub fn get_template(&self, kind: &str) -> Option<&str> {
        self.templates.get(kind).map(String::as_str)
    }

    /// Template kinds in wizard order
    pub fn kinds(&self) -> Vec<&str> {
        self.templates.keys().collect()
    }

    /// Build message from template with placeholder substitution
    pub fn build_message(
        &self,
        kind: &str,
        placeholders: &HashMap<String, String>,
    ) -> Option<String> {
        let template = self.get_template(kind)?;

        // Single pass over the template; substituted values are never rescanned
        let message = PLACEHOLDER.replace_all(template, |caps: &regex::Captures<'_>| {
            match placeholders.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        });

        Some(message.into_owned())
    }
}

/// Errors when loading feed templates
#[derive(Debug)]
pub enum FeedTemplatesConfigError {
    FileNotFound(String, String),
    ParseError(String),
}

impl std::fmt::Display for FeedTemplatesConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound(path, err) => {
                write!(f, "Feed templates not found at {}: {}", path, err)
            }
            Self::ParseError(err) => write!(f, "Failed to parse feed templates: {}", err),
        }
    }
}

impl std::error::Error for FeedTemplatesConfigError {}
