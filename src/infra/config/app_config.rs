use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::composing::ComposingTemplate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub engine: EngineConfig,
    pub labels: LabelsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

/// Where the in-memory engine takes its contacts and conversations from.
/// Without a fixture the engine starts empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelsConfig {
    pub composing_one: String,
    pub composing_other: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        let template = ComposingTemplate::default();
        Self {
            composing_one: template.one,
            composing_other: template.other,
        }
    }
}

impl LabelsConfig {
    pub fn composing_template(&self) -> ComposingTemplate {
        ComposingTemplate {
            one: self.composing_one.clone(),
            other: self.composing_other.clone(),
        }
    }
}
