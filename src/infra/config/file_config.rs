use std::path::PathBuf;

use serde::Deserialize;

use crate::infra::config::{AppConfig, EngineConfig, LabelsConfig, LogConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub engine: Option<FileEngineConfig>,
    pub labels: Option<FileLabelsConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(engine) = self.engine {
            engine.merge_into(&mut config.engine);
        }

        if let Some(labels) = self.labels {
            labels.merge_into(&mut config.labels);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileEngineConfig {
    pub fixture: Option<PathBuf>,
}

impl FileEngineConfig {
    fn merge_into(self, config: &mut EngineConfig) {
        if let Some(fixture) = self.fixture {
            config.fixture = Some(fixture);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLabelsConfig {
    pub composing_one: Option<String>,
    pub composing_other: Option<String>,
}

impl FileLabelsConfig {
    fn merge_into(self, config: &mut LabelsConfig) {
        if let Some(one) = self.composing_one {
            config.composing_one = one;
        }

        if let Some(other) = self.composing_other {
            config.composing_other = other;
        }
    }
}
