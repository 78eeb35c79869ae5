use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::infra::{
    config::{load, AppConfig},
    contracts::ConfigAdapter,
};

/// Reads `AppConfig` from a TOML file; `None` means `./config.toml`.
#[derive(Debug, Clone, Default)]
pub struct FileConfigAdapter {
    path: Option<PathBuf>,
}

impl FileConfigAdapter {
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
        }
    }
}

impl ConfigAdapter for FileConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        Ok(load(self.path.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::infra::error::AppError;

    #[test]
    fn surfaces_typed_error_through_anyhow() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"[engine]\nfixture = 7\n")
            .expect("must write test config");

        let error = FileConfigAdapter::new(Some(file.path()))
            .load()
            .expect_err("config must be rejected");

        assert!(matches!(
            error.downcast_ref::<AppError>(),
            Some(AppError::ConfigParse { .. })
        ));
    }
}
