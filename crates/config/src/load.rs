use crate::error::{ErrorKind, Result};
use crate::{APPLICATION, CONFIG_FILE_NAME, Config};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "SHELF_";

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APPLICATION)
}

/// Platform data directory, or the working directory if there is none.
pub(crate) fn data_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).unwrap_or_default()
}

/// Builds the layered [`Figment`] a [`Config`] is extracted from.
#[derive(Clone, Debug)]
pub struct Loader {
    user_file: Option<PathBuf>,
    explicit: Option<PathBuf>,
    env: bool,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            user_file: project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME)),
            explicit: None,
            env: true,
        }
    }
}

impl Loader {
    /// Layer a file on top of the user configuration. Unlike the user
    /// configuration, it must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Skip the configuration file in the platform configuration directory.
    pub fn without_user_file(mut self) -> Self {
        self.user_file = None;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    pub fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = &self.user_file {
            tracing::debug!(path = %path.display(), "layering user configuration");
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = &self.explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.display().to_string()));
            }
            figment = figment.merge(Toml::file_exact(path));
        }
        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        Ok(figment)
    }

    /// Extract and validate the configuration.
    #[instrument(skip(self), fields(explicit = ?self.explicit))]
    pub fn load(&self) -> Result<Config> {
        let config: Config = self.figment()?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }
}

/// Load from the default locations plus an optional explicit file.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let loader = Loader::default();
    match explicit {
        Some(path) => loader.with_file(path).load(),
        None => loader.load(),
    }
}
