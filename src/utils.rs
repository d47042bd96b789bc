use crate::discovery::{
    DEFAULT_DATABASE_NAME, DEFAULT_PACKAGE_PREFIX, default_search_root, find_database,
};
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings persisted in `config.toml`. Every key is optional.
#[derive(Deserialize, Default, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub db_path: Option<PathBuf>,
    pub search_root: Option<PathBuf>,
    pub package_prefix: Option<String>,
    pub database_name: Option<String>,
}

/// Where to find the database, after layering CLI flags over the config file.
/// This decouples the commands from how the arguments were parsed.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub search_root: Option<PathBuf>,
    pub package_prefix: String,
    pub database_name: String,
}

impl AppConfig {
    /// CLI > config file > defaults.
    pub fn resolve(cli_db: Option<PathBuf>, file: FileConfig) -> Self {
        Self {
            db_path: cli_db.or(file.db_path),
            search_root: file.search_root,
            package_prefix: file
                .package_prefix
                .unwrap_or_else(|| DEFAULT_PACKAGE_PREFIX.to_string()),
            database_name: file
                .database_name
                .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
        }
    }

    /// The explicit database path if one was given, otherwise the single
    /// database found below the search root.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            if !path.exists() {
                return Err(eyre!(
                    "Database not found at: {}\nUse --db to specify the path manually.",
                    path.display()
                ));
            }
            return Ok(path.clone());
        }
        let root = self
            .search_root
            .clone()
            .or_else(default_search_root)
            .ok_or_else(|| {
                eyre!(
                    "Could not determine where to search.\n\
                     Use --db to specify the database, or set search_root in config.toml."
                )
            })?;
        Ok(find_database(&root, &self.package_prefix, &self.database_name)?)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jwl-playlist/config.toml"))
}

pub fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        default_config_path().filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}
