use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use library::walker::{normalize_extension, normalize_root, prepare_root};
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub directories: Vec<String>,
    pub file_extensions: Vec<String>,
    pub blacklist: Vec<String>,
    pub port: u16,
    pub index_path: String,
    pub cache_path: String,
    pub enable_indexing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            directories: Vec::new(),
            file_extensions: ["mp3", "flac", "ogg", "m4a", "wav"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            blacklist: vec!["@eaDir".to_string()],
            port: 3000,
            index_path: "catalog.redb".to_string(),
            cache_path: ".cache/indexer-cache".to_string(),
            enable_indexing: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    InvalidDirectory(PathBuf),
    MissingDirectories,
    MissingExtensions,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
            ConfigError::InvalidDirectory(path) => {
                write!(f, "directory is not readable: {}", path.display())
            }
            ConfigError::MissingDirectories => write!(f, "no directories configured"),
            ConfigError::MissingExtensions => write!(f, "no file extensions configured"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("CATALOG_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

// The flag is true when the file was created.
pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)?;
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.port == 0 {
            config.port = 3000;
        }
        if config.index_path.trim().is_empty() {
            config.index_path = "catalog.redb".to_string();
        }
        if config.cache_path.trim().is_empty() {
            config.cache_path = ".cache/indexer-cache".to_string();
        }
        config.file_extensions = config
            .file_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| !ext.is_empty())
            .collect();
        return Ok((config, false));
    }

    let config = ServerConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

pub fn resolve_directories(
    config_path: &Path,
    config: &ServerConfig,
) -> Result<Vec<PathBuf>, ConfigError> {
    if config.file_extensions.is_empty() {
        return Err(ConfigError::MissingExtensions);
    }
    let configured: Vec<PathBuf> = config
        .directories
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| resolve_path(config_path, value))
        .collect();
    if configured.is_empty() {
        return Err(ConfigError::MissingDirectories);
    }
    let mut roots: Vec<PathBuf> = Vec::with_capacity(configured.len());
    for value in configured {
        let root = prepare_root(&value)
            .map_err(|_| ConfigError::InvalidDirectory(normalize_root(&value)))?;
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/config.yaml");

        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(created);
        assert!(path.exists());
        assert_eq!(config.port, 3000);
        assert_eq!(config.file_extensions, vec!["mp3", "flac", "ogg", "m4a", "wav"]);
        assert_eq!(config.blacklist, vec!["@eaDir"]);
        assert!(config.enable_indexing);

        let (_, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
    }

    #[test]
    fn extensions_are_normalized_and_gaps_filled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "directories: [\"/srv/music\"]\nfile_extensions: [\".MP3\", \" flac \", \"\"]\nport: 0\n",
        )
        .unwrap();

        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(config.file_extensions, vec!["mp3", "flac"]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.index_path, "catalog.redb");
        assert_eq!(config.directories, vec!["/srv/music"]);
    }

    #[test]
    fn relative_paths_follow_config_file() {
        let config_path = Path::new("/etc/catalog/config.yaml");
        assert_eq!(
            resolve_path(config_path, "catalog.redb"),
            PathBuf::from("/etc/catalog/catalog.redb")
        );
        assert_eq!(resolve_path(config_path, "/var/db"), PathBuf::from("/var/db"));
        assert_eq!(
            resolve_path(Path::new("config.yaml"), "x"),
            PathBuf::from("./x")
        );
    }

    #[test]
    fn directories_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        fs::create_dir(dir.path().join("music")).unwrap();

        let mut config = ServerConfig::default();
        assert!(matches!(
            resolve_directories(&config_path, &config),
            Err(ConfigError::MissingDirectories)
        ));

        config.directories = vec!["music".to_string()];
        let roots = resolve_directories(&config_path, &config).unwrap();
        assert_eq!(roots, vec![dir.path().join("music")]);

        config.directories.push("gone".to_string());
        match resolve_directories(&config_path, &config) {
            Err(ConfigError::InvalidDirectory(path)) => assert_eq!(path, dir.path().join("gone")),
            other => panic!("unexpected {:?}", other),
        }

        config.directories = vec!["music/".to_string(), "./music/../music".to_string()];
        let roots = resolve_directories(&config_path, &config).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(
            common::path_string(&roots[0]),
            common::path_string(&dir.path().join("music"))
        );

        config.file_extensions.clear();
        assert!(matches!(
            resolve_directories(&config_path, &config),
            Err(ConfigError::MissingExtensions)
        ));
    }
}
