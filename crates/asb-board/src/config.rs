use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const FEED_RELATIVE: &str = ".statusboard/feed.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub feed: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub sounds_dir: Option<PathBuf>,
}

/// Everything on disk the board touches, resolved once at startup.
#[derive(Debug, Clone)]
pub struct BoardPaths {
    pub feed_path: PathBuf,
    pub prefs_path: PathBuf,
    pub sounds_dir: PathBuf,
}

pub fn resolve_paths() -> Result<BoardPaths> {
    let config = load_config(&config_path()).unwrap_or_default();

    let data_dir = resolve_data_dir(&config);
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let feed_path = resolve_feed_path(&config)?;
    let sounds_dir = resolve_sounds_dir(&config, &data_dir);

    Ok(BoardPaths {
        feed_path,
        prefs_path: data_dir.join("prefs.db"),
        sounds_dir,
    })
}

fn load_config(path: &Path) -> io::Result<BoardConfig> {
    if !path.exists() {
        return Ok(BoardConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let config = toml::from_str(&contents).unwrap_or_default();
    Ok(config)
}

fn config_path() -> PathBuf {
    if let Ok(path) = env::var("ASB_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("asb/config.toml"))
        .unwrap_or_else(|| PathBuf::from("asb.toml"))
}

fn resolve_data_dir(config: &BoardConfig) -> PathBuf {
    if let Ok(path) = env::var("ASB_DATA_DIR") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    dirs::data_dir()
        .map(|dir| dir.join("asb"))
        .unwrap_or_else(|| PathBuf::from(".asb"))
}

fn resolve_feed_path(config: &BoardConfig) -> Result<PathBuf> {
    if let Ok(path) = env::var("ASB_FEED") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    if let Some(path) = &config.feed {
        return Ok(path.clone());
    }

    let cwd = env::current_dir().context("Failed to resolve working directory")?;
    if let Some(root) = find_feed_root(&cwd) {
        return Ok(root.join(FEED_RELATIVE));
    }
    Ok(cwd.join(FEED_RELATIVE))
}

/// Walks up from the starting directory until a feed file is found, so
/// the board can be launched from anywhere inside a project tree.
fn find_feed_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(path) = current {
        if path.join(FEED_RELATIVE).exists() {
            return Some(path.to_path_buf());
        }
        current = path.parent();
    }
    None
}

fn resolve_sounds_dir(config: &BoardConfig, data_dir: &Path) -> PathBuf {
    if let Ok(path) = env::var("ASB_SOUNDS_DIR") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    if let Some(dir) = &config.sounds_dir {
        return dir.clone();
    }
    data_dir.join("sounds")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = load_config(Path::new("/nonexistent/asb/config.toml")).expect("load");
        assert!(config.feed.is_none());
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn config_file_paths_are_parsed() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "feed = \"/srv/feed.json\"\ndata_dir = \"/var/lib/asb\"\n",
        )
        .expect("write config");

        let config = load_config(&path).expect("load");
        assert_eq!(config.feed.as_deref(), Some(Path::new("/srv/feed.json")));
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/var/lib/asb")));
        assert!(config.sounds_dir.is_none());
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "feed = [not toml").expect("write config");

        let config = load_config(&path).expect("load");
        assert!(config.feed.is_none());
    }

    #[test]
    fn feed_root_is_found_from_a_nested_directory() {
        let dir = tempdir().expect("temp dir");
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).expect("nested dirs");
        fs::create_dir_all(dir.path().join(".statusboard")).expect("feed dir");
        fs::write(dir.path().join(FEED_RELATIVE), "{}").expect("feed file");

        let found = find_feed_root(&nested).expect("root found");
        assert_eq!(found, dir.path());

        let other = tempdir().expect("other dir");
        assert!(find_feed_root(other.path()).is_none());
    }
}
