use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "skola";
const DB_FILE: &str = "skola.db";
const CONFIG_FILE: &str = "config.json";

/// Where the drill keeps its database and config file
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/skola/skola.db`, or the platform data-local dir
    /// when `HOME` is unset
    pub fn db_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::state_dir(home.as_deref()).map(|dir| dir.join(DB_FILE))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn state_dir(home: Option<&Path>) -> Option<PathBuf> {
        match home {
            Some(home) => Some(home.join(".local").join("state").join(APP_NAME)),
            None => Self::project_dirs().map(|dirs| dirs.data_local_dir().to_path_buf()),
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_dir_under_home() {
        let dir = AppDirs::state_dir(Some(Path::new("/home/student"))).unwrap();
        assert_eq!(dir, PathBuf::from("/home/student/.local/state/skola"));
    }

    #[test]
    fn test_file_names() {
        if let Some(path) = AppDirs::db_path() {
            assert!(path.ends_with("skola/skola.db"));
        }
        if let Some(path) = AppDirs::config_path() {
            assert_eq!(path.file_name().unwrap(), "config.json");
        }
    }
}
