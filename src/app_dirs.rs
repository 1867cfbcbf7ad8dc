use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "tarry";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }

    /// State dir where the platform has one (Linux), local data dir elsewhere
    pub fn log_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| {
            pd.state_dir()
                .unwrap_or_else(|| pd.data_local_dir())
                .join("tarry.log")
        })
    }
}
