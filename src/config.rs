use std::path::PathBuf;
use std::sync::LazyLock;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Path to the user config file: `$HOME/.config/extra-files.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Get the user config file path if the home directory is known.
#[must_use]
pub fn config_path() -> Option<&'static PathBuf> {
    CONFIG_PATH.as_ref()
}

/// Expand a leading `~` to the user home directory.
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod config_path_tests {
    use super::*;

    #[test]
    fn config_path_ends_with_project_name() {
        if let Some(path) = config_path() {
            assert!(path.ends_with(".config/extra-files.toml"));
        }
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/var/log/x.log"), PathBuf::from("/var/log/x.log"));
        assert_eq!(expand_home("relative/x.log"), PathBuf::from("relative/x.log"));
    }

    #[test]
    fn expand_home_replaces_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/logs/x.log"), home.join("logs/x.log"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
