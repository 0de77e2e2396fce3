//! Process configuration.
//!
//! Every knob is a CLI flag with an environment fallback, collected once at
//! startup into a [`Settings`] value that is passed (by `Arc` or reference)
//! into whatever needs it. There is no global configuration lookup anywhere
//! in the crate.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration, stable for the process lifetime.
#[derive(clap::Args, Debug, Clone)]
pub struct Settings {
    /// Directory containing one subdirectory per album
    #[arg(long, env = "ALBUMS_SOURCE_DIR", default_value = "/photos/albums", global = true)]
    pub source_dir: PathBuf,

    /// Directory where derived artifacts are cached
    #[arg(long, env = "CACHE_DIR", default_value = "/cache", global = true)]
    pub cache_dir: PathBuf,

    /// Users file with one `username:password` line per account
    #[arg(long, env = "USERS_FILE", default_value = "/config/users.txt", global = true)]
    pub users_file: PathBuf,

    /// Address the HTTP server binds to
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080", global = true)]
    pub listen_addr: SocketAddr,

    /// Secret used to sign session tokens
    #[arg(
        long,
        env = "SESSION_SECRET",
        default_value = "change-me-in-prod",
        hide_env_values = true,
        global = true
    )]
    pub session_secret: String,

    /// URL prefix the app is mounted under, e.g. "/albums" behind a reverse proxy
    #[arg(
        long,
        env = "ROOT_PATH",
        default_value = "",
        value_parser = parse_root_path,
        global = true
    )]
    pub root_path: String,
}

impl Settings {
    /// Cookie path: the root path, or `/` when mounted at the origin root.
    pub fn cookie_path(&self) -> &str {
        if self.root_path.is_empty() {
            "/"
        } else {
            &self.root_path
        }
    }
}

fn parse_root_path(raw: &str) -> Result<String, std::convert::Infallible> {
    Ok(normalize_root_path(raw))
}

/// Normalize a mount prefix: empty stays empty; anything else gets exactly
/// one leading slash and no trailing slash.
pub fn normalize_root_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_normalization() {
        assert_eq!(normalize_root_path(""), "");
        assert_eq!(normalize_root_path("   "), "");
        assert_eq!(normalize_root_path("/"), "");
        assert_eq!(normalize_root_path("albums"), "/albums");
        assert_eq!(normalize_root_path("albums/"), "/albums");
        assert_eq!(normalize_root_path("/albums"), "/albums");
        assert_eq!(normalize_root_path(" /a/b/ "), "/a/b");
    }

    #[test]
    fn cookie_path_defaults_to_slash() {
        let mut settings = crate::test_helpers::test_settings(
            PathBuf::from("/photos/albums"),
            PathBuf::from("/cache"),
            PathBuf::from("/config/users.txt"),
        );
        assert_eq!(settings.cookie_path(), "/");
        settings.root_path = "/albums".into();
        assert_eq!(settings.cookie_path(), "/albums");
    }
}
