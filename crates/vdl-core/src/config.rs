use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Message printed when the bot token is missing; the process exits right after.
pub const MISSING_TOKEN_MESSAGE: &str = "Error: no token provided. Terminated.";

const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Typed configuration, read from the process environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_api_token: String,

    // yt-dlp
    pub ytdlp_path: PathBuf,
    pub ytdlp_verbose: bool,
    pub download_timeout: Duration,

    /// Root for per-request work directories. `None` means the system temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        let cfg = Self::from_lookup(|key| env::var(key).ok())?;

        if let Some(dir) = &cfg.temp_dir {
            fs::create_dir_all(dir)?;
        }

        Ok(cfg)
    }

    /// Build the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_api_token = lookup("TELEGRAM_API_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| Error::Config(MISSING_TOKEN_MESSAGE.to_string()))?;

        let ytdlp_path = lookup("YTDLP_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .or_else(|| lookup("PATH").and_then(|p| which_in_path(&p, "yt-dlp")))
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));
        let ytdlp_verbose = lookup("YTDLP_VERBOSE").map(parse_bool).unwrap_or(true);

        let download_timeout = Duration::from_secs(
            lookup("DOWNLOAD_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        );

        let temp_dir = lookup("TEMP_DIR").and_then(non_empty).map(PathBuf::from);

        Ok(Self {
            telegram_api_token,
            ytdlp_path,
            ytdlp_verbose,
            download_timeout,
            temp_dir,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_bool(s: String) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn which_in_path(path: &str, binary: &str) -> Option<PathBuf> {
    for dir in env::split_paths(path) {
        let candidate = dir.join(binary);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable_file(p: &Path) -> bool {
    if !p.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(md) = fs::metadata(p) {
            return (md.permissions().mode() & 0o111) != 0;
        }
    }
    true
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), MISSING_TOKEN_MESSAGE);
    }

    #[test]
    fn blank_token_is_treated_as_missing() {
        let err = Config::from_lookup(lookup_from(&[("TELEGRAM_API_TOKEN", "   ")])).unwrap_err();
        assert_eq!(err.to_string(), MISSING_TOKEN_MESSAGE);
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_API_TOKEN", "123:abc"),
            ("PATH", "/nonexistent-vdl-bin"),
        ]))
        .unwrap();
        assert_eq!(cfg.telegram_api_token, "123:abc");
        assert_eq!(cfg.ytdlp_path, PathBuf::from("yt-dlp"));
        assert!(cfg.ytdlp_verbose);
        assert_eq!(
            cfg.download_timeout,
            Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS)
        );
        assert!(cfg.temp_dir.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_API_TOKEN", "t"),
            ("YTDLP_PATH", "/opt/yt-dlp"),
            ("YTDLP_VERBOSE", "off"),
            ("DOWNLOAD_TIMEOUT_SECS", "42"),
            ("TEMP_DIR", "/tmp/vdl"),
        ]))
        .unwrap();
        assert_eq!(cfg.ytdlp_path, PathBuf::from("/opt/yt-dlp"));
        assert!(!cfg.ytdlp_verbose);
        assert_eq!(cfg.download_timeout, Duration::from_secs(42));
        assert_eq!(cfg.temp_dir, Some(PathBuf::from("/tmp/vdl")));
    }

    #[test]
    fn zero_or_garbage_timeout_falls_back_to_default() {
        for raw in ["0", "soon"] {
            let cfg = Config::from_lookup(lookup_from(&[
                ("TELEGRAM_API_TOKEN", "t"),
                ("DOWNLOAD_TIMEOUT_SECS", raw),
            ]))
            .unwrap();
            assert_eq!(
                cfg.download_timeout,
                Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS)
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn finds_ytdlp_on_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("yt-dlp");
        fs::write(&bin, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let path = dir.path().to_string_lossy().to_string();
        let cfg = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_API_TOKEN", "t"),
            ("PATH", path.as_str()),
        ]))
        .unwrap();
        assert_eq!(cfg.ytdlp_path, bin);
    }
}
