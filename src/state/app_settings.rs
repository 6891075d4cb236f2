use crate::state::refresher::DEFAULT_POLL_INTERVAL;
use crate::state::store::default_store_path;
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_FUNC_URLS: &str = "func2url.json";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// Function name → URL map of the backend.
    pub func_urls: PathBuf,
    pub store_path: PathBuf,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliAction {
    Run,
    Help,
    Version,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            func_urls: PathBuf::from(DEFAULT_FUNC_URLS),
            store_path: default_store_path(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(path) = var("BRACKETVIEW_FUNC_URLS") {
            settings.func_urls = PathBuf::from(path);
        }
        if let Some(path) = var("BRACKETVIEW_STORE") {
            settings.store_path = PathBuf::from(path);
        }
        if let Some(secs) = var("BRACKETVIEW_POLL_SECS").and_then(|s| s.trim().parse::<u64>().ok())
            && secs > 0
        {
            settings.poll_interval = Duration::from_secs(secs);
        }
        settings.log_level = var("BRACKETVIEW_LOG").and_then(|l| LevelFilter::from_str(l.trim()).ok());
        settings
    }

    /// Apply command line flags on top of the environment.
    pub fn apply_args<I>(&mut self, args: I) -> Result<CliAction, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(CliAction::Help),
                "-V" | "--version" => return Ok(CliAction::Version),
                "--urls" => {
                    let path = args.next().ok_or("--urls needs a path")?;
                    self.func_urls = PathBuf::from(path);
                }
                "--store" => {
                    let path = args.next().ok_or("--store needs a path")?;
                    self.store_path = PathBuf::from(path);
                }
                _ => return Err(format!("Unknown argument: {arg}")),
            }
        }
        Ok(CliAction::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> AppSettings {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppSettings::from_lookup(|key| vars.get(key).cloned())
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn defaults_poll_every_three_seconds() {
        let settings = settings_from(&[]);
        assert_eq!(settings.poll_interval, Duration::from_secs(3));
        assert_eq!(settings.func_urls, PathBuf::from(DEFAULT_FUNC_URLS));
        assert!(settings.log_level.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = settings_from(&[
            ("BRACKETVIEW_FUNC_URLS", "/etc/bracket/urls.json"),
            ("BRACKETVIEW_STORE", "/tmp/state.json"),
            ("BRACKETVIEW_POLL_SECS", "10"),
            ("BRACKETVIEW_LOG", "debug"),
        ]);
        assert_eq!(settings.func_urls, PathBuf::from("/etc/bracket/urls.json"));
        assert_eq!(settings.store_path, PathBuf::from("/tmp/state.json"));
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
        assert_eq!(settings.log_level, Some(LevelFilter::Debug));
    }

    #[test]
    fn invalid_poll_interval_is_ignored() {
        assert_eq!(
            settings_from(&[("BRACKETVIEW_POLL_SECS", "0")]).poll_interval,
            DEFAULT_POLL_INTERVAL
        );
        assert_eq!(
            settings_from(&[("BRACKETVIEW_POLL_SECS", "soon")]).poll_interval,
            DEFAULT_POLL_INTERVAL
        );
    }

    #[test]
    fn flags_override_environment() {
        let mut settings = settings_from(&[("BRACKETVIEW_FUNC_URLS", "env.json")]);
        let action = settings
            .apply_args(args(&["--urls", "cli.json", "--store", "s.json"]))
            .unwrap();
        assert_eq!(action, CliAction::Run);
        assert_eq!(settings.func_urls, PathBuf::from("cli.json"));
        assert_eq!(settings.store_path, PathBuf::from("s.json"));
    }

    #[test]
    fn help_and_version_short_circuit() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.apply_args(args(&["--help"])), Ok(CliAction::Help));
        assert_eq!(settings.apply_args(args(&["-V"])), Ok(CliAction::Version));
    }

    #[test]
    fn missing_flag_value_and_unknown_flags_are_errors() {
        let mut settings = AppSettings::default();
        assert!(settings.apply_args(args(&["--urls"])).is_err());
        assert!(settings.apply_args(args(&["--bogus"])).is_err());
    }
}
