use std::{
    cmp::Reverse,
    env, fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::{ConfigError, IntakeConfig};

pub const HOME_ENV: &str = "MEDIAID_HOME";
const CONFIG_FILE: &str = "config.json";
const SESSION_FILE: &str = "session.json";
const BACKUP_PREFIX: &str = "config_";
const BACKUP_SUFFIX: &str = ".json";
const BACKUP_STAMP: &str = "%Y%m%d_%H%M%S";
const BACKUP_STAMP_LEN: usize = 15;

/// On-disk home of the intake client: settings, their backups and the
/// remembered session.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base_dir: PathBuf,
    config_path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    /// Explicit paths. The session file sits next to the config file.
    pub fn new(config_path: PathBuf, backups_dir: PathBuf) -> Self {
        let base_dir = config_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            base_dir,
            config_path,
            backups_dir,
        }
    }

    /// Lays out `<base>/config/config.json`, `<base>/config/backups/` and
    /// `<base>/session.json`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let config_dir = base.join("config");
        let backups_dir = config_dir.join("backups");
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE),
            backups_dir,
            base_dir: base,
        })
    }

    /// Uses `MEDIAID_HOME` when set, otherwise `~/.mediaid`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::with_base_dir(default_base_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    pub fn session_path(&self) -> PathBuf {
        self.base_dir.join(SESSION_FILE)
    }

    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<IntakeConfig, ConfigError> {
        if !self.config_path.exists() {
            return Ok(IntakeConfig::default());
        }
        read_json(&self.config_path)
    }

    pub fn save(&self, config: &IntakeConfig) -> Result<(), ConfigError> {
        write_json(&self.config_path, config)
    }

    /// Writes a timestamped copy and returns its file name.
    pub fn backup(&self, config: &IntakeConfig, note: Option<&str>) -> Result<String, ConfigError> {
        self.backup_at(config, note, Utc::now())
    }

    /// Never replaces an existing backup: a name already taken within the
    /// same second gets a `-2`, `-3`, ... counter after the stamp.
    fn backup_at(
        &self,
        config: &IntakeConfig,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, ConfigError> {
        let stamp = now.format(BACKUP_STAMP).to_string();
        let note = slug(note).map(|slug| format!("_{slug}")).unwrap_or_default();
        let mut counter = 1u32;
        let name = loop {
            let name = match counter {
                1 => format!("{BACKUP_PREFIX}{stamp}{note}{BACKUP_SUFFIX}"),
                n => format!("{BACKUP_PREFIX}{stamp}-{n}{note}{BACKUP_SUFFIX}"),
            };
            if !self.backups_dir.join(&name).exists() {
                break name;
            }
            counter += 1;
        };
        write_json(&self.backups_dir.join(&name), config)?;
        Ok(name)
    }

    /// Makes a backup the active config again.
    pub fn restore(&self, backup_name: &str) -> Result<IntakeConfig, ConfigError> {
        let path = self.backups_dir.join(backup_name);
        if !path.is_file() {
            return Err(ConfigError::MissingBackup(backup_name.to_string()));
        }
        let config: IntakeConfig = read_json(&path)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        if !self.backups_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let name = entry?.file_name();
            if let Some(name) = name.to_str().filter(|name| name.ends_with(BACKUP_SUFFIX)) {
                names.push(name.to_string());
            }
        }
        names.sort_by_key(|name| Reverse(backup_order(name)));
        Ok(names)
    }
}

pub fn default_base_dir() -> PathBuf {
    match env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
        Some(custom) => PathBuf::from(custom),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mediaid"),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Writes through a sibling temp file so a crash never leaves half a config.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Lowercase alphanumerics joined by single dashes.
fn slug(note: Option<&str>) -> Option<String> {
    let words: Vec<String> = note?
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    (!words.is_empty()).then(|| words.join("-"))
}

fn backup_stamp(name: &str) -> Option<NaiveDateTime> {
    let rest = name.strip_prefix(BACKUP_PREFIX)?;
    let stamp = rest.get(..BACKUP_STAMP_LEN)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP).ok()
}

/// Stamp first, then the same-second counter.
fn backup_order(name: &str) -> Option<(NaiveDateTime, u32)> {
    let stamp = backup_stamp(name)?;
    let rest = name.strip_prefix(BACKUP_PREFIX)?.get(BACKUP_STAMP_LEN..)?;
    let counter = rest
        .strip_prefix('-')
        .and_then(|tail| {
            let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .unwrap_or(1);
    Some((stamp, counter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_is_slugged() {
        assert_eq!(slug(Some("  Before Prod URL! ")).as_deref(), Some("before-prod-url"));
        assert_eq!(slug(Some("***")), None);
        assert_eq!(slug(None), None);
    }

    #[test]
    fn backup_names_parse_with_or_without_note() {
        assert!(backup_stamp("config_20240501_123045.json").is_some());
        assert!(backup_stamp("config_20240501_123045_staging.json").is_some());
        assert!(backup_stamp("config_20240501_123045-2_staging.json").is_some());
        assert!(backup_stamp("notes.json").is_none());
    }

    #[test]
    fn backups_in_the_same_second_do_not_overwrite() {
        use chrono::TimeZone;

        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap();

        let mut first = IntakeConfig::default();
        first.search_limit = 3;
        let mut second = IntakeConfig::default();
        second.search_limit = 7;
        let a = manager.backup_at(&first, Some("pre"), now).unwrap();
        let b = manager.backup_at(&second, Some("pre"), now).unwrap();

        assert_eq!(a, "config_20240501_123045_pre.json");
        assert_eq!(b, "config_20240501_123045-2_pre.json");
        assert_eq!(manager.list_backups().unwrap(), vec![b.clone(), a.clone()]);
        assert_eq!(manager.restore(&a).unwrap().search_limit, 3);
        assert_eq!(manager.restore(&b).unwrap().search_limit, 7);
    }
}
