use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::json;

use crate::alarm::AlarmError;

/// One configured alarm row, exactly as edited and persisted. The time is
/// kept as the raw "HH:MM" text so a half-typed value survives a save/load
/// cycle; it is validated at arm and save time, not on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmEntry {
    pub label: String,
    pub time: String,
    pub enabled: bool,
}

impl Default for AlarmEntry {
    fn default() -> Self {
        Self {
            label: String::new(),
            time: String::new(),
            enabled: true,
        }
    }
}

impl AlarmEntry {
    pub fn new(label: &str, time: &str, enabled: bool) -> Self {
        Self {
            label: label.to_string(),
            time: time.to_string(),
            enabled,
        }
    }

    /// Empty labels display as the 1-based row position.
    pub fn display_label(&self, index: usize) -> String {
        let trimmed = self.label.trim();
        if trimmed.is_empty() {
            format!("Alarm {}", index + 1)
        } else {
            trimmed.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub alarms: Vec<AlarmEntry>,
    pub default_ringtone: String,
    pub pause_on_lock: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alarms: default_alarms(),
            default_ringtone: String::new(),
            pause_on_lock: true,
        }
    }
}

pub fn default_alarms() -> Vec<AlarmEntry> {
    vec![
        AlarmEntry::new("Strategy Planning", "09:30", true),
        AlarmEntry::new("Video Editing", "10:00", true),
        AlarmEntry::new("Social Media Posting", "14:00", true),
    ]
}

/// Decodes an "HH:MM" 24-hour string into an (hour, minute) pair. The input
/// is trimmed; both parts must be plain digits; hour 0-23, minute 0-59.
pub fn parse_hhmm(input: &str) -> Result<(u32, u32), AlarmError> {
    let trimmed = input.trim();
    let Some((hour_raw, minute_raw)) = trimmed.split_once(':') else {
        return Err(AlarmError::InvalidTimeFormat {
            input: input.to_string(),
            reason: "use HH:MM (24h)",
        });
    };
    let all_digits =
        |part: &str| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit());
    if !all_digits(hour_raw) || !all_digits(minute_raw) {
        return Err(AlarmError::InvalidTimeFormat {
            input: input.to_string(),
            reason: "hour and minute must be numbers",
        });
    }
    let out_of_range = AlarmError::InvalidTimeFormat {
        input: input.to_string(),
        reason: "hour 0-23, minute 0-59",
    };
    let (Ok(hour), Ok(minute)) = (hour_raw.parse::<u32>(), minute_raw.parse::<u32>()) else {
        return Err(out_of_range);
    };
    if hour > 23 || minute > 59 {
        return Err(out_of_range);
    }
    Ok((hour, minute))
}

/// Save-time check: every enabled entry with a non-empty time must parse.
/// Disabled or timeless rows may hold anything.
pub fn validate_entries(entries: &[AlarmEntry]) -> Result<(), AlarmError> {
    for entry in entries {
        if entry.enabled && !entry.time.trim().is_empty() {
            parse_hhmm(&entry.time)?;
        }
    }
    Ok(())
}

/// Loads settings, falling back to the built-in defaults when the file is
/// absent, unreadable, or malformed. The read path never fails the app.
pub fn load_settings(path: &Path) -> Settings {
    match try_load_settings(path) {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("{err}; using built-in defaults");
            Settings::default()
        }
    }
}

pub fn try_load_settings(path: &Path) -> Result<Settings, AlarmError> {
    let content = fs::read_to_string(path).map_err(|err| {
        AlarmError::PersistenceUnavailable(format!("unable to read {}: {err}", path.display()))
    })?;
    parse_settings_text(&content)
}

pub fn parse_settings_text(content: &str) -> Result<Settings, AlarmError> {
    let raw = serde_json::from_str::<SettingsFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        AlarmError::PersistenceUnavailable(format!(
            "invalid JSON at line {line}, column {column}: {err}"
        ))
    })?;

    // The legacy format is a bare list of alarm records with no wrapping
    // settings object; normalize it to the wrapped defaults.
    let (raw_alarms, default_ringtone, pause_on_lock) = match raw {
        SettingsFile::Wrapped(wrapped) => (
            wrapped.alarms,
            wrapped.default_ringtone.trim().to_string(),
            wrapped.pause_on_lock,
        ),
        SettingsFile::Legacy(alarms) => (alarms, String::new(), true),
    };

    let mut alarms = raw_alarms
        .into_iter()
        .map(|alarm| AlarmEntry {
            label: alarm.label.trim().to_string(),
            time: alarm.time.trim().to_string(),
            enabled: alarm.enabled,
        })
        .collect::<Vec<_>>();
    if alarms.is_empty() {
        alarms = default_alarms();
    }

    Ok(Settings {
        alarms,
        default_ringtone,
        pause_on_lock,
    })
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), AlarmError> {
    let alarms = settings
        .alarms
        .iter()
        .map(|entry| {
            json!({
                "label": entry.label.trim(),
                "time": entry.time.trim(),
                "enabled": entry.enabled,
            })
        })
        .collect::<Vec<_>>();
    let payload = json!({
        "alarms": alarms,
        "default_ringtone": settings.default_ringtone,
        "pause_on_lock": settings.pause_on_lock,
    });
    let text = serde_json::to_string_pretty(&payload).map_err(|err| {
        AlarmError::PersistenceUnavailable(format!("unable to encode settings: {err}"))
    })?;
    fs::write(path, format!("{text}\n")).map_err(|err| {
        AlarmError::PersistenceUnavailable(format!("unable to write {}: {err}", path.display()))
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SettingsFile {
    Wrapped(WrappedSettingsFile),
    Legacy(Vec<AlarmEntryFile>),
}

#[derive(Debug, Deserialize)]
struct WrappedSettingsFile {
    #[serde(default)]
    alarms: Vec<AlarmEntryFile>,
    #[serde(default)]
    default_ringtone: String,
    #[serde(default = "default_pause_on_lock")]
    pause_on_lock: bool,
}

#[derive(Debug, Deserialize)]
struct AlarmEntryFile {
    #[serde(default)]
    label: String,
    #[serde(default)]
    time: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_pause_on_lock() -> bool {
    true
}
