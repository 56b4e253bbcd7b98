//! User preferences persisted as JSON next to the database.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::{
    currency,
    errors::{Result, TrackerError},
    utils::paths::{ensure_dir, settings_file_in},
};

const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub currency: String,
    pub date_format: DateFormat,
    pub first_day_of_week: FirstDayOfWeek,
    pub notifications: NotificationSettings,
    pub onboarding_completed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            date_format: DateFormat::Mdy,
            first_day_of_week: FirstDayOfWeek::Sunday,
            notifications: NotificationSettings::default(),
            onboarding_completed: false,
        }
    }
}

impl Settings {
    /// Applies a `settings set <key> <value>` style update.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "currency" => {
                let entry = currency::find(value).ok_or_else(|| {
                    TrackerError::validation(format!(
                        "unsupported currency `{}` (expected one of {})",
                        value,
                        currency::supported_codes().join(", ")
                    ))
                })?;
                self.currency = entry.code.to_string();
            }
            "date_format" => self.date_format = value.parse()?,
            "first_day_of_week" => self.first_day_of_week = value.parse()?,
            "budget_alerts" => self.notifications.budget_alerts = parse_flag(value)?,
            "budget_exceeded" => self.notifications.budget_exceeded = parse_flag(value)?,
            other => {
                return Err(TrackerError::validation(format!(
                    "unknown setting `{}`",
                    other
                )))
            }
        }
        Ok(())
    }
}

/// Toggles for the two budget notification kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationSettings {
    pub budget_alerts: bool,
    pub budget_exceeded: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            budget_alerts: true,
            budget_exceeded: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateFormat {
    Mdy,
    Dmy,
    Ymd,
    MdyDash,
    DmyDash,
    YmdDash,
}

impl DateFormat {
    pub const ALL: [DateFormat; 6] = [
        DateFormat::Mdy,
        DateFormat::Dmy,
        DateFormat::Ymd,
        DateFormat::MdyDash,
        DateFormat::DmyDash,
        DateFormat::YmdDash,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DateFormat::Mdy => "MDY",
            DateFormat::Dmy => "DMY",
            DateFormat::Ymd => "YMD",
            DateFormat::MdyDash => "MDY_DASH",
            DateFormat::DmyDash => "DMY_DASH",
            DateFormat::YmdDash => "YMD_DASH",
        }
    }

    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::Mdy => "%m/%d/%Y",
            DateFormat::Dmy => "%d/%m/%Y",
            DateFormat::Ymd => "%Y/%m/%d",
            DateFormat::MdyDash => "%m-%d-%Y",
            DateFormat::DmyDash => "%d-%m-%Y",
            DateFormat::YmdDash => "%Y-%m-%d",
        }
    }
}

impl FromStr for DateFormat {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        DateFormat::ALL
            .into_iter()
            .find(|format| format.key() == normalized)
            .ok_or_else(|| {
                TrackerError::validation(format!(
                    "unknown date format `{}` (expected MDY, DMY, YMD, MDY_DASH, DMY_DASH or YMD_DASH)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FirstDayOfWeek {
    Sunday,
    Monday,
    Saturday,
}

impl FirstDayOfWeek {
    pub fn weekday(&self) -> Weekday {
        match self {
            FirstDayOfWeek::Sunday => Weekday::Sun,
            FirstDayOfWeek::Monday => Weekday::Mon,
            FirstDayOfWeek::Saturday => Weekday::Sat,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FirstDayOfWeek::Sunday => "sunday",
            FirstDayOfWeek::Monday => "monday",
            FirstDayOfWeek::Saturday => "saturday",
        }
    }
}

impl FromStr for FirstDayOfWeek {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(FirstDayOfWeek::Sunday),
            "monday" | "mon" => Ok(FirstDayOfWeek::Monday),
            "saturday" | "sat" => Ok(FirstDayOfWeek::Saturday),
            _ => Err(TrackerError::validation(format!(
                "unknown first day of week `{}` (expected sunday, monday or saturday)",
                s
            ))),
        }
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(TrackerError::validation(format!(
            "expected on/off, got `{}`",
            value
        ))),
    }
}

/// Loads and atomically saves [`Settings`].
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    pub fn new(base: &Path) -> Result<Self> {
        ensure_dir(base)?;
        Ok(Self {
            path: settings_file_in(base),
        })
    }

    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            TrackerError::Config(format!("{}: {}", self.path.display(), err))
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension(format!("json.{}", TMP_SUFFIX));
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
