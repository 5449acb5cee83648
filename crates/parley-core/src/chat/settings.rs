//! User-facing settings and theme enums.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Light or dark base theme, stored under the `theme` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The opposite base theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Accent color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ColorTheme {
    #[default]
    Gold,
    Blue,
    Purple,
    Green,
    Pink,
    BlackWhite,
    Pastel,
    Sunset,
    Forest,
    Ocean,
}

/// Shape of message bubbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum BubbleStyle {
    #[default]
    Standard,
    Modern,
    Rounded,
    Sharp,
}

/// Application settings.
///
/// Stored as a flat camelCase JSON object under the `settings` key. Missing
/// fields take their default, and unrecognized enum values fall back to the
/// default instead of rejecting the whole object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub is_dark_mode: bool,
    #[serde(with = "lenient_enum")]
    pub color_theme: ColorTheme,
    #[serde(with = "lenient_enum")]
    pub bubble_style: BubbleStyle,
    pub font_family: String,
    pub message_sound: bool,
    pub notification_sound: bool,
    pub vibration_feedback: bool,
    /// When false, message mutations are kept in memory only.
    pub auto_save: bool,
    pub show_timestamp: bool,
    pub show_typing_indicator: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_dark_mode: false,
            color_theme: ColorTheme::Gold,
            bubble_style: BubbleStyle::Standard,
            font_family: "default".to_string(),
            message_sound: true,
            notification_sound: true,
            vibration_feedback: true,
            auto_save: true,
            show_timestamp: true,
            show_typing_indicator: true,
        }
    }
}

impl Settings {
    /// Returns the base theme implied by `is_dark_mode`.
    pub fn theme(&self) -> Theme {
        if self.is_dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// Sets a single field from its camelCase name and a string value.
    ///
    /// Used by text front ends (`--set autoSave=false`).
    pub fn set_field(&mut self, name: &str, value: &str) -> crate::error::Result<()> {
        use crate::error::ParleyError;

        let parse_bool = |v: &str| {
            v.parse::<bool>()
                .map_err(|_| ParleyError::validation(format!("'{}' expects true or false", name)))
        };

        match name {
            "isDarkMode" => self.is_dark_mode = parse_bool(value)?,
            "colorTheme" => {
                self.color_theme = ColorTheme::from_str(value)
                    .map_err(|_| ParleyError::validation(format!("unknown color theme '{}'", value)))?
            }
            "bubbleStyle" => {
                self.bubble_style = BubbleStyle::from_str(value)
                    .map_err(|_| ParleyError::validation(format!("unknown bubble style '{}'", value)))?
            }
            "fontFamily" => self.font_family = value.to_string(),
            "messageSound" => self.message_sound = parse_bool(value)?,
            "notificationSound" => self.notification_sound = parse_bool(value)?,
            "vibrationFeedback" => self.vibration_feedback = parse_bool(value)?,
            "autoSave" => self.auto_save = parse_bool(value)?,
            "showTimestamp" => self.show_timestamp = parse_bool(value)?,
            "showTypingIndicator" => self.show_typing_indicator = parse_bool(value)?,
            other => return Err(ParleyError::not_found("setting", other)),
        }
        Ok(())
    }
}

/// String-backed enums that fall back to their default on unknown input.
mod lenient_enum {
    use super::*;

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<str>,
    {
        serializer.serialize_str(value.as_ref())
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + Default,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|s| T::from_str(&s).ok())
            .unwrap_or_default())
    }
}
