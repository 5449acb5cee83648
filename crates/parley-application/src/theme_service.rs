//! Theme, bubble style and background persistence.
//!
//! Theme names are stored as raw strings under `theme`, `colorTheme` and
//! `bubbleStyle`. Backgrounds are JSON objects.

use std::str::FromStr;
use std::sync::Arc;

use parley_core::chat::{Background, BubbleStyle, ColorTheme, Settings, Theme};
use parley_core::storage::SessionScopedStore;
use parley_core::storage::keys::{
    BACKGROUND_GALLERY, BUBBLE_STYLE, COLOR_THEME, CURRENT_BACKGROUND, THEME,
};

/// The stored look of the chat.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThemeSelection {
    pub theme: Theme,
    pub color_theme: ColorTheme,
    pub bubble_style: BubbleStyle,
    pub background: Option<Background>,
}

pub struct ThemeService {
    store: Arc<dyn SessionScopedStore>,
}

impl ThemeService {
    pub fn new(store: Arc<dyn SessionScopedStore>) -> Self {
        Self { store }
    }

    /// Reads the stored selection.
    ///
    /// Missing or unknown names fall back to what `settings` says.
    pub fn load(&self, settings: &Settings) -> ThemeSelection {
        ThemeSelection {
            theme: self.load_enum(THEME, settings.theme()),
            color_theme: self.load_enum(COLOR_THEME, settings.color_theme),
            bubble_style: self.load_enum(BUBBLE_STYLE, settings.bubble_style),
            background: self.current_background(),
        }
    }

    fn load_enum<T: FromStr>(&self, key: &str, fallback: T) -> T {
        match self.store.get(key) {
            Some(raw) => T::from_str(&raw).unwrap_or_else(|_| {
                tracing::warn!("[Theme] Unknown value '{}' under '{}', using fallback", raw, key);
                fallback
            }),
            None => fallback,
        }
    }

    pub fn set_theme(&self, theme: Theme) -> bool {
        self.store.set(THEME, theme.as_ref())
    }

    pub fn set_color_theme(&self, color_theme: ColorTheme) -> bool {
        self.store.set(COLOR_THEME, color_theme.as_ref())
    }

    pub fn set_bubble_style(&self, bubble_style: BubbleStyle) -> bool {
        self.store.set(BUBBLE_STYLE, bubble_style.as_ref())
    }

    /// Stores the opposite of `current` and returns it.
    pub fn toggle_dark_mode(&self, current: Theme) -> Theme {
        let next = current.toggled();
        self.set_theme(next);
        next
    }

    /// Stores the default selection and removes the current background.
    pub fn reset_to_default(&self) -> bool {
        let defaults = ThemeSelection::default();
        let saved = self.set_theme(defaults.theme)
            & self.set_color_theme(defaults.color_theme)
            & self.set_bubble_style(defaults.bubble_style)
            & self.apply_background(None);
        tracing::info!("[Theme] Theme reset to defaults");
        saved
    }

    pub fn current_background(&self) -> Option<Background> {
        let raw = self.store.get(CURRENT_BACKGROUND)?;
        match serde_json::from_str(&raw) {
            Ok(background) => Some(background),
            Err(e) => {
                tracing::warn!("[Theme] Ignoring malformed background: {}", e);
                None
            }
        }
    }

    /// Applies or removes the chat background.
    ///
    /// A new background is also remembered in the gallery.
    pub fn apply_background(&self, background: Option<&Background>) -> bool {
        let Some(background) = background else {
            return self.store.remove(CURRENT_BACKGROUND);
        };

        let json = match serde_json::to_string(background) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("[Theme] Failed to serialize background: {}", e);
                return false;
            }
        };
        if !self.store.set(CURRENT_BACKGROUND, &json) {
            return false;
        }

        let mut gallery = self.gallery();
        if !gallery.contains(background) {
            gallery.push(background.clone());
            match serde_json::to_string(&gallery) {
                Ok(json) => {
                    self.store.set(BACKGROUND_GALLERY, &json);
                }
                Err(e) => tracing::error!("[Theme] Failed to serialize gallery: {}", e),
            }
        }
        true
    }

    /// Backgrounds used so far, oldest first.
    pub fn gallery(&self) -> Vec<Background> {
        let Some(raw) = self.store.get(BACKGROUND_GALLERY) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("[Theme] Ignoring malformed gallery: {}", e);
            Vec::new()
        })
    }
}
