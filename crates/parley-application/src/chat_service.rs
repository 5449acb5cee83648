//! Chat use cases: hydration, sending, paging and simulated replies.

use std::sync::Arc;

use parley_core::chat::{
    Background, BubbleStyle, ChatState, ColorTheme, Message, MessageContent, Profile, Settings,
    Theme, merge_over_defaults,
};
use parley_core::config::ChatConfig;
use parley_core::error::{ParleyError, Result};
use parley_core::storage::SessionScopedStore;
use parley_core::storage::keys::{MESSAGES, PARTNER, SETTINGS, USER};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use crate::reply_simulator::ReplySimulator;
use crate::theme_service::{ThemeSelection, ThemeService};

/// Owns the in-memory [`ChatState`] and writes it through the store.
///
/// Locks are never held across an await point.
pub struct ChatService {
    store: Arc<dyn SessionScopedStore>,
    themes: ThemeService,
    state: RwLock<ChatState>,
    config: ChatConfig,
    replies: ReplySimulator,
}

impl ChatService {
    pub fn new(store: Arc<dyn SessionScopedStore>, config: ChatConfig) -> Self {
        Self {
            themes: ThemeService::new(store.clone()),
            state: RwLock::new(ChatState::new(config.history_batch_size)),
            replies: ReplySimulator::from_config(&config),
            store,
            config,
        }
    }

    /// Replaces the reply simulator (seeded or zero-delay in tests).
    pub fn with_reply_simulator(mut self, replies: ReplySimulator) -> Self {
        self.replies = replies;
        self
    }

    pub fn themes(&self) -> &ThemeService {
        &self.themes
    }

    /// Loads settings, messages, profiles and theme from the store.
    ///
    /// Anything unreadable falls back to defaults and is logged.
    pub async fn hydrate(&self) {
        let settings = self
            .load_merged(SETTINGS, Settings::default())
            .unwrap_or_default();

        let (messages, undecodable_messages) = match self.store.get(MESSAGES) {
            Some(raw) => decode_messages(&raw),
            None => (Vec::new(), Vec::new()),
        };

        let partner = self
            .load_merged(PARTNER, Profile::default_partner())
            .unwrap_or_else(Profile::default_partner);
        let user = self
            .load_merged(USER, Profile::default_user())
            .unwrap_or_else(Profile::default_user);
        let selection = self.themes.load(&settings);

        let mut state = self.state.write().await;
        *state = ChatState::new(self.config.history_batch_size);
        state.settings = settings;
        state.messages = messages;
        state.undecodable_messages = undecodable_messages;
        state.partner = partner;
        state.user = user;
        state.theme = selection.theme;
        state.color_theme = selection.color_theme;
        state.bubble_style = selection.bubble_style;
        state.background = selection.background;

        tracing::debug!(
            "[Chat] Hydrated {} messages for session {}",
            state.messages.len(),
            self.store.session_id()
        );
    }

    /// Reads a JSON object and merges it over `defaults`. `None` if the
    /// stored value is unusable.
    fn load_merged<T>(&self, key: &str, defaults: T) -> Option<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let Some(raw) = self.store.get(key) else {
            return Some(defaults);
        };
        match merge_over_defaults(&defaults, &raw) {
            Ok(merged) => Some(merged),
            Err(e) => {
                tracing::warn!("[Chat] Stored '{}' is unreadable, using defaults: {}", key, e);
                None
            }
        }
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> ChatState {
        self.state.read().await.clone()
    }

    pub async fn visible_messages(&self) -> Vec<Message> {
        self.state.read().await.visible_messages().to_vec()
    }

    pub async fn settings(&self) -> Settings {
        self.state.read().await.settings.clone()
    }

    /// Sends a text message.
    ///
    /// Input is trimmed. Returns `Ok(None)` for empty input and a validation
    /// error for text longer than the configured maximum.
    pub async fn send_text(&self, text: &str) -> Result<Option<Message>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let length = text.chars().count();
        if length > self.config.max_message_length {
            return Err(ParleyError::validation(format!(
                "Message is too long ({} characters, at most {})",
                length, self.config.max_message_length
            )));
        }

        let message = Message::sent(MessageContent::Text(text.to_string()));
        self.append(message.clone()).await;
        Ok(Some(message))
    }

    /// Sends an image given as a data URL or remote URL.
    pub async fn send_image(&self, data: &str) -> Result<Message> {
        if data.len() > self.config.max_image_bytes {
            return Err(ParleyError::validation(format!(
                "Image is too large ({} bytes, at most {})",
                data.len(),
                self.config.max_image_bytes
            )));
        }

        let message = Message::sent(MessageContent::Image(data.to_string()));
        self.append(message.clone()).await;
        Ok(message)
    }

    async fn append(&self, message: Message) {
        let mut state = self.state.write().await;
        state.append_message(message);
        self.persist_messages(&state);
    }

    /// Writes the message list if `autoSave` is on.
    ///
    /// Entries that did not decode at hydration are written back first.
    /// Returns true if the list was written.
    pub async fn save_messages(&self) -> bool {
        let state = self.state.read().await;
        self.persist_messages(&state)
    }

    fn persist_messages(&self, state: &ChatState) -> bool {
        if !state.settings.auto_save {
            tracing::debug!("[Chat] autoSave is off, messages kept in memory");
            return false;
        }
        let mut entries = state.undecodable_messages.clone();
        for message in &state.messages {
            match serde_json::to_value(message) {
                Ok(value) => entries.push(value),
                Err(e) => {
                    tracing::error!("[Chat] Failed to serialize message {}: {}", message.id, e);
                    return false;
                }
            }
        }
        match serde_json::to_string(&entries) {
            Ok(json) => self.store.set(MESSAGES, &json),
            Err(e) => {
                tracing::error!("[Chat] Failed to serialize messages: {}", e);
                false
            }
        }
    }

    /// Applies `update` to the settings and saves them wholesale.
    ///
    /// A changed dark mode, color theme or bubble style is also written to
    /// its theme key, which takes precedence at hydration.
    pub async fn update_settings<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut Settings),
    {
        let mut state = self.state.write().await;
        let before = state.settings.clone();
        update(&mut state.settings);
        state.color_theme = state.settings.color_theme;
        state.bubble_style = state.settings.bubble_style;
        state.theme = state.settings.theme();

        let mut saved = match serde_json::to_string(&state.settings) {
            Ok(json) => self.store.set(SETTINGS, &json),
            Err(e) => {
                tracing::error!("[Chat] Failed to serialize settings: {}", e);
                false
            }
        };

        if state.settings.is_dark_mode != before.is_dark_mode {
            saved &= self.themes.set_theme(state.theme);
        }
        if state.settings.color_theme != before.color_theme {
            saved &= self.themes.set_color_theme(state.color_theme);
        }
        if state.settings.bubble_style != before.bubble_style {
            saved &= self.themes.set_bubble_style(state.bubble_style);
        }
        saved
    }

    pub async fn set_partner(&self, profile: Profile) -> bool {
        let saved = self.save_json(PARTNER, &profile);
        self.state.write().await.partner = profile;
        saved
    }

    pub async fn set_user(&self, profile: Profile) -> bool {
        let saved = self.save_json(USER, &profile);
        self.state.write().await.user = profile;
        saved
    }

    fn save_json<T: serde::Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.store.set(key, &json),
            Err(e) => {
                tracing::error!("[Chat] Failed to serialize '{}': {}", key, e);
                false
            }
        }
    }

    pub async fn set_theme(&self, theme: Theme) -> bool {
        self.state.write().await.theme = theme;
        self.themes.set_theme(theme)
    }

    pub async fn set_color_theme(&self, color_theme: ColorTheme) -> bool {
        self.state.write().await.color_theme = color_theme;
        self.themes.set_color_theme(color_theme)
    }

    pub async fn set_bubble_style(&self, bubble_style: BubbleStyle) -> bool {
        self.state.write().await.bubble_style = bubble_style;
        self.themes.set_bubble_style(bubble_style)
    }

    pub async fn apply_background(&self, background: Option<Background>) -> bool {
        let saved = self.themes.apply_background(background.as_ref());
        self.state.write().await.background = background;
        saved
    }

    /// Switches between the light and dark theme. Returns the new theme.
    pub async fn toggle_dark_mode(&self) -> Theme {
        let mut state = self.state.write().await;
        state.theme = self.themes.toggle_dark_mode(state.theme);
        state.theme
    }

    /// Restores the default theme, color theme and bubble style and removes
    /// the background. The gallery is kept.
    pub async fn reset_theme(&self) -> bool {
        let saved = self.themes.reset_to_default();
        let defaults = ThemeSelection::default();
        let mut state = self.state.write().await;
        state.theme = defaults.theme;
        state.color_theme = defaults.color_theme;
        state.bubble_style = defaults.bubble_style;
        state.background = defaults.background;
        saved
    }

    /// Reveals the next page of older messages after the history delay.
    ///
    /// Returns the revealed messages, oldest first. Empty when a load is
    /// already running or nothing is left.
    pub async fn load_more_history(&self) -> Vec<Message> {
        if !self.state.write().await.begin_history_load() {
            return Vec::new();
        }

        tokio::time::sleep(self.config.history_load_delay()).await;

        let revealed = self.state.write().await.finish_history_load();
        tracing::debug!("[Chat] Revealed {} older messages", revealed.len());
        revealed
    }

    /// Maybe lets the partner answer the last message.
    ///
    /// Waits out the planned delays, shows the typing indicator in between
    /// when `showTypingIndicator` is on, then appends and saves the reply.
    pub async fn simulate_reply(&self) -> Option<Message> {
        let planned = self.replies.plan()?;

        tokio::time::sleep(planned.delay).await;
        {
            let mut state = self.state.write().await;
            state.typing_indicator_visible = state.settings.show_typing_indicator;
        }

        tokio::time::sleep(planned.typing).await;

        let reply = Message::received(planned.text);
        let mut state = self.state.write().await;
        state.typing_indicator_visible = false;
        state.append_message(reply.clone());
        self.persist_messages(&state);
        Some(reply)
    }

    /// Sends a text message and waits for a possible reply.
    pub async fn send_text_and_await_reply(
        &self,
        text: &str,
    ) -> Result<(Option<Message>, Option<Message>)> {
        let Some(sent) = self.send_text(text).await? else {
            return Ok((None, None));
        };
        let reply = self.simulate_reply().await;
        Ok((Some(sent), reply))
    }
}

/// Decodes a stored message list entry by entry.
///
/// Entries that fail to decode are returned separately so the next write
/// keeps them. A value that is not a JSON list reads as an empty thread.
fn decode_messages(raw: &str) -> (Vec<Message>, Vec<JsonValue>) {
    let entries = match serde_json::from_str::<Vec<JsonValue>>(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("[Chat] Stored messages are unreadable, starting empty: {}", e);
            return (Vec::new(), Vec::new());
        }
    };

    let mut messages = Vec::with_capacity(entries.len());
    let mut undecodable = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match Message::deserialize(&entry) {
            Ok(message) => messages.push(message),
            Err(e) => {
                tracing::warn!("[Chat] Keeping message {} as stored, it does not decode: {}", index, e);
                undecodable.push(entry);
            }
        }
    }
    (messages, undecodable)
}
