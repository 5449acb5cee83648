//! In-memory chat state.
//!
//! `ChatState` is the aggregate the presentation layer renders. It knows
//! nothing about storage; hydration and persistence live in the application
//! layer.

use serde_json::Value as JsonValue;

use super::{Background, BubbleStyle, ColorTheme, Message, Profile, Settings, Theme};

/// Default number of messages revealed per history page.
pub const DEFAULT_HISTORY_BATCH_SIZE: usize = 50;

/// The in-memory chat aggregate.
///
/// The thread view shows the newest `displayed_message_count` messages. Older
/// messages are revealed page by page through
/// [`begin_history_load`](Self::begin_history_load) /
/// [`finish_history_load`](Self::finish_history_load).
#[derive(Debug, Clone)]
pub struct ChatState {
    pub settings: Settings,
    pub messages: Vec<Message>,
    /// Stored entries that do not decode as a [`Message`]. Kept verbatim and
    /// written back ahead of `messages`.
    pub undecodable_messages: Vec<JsonValue>,
    pub displayed_message_count: usize,
    /// Reentrancy guard for history paging.
    pub is_loading_history: bool,
    pub partner: Profile,
    pub user: Profile,
    pub theme: Theme,
    pub color_theme: ColorTheme,
    pub bubble_style: BubbleStyle,
    pub background: Option<Background>,
    pub typing_indicator_visible: bool,
    history_batch_size: usize,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_BATCH_SIZE)
    }
}

impl ChatState {
    /// Creates an empty state with default settings and profiles.
    pub fn new(history_batch_size: usize) -> Self {
        let settings = Settings::default();
        Self {
            theme: settings.theme(),
            color_theme: settings.color_theme,
            bubble_style: settings.bubble_style,
            settings,
            messages: Vec::new(),
            undecodable_messages: Vec::new(),
            displayed_message_count: history_batch_size,
            is_loading_history: false,
            partner: Profile::default_partner(),
            user: Profile::default_user(),
            background: None,
            typing_indicator_visible: false,
            history_batch_size,
        }
    }

    pub fn history_batch_size(&self) -> usize {
        self.history_batch_size
    }

    /// Appends a new message to the bottom of the thread.
    ///
    /// The cursor grows with it once the view is full, so a new message never
    /// pushes an already shown one out of view.
    pub fn append_message(&mut self, message: Message) {
        if self.messages.len() >= self.displayed_message_count {
            self.displayed_message_count += 1;
        }
        self.messages.push(message);
    }

    /// Returns the messages currently shown, oldest first.
    pub fn visible_messages(&self) -> &[Message] {
        let start = self
            .messages
            .len()
            .saturating_sub(self.displayed_message_count);
        &self.messages[start..]
    }

    /// Returns true if there are messages above the current cursor.
    pub fn has_more_history(&self) -> bool {
        self.messages.len() > self.displayed_message_count
    }

    /// Enters the loading state.
    ///
    /// Returns false (and changes nothing) when a load is already in flight or
    /// there is nothing left to reveal.
    pub fn begin_history_load(&mut self) -> bool {
        if self.is_loading_history || !self.has_more_history() {
            return false;
        }
        self.is_loading_history = true;
        true
    }

    /// Leaves the loading state, advancing the cursor by at most one batch.
    ///
    /// Returns the newly revealed messages, oldest first. Returns an empty
    /// vector if no load was in flight.
    pub fn finish_history_load(&mut self) -> Vec<Message> {
        if !self.is_loading_history {
            return Vec::new();
        }

        let total = self.messages.len();
        let old_count = self.displayed_message_count.min(total);
        let new_count = (self.displayed_message_count + self.history_batch_size).min(total);

        let revealed = self.messages[total - new_count..total - old_count].to_vec();

        self.displayed_message_count = new_count;
        self.is_loading_history = false;
        revealed
    }
}
