//! Chat domain: messages, settings, profiles and the in-memory chat state.

pub mod message;
pub mod profile;
pub mod settings;
pub mod state;

pub use message::{Message, MessageContent, MessageKind, MessageStatus};
pub use profile::{Background, BackgroundKind, Profile};
pub use settings::{BubbleStyle, ColorTheme, Settings, Theme};
pub use state::ChatState;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use crate::error::{ParleyError, Result};

/// Shallow-merges a stored JSON object over `defaults`.
///
/// Top-level fields present in `stored` replace the default field, the rest
/// keep their default value. Fails if `stored` is not a JSON object or the
/// merged object does not deserialize into `T`.
pub fn merge_over_defaults<T>(defaults: &T, stored: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut base = serde_json::to_value(defaults)?;
    let overlay: JsonValue = serde_json::from_str(stored)?;

    let (Some(base_map), JsonValue::Object(overlay_map)) = (base.as_object_mut(), overlay) else {
        return Err(ParleyError::Serialization {
            format: "JSON".to_string(),
            message: "expected a JSON object".to_string(),
        });
    };

    for (key, value) in overlay_map {
        base_map.insert(key, value);
    }

    Ok(serde_json::from_value(base)?)
}
