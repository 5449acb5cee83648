//! Key layout constants.
//!
//! Physical key = `<prefix><session id>_<logical key>`.

/// Default global prefix for every physical key.
pub const DEFAULT_PREFIX: &str = "parley_";

/// Key holding the active session id in the session-lifetime area.
pub const SESSION_KEY: &str = "parley_session";

/// Version written into export bundles.
pub const BUNDLE_VERSION: &str = "2.0.0";

pub const SETTINGS: &str = "settings";
pub const MESSAGES: &str = "messages";
pub const PARTNER: &str = "partner";
pub const USER: &str = "user";
pub const THEME: &str = "theme";
pub const COLOR_THEME: &str = "colorTheme";
pub const BUBBLE_STYLE: &str = "bubbleStyle";
pub const CURRENT_BACKGROUND: &str = "currentBackground";
pub const BACKGROUND_GALLERY: &str = "backgroundGallery";

/// Builds the physical key for a logical key.
pub fn namespaced(prefix: &str, session_id: &str, key: &str) -> String {
    format!("{}{}_{}", prefix, session_id, key)
}

/// Splits a physical key into `(session id, logical key)`.
///
/// Logical keys never contain `_`, so the split happens at the last
/// underscore. Returns `None` for keys outside `prefix`.
pub fn split_namespaced<'a>(prefix: &str, physical: &'a str) -> Option<(&'a str, &'a str)> {
    let rest = physical.strip_prefix(prefix)?;
    let (session, key) = rest.rsplit_once('_')?;
    if session.is_empty() || key.is_empty() {
        return None;
    }
    Some((session, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced() {
        assert_eq!(
            namespaced(DEFAULT_PREFIX, "session_1_abc", MESSAGES),
            "parley_session_1_abc_messages"
        );
    }

    #[test]
    fn test_split_namespaced() {
        assert_eq!(
            split_namespaced(DEFAULT_PREFIX, "parley_session_1_abc_colorTheme"),
            Some(("session_1_abc", "colorTheme"))
        );
        assert_eq!(split_namespaced(DEFAULT_PREFIX, "other_session_1_abc_x"), None);
        assert_eq!(split_namespaced(DEFAULT_PREFIX, "parley_nokey"), None);
    }
}
