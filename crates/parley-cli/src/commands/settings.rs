use std::str::FromStr;

use anyhow::{Context, Result, bail};
use parley_core::chat::{Background, BubbleStyle, ColorTheme, Theme};

use crate::context::AppContext;

/// Splits `key=value`.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected key=value, got '{}'", raw);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("missing setting name in '{}'", raw);
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Prints the settings, or applies `assignments` and saves.
pub async fn settings(ctx: &AppContext, assignments: &[String]) -> Result<()> {
    let chat = ctx.chat().await;

    if !assignments.is_empty() {
        let mut updated = chat.settings().await;
        for raw in assignments {
            let (key, value) = parse_assignment(raw)?;
            updated
                .set_field(&key, &value)
                .with_context(|| format!("Cannot set '{}'", key))?;
        }
        if !chat.update_settings(|settings| *settings = updated).await {
            bail!("Settings could not be saved");
        }
    }

    println!("{}", serde_json::to_string_pretty(&chat.settings().await)?);
    Ok(())
}

pub struct ThemeArgs {
    pub reset: bool,
    pub toggle_dark: bool,
    pub mode: Option<String>,
    pub color: Option<String>,
    pub bubble: Option<String>,
    pub background_color: Option<String>,
    pub background_image: Option<String>,
    pub no_background: bool,
}

/// Applies theme changes, then prints the current selection.
pub async fn theme(ctx: &AppContext, args: ThemeArgs) -> Result<()> {
    let chat = ctx.chat().await;

    if args.reset && !chat.reset_theme().await {
        bail!("Theme could not be reset");
    }
    if args.toggle_dark {
        chat.toggle_dark_mode().await;
    }
    if let Some(mode) = args.mode.as_deref() {
        let theme = Theme::from_str(mode).with_context(|| format!("unknown theme '{}'", mode))?;
        chat.set_theme(theme).await;
    }
    if let Some(color) = args.color.as_deref() {
        let color_theme = ColorTheme::from_str(color)
            .with_context(|| format!("unknown color theme '{}'", color))?;
        chat.set_color_theme(color_theme).await;
    }
    if let Some(bubble) = args.bubble.as_deref() {
        let style = BubbleStyle::from_str(bubble)
            .with_context(|| format!("unknown bubble style '{}'", bubble))?;
        chat.set_bubble_style(style).await;
    }

    if args.no_background {
        chat.apply_background(None).await;
    } else if let Some(value) = args.background_color {
        chat.apply_background(Some(Background::color(value))).await;
    } else if let Some(value) = args.background_image {
        chat.apply_background(Some(Background::image(value))).await;
    }

    let state = chat.snapshot().await;
    println!("theme:        {}", state.theme);
    println!("color theme:  {}", state.color_theme);
    println!("bubble style: {}", state.bubble_style);
    match &state.background {
        Some(background) => println!("background:   {}", serde_json::to_string(background)?),
        None => println!("background:   none"),
    }
    println!("gallery:      {} saved", chat.themes().gallery().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("autoSave=false").unwrap(),
            ("autoSave".to_string(), "false".to_string())
        );
        assert_eq!(
            parse_assignment(" fontFamily = serif ").unwrap(),
            ("fontFamily".to_string(), "serif".to_string())
        );
        assert!(parse_assignment("autoSave").is_err());
        assert!(parse_assignment("=true").is_err());
    }
}
