use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use parley_core::chat::message::format_relative_time;
use parley_core::chat::{ChatState, Message, MessageContent, MessageKind};

use crate::context::AppContext;

pub async fn send(ctx: &AppContext, text: &str, image: bool) -> Result<()> {
    let chat = ctx.chat().await;

    if image {
        let message = chat.send_image(text).await?;
        let state = chat.snapshot().await;
        println!("{}", render(&message, &state));
        return Ok(());
    }

    let (sent, reply) = chat.send_text_and_await_reply(text).await?;
    let Some(sent) = sent else {
        println!("{}", "Nothing to send".dimmed());
        return Ok(());
    };

    let state = chat.snapshot().await;
    println!("{}", render(&sent, &state));
    if let Some(reply) = reply {
        println!("{}", render(&reply, &state));
    }
    Ok(())
}

/// Prints the visible thread, revealing `more` extra pages first.
pub async fn history(ctx: &AppContext, more: u8) -> Result<()> {
    let chat = ctx.chat().await;
    for _ in 0..more {
        if chat.load_more_history().await.is_empty() {
            break;
        }
    }

    let state = chat.snapshot().await;
    if state.messages.is_empty() {
        println!("{}", "No messages yet".dimmed());
        return Ok(());
    }

    if state.has_more_history() {
        let hidden = state.messages.len() - state.displayed_message_count;
        println!(
            "{}",
            format!("... {} older messages (use --more)", hidden).dimmed()
        );
    }
    for message in state.visible_messages() {
        println!("{}", render(message, &state));
    }
    Ok(())
}

fn render(message: &Message, state: &ChatState) -> String {
    let body = match &message.content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Image(data) => format!("[image, {} bytes]", data.len()),
    };

    let line = match message.kind {
        MessageKind::Sent => format!("{}: {}", state.user.name.green().bold(), body),
        MessageKind::Received => format!("{}: {}", state.partner.name.cyan().bold(), body),
    };

    if state.settings.show_timestamp {
        let when = format_relative_time(message.timestamp, Utc::now());
        format!("{} {}", format!("[{}]", when).dimmed(), line)
    } else {
        line
    }
}
