//! Terminal implementations of the presentation collaborators.

use std::io::{self, Write};

use async_trait::async_trait;
use colored::Colorize;
use parley_core::notify::{ConfirmRequest, Confirmer, Notification, NotificationLevel, Notifier};

/// Prints notifications, errors to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        let message = notification.message.as_str();
        match notification.level {
            NotificationLevel::Success => println!("✅ {}", message.green()),
            NotificationLevel::Info => println!("{}", message.cyan()),
            NotificationLevel::Warning => eprintln!("⚠️  {}", message.yellow()),
            NotificationLevel::Error => eprintln!("❌ {}", message.red()),
        }
    }
}

/// Asks on stdin. `assume_yes` answers every question with yes.
pub struct StdinConfirmer {
    assume_yes: bool,
}

impl StdinConfirmer {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

/// Accepts `y`/`yes` (any case) or the confirm label itself.
pub fn is_affirmative(answer: &str, confirm_label: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y")
        || answer.eq_ignore_ascii_case("yes")
        || answer.eq_ignore_ascii_case(confirm_label)
}

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, request: ConfirmRequest) -> bool {
        if self.assume_yes {
            return true;
        }

        print!(
            "{}\n{}\n[y] {} / [N] {}: ",
            request.title.bold(),
            request.message,
            request.confirm_label,
            request.cancel_label
        );
        if io::stdout().flush().is_err() {
            return false;
        }

        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_affirmative(&line, &request.confirm_label),
            _ => false,
        }
    }
}
