//! Scripted partner replies.

use std::sync::Mutex;
use std::time::Duration;

use parley_core::config::ChatConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Replies the simulated partner picks from.
pub const CANNED_REPLIES: [&str; 8] = [
    "Got it!",
    "That's a great idea",
    "Let me think...",
    "I agree with you",
    "Haha, that's funny!",
    "👍 Nice!",
    "I was thinking the same",
    "Thanks for sharing!",
];

/// A reply decided after a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReply {
    /// Wait before the partner starts typing.
    pub delay: Duration,
    /// Time spent typing before the reply lands.
    pub typing: Duration,
    pub text: &'static str,
}

/// Decides whether and when the partner answers.
pub struct ReplySimulator {
    probability: f64,
    min_delay: Duration,
    max_delay: Duration,
    rng: Mutex<StdRng>,
}

impl ReplySimulator {
    pub fn new(probability: f64, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            min_delay,
            max_delay,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            config.reply_probability,
            Duration::from_millis(config.reply_delay_min_ms),
            Duration::from_millis(config.reply_delay_max_ms),
        )
    }

    /// Makes every decision reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Rolls the dice for one sent message.
    pub fn plan(&self) -> Option<PlannedReply> {
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };

        if !rng.gen_bool(self.probability) {
            return None;
        }

        let delay = self.random_delay(&mut *rng);
        let typing = self.random_delay(&mut *rng);
        let text = CANNED_REPLIES[rng.gen_range(0..CANNED_REPLIES.len())];

        Some(PlannedReply {
            delay,
            typing,
            text,
        })
    }

    fn random_delay(&self, rng: &mut impl Rng) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        rng.gen_range(self.min_delay..self.max_delay)
    }
}
