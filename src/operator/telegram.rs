//! Telegram operator channel.
//!
//! Requires the `telegram` feature. Notifications go through a background
//! worker so `notify` never blocks; confirmations are asked in the chat
//! and answered with a plain yes/no reply.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::prelude::*;
use teloxide::types::UpdateKind;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::{log_event, Event, Operator};

/// Configuration for the Telegram operator channel.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token from @`BotFather`.
    pub bot_token: String,
    /// Chat ID questions and notifications go to.
    pub chat_id: i64,
    /// How long `decide` waits for an answer before returning no.
    pub decide_timeout: Duration,
}

impl TelegramConfig {
    /// Create config from environment variables.
    #[must_use]
    pub fn from_env(decide_timeout: Duration) -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .ok()
            .and_then(|s| s.parse().ok())?;

        Some(Self {
            bot_token,
            chat_id,
            decide_timeout,
        })
    }
}

/// Operator channel backed by a Telegram chat.
pub struct TelegramOperator {
    bot: Bot,
    chat_id: ChatId,
    decide_timeout: Duration,
    sender: mpsc::UnboundedSender<Event>,
}

impl TelegramOperator {
    /// Create the operator and spawn its notification worker.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(config: TelegramConfig) -> Self {
        let bot = Bot::new(&config.bot_token);
        let chat_id = ChatId(config.chat_id);

        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(notification_worker(bot.clone(), chat_id, receiver));

        Self {
            bot,
            chat_id,
            decide_timeout: config.decide_timeout,
            sender,
        }
    }

    /// Update offset past everything already in the queue, so `decide`
    /// only sees replies sent after the question.
    async fn latest_offset(&self) -> i32 {
        match self.bot.get_updates().offset(-1).await {
            Ok(updates) => updates.last().map_or(0, |u| u.id.0 as i32 + 1),
            Err(e) => {
                warn!(error = %e, "Failed to read Telegram update backlog");
                0
            }
        }
    }

    async fn await_answer(&self, mut offset: i32, deadline: Instant) -> Option<bool> {
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let poll_secs = remaining.min(Duration::from_secs(20)).as_secs().max(1) as u32;

            let updates = match self.bot.get_updates().offset(offset).timeout(poll_secs).await {
                Ok(updates) => updates,
                Err(e) => {
                    error!(error = %e, "Failed to poll Telegram updates");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    continue;
                }
            };

            for update in updates {
                offset = update.id.0 as i32 + 1;
                let UpdateKind::Message(message) = update.kind else {
                    continue;
                };
                if message.chat.id != self.chat_id {
                    continue;
                }
                match message.text().map(|t| t.trim().to_lowercase()).as_deref() {
                    Some("yes" | "y") => return Some(true),
                    Some("no" | "n") => return Some(false),
                    Some(_) => {
                        let _ = self
                            .bot
                            .send_message(self.chat_id, "Please answer yes or no.")
                            .await;
                    }
                    None => {}
                }
            }
        }
    }
}

#[async_trait]
impl Operator for TelegramOperator {
    async fn decide(&self, question: &str) -> bool {
        let offset = self.latest_offset().await;

        let text = format!("{question}\n\nReply yes or no.");
        if let Err(e) = self.bot.send_message(self.chat_id, text).await {
            error!(error = %e, "Failed to send Telegram question, answering no");
            return false;
        }

        let deadline = Instant::now() + self.decide_timeout;
        match self.await_answer(offset, deadline).await {
            Some(answer) => answer,
            None => {
                info!(question = %question, "Telegram confirmation timed out, answering no");
                let _ = self
                    .bot
                    .send_message(self.chat_id, "No answer in time; not trading.")
                    .await;
                false
            }
        }
    }

    fn notify(&self, event: Event) {
        log_event(&event);
        if self.sender.send(event).is_err() {
            warn!("Telegram notification channel closed");
        }
    }
}

/// Background worker that sends notification messages.
async fn notification_worker(bot: Bot, chat_id: ChatId, mut receiver: mpsc::UnboundedReceiver<Event>) {
    info!(chat_id = chat_id.0, "Telegram operator channel started");

    while let Some(event) = receiver.recv().await {
        let Some(text) = format_event(&event) else {
            continue;
        };
        if let Err(e) = bot.send_message(chat_id, text).await {
            error!(error = %e, "Failed to send Telegram message");
        }
    }
}

/// Chat rendering of an event. Low-signal events stay in the log only.
fn format_event(event: &Event) -> Option<String> {
    match event {
        Event::OpportunityDetected {
            buy_venue,
            sell_venue,
            margin,
        } => Some(format!(
            "Opportunity: buy {buy_venue}, sell {sell_venue}, margin {:.2}%",
            margin * rust_decimal::Decimal::ONE_HUNDRED
        )),
        Event::PairSkipped { .. } | Event::TradeAborted { .. } => None,
        Event::TradeCompleted {
            buy_venue,
            sell_venue,
            amount,
            currency,
            margin,
        } => Some(format!(
            "Trade done: {amount} {currency} bought on {buy_venue}, sold on {sell_venue} ({:.2}% margin)",
            margin * rust_decimal::Decimal::ONE_HUNDRED
        )),
        Event::RiskyLegFailed { venue, error } => {
            Some(format!("Risky leg on {venue} failed, nothing moved: {error}"))
        }
        Event::PositionUnbalanced {
            risky_venue,
            safer_venue,
            amount,
            currency,
            detail,
        } => Some(format!(
            "\u{26a0} UNBALANCED POSITION \u{26a0}\n\
             {amount} {currency} committed on {risky_venue} without the offsetting \
             {safer_venue} leg: {detail}\n\
             Manual intervention required; this trade will NOT be retried."
        )),
    }
}
