//! Console operator channel for attended runs.

use async_trait::async_trait;
use dialoguer::Confirm;
use tracing::warn;

use super::{log_event, Event, Operator};

/// Prompts on the terminal for confirmations; events go to the log.
pub struct ConsoleOperator;

#[async_trait]
impl Operator for ConsoleOperator {
    async fn decide(&self, question: &str) -> bool {
        let question = question.to_string();

        // dialoguer blocks on stdin; keep it off the async runtime.
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(question)
                .default(false)
                .interact()
        })
        .await;

        match answer {
            Ok(Ok(yes)) => yes,
            Ok(Err(e)) => {
                warn!(error = %e, "Console prompt failed, answering no");
                false
            }
            Err(e) => {
                warn!(error = %e, "Console prompt task failed, answering no");
                false
            }
        }
    }

    fn notify(&self, event: Event) {
        log_event(&event);
    }
}
