//! Scripted operator channel.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::operator::{Event, Operator};

/// An operator with queued confirmation answers and captured events.
///
/// `decide` pops the next queued answer; an empty queue answers yes, so
/// tests that do not exercise the confirmation gates proceed unhindered.
#[derive(Default)]
pub struct ScriptedOperator {
    answers: Mutex<VecDeque<bool>>,
    questions: Mutex<Vec<String>>,
    events: Mutex<Vec<Event>>,
}

impl ScriptedOperator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_answers(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Questions asked so far, in order.
    #[must_use]
    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().clone()
    }

    /// Events notified so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// True if any captured event is a `PositionUnbalanced`.
    #[must_use]
    pub fn saw_unbalanced(&self) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| matches!(e, Event::PositionUnbalanced { .. }))
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn decide(&self, question: &str) -> bool {
        self.questions.lock().push(question.to_string());
        self.answers.lock().pop_front().unwrap_or(true)
    }

    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}
