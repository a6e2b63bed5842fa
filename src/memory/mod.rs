//! Per-agent conversation memory.
//!
//! Each agent keeps a sliding window of recent user/assistant turns so that
//! follow-up questions ("and the second one?") resolve against earlier
//! answers. Tool traffic is not retained; only the user's text and the
//! agent's final reply are.

use crate::llm::coordinator::{ConversationMessage, MessageRole};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Default number of messages kept when an agent sets no window
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Bounded, thread-safe message history.
///
/// The lock is only held while copying messages in or out, never across an
/// `.await`.
#[derive(Debug)]
pub struct ConversationWindow {
    capacity: usize,
    messages: Mutex<VecDeque<ConversationMessage>>,
}

impl ConversationWindow {
    /// A window holding at most `capacity` messages. Zero disables memory.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the retained messages, oldest first
    pub fn snapshot(&self) -> Vec<ConversationMessage> {
        self.messages.lock().iter().cloned().collect()
    }

    /// Record one completed exchange, evicting the oldest messages past capacity
    pub fn record_exchange(&self, user: &str, assistant: &str) {
        if self.capacity == 0 {
            return;
        }

        let mut messages = self.messages.lock();
        messages.push_back(ConversationMessage::user(user));
        messages.push_back(ConversationMessage::assistant(assistant, Vec::new()));

        while messages.len() > self.capacity {
            messages.pop_front();
        }

        // Never start the window on an orphaned assistant reply
        while messages
            .front()
            .is_some_and(|m| m.role == MessageRole::Assistant)
        {
            messages.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Default for ConversationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_exchange_in_order() {
        let window = ConversationWindow::new(10);
        window.record_exchange("list instances", "You have two instances.");

        let messages = window.snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "list instances");
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }

    #[test]
    fn test_evicts_oldest() {
        let window = ConversationWindow::new(4);
        for i in 0..5 {
            window.record_exchange(&format!("q{}", i), &format!("a{}", i));
        }

        let contents: Vec<String> = window.snapshot().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["q3", "a3", "q4", "a4"]);
    }

    #[test]
    fn test_odd_capacity_never_starts_with_assistant() {
        let window = ConversationWindow::new(3);
        window.record_exchange("q0", "a0");
        window.record_exchange("q1", "a1");

        let messages = window.snapshot();
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_zero_capacity_disables_memory() {
        let window = ConversationWindow::new(0);
        window.record_exchange("q", "a");
        assert!(window.is_empty());
    }

    #[test]
    fn test_clear() {
        let window = ConversationWindow::default();
        assert_eq!(window.capacity(), DEFAULT_HISTORY_WINDOW);
        window.record_exchange("q", "a");
        window.clear();
        assert_eq!(window.len(), 0);
    }
}
