use super::types::Message;
use parking_lot::RwLock;
use std::sync::Arc;

/// Change notification emitted after every mutation of the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    Appended(usize),
    Updated(usize),
    Cleared,
}

type Observer = Arc<dyn Fn(LogEvent) + Send + Sync>;

/// The mutation surface handed to stream consumers.
///
/// Consumers never get open read-write access to the log; every write goes
/// through one of these three calls.
pub trait LogMutator {
    /// Append a message and return its index
    fn append(&self, message: Message) -> usize;

    /// Index of the most recent message matching `predicate`
    fn find_last(&self, predicate: &dyn Fn(&Message) -> bool) -> Option<usize>;

    /// Replace the content of the message at `index`.
    /// Returns false if there is no such message.
    fn update_content(&self, index: usize, content: &str) -> bool;
}

/// Ordered conversation log shared between the UI and the chat worker
#[derive(Clone)]
pub struct MessageLog {
    messages: Arc<RwLock<Vec<Message>>>,
    observer: Arc<RwLock<Option<Observer>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            observer: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a callback invoked after every mutation (e.g. to request a repaint)
    pub fn set_observer(&self, observer: impl Fn(LogEvent) + Send + Sync + 'static) {
        *self.observer.write() = Some(Arc::new(observer));
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn get(&self, index: usize) -> Option<Message> {
        self.messages.read().get(index).cloned()
    }

    pub fn clear(&self) {
        self.messages.write().clear();
        self.notify(LogEvent::Cleared);
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    fn notify(&self, event: LogEvent) {
        // Clone out of the lock so the callback may read the log
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            observer(event);
        }
    }
}

impl LogMutator for MessageLog {
    fn append(&self, message: Message) -> usize {
        let index = {
            let mut messages = self.messages.write();
            messages.push(message);
            messages.len() - 1
        };
        self.notify(LogEvent::Appended(index));
        index
    }

    fn find_last(&self, predicate: &dyn Fn(&Message) -> bool) -> Option<usize> {
        self.messages.read().iter().rposition(|m| predicate(m))
    }

    fn update_content(&self, index: usize, content: &str) -> bool {
        let updated = match self.messages.write().get_mut(index) {
            Some(message) => {
                message.content.clear();
                message.content.push_str(content);
                true
            }
            None => false,
        };
        if updated {
            self.notify(LogEvent::Updated(index));
        }
        updated
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MessageLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageLog")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Role, RetrievalSettings};
    use parking_lot::Mutex;

    #[test]
    fn test_append_returns_insertion_index() {
        let log = MessageLog::new();
        assert_eq!(log.append(Message::user("hi")), 0);
        assert_eq!(log.append(Message::assistant("")), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_find_last_scans_backwards() {
        let log = MessageLog::new();
        log.append(Message::user("first"));
        log.append(Message::assistant("a"));
        log.append(Message::user("second"));
        log.append(Message::assistant("b"));

        let last_user = log.find_last(&|m| m.role() == Role::User);
        assert_eq!(last_user, Some(2));
        assert_eq!(log.find_last(&|m| m.content == "missing"), None);
    }

    #[test]
    fn test_update_content_keeps_role_and_metadata() {
        let log = MessageLog::new();
        let idx = log.append(Message::assistant("").with_metadata(RetrievalSettings::default()));

        assert!(log.update_content(idx, "Hello"));
        assert!(!log.update_content(idx + 1, "nope"));

        let message = log.get(idx).unwrap();
        assert_eq!(message.content, "Hello");
        assert_eq!(message.role(), Role::Assistant);
        assert!(message.metadata().is_some());
    }

    #[test]
    fn test_observer_sees_every_mutation() {
        let log = MessageLog::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        log.set_observer(move |event| sink.lock().push(event));

        let idx = log.append(Message::user(""));
        log.update_content(idx, "x");
        log.clear();

        assert_eq!(
            *events.lock(),
            vec![LogEvent::Appended(0), LogEvent::Updated(0), LogEvent::Cleared]
        );
    }

    #[test]
    fn test_clones_share_storage() {
        let log = MessageLog::new();
        let other = log.clone();
        other.append(Message::user("shared"));
        assert_eq!(log.len(), 1);
    }
}
