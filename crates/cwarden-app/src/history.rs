//! Command history for console input
//!
//! Keeps the submitted commands of one console view and drives up/down
//! recall over them. While browsing, the text the user had typed before the
//! first recall is parked as a draft and restored when navigation walks past
//! the newest entry.

/// Most entries one view retains. Oldest entries fall off first.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Submitted-command history with a recall cursor.
///
/// The cursor is `None` while not browsing. `previous` enters browsing at the
/// newest entry and walks toward the oldest, clamping there; `next` walks
/// back toward the newest and then leaves browsing, handing back the draft.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
    draft: String,
    capacity: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            draft: String::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record a submitted command.
    ///
    /// Whitespace-only text is rejected and nothing changes. Otherwise the
    /// command is appended, the oldest entry is dropped once the capacity is
    /// reached, and any browsing state is reset.
    pub fn submit(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(text.to_string());
        self.cursor = None;
        self.draft.clear();
        true
    }

    /// Step toward older entries, returning the text the input should show.
    ///
    /// The first step parks `current` as the draft. At the oldest entry the
    /// cursor stays put. Returns `None` when there is no history to recall.
    pub fn previous(&mut self, current: &str) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let index = match self.cursor {
            None => {
                self.draft = current.to_string();
                self.entries.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.cursor = Some(index);
        Some(self.entries[index].clone())
    }

    /// Step toward newer entries, returning the text the input should show.
    ///
    /// Walking past the newest entry leaves browsing and returns the draft.
    /// Returns `None` when not browsing.
    pub fn next(&mut self) -> Option<String> {
        let index = self.cursor?;

        if index + 1 < self.entries.len() {
            self.cursor = Some(index + 1);
            Some(self.entries[index + 1].clone())
        } else {
            self.cursor = None;
            Some(std::mem::take(&mut self.draft))
        }
    }

    pub fn is_browsing(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_rejects_whitespace() {
        let mut history = CommandHistory::new();
        assert!(!history.submit(""));
        assert!(!history.submit("   "));
        assert!(!history.submit("\t\n"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_submit_appends_in_order() {
        let mut history = CommandHistory::new();
        assert!(history.submit("list"));
        assert!(history.submit("help"));
        assert_eq!(history.entries(), ["list", "help"]);
    }

    #[test]
    fn test_previous_on_empty_history_does_nothing() {
        let mut history = CommandHistory::new();
        assert_eq!(history.previous("typed"), None);
        assert!(!history.is_browsing());
    }

    #[test]
    fn test_next_without_browsing_does_nothing() {
        let mut history = CommandHistory::new();
        history.submit("list");
        assert_eq!(history.next(), None);
    }

    #[test]
    fn test_recall_walks_back_then_forward_to_draft() {
        let mut history = CommandHistory::new();
        history.submit("list");
        history.submit("help");

        // Two steps back from an empty input land on the oldest entry.
        assert_eq!(history.previous("").as_deref(), Some("help"));
        assert_eq!(history.previous("").as_deref(), Some("list"));

        // Forward again, then past the newest entry back to the empty draft.
        assert_eq!(history.next().as_deref(), Some("help"));
        assert_eq!(history.next().as_deref(), Some(""));
        assert!(!history.is_browsing());
    }

    #[test]
    fn test_previous_clamps_at_oldest() {
        let mut history = CommandHistory::new();
        history.submit("list");
        history.submit("help");

        history.previous("");
        history.previous("");
        assert_eq!(history.previous("").as_deref(), Some("list"));
        assert_eq!(history.previous("").as_deref(), Some("list"));
    }

    #[test]
    fn test_draft_preserves_typed_text() {
        let mut history = CommandHistory::new();
        history.submit("stop");

        assert_eq!(history.previous("say hello").as_deref(), Some("stop"));
        assert_eq!(history.next().as_deref(), Some("say hello"));
    }

    #[test]
    fn test_draft_captured_only_on_first_step() {
        let mut history = CommandHistory::new();
        history.submit("list");
        history.submit("help");

        // The text passed on later steps must not overwrite the parked draft.
        history.previous("original");
        history.previous("help");
        assert_eq!(history.next().as_deref(), Some("help"));
        assert_eq!(history.next().as_deref(), Some("original"));
    }

    #[test]
    fn test_submit_resets_browsing() {
        let mut history = CommandHistory::new();
        history.submit("list");
        history.previous("draft");
        assert!(history.is_browsing());

        history.submit("stop");
        assert!(!history.is_browsing());
        assert_eq!(history.previous("").as_deref(), Some("stop"));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = CommandHistory::with_capacity(3);
        history.submit("a");
        history.submit("b");
        history.submit("c");
        history.submit("d");

        assert_eq!(history.len(), 3);
        assert_eq!(history.entries(), ["b", "c", "d"]);
    }
}
