//! Append-only console line buffer
//!
//! Stores every line delivered for one console view, in arrival order, for
//! the lifetime of the view. Each mutation bumps a revision counter after the
//! lines are in place, so a renderer can compare revisions to decide when to
//! scroll to the end.

/// Unbounded, append-only store of console lines.
///
/// Lines are never removed or reordered; the buffer lives exactly as long as
/// its view. `revision()` changes strictly after the lines it announces are
/// observable through `lines()`.
#[derive(Debug, Clone, Default)]
pub struct AppendBuffer {
    lines: Vec<String>,
    revision: u64,
}

impl AppendBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single line and bump the revision.
    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
        self.revision += 1;
    }

    /// Append a batch of lines in order.
    ///
    /// The revision is bumped once per call, and only if at least one line
    /// was actually added.
    pub fn extend<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.lines.len();
        self.lines.extend(lines);
        if self.lines.len() > before {
            self.revision += 1;
        }
    }

    /// All lines in arrival order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Monotonic counter incremented after every observable mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.lines.iter()
    }
}
