#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryDirection {
    Previous,
    Next,
}

/// What the input field should show after a history step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recall {
    Entry(String),
    Blank,
    Unchanged,
}

/// Append-only command history with a browsing cursor.
///
/// The cursor ranges over `0..=len`; `len` means the user is on a fresh,
/// blank line rather than browsing.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: String) {
        self.entries.push(entry);
        self.cursor = self.entries.len();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn step(&mut self, direction: HistoryDirection) -> Recall {
        match direction {
            HistoryDirection::Previous => {
                if self.cursor == 0 {
                    return Recall::Unchanged;
                }
                self.cursor -= 1;
                self.recall_current()
            }
            HistoryDirection::Next => {
                let next = self.cursor + 1;
                if next >= self.entries.len() {
                    self.cursor = self.entries.len();
                    Recall::Blank
                } else {
                    self.cursor = next;
                    self.recall_current()
                }
            }
        }
    }

    fn recall_current(&self) -> Recall {
        match self.entries.get(self.cursor) {
            Some(entry) => Recall::Entry(entry.clone()),
            None => Recall::Blank,
        }
    }
}
