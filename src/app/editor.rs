//! Multi-line text buffer used for post content while composing or editing.
//!
//! The cursor is a byte offset that always sits on a grapheme boundary.

use unicode_segmentation::UnicodeSegmentation;

const MAX_UNDO: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Snapshot {
    text: String,
    cursor: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
    goal_column: Option<usize>,
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    dirty: bool,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            cursor: text.len(),
            text,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces the content and forgets history.
    pub fn reset(&mut self, text: impl Into<String>) {
        *self = Self::new(text);
    }

    pub fn insert_char(&mut self, ch: char) {
        self.checkpoint();
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.goal_column = if ch == '\n' { Some(0) } else { None };
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.checkpoint();
        let prev = prev_boundary(&self.text, self.cursor);
        self.text.replace_range(prev..self.cursor, "");
        self.cursor = prev;
        self.goal_column = None;
        true
    }

    pub fn delete(&mut self) -> bool {
        let next = next_boundary(&self.text, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.checkpoint();
        self.text.replace_range(self.cursor..next, "");
        self.goal_column = None;
        true
    }

    pub fn move_left(&mut self) -> bool {
        let prev = prev_boundary(&self.text, self.cursor);
        self.jump(prev, None)
    }

    pub fn move_right(&mut self) -> bool {
        let next = next_boundary(&self.text, self.cursor);
        self.jump(next, None)
    }

    pub fn move_home(&mut self) -> bool {
        let start = line_start(&self.text, self.cursor);
        self.jump(start, Some(0))
    }

    pub fn move_end(&mut self) -> bool {
        let end = line_end(&self.text, self.cursor);
        let column = column_of(&self.text, end);
        self.jump(end, Some(column))
    }

    pub fn move_up(&mut self) -> bool {
        let start = line_start(&self.text, self.cursor);
        let column = self
            .goal_column
            .unwrap_or_else(|| column_of(&self.text, self.cursor));
        let target = if start == 0 {
            0
        } else {
            let prev_start = line_start(&self.text, start - 1);
            offset_for_column(&self.text, prev_start, column)
        };
        self.jump(target, Some(column))
    }

    pub fn move_down(&mut self) -> bool {
        let end = line_end(&self.text, self.cursor);
        let column = self
            .goal_column
            .unwrap_or_else(|| column_of(&self.text, self.cursor));
        let target = if end == self.text.len() {
            end
        } else {
            offset_for_column(&self.text, end + 1, column)
        };
        self.jump(target, Some(column))
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.redo.push(current);
        self.restore(previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo.push(current);
        self.restore(next);
        true
    }

    /// Zero-based (line, column) of the cursor, counted in graphemes.
    pub fn cursor_position(&self) -> (usize, usize) {
        let line = self.text[..self.cursor].matches('\n').count();
        (line, column_of(&self.text, self.cursor))
    }

    fn jump(&mut self, target: usize, goal: Option<usize>) -> bool {
        self.goal_column = goal;
        if target == self.cursor {
            return false;
        }
        self.cursor = target;
        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            cursor: self.cursor,
        }
    }

    fn checkpoint(&mut self) {
        let snapshot = self.snapshot();
        self.undo.push(snapshot);
        if self.undo.len() > MAX_UNDO {
            self.undo.remove(0);
        }
        self.redo.clear();
        self.dirty = true;
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.text = snapshot.text;
        self.cursor = snapshot.cursor.min(self.text.len());
        self.goal_column = None;
        self.dirty = true;
    }
}

fn prev_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|g| cursor + g.len())
        .unwrap_or(text.len())
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}

fn column_of(text: &str, cursor: usize) -> usize {
    text[line_start(text, cursor)..cursor].graphemes(true).count()
}

fn offset_for_column(text: &str, start: usize, column: usize) -> usize {
    let end = line_end(text, start);
    text[start..end]
        .grapheme_indices(true)
        .nth(column)
        .map(|(idx, _)| start + idx)
        .unwrap_or(end)
}
