use ratatui::layout::Rect;
use std::cmp;

/// Plain multi-line text buffer with a cursor, used by every form field
#[derive(Debug, Clone)]
pub struct Editor {
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,     // In characters, not bytes
    pub scroll_offset: usize,  // First visible line
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
        }
    }

    /// Build an editor holding `content` with the cursor at the end
    pub fn from_string(content: impl Into<String>) -> Self {
        let content = content.into();
        let lines: Vec<String> = if content.is_empty() {
            vec![String::new()]
        } else {
            content.lines().map(|s| s.to_string()).collect()
        };
        let cursor_line = lines.len().saturating_sub(1);
        let cursor_col = lines.last().map(|l| l.chars().count()).unwrap_or(0);
        Self {
            lines,
            cursor_line,
            cursor_col,
            scroll_offset: 0,
        }
    }

    fn current_line_len(&self) -> usize {
        self.lines
            .get(self.cursor_line)
            .map(|l| l.chars().count())
            .unwrap_or(0)
    }

    fn ensure_cursor_valid(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        if self.cursor_line >= self.lines.len() {
            self.cursor_line = self.lines.len() - 1;
        }
        self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.insert_newline();
            return;
        }
        self.ensure_cursor_valid();
        let line = &mut self.lines[self.cursor_line];
        let mut chars: Vec<char> = line.chars().collect();
        chars.insert(self.cursor_col, ch);
        *line = chars.into_iter().collect();
        self.cursor_col += 1;
    }

    /// Delete the character before the cursor, joining lines at column 0
    pub fn delete_char(&mut self) {
        self.ensure_cursor_valid();
        if self.cursor_col > 0 {
            let line = &mut self.lines[self.cursor_line];
            let mut chars: Vec<char> = line.chars().collect();
            chars.remove(self.cursor_col - 1);
            *line = chars.into_iter().collect();
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            let current = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
            self.lines[self.cursor_line].push_str(&current);
        }
    }

    pub fn insert_newline(&mut self) {
        self.ensure_cursor_valid();
        let line = &mut self.lines[self.cursor_line];
        let mut chars: Vec<char> = line.chars().collect();
        let remainder: String = chars.split_off(self.cursor_col).into_iter().collect();
        *line = chars.into_iter().collect();
        self.lines.insert(self.cursor_line + 1, remainder);
        self.cursor_line += 1;
        self.cursor_col = 0;
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.current_line_len() {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_col = self.current_line_len();
    }

    /// Keep the cursor line inside a viewport of `viewport_height` lines
    pub fn update_scroll(&mut self, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }
        if self.cursor_line < self.scroll_offset {
            self.scroll_offset = self.cursor_line;
        } else if self.cursor_line >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.cursor_line + 1 - viewport_height;
        }
    }

    /// Lines visible in a viewport of the given height, starting at the scroll offset
    pub fn visible_lines(&self, viewport_height: usize) -> &[String] {
        let start = cmp::min(self.scroll_offset, self.lines.len());
        let end = cmp::min(start + viewport_height, self.lines.len());
        &self.lines[start..end]
    }

    pub fn to_string(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    /// Terminal position of the cursor for a bordered field drawn in `area`
    pub fn cursor_screen_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let inner_height = area.height.saturating_sub(2) as usize;
        let inner_width = area.width.saturating_sub(2) as usize;
        if inner_height == 0 || inner_width == 0 || self.cursor_line < self.scroll_offset {
            return None;
        }
        let row = self.cursor_line - self.scroll_offset;
        if row >= inner_height {
            return None;
        }
        let col = cmp::min(self.cursor_col, inner_width.saturating_sub(1));
        Some((area.x + 1 + col as u16, area.y + 1 + row as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> Editor {
        let mut editor = Editor::new();
        for ch in text.chars() {
            editor.insert_char(ch);
        }
        editor
    }

    #[test]
    fn typing_and_newlines_build_multi_line_text() {
        let editor = typed("wheel\nnight run");
        assert_eq!(editor.lines, vec!["wheel", "night run"]);
        assert_eq!(editor.to_string(), "wheel\nnight run");
        assert_eq!((editor.cursor_line, editor.cursor_col), (1, 9));
    }

    #[test]
    fn backspace_at_line_start_joins_lines() {
        let mut editor = typed("ab\ncd");
        editor.move_cursor_home();
        editor.delete_char();
        assert_eq!(editor.lines, vec!["abcd"]);
        assert_eq!(editor.cursor_col, 2);
    }

    #[test]
    fn handles_multibyte_characters() {
        let mut editor = Editor::from_string("ハム太郎");
        editor.move_cursor_left();
        editor.delete_char();
        assert_eq!(editor.to_string(), "ハム郎");
        editor.insert_char('次');
        assert_eq!(editor.to_string(), "ハム次郎");
    }

    #[test]
    fn vertical_moves_clamp_the_column() {
        let mut editor = Editor::from_string("a long first line\nshort");
        editor.move_cursor_up();
        editor.move_cursor_end();
        editor.move_cursor_down();
        assert_eq!((editor.cursor_line, editor.cursor_col), (1, 5));
    }

    #[test]
    fn scroll_follows_the_cursor() {
        let mut editor = Editor::from_string("1\n2\n3\n4\n5");
        editor.update_scroll(2);
        assert_eq!(editor.scroll_offset, 3);
        assert_eq!(editor.visible_lines(2), ["4", "5"]);

        let area = Rect::new(10, 5, 20, 4);
        assert_eq!(editor.cursor_screen_pos(area), Some((12, 7)));
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        assert!(Editor::from_string("  \n ").is_blank());
        assert!(!Editor::from_string("x").is_blank());
    }
}
