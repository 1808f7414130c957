//! The modal key processor.
//!
//! [`KeyProcessor`] receives one [`KeyPress`] at a time and drives the
//! [`Editor`]: it routes keys to the focused input line or the document,
//! interprets navigation-mode commands (counts, operators, motions,
//! registers, marks, selections), and feeds the record/replay log so `.`
//! can repeat the last edit.
//!
//! Multi-key sequences are held as a [`Pending`] state between keys;
//! [`flush`](KeyProcessor::flush) drops an unfinished prefix, which an
//! embedding UI calls on its escape-timeout.

use ved_text::{word, Document};

use crate::buffer::Selection;
use crate::editor::{Editor, EditorEffect, Focus};
use crate::key::{Key, KeyPress};
use crate::register::{is_register_name, PasteMode, RegisterContent, RegisterKind};
use crate::search::SearchDirection;
use crate::state::{CharacterFind, InputMode, Operator};
use crate::text_object::{self, TextObject, TextObjectKind};

// ---------------------------------------------------------------------------
// Pending
// ---------------------------------------------------------------------------

/// A sequence started but not resolved: the next key completes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Pending {
    #[default]
    None,
    /// `"` — awaiting a register name.
    Register,
    /// `"x` — awaiting what to do with register `x`.
    RegisterAction(char),
    /// `f` / `F` / `t` / `T` — awaiting the target character.
    FindChar { backwards: bool, till: bool },
    /// `m` — awaiting a mark name.
    Mark,
    /// `'` — awaiting a mark to jump to.
    Jump,
    /// `g` prefix.
    G,
    /// `Z` prefix.
    Z,
    /// `Ctrl-W` prefix.
    CtrlW,
    /// `i` while an operator is pending (`diw`).
    InnerObject,
    /// `a` while an operator is pending (`daw`).
    AroundObject,
}

// ---------------------------------------------------------------------------
// KeyProcessor
// ---------------------------------------------------------------------------

pub struct KeyProcessor {
    pub editor: Editor,
    /// Digits typed so far.
    count: Option<usize>,
    pending: Pending,
    /// Close the `.` recording after this key has been logged.
    finish_after_key: bool,
    /// Rows receiving text in [`InputMode::InsertMultiple`].
    multi_insert_rows: Vec<usize>,
    multi_insert_col: usize,
}

impl KeyProcessor {
    #[must_use]
    pub fn new(editor: Editor) -> Self {
        Self {
            editor,
            count: None,
            pending: Pending::None,
            finish_after_key: false,
            multi_insert_rows: Vec::new(),
            multi_insert_col: 0,
        }
    }

    /// Process one key press.
    pub fn feed(&mut self, key: KeyPress) {
        self.editor.clear_message();
        match self.editor.focus {
            Focus::CommandLine => self.process_command_line_key(key),
            Focus::SearchLine => self.process_search_line_key(key),
            Focus::Document => self.process_document_key(key),
        }
        // The recorder sees every key after its handler ran; commands
        // that resolve on this key asked to close the log after it.
        self.editor.append_edit_command(key);
        if self.finish_after_key {
            self.finish_after_key = false;
            self.editor.finish_edit_command(None);
        }
        self.editor.refresh_reports();
    }

    /// Feed each char of `keys` as a plain key press (tests, macros).
    pub fn feed_str(&mut self, keys: &str) {
        for c in keys.chars() {
            self.feed(KeyPress::char(c));
        }
    }

    /// Drop an ambiguous prefix (escape-timeout from the UI).
    pub fn flush(&mut self) {
        self.pending = Pending::None;
    }

    // -- shared helpers -----------------------------------------------------

    fn take_count(&mut self) -> usize {
        self.count.take().unwrap_or(1)
    }

    fn document(&self) -> Document {
        self.editor.current_buffer().document().clone()
    }

    fn set_document(&mut self, document: Document) {
        self.editor.current_buffer_mut().set_document(document);
    }

    fn move_by(&mut self, object: TextObject) {
        let doc = self.document().moved(object.start);
        self.set_document(doc);
    }

    fn move_vertically(&mut self, delta: isize) {
        let doc = self.document();
        let rows = doc.line_count() as isize;
        let row = (doc.cursor_row() as isize + delta).clamp(0, rows - 1) as usize;
        let col = doc.cursor_col().min(doc.line_content_len(row));
        let cursor = doc.row_col_to_offset(row, col);
        self.set_document(doc.at(cursor));
    }

    /// Left within the line, as far as the column allows.
    fn cursor_left_in_line(&mut self, count: usize) {
        let doc = self.document();
        let delta = doc.cursor_left(count);
        self.set_document(doc.moved(delta));
    }

    fn cursor_right_in_line(&mut self, count: usize) {
        let doc = self.document();
        let delta = doc.cursor_right(count);
        self.set_document(doc.moved(delta));
    }

    // -- input lines --------------------------------------------------------

    fn process_command_line_key(&mut self, key: KeyPress) {
        if key.key == Key::Escape || key.is_ctrl('c') {
            self.editor.leave_command_mode();
            return;
        }
        match key.key {
            Key::Enter => self.editor.accept_command_line(),
            Key::Backspace => {
                match self.editor.command_line.as_mut() {
                    Some(line) if !line.is_empty() => {
                        line.pop();
                    }
                    _ => self.editor.leave_command_mode(),
                }
            }
            _ => {
                if let Some(c) = key.as_char() {
                    if let Some(line) = self.editor.command_line.as_mut() {
                        line.push(c);
                    }
                }
            }
        }
    }

    fn process_search_line_key(&mut self, key: KeyPress) {
        if key.key == Key::Escape || key.is_ctrl('c') {
            self.editor.leave_command_mode();
            return;
        }
        match key.key {
            Key::Enter => self.editor.accept_search_line(),
            Key::Backspace => {
                match self.editor.search_line.as_mut() {
                    Some(line) if !line.is_empty() => {
                        line.pop();
                    }
                    _ => self.editor.leave_command_mode(),
                }
            }
            _ => {
                if let Some(c) = key.as_char() {
                    if let Some(line) = self.editor.search_line.as_mut() {
                        line.push(c);
                    }
                }
            }
        }
    }

    // -- document -----------------------------------------------------------

    fn process_document_key(&mut self, key: KeyPress) {
        match self.editor.vi_state.input_mode {
            InputMode::Insert | InputMode::InsertMultiple | InputMode::Replace => {
                self.process_text_input_key(key);
            }
            InputMode::ReplaceSingle => self.process_replace_single_key(key),
            InputMode::Navigation => self.process_navigation_key(key),
        }
    }

    /// Leave an input mode the vi way: cursor one left, back to
    /// navigation, recording closed with the escape itself.
    fn leave_input_mode(&mut self, key: KeyPress) {
        self.editor.finish_edit_command(Some(key));
        if matches!(
            self.editor.vi_state.input_mode,
            InputMode::Insert | InputMode::Replace
        ) {
            self.cursor_left_in_line(1);
        }
        self.editor.vi_state.input_mode = InputMode::Navigation;
        self.editor.current_buffer_mut().selection = None;
        self.multi_insert_rows.clear();
    }

    fn process_text_input_key(&mut self, key: KeyPress) {
        if key.key == Key::Escape || key.is_ctrl('c') {
            self.leave_input_mode(key);
            return;
        }
        if key.is_ctrl('d') {
            self.change_indent_current_line(false);
            return;
        }
        let overwrite = self.editor.vi_state.input_mode == InputMode::Replace;
        let multiple = self.editor.vi_state.input_mode == InputMode::InsertMultiple;
        match key.key {
            Key::Enter => {
                let copy_margin =
                    self.editor.options.autoindent && !self.editor.options.paste_mode;
                self.editor.current_buffer_mut().newline(copy_margin);
            }
            Key::Backspace => {
                if overwrite {
                    self.cursor_left_in_line(1);
                } else {
                    self.editor.current_buffer_mut().delete_before(1);
                }
            }
            Key::Tab => {
                if self.editor.options.expand_tab {
                    let width = self.editor.options.tabstop;
                    let col = self.document().cursor_col();
                    let spaces = " ".repeat(width - col % width);
                    self.editor.current_buffer_mut().insert_text(&spaces, false);
                } else {
                    self.editor.current_buffer_mut().insert_text("\t", false);
                }
            }
            _ => {
                if let Some(c) = key.as_char() {
                    if multiple {
                        self.insert_on_selected_rows(c);
                    } else {
                        self.editor
                            .current_buffer_mut()
                            .insert_text(&c.to_string(), overwrite);
                    }
                }
            }
        }
    }

    fn insert_on_selected_rows(&mut self, c: char) {
        let doc = self.document();
        let col = self.multi_insert_col;
        let mut lines = doc.lines();
        for &row in &self.multi_insert_rows {
            if let Some(line) = lines.get_mut(row) {
                if line.chars().count() >= col {
                    let at = line
                        .char_indices()
                        .nth(col)
                        .map_or(line.len(), |(byte, _)| byte);
                    line.insert(at, c);
                }
            }
        }
        self.multi_insert_col += 1;
        let row = doc.cursor_row();
        let text = lines.join("\n");
        let cursor = Document::new(&text).row_col_to_offset(row, self.multi_insert_col);
        self.set_document(Document::with_cursor(&text, cursor));
    }

    fn process_replace_single_key(&mut self, key: KeyPress) {
        if key.key == Key::Escape || key.is_ctrl('c') {
            self.editor.finish_edit_command(Some(key));
            self.editor.vi_state.input_mode = InputMode::Navigation;
            return;
        }
        if let Some(c) = key.as_char() {
            let buffer = self.editor.current_buffer_mut();
            if buffer.document().current_char().is_some_and(|ch| ch != '\n') {
                buffer.insert_text(&c.to_string(), true);
                let doc = buffer.document().moved(-1);
                buffer.set_document(doc);
            }
            self.editor.vi_state.input_mode = InputMode::Navigation;
            self.finish_after_key = true;
        }
    }

    // -- navigation ---------------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn process_navigation_key(&mut self, key: KeyPress) {
        match std::mem::take(&mut self.pending) {
            Pending::None => {}
            pending => {
                self.resolve_pending(pending, key);
                return;
            }
        }

        if key.key == Key::Escape || key.is_ctrl('c') {
            self.editor.finish_edit_command(Some(key));
            self.editor.vi_state.reset_operator();
            self.editor.current_buffer_mut().selection = None;
            self.count = None;
            return;
        }
        if key.is_ctrl('r') {
            self.editor.current_buffer_mut().redo();
            return;
        }
        if key.is_ctrl('w') {
            self.pending = Pending::CtrlW;
            return;
        }
        if key.is_ctrl('v') {
            self.toggle_selection(RegisterKind::Block);
            return;
        }

        let Some(c) = key.as_char() else {
            self.process_navigation_special_key(key);
            return;
        };

        // Count digits; a bare `0` is the line-start motion.
        if c.is_ascii_digit() && (c != '0' || self.count.is_some()) {
            let digit = c.to_digit(10).unwrap_or(0) as usize;
            self.count = Some(self.count.unwrap_or(0) * 10 + digit);
            return;
        }

        if let Some(operator) = self.editor.vi_state.operator {
            self.process_operator_pending_key(operator, c);
            return;
        }

        match c {
            // Operators.
            'd' => self.operator_key(Operator::Delete, key),
            'c' => self.operator_key(Operator::Change, key),
            'y' => self.operator_key(Operator::Yank, key),
            '>' => self.operator_key(Operator::Indent, key),
            '<' => self.operator_key(Operator::Unindent, key),

            // Entering input modes.
            'i' => self.enter_insert(),
            'I' => {
                match self.editor.current_buffer().selection {
                    Some(selection) if selection.kind == RegisterKind::Block => {
                        self.begin_block_insert(selection);
                    }
                    _ => {
                        let doc = self.document();
                        let to_first = doc.start_of_line(true);
                        self.set_document(doc.moved(to_first));
                        self.enter_insert();
                    }
                }
            }
            'a' => {
                let doc = self.document();
                if doc.current_char().is_some_and(|ch| ch != '\n') {
                    self.set_document(doc.moved(1));
                }
                self.enter_insert();
            }
            'A' => {
                let doc = self.document();
                let to_end = doc.end_of_line();
                self.set_document(doc.moved(to_end));
                self.enter_insert();
            }
            'o' => {
                let _ = self.take_count();
                self.editor.start_edit_command(&[], 1);
                let copy_margin = self.copy_margin();
                self.editor.current_buffer_mut().insert_line_below(copy_margin);
                self.editor.vi_state.input_mode = InputMode::Insert;
            }
            'O' => {
                let _ = self.take_count();
                self.editor.start_edit_command(&[], 1);
                let copy_margin = self.copy_margin();
                self.editor.current_buffer_mut().insert_line_above(copy_margin);
                self.editor.vi_state.input_mode = InputMode::Insert;
            }
            'C' => {
                let _ = self.take_count();
                self.editor.start_edit_command(&[key], 1);
                self.delete_until_end_of_line();
                self.editor.vi_state.input_mode = InputMode::Insert;
            }
            'D' => {
                let _ = self.take_count();
                self.editor.start_edit_command(&[key], 1);
                self.delete_until_end_of_line();
                self.editor.finish_edit_command(None);
            }
            'S' => {
                let _ = self.take_count();
                self.editor.start_edit_command(&[key], 1);
                self.change_current_line();
            }
            's' => {
                if self.editor.current_buffer().selection.is_some() {
                    self.operator_key(Operator::Change, key);
                    return;
                }
                let count = self.take_count();
                self.editor.start_edit_command(&[key], count);
                let room = self.document().current_line_after_cursor().chars().count();
                let deleted = self.editor.current_buffer_mut().delete(count.min(room));
                self.editor.clipboard.set(RegisterContent::characters(deleted));
                self.editor.vi_state.input_mode = InputMode::Insert;
            }
            'x' => {
                if self.editor.current_buffer().selection.is_some() {
                    self.operator_key(Operator::Delete, key);
                    return;
                }
                let count = self.take_count();
                let room = self.document().current_line_after_cursor().chars().count();
                let count = count.min(room);
                if count > 0 {
                    self.editor.start_edit_command(&[key], count);
                    let deleted = self.editor.current_buffer_mut().delete(count);
                    self.editor.clipboard.set(RegisterContent::characters(deleted));
                    self.editor.finish_edit_command(None);
                }
            }
            'X' => {
                let count = self.take_count().min(self.document().cursor_col());
                if count > 0 {
                    self.editor.start_edit_command(&[key], count);
                    let deleted = self.editor.current_buffer_mut().delete_before(count);
                    self.editor.clipboard.set(RegisterContent::characters(deleted));
                    self.editor.finish_edit_command(None);
                }
            }
            'r' => {
                let _ = self.take_count();
                self.editor.start_edit_command(&[key], 1);
                self.editor.vi_state.input_mode = InputMode::ReplaceSingle;
            }
            'R' => {
                let _ = self.take_count();
                self.editor.start_edit_command(&[], 1);
                self.editor.vi_state.input_mode = InputMode::Replace;
            }
            '~' => {
                if self.editor.vi_state.tilde_operator {
                    self.operator_key(Operator::SwapCase, key);
                    return;
                }
                let _ = self.take_count();
                self.editor.start_edit_command(&[key], 1);
                let buffer = self.editor.current_buffer_mut();
                if let Some(ch) = buffer.document().current_char() {
                    if ch != '\n' {
                        let swapped = recase(ch, Operator::SwapCase).to_string();
                        buffer.insert_text(&swapped, true);
                    }
                }
                self.editor.finish_edit_command(None);
            }
            'J' => {
                let _ = self.take_count();
                self.editor.start_edit_command(&[key], 1);
                self.editor.current_buffer_mut().join_next_line(" ");
                self.editor.finish_edit_command(None);
            }
            'p' => self.paste_clipboard(key, PasteMode::After),
            'P' => self.paste_clipboard(key, PasteMode::Before),
            'u' => {
                self.editor.current_buffer_mut().undo();
            }

            // Selections.
            'v' => self.toggle_selection(RegisterKind::Characters),
            'V' => self.toggle_selection(RegisterKind::Lines),

            // Search and command line.
            'n' => {
                let count = self.take_count();
                let direction = self.editor.search_state.direction;
                self.editor.perform_search(direction, false, count);
            }
            'N' => {
                let count = self.take_count();
                let direction = self.editor.search_state.direction.invert();
                self.editor.perform_search(direction, false, count);
            }
            '/' => self.editor.enter_search_mode(SearchDirection::Forward),
            '?' => self.editor.enter_search_mode(SearchDirection::Backward),
            ':' => self.editor.enter_command_mode(),

            // Prefixes.
            '"' => self.pending = Pending::Register,
            'm' => self.pending = Pending::Mark,
            '\'' => self.pending = Pending::Jump,
            'g' => self.pending = Pending::G,
            'Z' => self.pending = Pending::Z,
            'f' => self.pending = Pending::FindChar { backwards: false, till: false },
            'F' => self.pending = Pending::FindChar { backwards: true, till: false },
            't' => self.pending = Pending::FindChar { backwards: false, till: true },
            'T' => self.pending = Pending::FindChar { backwards: true, till: true },
            ';' => self.repeat_character_find(false),
            ',' => self.repeat_character_find(true),

            'G' => match self.count.take() {
                Some(line) => self.editor.go_to_line(line),
                None => {
                    let last = self.document().line_count();
                    self.editor.go_to_line(last);
                }
            },
            '.' => self.replay_last_edit_command(),

            // Motions.
            'h' => {
                let count = self.take_count();
                self.cursor_left_in_line(count);
            }
            'l' => {
                let count = self.take_count();
                self.cursor_right_in_line(count);
            }
            'j' => {
                let count = self.take_count();
                self.move_vertically(count as isize);
            }
            'k' => {
                let count = self.take_count();
                self.move_vertically(-(count as isize));
            }
            _ => {
                let count = self.take_count();
                let doc = self.document();
                if let Some(object) = motion_object(&doc, c, count, None) {
                    self.move_by(object);
                }
            }
        }
    }

    fn process_navigation_special_key(&mut self, key: KeyPress) {
        let count = self.take_count();
        match key.key {
            Key::Left => self.cursor_left_in_line(count),
            Key::Right => self.cursor_right_in_line(count),
            Key::Up => self.move_vertically(-(count as isize)),
            Key::Down => self.move_vertically(count as isize),
            Key::Home => {
                let doc = self.document();
                let to_start = doc.start_of_line(false);
                self.set_document(doc.moved(to_start));
            }
            Key::End => {
                let doc = self.document();
                let to_end = doc.end_of_line();
                self.set_document(doc.moved(to_end));
            }
            Key::Delete => {
                let room = self.document().current_line_after_cursor().chars().count();
                if room > 0 {
                    let deleted = self.editor.current_buffer_mut().delete(1);
                    self.editor.clipboard.set(RegisterContent::characters(deleted));
                }
            }
            _ => {}
        }
    }

    // -- operators ----------------------------------------------------------

    /// An operator key: start the pending state, or act on the selection
    /// at once when one exists.
    fn operator_key(&mut self, operator: Operator, key: KeyPress) {
        if let Some(selection) = self.editor.current_buffer().selection {
            let _ = self.take_count();
            self.editor.current_buffer_mut().save_to_undo_stack();
            let doc = self.document();
            let object = selection_object(&selection, &doc);
            self.editor.current_buffer_mut().selection = None;
            self.apply_operator(operator, object);
            return;
        }
        self.start_operator_with_keys(operator, &[key]);
    }

    fn start_operator_with_keys(&mut self, operator: Operator, keys: &[KeyPress]) {
        let arg = self.count.take();
        self.editor.start_edit_command(keys, arg.unwrap_or(1));
        self.editor.vi_state.operator = Some(operator);
        self.editor.vi_state.operator_arg = arg;
    }

    fn process_operator_pending_key(&mut self, operator: Operator, c: char) {
        match c {
            'i' => {
                self.pending = Pending::InnerObject;
                return;
            }
            'a' => {
                self.pending = Pending::AroundObject;
                return;
            }
            'f' => {
                self.pending = Pending::FindChar { backwards: false, till: false };
                return;
            }
            'F' => {
                self.pending = Pending::FindChar { backwards: true, till: false };
                return;
            }
            't' => {
                self.pending = Pending::FindChar { backwards: false, till: true };
                return;
            }
            'T' => {
                self.pending = Pending::FindChar { backwards: true, till: true };
                return;
            }
            _ => {}
        }
        let total = self.editor.vi_state.operator_arg.unwrap_or(1) * self.take_count();
        let doc = self.document();

        if c == operator_repeat_key(operator) {
            // Doubled operator works on whole lines.
            if operator == Operator::Change {
                self.editor.vi_state.reset_operator();
                self.change_current_line();
                return;
            }
            let object = rows_down_object(&doc, total.saturating_sub(1));
            self.apply_operator(operator, object);
            // `guu` / `gUU` close the recording; `dd` and friends leave
            // it open, as the plain operators do.
            if matches!(operator, Operator::Lowercase | Operator::Uppercase) {
                self.finish_after_key = true;
            }
            return;
        }

        let object = match c {
            'j' => Some(rows_down_object(&doc, total)),
            'k' => Some(rows_up_object(&doc, total)),
            'G' => {
                let last = doc.line_count().saturating_sub(doc.cursor_row() + 1);
                Some(rows_down_object(&doc, last))
            }
            _ => motion_object(&doc, c, total, Some(operator)),
        };
        match object {
            Some(object) => self.apply_operator(operator, object),
            None => self.editor.vi_state.reset_operator(),
        }
    }

    fn apply_operator(&mut self, operator: Operator, object: TextObject) {
        match operator {
            Operator::Delete | Operator::Change => {
                let doc = self.document();
                let (new_doc, content) = object.cut(&doc);
                let new_doc = if object.kind == TextObjectKind::Linewise {
                    let to_first = new_doc.start_of_line(true);
                    new_doc.moved(to_first)
                } else {
                    new_doc
                };
                self.set_document(new_doc);
                self.store_cut(content);
                if operator == Operator::Change {
                    self.editor.vi_state.input_mode = InputMode::Insert;
                }
            }
            Operator::Yank => {
                let doc = self.document();
                let (_, content) = object.cut(&doc);
                self.store_cut(content);
            }
            Operator::Indent | Operator::Unindent => {
                let doc = self.document();
                let (start, end) = object.operator_range(&doc);
                let cursor = doc.cursor() as isize;
                let len = doc.len_chars() as isize;
                let start_row = doc.offset_to_row_col((cursor + start).clamp(0, len) as usize).0;
                let end_row = doc.offset_to_row_col((cursor + end).clamp(0, len) as usize).0;
                self.change_indent_rows(start_row..end_row + 1, operator == Operator::Indent);
            }
            Operator::Lowercase | Operator::Uppercase | Operator::SwapCase => {
                self.transform_case(object, operator);
            }
        }
        self.editor.vi_state.reset_operator();
    }

    /// Deleted or yanked text goes to the named register when one was
    /// given, otherwise to the clipboard.
    fn store_cut(&mut self, content: RegisterContent) {
        match self.editor.vi_state.operator_register.take() {
            Some(name) => {
                self.editor.vi_state.named_registers.insert(name, content);
            }
            None => self.editor.clipboard.set(content),
        }
    }

    fn transform_case(&mut self, object: TextObject, operator: Operator) {
        let doc = self.document();
        let (start_rel, end_rel) = object.operator_range(&doc);
        let cursor = doc.cursor() as isize;
        let len = doc.len_chars() as isize;
        let start = (cursor + start_rel).clamp(0, len) as usize;
        let end = (cursor + end_rel).clamp(0, len) as usize;
        let text: String = doc
            .text()
            .chars()
            .enumerate()
            .map(|(i, ch)| {
                if i >= start && i < end {
                    recase(ch, operator)
                } else {
                    ch
                }
            })
            .collect();
        self.set_document(Document::with_cursor(&text, start));
    }

    // -- small edit commands ------------------------------------------------

    fn copy_margin(&self) -> bool {
        self.editor.options.autoindent && !self.editor.options.paste_mode
    }

    fn enter_insert(&mut self) {
        let _ = self.take_count();
        self.editor.start_edit_command(&[], 1);
        self.editor.vi_state.input_mode = InputMode::Insert;
    }

    fn delete_until_end_of_line(&mut self) {
        let room = self.document().current_line_after_cursor().chars().count();
        if room > 0 {
            let deleted = self.editor.current_buffer_mut().delete(room);
            self.editor.clipboard.set(RegisterContent::characters(deleted));
        }
    }

    /// `cc` / `S` — yank the whole line, clear its content, insert.
    fn change_current_line(&mut self) {
        let doc = self.document();
        let line = doc.current_line();
        self.editor.clipboard.set(RegisterContent::lines(line));
        let to_first = doc.start_of_line(true);
        self.set_document(doc.moved(to_first));
        self.delete_until_end_of_line();
        self.editor.vi_state.input_mode = InputMode::Insert;
    }

    fn paste_clipboard(&mut self, key: KeyPress, mode: PasteMode) {
        let count = self.take_count();
        let content = self.editor.clipboard.get().clone();
        if content.is_empty() {
            return;
        }
        self.editor.start_edit_command(&[key], count);
        self.editor.current_buffer_mut().paste(&content, count, mode);
        self.editor.finish_edit_command(None);
    }

    /// `I` on a block selection: insert the typed text at the same column
    /// of every selected row.
    fn begin_block_insert(&mut self, selection: Selection) {
        let doc = self.document();
        let (anchor_row, anchor_col) = doc.offset_to_row_col(selection.anchor);
        let (row, col) = (doc.cursor_row(), doc.cursor_col());
        let first = anchor_row.min(row);
        let last = anchor_row.max(row);
        self.multi_insert_rows = (first..=last).collect();
        self.multi_insert_col = anchor_col.min(col);
        self.editor.current_buffer_mut().selection = None;
        let cursor = doc.row_col_to_offset(first, self.multi_insert_col);
        self.set_document(doc.at(cursor));
        self.editor.start_edit_command(&[], 1);
        self.editor.vi_state.input_mode = InputMode::InsertMultiple;
    }

    fn toggle_selection(&mut self, kind: RegisterKind) {
        let anchor = self.document().cursor();
        let buffer = self.editor.current_buffer_mut();
        buffer.selection = match buffer.selection {
            Some(selection) if selection.kind == kind => None,
            Some(selection) => Some(Selection { anchor: selection.anchor, kind }),
            None => Some(Selection { anchor, kind }),
        };
    }

    fn repeat_character_find(&mut self, invert: bool) {
        let Some(find) = self.editor.vi_state.last_character_find else {
            return;
        };
        let backwards = find.backwards != invert;
        let count = self.take_count();
        let doc = self.document();
        let object = if backwards {
            text_object::find_char_backwards(&doc, find.character, count)
        } else {
            text_object::find_char(&doc, find.character, count)
        };
        if let Some(object) = object {
            match self.editor.vi_state.operator {
                Some(operator) => self.apply_operator(operator, object),
                None => self.move_by(object),
            }
        } else {
            self.editor.vi_state.reset_operator();
        }
    }

    fn replay_last_edit_command(&mut self) {
        self.count = None;
        let keys = self.editor.last_edit_command_keys();
        if keys.is_empty() {
            return;
        }
        let arg = self.editor.last_edit_command_arg();
        log::debug!("replay {} keys, arg {arg}", keys.len());
        if arg != 1 {
            for digit in arg.to_string().chars() {
                self.feed(KeyPress::char(digit));
            }
        }
        for key in keys {
            self.feed(key);
        }
    }

    // -- indent -------------------------------------------------------------

    fn change_indent_current_line(&mut self, increase: bool) {
        let row = self.document().cursor_row();
        self.change_indent_rows(row..row + 1, increase);
    }

    fn change_indent_rows(&mut self, rows: std::ops::Range<usize>, increase: bool) {
        let width = self.editor.options.shiftwidth;
        let expand_tab = self.editor.options.expand_tab;
        self.editor.current_buffer_mut().transform_lines(rows, |line| {
            if increase {
                if expand_tab {
                    format!("{}{line}", " ".repeat(width))
                } else {
                    format!("\t{line}")
                }
            } else {
                unindent_line(line, width, expand_tab)
            }
        });
    }

    // -- pending resolution --------------------------------------------------

    fn resolve_pending(&mut self, pending: Pending, key: KeyPress) {
        match pending {
            Pending::None => {}
            Pending::Register => {
                if let Some(c) = key.as_char() {
                    if is_register_name(c) {
                        self.pending = Pending::RegisterAction(c);
                    }
                }
            }
            Pending::RegisterAction(register) => self.resolve_register_action(register, key),
            Pending::FindChar { backwards, till } => self.resolve_find_char(backwards, till, key),
            Pending::Mark => {
                if let Some(c) = key.as_char() {
                    if c.is_ascii_lowercase() {
                        let line = self.document().cursor_row() + 1;
                        self.editor.current_buffer_mut().marks.insert(c, line);
                    }
                }
            }
            Pending::Jump => {
                if let Some(c) = key.as_char() {
                    if let Some(&line) = self.editor.current_buffer().marks.get(&c) {
                        self.editor.go_to_line(line);
                    }
                }
            }
            Pending::G => self.resolve_g_prefix(key),
            Pending::Z => self.resolve_z_prefix(key),
            Pending::CtrlW => self.resolve_window_prefix(key),
            Pending::InnerObject | Pending::AroundObject => {
                let around = pending == Pending::AroundObject;
                if key.as_char() == Some('w') {
                    let doc = self.document();
                    let object = if around {
                        text_object::a_word(&doc)
                    } else {
                        text_object::inner_word(&doc)
                    };
                    if let Some(operator) = self.editor.vi_state.operator {
                        self.apply_operator(operator, object);
                        return;
                    }
                }
                self.editor.vi_state.reset_operator();
            }
        }
    }

    fn resolve_register_action(&mut self, register: char, key: KeyPress) {
        let prefix = [KeyPress::char('"'), KeyPress::char(register), key];
        match key.as_char() {
            Some('p') | Some('P') => {
                let mode = if key.as_char() == Some('p') {
                    PasteMode::After
                } else {
                    PasteMode::Before
                };
                let Some(content) = self.editor.vi_state.named_registers.get(&register).cloned()
                else {
                    return;
                };
                if content.is_empty() {
                    return;
                }
                let count = self.take_count();
                self.editor.start_edit_command(&prefix, count);
                self.editor.current_buffer_mut().paste(&content, count, mode);
                self.editor.finish_edit_command(None);
            }
            Some('d') => {
                self.editor.vi_state.operator_register = Some(register);
                self.start_operator_with_keys(Operator::Delete, &prefix);
            }
            Some('c') => {
                self.editor.vi_state.operator_register = Some(register);
                self.start_operator_with_keys(Operator::Change, &prefix);
            }
            Some('y') => {
                self.editor.vi_state.operator_register = Some(register);
                self.start_operator_with_keys(Operator::Yank, &prefix);
            }
            _ => {}
        }
    }

    fn resolve_find_char(&mut self, backwards: bool, till: bool, key: KeyPress) {
        let Some(c) = key.as_char() else {
            self.editor.vi_state.reset_operator();
            return;
        };
        self.editor.vi_state.last_character_find =
            Some(CharacterFind { character: c, backwards });
        let count =
            self.count.take().unwrap_or(1) * self.editor.vi_state.operator_arg.unwrap_or(1);
        let doc = self.document();
        let object = match (backwards, till) {
            (false, false) => text_object::find_char(&doc, c, count),
            (true, false) => text_object::find_char_backwards(&doc, c, count),
            (false, true) => text_object::till_char(&doc, c, count),
            (true, true) => text_object::till_char_backwards(&doc, c, count),
        };
        match (self.editor.vi_state.operator, object) {
            (Some(operator), Some(object)) => self.apply_operator(operator, object),
            (Some(_), None) => self.editor.vi_state.reset_operator(),
            (None, Some(object)) => self.move_by(object),
            (None, None) => {}
        }
    }

    fn resolve_g_prefix(&mut self, key: KeyPress) {
        match key.as_char() {
            Some('g') => {
                let line = self.count.take().unwrap_or(1);
                self.editor.go_to_line(line);
            }
            Some('J') => {
                self.editor
                    .start_edit_command(&[KeyPress::char('g'), key], 1);
                self.editor.current_buffer_mut().join_next_line("");
                self.editor.finish_edit_command(None);
            }
            Some('u') => {
                self.start_operator_with_keys(Operator::Lowercase, &[KeyPress::char('g'), key]);
            }
            Some('U') => {
                self.start_operator_with_keys(Operator::Uppercase, &[KeyPress::char('g'), key]);
            }
            Some('t') => self.editor.emit(EditorEffect::NextTab),
            Some('T') => self.editor.emit(EditorEffect::PreviousTab),
            _ => {}
        }
    }

    fn resolve_z_prefix(&mut self, key: KeyPress) {
        match key.as_char() {
            Some('Z') => {
                if self.editor.current_buffer().location.is_none() {
                    self.editor.show_message("No file name");
                } else if let Err(e) = self.editor.write_current_buffer(None) {
                    self.editor.show_message(format!("Cannot write: {e}"));
                } else {
                    self.editor.emit(EditorEffect::Quit { status: 0 });
                }
            }
            // `ZQ` discards changes, like `:q!`.
            Some('Q') => {
                if self.editor.window_count > 1 {
                    self.editor.window_count -= 1;
                    self.editor.emit(EditorEffect::CloseWindow);
                } else if self.editor.tab_count > 1 {
                    self.editor.tab_count -= 1;
                    self.editor.emit(EditorEffect::CloseTab);
                } else {
                    self.editor.emit(EditorEffect::Quit { status: 0 });
                }
            }
            _ => {}
        }
    }

    fn resolve_window_prefix(&mut self, key: KeyPress) {
        match key.as_char() {
            Some('w') => self.editor.emit(EditorEffect::FocusNextWindow),
            Some('s') => {
                self.editor.window_count += 1;
                self.editor.emit(EditorEffect::SplitHorizontally);
            }
            Some('v') => {
                self.editor.window_count += 1;
                self.editor.emit(EditorEffect::SplitVertically);
            }
            Some('n') => {
                self.editor.window_count += 1;
                self.editor.emit(EditorEffect::SplitHorizontally);
                self.editor.add_scratch_buffer();
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

const fn operator_repeat_key(operator: Operator) -> char {
    match operator {
        Operator::Delete => 'd',
        Operator::Change => 'c',
        Operator::Yank => 'y',
        Operator::Indent => '>',
        Operator::Unindent => '<',
        Operator::Lowercase => 'u',
        Operator::Uppercase => 'U',
        Operator::SwapCase => '~',
    }
}

/// Resolve a plain motion key to a text object, `None` when the key is
/// not a motion (or the motion has nowhere to go).
fn motion_object(
    doc: &Document,
    c: char,
    count: usize,
    operator: Option<Operator>,
) -> Option<TextObject> {
    match c {
        // As a movement `w` goes to the next word beginning; as an
        // operator target it covers the rest of the current word.
        'w' => match operator {
            Some(op) => text_object::word_forward(doc, count, op == Operator::Delete),
            None => Some(TextObject::new(
                word::find_next_word_beginning(doc, count)
                    .unwrap_or_else(|| doc.end_of_document()),
            )),
        },
        'b' => Some(text_object::word_backward(doc, count)),
        'e' => text_object::word_end(doc, count),
        '$' => Some(text_object::end_of_line(doc)),
        '0' => Some(text_object::start_of_line(doc, false)),
        '^' => Some(text_object::start_of_line(doc, true)),
        'h' => {
            let step = count.min(doc.cursor_col());
            Some(TextObject::new(-(step as isize)))
        }
        'l' => {
            let room = doc.current_line_after_cursor().chars().count();
            Some(TextObject::new(count.min(room) as isize))
        }
        _ => None,
    }
}

fn recase(ch: char, operator: Operator) -> char {
    let upper = match operator {
        Operator::Uppercase => true,
        Operator::Lowercase => false,
        _ => ch.is_lowercase(),
    };
    if upper {
        ch.to_uppercase().next().unwrap_or(ch)
    } else {
        ch.to_lowercase().next().unwrap_or(ch)
    }
}

/// Whole lines from the cursor row down `rows` more rows.
fn rows_down_object(doc: &Document, rows: usize) -> TextObject {
    let target = (doc.cursor_row() + rows).min(doc.line_count().saturating_sub(1));
    let delta = doc.row_col_to_offset(target, 0) as isize - doc.cursor() as isize;
    TextObject { start: 0, end: delta, kind: TextObjectKind::Linewise }
}

fn rows_up_object(doc: &Document, rows: usize) -> TextObject {
    let target = doc.cursor_row().saturating_sub(rows);
    let delta = doc.row_col_to_offset(target, 0) as isize - doc.cursor() as isize;
    TextObject { start: delta, end: 0, kind: TextObjectKind::Linewise }
}

/// The active selection as a text object, anchored at the cursor.
fn selection_object(selection: &Selection, doc: &Document) -> TextObject {
    let start = selection.anchor as isize - doc.cursor() as isize;
    let kind = match selection.kind {
        RegisterKind::Lines => TextObjectKind::Linewise,
        RegisterKind::Characters | RegisterKind::Block => TextObjectKind::Inclusive,
    };
    TextObject { start, end: 0, kind }
}

/// One unindent step: a shiftwidth of leading spaces (or the ragged
/// remainder), or a single leading tab.
fn unindent_line(line: &str, width: usize, expand_tab: bool) -> String {
    if expand_tab {
        let leading = line.chars().take_while(|&c| c == ' ').count();
        let remove = if leading == 0 {
            0
        } else if leading % width != 0 {
            leading % width
        } else {
            width
        };
        line.chars().skip(remove).collect()
    } else {
        line.strip_prefix('\t').unwrap_or(line).to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
