//! The application state.
//!
//! `Editor` owns the open buffers, the global options, the clipboard and
//! search state, the command and search input lines with their
//! histories, and the record/replay log behind `.`. It yields
//! [`EditorEffect`]s for everything it does not model itself (window and
//! tab layout, quitting, colorschemes); an embedding UI drains those
//! after each key.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::rc::Rc;

use thiserror::Error;

use ved_text::Document;

use crate::buffer::{Buffer, ReportError};
use crate::commands::CommandEngine;
use crate::history::History;
use crate::key::{Key, KeyPress};
use crate::register::Clipboard;
use crate::search::{SearchDirection, SearchState};
use crate::state::ViState;
use crate::storage::{FileStorage, Presence, Storage};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Which input area receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Document,
    CommandLine,
    SearchLine,
}

/// A layout or lifecycle action for the embedding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEffect {
    Quit { status: i32 },
    CloseWindow,
    KeepOnlyWindow,
    SplitHorizontally,
    SplitVertically,
    FocusNextWindow,
    NewTab,
    CloseTab,
    NextTab,
    PreviousTab,
    ShowHelp,
    UseColorscheme(String),
}

/// Global option set; buffers may override some per-buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    pub show_line_numbers: bool,
    pub relative_number: bool,
    pub highlight_search: bool,
    pub paste_mode: bool,
    pub show_ruler: bool,
    pub show_wildmenu: bool,
    pub autoindent: bool,
    pub expand_tab: bool,
    pub tabstop: usize,
    pub shiftwidth: usize,
    pub scroll_offset: usize,
    pub incsearch: bool,
    pub ignore_case: bool,
    pub display_unprintable_characters: bool,
    pub enable_wrapscan: bool,
    pub wrap_lines: bool,
    pub break_indent: bool,
    pub enable_mouse_support: bool,
    pub cursorline: bool,
    pub cursorcolumn: bool,
    pub colorcolumn: Vec<usize>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            show_line_numbers: false,
            relative_number: false,
            highlight_search: true,
            paste_mode: false,
            show_ruler: true,
            show_wildmenu: true,
            autoindent: true,
            expand_tab: true,
            tabstop: 4,
            shiftwidth: 4,
            scroll_offset: 0,
            incsearch: true,
            ignore_case: false,
            display_unprintable_characters: false,
            enable_wrapscan: true,
            wrap_lines: true,
            break_indent: false,
            enable_mouse_support: false,
            cursorline: false,
            cursorcolumn: false,
            colorcolumn: Vec::new(),
        }
    }
}

/// One entry in the `.` log: a key, or a completion that replaced text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    Key(KeyPress),
    Completion { deleted: usize, inserted: String },
}

/// The background report pass: location and text in, findings out.
pub type Reporter = Box<dyn Fn(&str, &Document) -> Vec<ReportError>>;

#[derive(Debug, Error)]
pub enum EditorError {
    /// The command grammar failed to compile.
    #[error(transparent)]
    Grammar(#[from] regex::Error),
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

pub struct Editor {
    storage: Box<dyn Storage>,
    pub options: EditorOptions,
    buffers: Vec<Buffer>,
    active: usize,
    /// Open windows / tab pages, as reported by the embedding UI's
    /// effects. Only the counts matter to `:q` and friends.
    pub window_count: usize,
    pub tab_count: usize,
    pub focus: Focus,
    message: Option<String>,
    pub vi_state: ViState,
    pub clipboard: Clipboard,
    pub search_state: SearchState,
    pending_search_direction: SearchDirection,
    pub last_substitute_text: String,
    /// Text being typed after `:` / `/`, while focused there.
    pub command_line: Option<String>,
    pub search_line: Option<String>,
    command_history: History,
    search_history: History,
    engine: Rc<CommandEngine>,
    effects: Vec<EditorEffect>,
    /// The `:n` / `:p` argument list.
    pub locations: Vec<String>,
    pub current_location_index: usize,
    pub location_history: Vec<String>,
    pub colorscheme: String,
    reporter: Option<Reporter>,

    // `.` record/replay.
    last_edit_command: Vec<EditEvent>,
    last_edit_command_arg: usize,
    edit_command_log: Vec<EditEvent>,
    edit_command_arg: usize,
    in_edit_command: bool,
    suppress_append_once: bool,
}

impl Editor {
    pub fn new() -> Result<Self, EditorError> {
        Self::with_storage(Box::new(FileStorage::new()))
    }

    pub fn with_storage(storage: Box<dyn Storage>) -> Result<Self, EditorError> {
        Ok(Self {
            storage,
            options: EditorOptions::default(),
            buffers: vec![Buffer::scratch()],
            active: 0,
            window_count: 1,
            tab_count: 1,
            focus: Focus::default(),
            message: None,
            vi_state: ViState::new(),
            clipboard: Clipboard::new(),
            search_state: SearchState::default(),
            pending_search_direction: SearchDirection::Forward,
            last_substitute_text: String::new(),
            command_line: None,
            search_line: None,
            command_history: History::in_memory(),
            search_history: History::in_memory(),
            engine: Rc::new(CommandEngine::new()?),
            effects: Vec::new(),
            locations: Vec::new(),
            current_location_index: 0,
            location_history: Vec::new(),
            colorscheme: "default".to_string(),
            reporter: None,
            last_edit_command: Vec::new(),
            last_edit_command_arg: 1,
            edit_command_log: Vec::new(),
            edit_command_arg: 1,
            in_edit_command: false,
            suppress_append_once: false,
        })
    }

    /// Attach persistent history files, loading their entries. Missing
    /// files start empty and are created on first append.
    pub fn load_histories(&mut self, commands: &Path, search: &Path) {
        self.command_history = History::load(commands);
        self.search_history = History::load(search);
    }

    // -- report pass ---------------------------------------------------------

    /// Attach the background report pass run after text changes.
    pub fn set_reporter(&mut self, reporter: impl Fn(&str, &Document) -> Vec<ReportError> + 'static) {
        self.reporter = Some(Box::new(reporter));
    }

    /// Refresh the focused buffer's reports when its text changed. Called
    /// after every processed key and Ex command.
    pub fn refresh_reports(&mut self) {
        let Some(reporter) = self.reporter.take() else { return };
        self.current_buffer_mut().run_reporter(reporter.as_ref());
        self.reporter = Some(reporter);
    }

    // -- buffers ------------------------------------------------------------

    #[must_use]
    pub fn current_buffer(&self) -> &Buffer {
        &self.buffers[self.active]
    }

    pub fn current_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffers[self.active]
    }

    #[must_use]
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active
    }

    /// Open `location`, focusing an already-open buffer when one exists.
    pub fn open_location(&mut self, location: &str) {
        log::debug!("open location {location:?}");
        if !self.storage.can_open_location(location) {
            self.show_message(format!("Cannot open: {location}"));
            return;
        }
        if let Some(index) = self
            .buffers
            .iter()
            .position(|b| b.location.as_deref() == Some(location))
        {
            self.active = index;
        } else {
            let buffer = self.load_buffer(location);
            self.buffers.push(buffer);
            self.active = self.buffers.len() - 1;
        }
        self.location_history.push(location.to_string());
        if !self.locations.iter().any(|l| l == location) {
            self.locations.push(location.to_string());
            self.current_location_index = self.locations.len() - 1;
        }
    }

    /// `:badd` — load a buffer without focusing it.
    pub fn add_buffer_for_location(&mut self, location: &str) {
        if self
            .buffers
            .iter()
            .any(|b| b.location.as_deref() == Some(location))
        {
            return;
        }
        let buffer = self.load_buffer(location);
        self.buffers.push(buffer);
    }

    fn load_buffer(&mut self, location: &str) -> Buffer {
        match self.storage.presence(location) {
            Presence::Missing => Buffer::with_location(location, "", true),
            Presence::Directory => {
                self.show_message(format!("{location} is a directory"));
                Buffer::with_location(location, "", false)
            }
            Presence::File => match self.storage.read(location) {
                Ok(text) => Buffer::with_location(location, &text, false),
                Err(e) => {
                    self.show_message(format!("Cannot read {location:?}: {e}"));
                    Buffer::with_location(location, "", false)
                }
            },
        }
    }

    pub fn add_scratch_buffer(&mut self) {
        self.buffers.push(Buffer::scratch());
        self.active = self.buffers.len() - 1;
    }

    pub fn go_to_next_buffer(&mut self) {
        self.active = (self.active + 1) % self.buffers.len();
    }

    pub fn go_to_previous_buffer(&mut self) {
        self.active = (self.active + self.buffers.len() - 1) % self.buffers.len();
    }

    /// `:b {name}` — a buffer number or a location (suffix) match.
    pub fn go_to_buffer(&mut self, name: &str) {
        if let Ok(number) = name.parse::<usize>() {
            if number >= 1 && number <= self.buffers.len() {
                self.active = number - 1;
                return;
            }
        }
        let found = self.buffers.iter().position(|b| {
            b.location
                .as_deref()
                .is_some_and(|l| l == name || l.ends_with(name))
        });
        match found {
            Some(index) => self.active = index,
            None => self.show_message(format!("No matching buffer: {name}")),
        }
    }

    /// `:bw` — drop the buffer; an empty list gets a fresh scratch one.
    pub fn close_current_buffer(&mut self) {
        self.buffers.remove(self.active);
        if self.buffers.is_empty() {
            self.buffers.push(Buffer::scratch());
        }
        self.active = self.active.min(self.buffers.len() - 1);
    }

    // -- storage ------------------------------------------------------------

    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        &*self.storage
    }

    pub fn reload_current_buffer(&mut self) {
        let location = self.current_buffer().location.clone();
        if let Err(e) = self.buffers[self.active].reload(&*self.storage) {
            self.show_message(format!("Cannot read {location:?}: {e}"));
        }
    }

    pub fn write_current_buffer(&mut self, location: Option<&str>) -> io::Result<()> {
        self.buffers[self.active].write(&*self.storage, location)
    }

    /// `:wa` — write every buffer that has a name.
    pub fn write_all_buffers(&mut self) {
        let mut failures = Vec::new();
        for buffer in &mut self.buffers {
            if buffer.location.is_none() {
                continue;
            }
            if let Err(e) = buffer.write(&*self.storage, None) {
                failures.push(format!("{e}"));
            }
        }
        if let Some(failure) = failures.first() {
            self.show_message(format!("Cannot write: {failure}"));
        }
    }

    // -- messages and effects ------------------------------------------------

    pub fn show_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Any key press clears a lingering message.
    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn emit(&mut self, effect: EditorEffect) {
        self.effects.push(effect);
    }

    pub fn drain_effects(&mut self) -> Vec<EditorEffect> {
        std::mem::take(&mut self.effects)
    }

    // -- command line --------------------------------------------------------

    pub fn enter_command_mode(&mut self) {
        self.focus = Focus::CommandLine;
        self.command_line = Some(String::new());
    }

    pub fn leave_command_mode(&mut self) {
        self.focus = Focus::Document;
        self.command_line = None;
        self.search_line = None;
    }

    /// Run the typed command line and return to the document.
    pub fn accept_command_line(&mut self) {
        let input = self.command_line.take().unwrap_or_default();
        self.focus = Focus::Document;
        self.execute_command(&input);
    }

    /// Parse and run one Ex command line.
    pub fn execute_command(&mut self, input: &str) {
        log::debug!("execute command {input:?}");
        self.clear_message();
        if self.command_history.append(input).is_err() {
            log::warn!("could not persist command history entry");
        }
        let engine = Rc::clone(&self.engine);
        engine.handle(self, input);
        self.refresh_reports();
    }

    /// `:{number}` and `G` — jump to a 1-based line, first non-blank.
    pub fn go_to_line(&mut self, line: usize) {
        let buffer = self.current_buffer_mut();
        let row = line
            .saturating_sub(1)
            .min(buffer.document().line_count().saturating_sub(1));
        let offset = buffer.document().row_col_to_offset(row, 0);
        let doc = buffer.document().at(offset);
        let to_first_non_blank = doc.start_of_line(true);
        buffer.set_document(doc.moved(to_first_non_blank));
    }

    /// `:!{command}` — run detached through the shell; output is not
    /// captured.
    pub fn run_shell_command(&mut self, command: &str) {
        log::debug!("shell command {command:?}");
        let spawned = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(e) = spawned {
            self.show_message(format!("{e}"));
        }
    }

    // -- search line ---------------------------------------------------------

    pub fn enter_search_mode(&mut self, direction: SearchDirection) {
        self.focus = Focus::SearchLine;
        self.search_line = Some(String::new());
        self.pending_search_direction = direction;
    }

    /// Accept the typed pattern and jump to the first match. An empty
    /// pattern repeats the previous search.
    pub fn accept_search_line(&mut self) {
        let typed = self.search_line.take().unwrap_or_default();
        self.focus = Focus::Document;
        if !typed.is_empty() {
            self.search_state.text = typed;
        }
        self.search_state.direction = self.pending_search_direction;
        let text = self.search_state.text.clone();
        if self.search_history.append(&text).is_err() {
            log::warn!("could not persist search history entry");
        }
        self.perform_search(self.search_state.direction, false, 1);
    }

    /// Move to the next match in `direction` (`n`, `N`, and accepting
    /// the search line all come through here).
    pub fn perform_search(
        &mut self,
        direction: SearchDirection,
        include_current_position: bool,
        count: usize,
    ) {
        let state = SearchState { text: self.search_state.text.clone(), direction };
        let ignore_case = self.options.ignore_case;
        let wrapscan = self.options.enable_wrapscan;
        let buffer = self.current_buffer_mut();
        match buffer.search(&state, include_current_position, count, ignore_case, wrapscan) {
            Ok(hit) => buffer.apply_search_hit(hit),
            Err(e) => self.show_message(e.to_string()),
        }
    }

    #[must_use]
    pub fn command_history(&self) -> &History {
        &self.command_history
    }

    #[must_use]
    pub fn search_history(&self) -> &History {
        &self.search_history
    }

    // -- `.` record/replay ---------------------------------------------------

    /// Begin recording an edit command. `keys` is the sequence that
    /// triggered it (already fully processed, so the processor's
    /// post-dispatch append skips one key); `arg` its count.
    pub fn start_edit_command(&mut self, keys: &[KeyPress], arg: usize) {
        log::debug!("start edit command {keys:?} arg {arg}");
        self.edit_command_log = keys.iter().copied().map(EditEvent::Key).collect();
        self.edit_command_arg = arg;
        self.suppress_append_once = !keys.is_empty();
        self.current_buffer_mut().save_to_undo_stack();
        self.in_edit_command = true;
    }

    /// Record one processed key while an edit command is open.
    pub fn append_edit_command(&mut self, key: KeyPress) {
        if !self.in_edit_command {
            return;
        }
        if self.suppress_append_once {
            self.suppress_append_once = false;
            return;
        }
        // Completion-cycling keys are represented by the completion
        // event itself.
        if key.is_ctrl('g') || key.is_ctrl('p') || key.is_ctrl('n') {
            return;
        }
        self.edit_command_log.push(EditEvent::Key(key));
        // `dw` resolves on its own; nothing further will arrive.
        let chars: Vec<Option<char>> = self.edit_command_log.iter().map(|e| match e {
            EditEvent::Key(k) => k.as_char(),
            EditEvent::Completion { .. } => None,
        }).collect();
        if chars == [Some('d'), Some('w')] {
            self.finish_edit_command(None);
        }
    }

    /// Record an accepted completion, replacing a prior one at the same
    /// spot (cycling rewrites, it does not stack).
    pub fn append_edit_completion(&mut self, deleted: usize, inserted: String) {
        if !self.in_edit_command {
            return;
        }
        if matches!(self.edit_command_log.last(), Some(EditEvent::Completion { .. })) {
            self.edit_command_log.pop();
        }
        self.edit_command_log.push(EditEvent::Completion { deleted, inserted });
    }

    /// Close the recording; `key` is the terminating key, when one
    /// exists (`Escape` ending an insert).
    pub fn finish_edit_command(&mut self, key: Option<KeyPress>) {
        if !self.in_edit_command {
            return;
        }
        if let Some(key) = key {
            self.edit_command_log.push(EditEvent::Key(key));
        }
        self.last_edit_command = std::mem::take(&mut self.edit_command_log);
        self.last_edit_command_arg = self.edit_command_arg;
        self.in_edit_command = false;
        self.suppress_append_once = false;
        log::debug!("recorded edit command {:?}", self.last_edit_command);
    }

    #[must_use]
    pub const fn in_edit_command(&self) -> bool {
        self.in_edit_command
    }

    #[must_use]
    pub const fn last_edit_command_arg(&self) -> usize {
        self.last_edit_command_arg
    }

    /// The recorded command as a replayable key sequence. A completion
    /// event becomes backspaces plus the inserted characters.
    #[must_use]
    pub fn last_edit_command_keys(&self) -> Vec<KeyPress> {
        let mut keys = Vec::new();
        for event in &self.last_edit_command {
            match event {
                EditEvent::Key(key) => keys.push(*key),
                EditEvent::Completion { deleted, inserted } => {
                    keys.extend(std::iter::repeat_n(KeyPress::new(Key::Backspace), *deleted));
                    keys.extend(inserted.chars().map(KeyPress::char));
                }
            }
        }
        keys
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn editor() -> Editor {
        Editor::new().unwrap()
    }

    // -- buffers ------------------------------------------------------------

    #[test]
    fn starts_with_one_scratch_buffer() {
        let editor = editor();
        assert_eq!(editor.buffers().len(), 1);
        assert_eq!(editor.current_buffer().display_name(), "[New file]");
    }

    #[test]
    fn open_missing_location_creates_new_file_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");
        let mut editor = editor();
        editor.open_location(path.to_str().unwrap());
        assert!(editor.current_buffer().is_new);
        assert_eq!(editor.current_buffer().text(), "");
    }

    #[test]
    fn open_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "hello\nworld\n").unwrap();
        let mut editor = editor();
        editor.open_location(path.to_str().unwrap());
        assert_eq!(editor.current_buffer().text(), "hello\nworld");
        assert!(!editor.current_buffer().is_new);
    }

    #[test]
    fn reopening_a_location_focuses_the_existing_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "x\n").unwrap();
        let mut editor = editor();
        editor.open_location(path.to_str().unwrap());
        editor.add_scratch_buffer();
        editor.open_location(path.to_str().unwrap());
        assert_eq!(editor.buffers().len(), 2);
        assert_eq!(editor.active_index(), 0);
    }

    #[test]
    fn buffer_rotation_wraps() {
        let mut editor = editor();
        editor.add_scratch_buffer();
        assert_eq!(editor.active_index(), 1);
        editor.go_to_next_buffer();
        assert_eq!(editor.active_index(), 0);
        editor.go_to_previous_buffer();
        assert_eq!(editor.active_index(), 1);
    }

    #[test]
    fn go_to_buffer_by_number_and_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "n\n").unwrap();
        let mut editor = editor();
        editor.open_location(path.to_str().unwrap());
        editor.go_to_buffer("1");
        assert_eq!(editor.active_index(), 0);
        editor.go_to_buffer("notes.txt");
        assert_eq!(editor.active_index(), 1);
        editor.go_to_buffer("nope.txt");
        assert_eq!(editor.message(), Some("No matching buffer: nope.txt"));
    }

    #[test]
    fn closing_the_last_buffer_leaves_a_scratch_one() {
        let mut editor = editor();
        editor.close_current_buffer();
        assert_eq!(editor.buffers().len(), 1);
    }

    // -- lines and messages --------------------------------------------------

    #[test]
    fn go_to_line_lands_on_first_non_blank() {
        let mut editor = editor();
        editor.current_buffer_mut().set_document(Document::new("a\n   b\nc"));
        editor.go_to_line(2);
        assert_eq!(editor.current_buffer().document().cursor_row(), 1);
        assert_eq!(editor.current_buffer().document().cursor_col(), 3);
    }

    #[test]
    fn go_to_line_clamps_to_last_line() {
        let mut editor = editor();
        editor.current_buffer_mut().set_document(Document::new("a\nb"));
        editor.go_to_line(99);
        assert_eq!(editor.current_buffer().document().cursor_row(), 1);
    }

    #[test]
    fn load_histories_reads_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let commands = dir.path().join("commands_history");
        let search = dir.path().join("search_history");
        std::fs::write(&commands, "w\nq\n").unwrap();
        let mut editor = editor();
        editor.load_histories(&commands, &search);
        assert_eq!(editor.command_history().last(), Some("q"));
        assert!(editor.search_history().is_empty());
    }

    #[test]
    fn message_is_cleared_by_next_command() {
        let mut editor = editor();
        editor.show_message("old");
        editor.execute_command(":set nu");
        assert_eq!(editor.message(), None);
    }

    // -- command and search lines --------------------------------------------

    #[test]
    fn command_line_round_trip() {
        let mut editor = editor();
        editor.enter_command_mode();
        assert_eq!(editor.focus, Focus::CommandLine);
        *editor.command_line.as_mut().unwrap() = "set nu".to_string();
        editor.accept_command_line();
        assert_eq!(editor.focus, Focus::Document);
        assert!(editor.options.show_line_numbers);
        assert_eq!(editor.command_history().last(), Some("set nu"));
    }

    #[test]
    fn search_line_moves_the_cursor() {
        let mut editor = editor();
        editor.current_buffer_mut().set_document(Document::new("one two three"));
        editor.enter_search_mode(SearchDirection::Forward);
        *editor.search_line.as_mut().unwrap() = "three".to_string();
        editor.accept_search_line();
        assert_eq!(editor.current_buffer().document().cursor(), 8);
        assert_eq!(editor.search_history().last(), Some("three"));
    }

    #[test]
    fn empty_search_line_repeats_the_last_search() {
        let mut editor = editor();
        editor.current_buffer_mut().set_document(Document::new("ab ab ab"));
        editor.search_state.text = "ab".to_string();
        editor.enter_search_mode(SearchDirection::Forward);
        editor.accept_search_line();
        assert_eq!(editor.current_buffer().document().cursor(), 3);
    }

    #[test]
    fn failed_search_without_wrapscan_reports() {
        let mut editor = editor();
        editor.current_buffer_mut().set_document(Document::new("abc"));
        editor.options.enable_wrapscan = false;
        editor.search_state.text = "zz".to_string();
        editor.perform_search(SearchDirection::Forward, false, 1);
        assert_eq!(
            editor.message(),
            Some("Search hit BOTTOM without match for: zz")
        );
    }

    // -- record/replay -------------------------------------------------------

    #[test]
    fn recording_keeps_trigger_and_typed_keys() {
        let mut editor = editor();
        // `i` starts an insert with an empty log; the processor then
        // appends the trigger itself and every typed key.
        editor.start_edit_command(&[], 1);
        editor.append_edit_command(KeyPress::char('i'));
        editor.append_edit_command(KeyPress::char('h'));
        editor.append_edit_command(KeyPress::char('i'));
        editor.finish_edit_command(Some(KeyPress::new(Key::Escape)));

        let keys = editor.last_edit_command_keys();
        assert_eq!(
            keys,
            vec![
                KeyPress::char('i'),
                KeyPress::char('h'),
                KeyPress::char('i'),
                KeyPress::new(Key::Escape),
            ]
        );
        assert!(!editor.in_edit_command());
    }

    #[test]
    fn trigger_sequence_is_not_double_logged() {
        let mut editor = editor();
        // An operator fires on its own key; the post-dispatch append of
        // that same key must be swallowed.
        editor.start_edit_command(&[KeyPress::char('d')], 1);
        editor.append_edit_command(KeyPress::char('d'));
        editor.append_edit_command(KeyPress::char('w'));
        assert!(!editor.in_edit_command());
        assert_eq!(
            editor.last_edit_command_keys(),
            vec![KeyPress::char('d'), KeyPress::char('w')]
        );
    }

    #[test]
    fn completion_replays_as_backspaces_and_text() {
        let mut editor = editor();
        editor.start_edit_command(&[], 1);
        editor.append_edit_command(KeyPress::char('i'));
        editor.append_edit_command(KeyPress::char('p'));
        editor.append_edit_completion(1, "print".to_string());
        // Cycling replaces the previous completion instead of stacking.
        editor.append_edit_completion(1, "println".to_string());
        editor.finish_edit_command(Some(KeyPress::new(Key::Escape)));

        let keys = editor.last_edit_command_keys();
        let expected: Vec<KeyPress> = [KeyPress::char('i'), KeyPress::char('p'), KeyPress::new(Key::Backspace)]
            .into_iter()
            .chain("println".chars().map(KeyPress::char))
            .chain([KeyPress::new(Key::Escape)])
            .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn recording_is_an_undo_point() {
        let mut editor = editor();
        editor.current_buffer_mut().set_document(Document::new("x"));
        editor.start_edit_command(&[], 1);
        editor.current_buffer_mut().insert_text("y", false);
        editor.finish_edit_command(None);
        assert!(editor.current_buffer_mut().undo());
        assert_eq!(editor.current_buffer().text(), "x");
    }
}
