//! Ex command execution.
//!
//! [`CommandEngine`] parses a `:` line with the [`grammar`](crate::grammar)
//! and dispatches it: line jumps and shell escapes first, then `set` and
//! buffer/colorscheme forms, then the command registry, then the built-in
//! range operations (substitute, yank, delete, copy). A line that parses
//! but names nothing known reports `Not an editor command`.
//!
//! Layout concerns (windows, tabs) are not modelled here; those commands
//! emit [`EditorEffect`]s for the embedding UI to act on.

use std::collections::HashMap;

use regex::Regex;

use ved_text::Document;

use crate::buffer::Buffer;
use crate::editor::{Editor, EditorEffect};
use crate::grammar::{CommandDescriptor, CommandGrammar};
use crate::register::RegisterContent;
use crate::storage::Presence;

const MSG_UNSAVED: &str = "No write since last change (add ! to override)";
const MSG_NO_FILE_NAME: &str = "No file name";
const MSG_FILE_EXISTS: &str = "File exists (add ! to override)";
const MSG_NO_BANG: &str = "No ! allowed";
const MSG_READONLY: &str = "'readonly' option is set (add ! to override)";
const MSG_ONLY_ONE_FILE: &str = "There is only one file to edit";
const MSG_NO_MORE_FILES: &str = "No more file";
const MSG_NUMBER_REQUIRED: &str = "Number required after =";
const MSG_MUST_BE_POSITIVE: &str = "Argument must be positive";
const MSG_INVALID_COLORCOLUMN: &str = "Invalid value. Expecting comma separated list of integers";

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

type BareFn = fn(&mut Editor, bool);
type LocationFn = fn(&mut Editor, Option<&str>, bool);

enum CommandHandler {
    /// Takes no argument.
    Bare { accepts_force: bool, run: BareFn },
    /// Takes an optional path argument.
    Location { accepts_force: bool, run: LocationFn },
}

/// Name → handler table for the registered Ex commands.
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandHandler>,
}

impl CommandRegistry {
    fn bare(&mut self, names: &[&'static str], accepts_force: bool, run: BareFn) {
        for name in names {
            self.commands.insert(name, CommandHandler::Bare { accepts_force, run });
        }
    }

    fn location(&mut self, names: &[&'static str], accepts_force: bool, run: LocationFn) {
        for name in names {
            self.commands.insert(name, CommandHandler::Location { accepts_force, run });
        }
    }

    /// Names that accept a path argument; the grammar needs these.
    #[must_use]
    pub fn location_command_names(&self) -> Vec<&'static str> {
        self.commands
            .iter()
            .filter(|(_, handler)| matches!(handler, CommandHandler::Location { .. }))
            .map(|(name, _)| *name)
            .collect()
    }

    #[must_use]
    fn default_table() -> Self {
        let mut r = Self { commands: HashMap::new() };

        r.bare(&["bn", "bnext"], true, cmd_buffer_next);
        r.bare(&["bp", "bprevious"], true, cmd_buffer_previous);
        r.bare(&["bw", "bwipeout", "bd", "bdelete"], true, cmd_buffer_wipe);
        r.bare(&["files", "ls", "buffers"], false, cmd_buffer_list);
        r.bare(&["only"], false, cmd_only);
        r.bare(&["hide"], false, cmd_hide);
        r.bare(&["new"], false, cmd_new);
        r.bare(&["vnew"], false, cmd_vertical_new);
        r.bare(&["n", "next"], false, cmd_next_location);
        r.bare(&["p", "previous"], false, cmd_previous_location);
        r.bare(&["q", "quit"], true, cmd_quit);
        r.bare(&["qa", "qall"], true, cmd_quit_all);
        r.bare(&["cq", "cquit"], false, cmd_cquit);
        r.bare(&["wa", "wall"], false, cmd_write_all);
        r.bare(&["wqa", "xa", "xall"], false, cmd_write_and_quit_all);
        r.bare(&["h", "help"], false, cmd_help);
        r.bare(&["tabclose", "tabc"], false, cmd_tab_close);
        r.bare(&["tabnext", "tabn"], false, cmd_tab_next);
        r.bare(&["tabprevious", "tabp"], false, cmd_tab_previous);
        r.bare(&["pwd"], false, cmd_pwd);

        r.location(&["o", "open", "e", "edit"], true, cmd_edit);
        r.location(&["w", "write"], true, cmd_write);
        r.location(&["wq", "x"], true, cmd_write_and_quit);
        r.location(&["sp", "split"], false, cmd_split);
        r.location(&["vsp", "vsplit"], false, cmd_vertical_split);
        r.location(&["badd"], false, cmd_buffer_add);
        r.location(&["tabe", "tabedit", "tabnew"], false, cmd_tab_new);
        r.location(&["cd"], false, cmd_change_directory);

        r
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The registry plus the grammar compiled from it.
pub struct CommandEngine {
    registry: CommandRegistry,
    grammar: CommandGrammar,
}

impl CommandEngine {
    pub fn new() -> Result<Self, regex::Error> {
        let registry = CommandRegistry::default_table();
        let grammar = CommandGrammar::compile(&registry.location_command_names())?;
        Ok(Self { registry, grammar })
    }

    /// Execute one command line. Unparsable input is ignored.
    pub fn handle(&self, editor: &mut Editor, input: &str) {
        let Some(d) = self.grammar.parse(input) else {
            return;
        };
        if let Some(line) = &d.go_to_line {
            if let Ok(line) = line.parse::<usize>() {
                editor.go_to_line(line);
            }
            return;
        }
        if let Some(command) = &d.shell_command {
            editor.run_shell_command(command);
            return;
        }
        if let Some(option) = &d.set_option {
            handle_set(editor, option, d.set_value.as_deref());
            return;
        }
        if let Some(name) = &d.colorscheme {
            editor.colorscheme.clone_from(name);
            editor.emit(EditorEffect::UseColorscheme(name.clone()));
            return;
        }
        if let Some(name) = &d.buffer_name {
            cmd_go_to_buffer(editor, name, d.force);
            return;
        }

        let Some(command) = d.command.as_deref() else {
            // Empty line.
            return;
        };
        if let Some(handler) = self.registry.commands.get(command) {
            run_registered(editor, handler, &d);
        } else if command == "s" || command == "substitute" {
            substitute(editor, &d);
        } else if command == "ya" || command.starts_with("yank") {
            yank(editor, &d);
        } else if command == "d" || command.starts_with("delete") {
            delete(editor, &d);
        } else if command == "co" {
            copy(editor, &d);
        } else {
            editor.show_message(format!("Not an editor command: {input}"));
        }
    }
}

fn run_registered(editor: &mut Editor, handler: &CommandHandler, d: &CommandDescriptor) {
    match handler {
        CommandHandler::Bare { accepts_force, run } => {
            if d.force && !accepts_force {
                editor.show_message(MSG_NO_BANG);
            } else {
                run(editor, d.force);
            }
        }
        CommandHandler::Location { accepts_force, run } => {
            if d.force && !accepts_force {
                editor.show_message(MSG_NO_BANG);
            } else {
                run(editor, d.location.as_deref(), d.force);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// Resolve one range token to a 0-based row. Tokens are shaped by the
/// grammar: a number, `.`, `$`, or a mark.
fn line_index(buffer: &Buffer, token: &str) -> Result<usize, String> {
    let document = buffer.document();
    if let Some(mark) = token.strip_prefix('\'') {
        let Some(c) = mark.chars().next() else {
            return Err(format!("Mark not set: {token}"));
        };
        return buffer
            .marks
            .get(&c)
            .map(|line| line.saturating_sub(1))
            .ok_or_else(|| format!("Mark not set: {token}"));
    }
    match token {
        "$" => Ok(document.line_count().saturating_sub(1)),
        "." => Ok(document.cursor_row()),
        _ => token
            .parse::<usize>()
            .map(|n| n.saturating_sub(1))
            .map_err(|_| format!("Invalid range: {token}")),
    }
}

/// Resolve the descriptor's range to half-open rows. No range means the
/// cursor line; `%` means the whole buffer.
fn resolve_range(buffer: &Buffer, d: &CommandDescriptor) -> Result<(usize, usize), String> {
    let document = buffer.document();
    let Some(start) = &d.range_start else {
        let row = document.cursor_row();
        return Ok((row, row + 1));
    };
    if start == "%" {
        return Ok((0, document.line_count()));
    }
    let start = line_index(buffer, start)?.min(document.line_count());
    let end = match &d.range_end {
        Some(end) => line_index(buffer, end)?,
        None => start,
    };
    // Rows past the end of the buffer (or a backwards range) collapse to
    // an empty slice rather than failing.
    Ok((start, (end + 1).min(document.line_count()).max(start)))
}

// ---------------------------------------------------------------------------
// Range operations
// ---------------------------------------------------------------------------

/// `:[range]s/search/replace/[g]`.
///
/// An empty (or missing) search pattern reuses the last search text; a
/// missing replacement reuses the last substitute text. Both are
/// persisted afterwards, so `n` continues searching for the pattern.
fn substitute(editor: &mut Editor, d: &CommandDescriptor) {
    let search = match d.search.as_deref() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => editor.search_state.text.clone(),
    };
    let replace = d
        .replace
        .clone()
        .unwrap_or_else(|| editor.last_substitute_text.clone());
    let all_occurrences = d.flags.contains('g');

    // Like a search query, a pattern that is not a valid regex matches
    // its literal text instead.
    let pattern = match Regex::new(&search) {
        Ok(pattern) => pattern,
        Err(_) => match Regex::new(&regex::escape(&search)) {
            Ok(pattern) => pattern,
            Err(_) => return,
        },
    };
    let replacement = to_regex_replacement(&replace);

    let (start, end) = match resolve_range(editor.current_buffer(), d) {
        Ok(range) => range,
        Err(message) => {
            editor.show_message(message);
            return;
        }
    };

    let buffer = editor.current_buffer_mut();
    buffer.save_to_undo_stack();
    let mut lines = buffer.document().lines();
    let mut last_changed = None;
    for (row, line) in lines.iter_mut().enumerate().take(end).skip(start) {
        if !pattern.is_match(line) {
            continue;
        }
        *line = if all_occurrences {
            pattern.replace_all(line, replacement.as_str()).into_owned()
        } else {
            pattern.replace(line, replacement.as_str()).into_owned()
        };
        last_changed = Some(row);
    }
    let text = lines.join("\n");
    let document = match last_changed {
        Some(row) => {
            let doc = Document::with_cursor(&text, Document::new(&text).row_col_to_offset(row, 0));
            let to_first_non_blank = doc.start_of_line(true);
            doc.moved(to_first_non_blank)
        }
        None => Document::with_cursor(&text, buffer.document().cursor()),
    };
    buffer.set_document(document);

    editor.last_substitute_text = replace;
    editor.search_state.text = search;
}

/// Convert a `\N` backreference replacement into the `${N}` form; `$` in
/// the input must come through literally.
fn to_regex_replacement(replace: &str) -> String {
    let mut out = String::with_capacity(replace.len());
    let mut chars = replace.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek() {
                Some(&group @ '0'..='9') => {
                    out.push('$');
                    out.push('{');
                    out.push(group);
                    out.push('}');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                _ => out.push('\\'),
            },
            _ => out.push(c),
        }
    }
    out
}

/// `:[range]ya` — copy the range to the clipboard as whole lines.
fn yank(editor: &mut Editor, d: &CommandDescriptor) {
    let (start, end) = match resolve_range(editor.current_buffer(), d) {
        Ok(range) => range,
        Err(message) => return editor.show_message(message),
    };
    let lines = editor.current_buffer().document().lines();
    let text = lines[start..end].join("\n");
    editor.clipboard.set(RegisterContent::lines(text));
}

/// `:[range]d` — delete the range into the clipboard. The surviving
/// lines join cleanly, with no blank line left behind.
fn delete(editor: &mut Editor, d: &CommandDescriptor) {
    let (start, end) = match resolve_range(editor.current_buffer(), d) {
        Ok(range) => range,
        Err(message) => return editor.show_message(message),
    };
    let buffer = editor.current_buffer_mut();
    buffer.save_to_undo_stack();
    let mut lines = buffer.document().lines();
    let deleted: Vec<String> = lines.drain(start..end).collect();
    editor.clipboard.set(RegisterContent::lines(deleted.join("\n")));

    let text = lines.join("\n");
    let row = start.min(lines.len().saturating_sub(1));
    let cursor = Document::new(&text).row_col_to_offset(row, 0);
    editor
        .current_buffer_mut()
        .set_document(Document::with_cursor(&text, cursor));
}

/// `:[range]co {line}` — copy the range below the target line.
fn copy(editor: &mut Editor, d: &CommandDescriptor) {
    let (start, end) = match resolve_range(editor.current_buffer(), d) {
        Ok(range) => range,
        Err(message) => return editor.show_message(message),
    };
    let target = match d.target_line.as_deref().map(|t| line_index(editor.current_buffer(), t)) {
        Some(Ok(row)) => row,
        Some(Err(message)) => return editor.show_message(message),
        None => return,
    };
    let buffer = editor.current_buffer_mut();
    buffer.save_to_undo_stack();
    let mut lines = buffer.document().lines();
    let copied: Vec<String> = lines[start..end].to_vec();
    let insert_at = (target + 1).min(lines.len());
    lines.splice(insert_at..insert_at, copied);
    let text = lines.join("\n");
    let cursor = Document::new(&text).row_col_to_offset(target, 0);
    buffer.set_document(Document::with_cursor(&text, cursor));
}

// ---------------------------------------------------------------------------
// Registered commands
// ---------------------------------------------------------------------------

/// True (and a message shown) when unsaved changes block the command.
fn unsaved_guard(editor: &mut Editor, force: bool) -> bool {
    if !force && editor.current_buffer().has_unsaved_changes() {
        editor.show_message(MSG_UNSAVED);
        true
    } else {
        false
    }
}

fn cmd_buffer_next(editor: &mut Editor, force: bool) {
    if !unsaved_guard(editor, force) {
        editor.go_to_next_buffer();
    }
}

fn cmd_buffer_previous(editor: &mut Editor, force: bool) {
    if !unsaved_guard(editor, force) {
        editor.go_to_previous_buffer();
    }
}

fn cmd_go_to_buffer(editor: &mut Editor, name: &str, force: bool) {
    if !unsaved_guard(editor, force) {
        editor.go_to_buffer(name);
    }
}

fn cmd_buffer_wipe(editor: &mut Editor, force: bool) {
    if !unsaved_guard(editor, force) {
        editor.close_current_buffer();
    }
}

fn cmd_buffer_list(editor: &mut Editor, _force: bool) {
    let active = editor.active_index();
    let listing: Vec<String> = editor
        .buffers()
        .iter()
        .enumerate()
        .map(|(i, buffer)| {
            let star = if i == active { "%a" } else { "  " };
            let modified = if buffer.has_unsaved_changes() { "+" } else { " " };
            format!(
                " {:3} {star} {modified} {:20} line {}",
                i + 1,
                buffer.display_name(),
                buffer.document().cursor_row() + 1
            )
        })
        .collect();
    editor.show_message(listing.join("\n"));
}

fn cmd_only(editor: &mut Editor, _force: bool) {
    editor.window_count = 1;
    editor.emit(EditorEffect::KeepOnlyWindow);
}

fn cmd_hide(editor: &mut Editor, _force: bool) {
    if editor.window_count > 1 {
        editor.window_count -= 1;
        editor.emit(EditorEffect::CloseWindow);
    }
}

fn cmd_split(editor: &mut Editor, location: Option<&str>, _force: bool) {
    editor.window_count += 1;
    editor.emit(EditorEffect::SplitHorizontally);
    if let Some(location) = location {
        editor.open_location(location);
    }
}

fn cmd_vertical_split(editor: &mut Editor, location: Option<&str>, _force: bool) {
    editor.window_count += 1;
    editor.emit(EditorEffect::SplitVertically);
    if let Some(location) = location {
        editor.open_location(location);
    }
}

fn cmd_new(editor: &mut Editor, _force: bool) {
    editor.window_count += 1;
    editor.emit(EditorEffect::SplitHorizontally);
    editor.add_scratch_buffer();
}

fn cmd_vertical_new(editor: &mut Editor, _force: bool) {
    editor.window_count += 1;
    editor.emit(EditorEffect::SplitVertically);
    editor.add_scratch_buffer();
}

fn cmd_buffer_add(editor: &mut Editor, location: Option<&str>, _force: bool) {
    match location {
        Some(location) => editor.add_buffer_for_location(location),
        None => editor.show_message("Argument required"),
    }
}

fn cmd_next_location(editor: &mut Editor, _force: bool) {
    if editor.locations.len() <= 1 {
        editor.show_message(MSG_ONLY_ONE_FILE);
    } else if editor.current_location_index + 1 >= editor.locations.len() {
        editor.show_message(MSG_NO_MORE_FILES);
    } else {
        editor.current_location_index += 1;
        let location = editor.locations[editor.current_location_index].clone();
        editor.open_location(&location);
    }
}

fn cmd_previous_location(editor: &mut Editor, _force: bool) {
    if editor.locations.len() <= 1 {
        editor.show_message(MSG_ONLY_ONE_FILE);
    } else if editor.current_location_index == 0 {
        editor.show_message(MSG_NO_MORE_FILES);
    } else {
        editor.current_location_index -= 1;
        let location = editor.locations[editor.current_location_index].clone();
        editor.open_location(&location);
    }
}

/// `:e [location]` — open a location, or re-read the current file.
/// `#` names the previously visited location.
fn cmd_edit(editor: &mut Editor, location: Option<&str>, force: bool) {
    match location {
        Some(location) => {
            let location = if location == "#" {
                let history = &editor.location_history;
                match history.len().checked_sub(2).and_then(|i| history.get(i)) {
                    Some(previous) => previous.clone(),
                    None => return editor.show_message("No alternate file"),
                }
            } else {
                location.to_string()
            };
            editor.open_location(&location);
        }
        None => {
            if editor.current_buffer().location.is_none() {
                editor.show_message(MSG_NO_FILE_NAME);
            } else if !unsaved_guard(editor, force) {
                editor.reload_current_buffer();
            }
        }
    }
}

fn cmd_write(editor: &mut Editor, location: Option<&str>, force: bool) {
    write_buffer(editor, location, force);
}

/// Shared by `:w`, `:wq` and `:wa`. Returns true when the write happened.
fn write_buffer(editor: &mut Editor, location: Option<&str>, force: bool) -> bool {
    if let Some(location) = location {
        let is_current = editor.current_buffer().location.as_deref() == Some(location);
        if !force && !is_current && editor.storage().presence(location) != Presence::Missing {
            editor.show_message(MSG_FILE_EXISTS);
            return false;
        }
    }
    if location.is_none() && editor.current_buffer().location.is_none() {
        editor.show_message(MSG_NO_FILE_NAME);
        return false;
    }
    match editor.write_current_buffer(location) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            editor.show_message(MSG_READONLY);
            false
        }
        Err(e) => {
            editor.show_message(format!("Cannot write: {e}"));
            false
        }
    }
}

fn cmd_write_and_quit(editor: &mut Editor, location: Option<&str>, force: bool) {
    if write_buffer(editor, location, force) {
        cmd_quit(editor, true);
    }
}

fn cmd_write_all(editor: &mut Editor, _force: bool) {
    editor.write_all_buffers();
}

fn cmd_write_and_quit_all(editor: &mut Editor, _force: bool) {
    editor.write_all_buffers();
    cmd_quit_all(editor, true);
}

/// `:q` — close the window; quitting the editor only from the last one.
fn cmd_quit(editor: &mut Editor, force: bool) {
    if editor.window_count > 1 {
        editor.window_count -= 1;
        editor.emit(EditorEffect::CloseWindow);
    } else if editor.tab_count > 1 {
        editor.tab_count -= 1;
        editor.emit(EditorEffect::CloseTab);
    } else if !unsaved_guard(editor, force) {
        editor.emit(EditorEffect::Quit { status: 0 });
    }
}

fn cmd_quit_all(editor: &mut Editor, force: bool) {
    let any_unsaved = editor.buffers().iter().any(Buffer::has_unsaved_changes);
    if !force && any_unsaved {
        editor.show_message(MSG_UNSAVED);
    } else {
        editor.emit(EditorEffect::Quit { status: 0 });
    }
}

/// `:cq` — quit with a nonzero status, for tools reading the exit code.
fn cmd_cquit(editor: &mut Editor, _force: bool) {
    editor.emit(EditorEffect::Quit { status: 1 });
}

fn cmd_help(editor: &mut Editor, _force: bool) {
    editor.emit(EditorEffect::ShowHelp);
}

fn cmd_tab_new(editor: &mut Editor, location: Option<&str>, _force: bool) {
    editor.tab_count += 1;
    editor.emit(EditorEffect::NewTab);
    match location {
        Some(location) => editor.open_location(location),
        None => editor.add_scratch_buffer(),
    }
}

fn cmd_tab_close(editor: &mut Editor, _force: bool) {
    if editor.tab_count > 1 {
        editor.tab_count -= 1;
        editor.emit(EditorEffect::CloseTab);
    }
}

fn cmd_tab_next(editor: &mut Editor, _force: bool) {
    editor.emit(EditorEffect::NextTab);
}

fn cmd_tab_previous(editor: &mut Editor, _force: bool) {
    editor.emit(EditorEffect::PreviousTab);
}

fn cmd_pwd(editor: &mut Editor, _force: bool) {
    match std::env::current_dir() {
        Ok(dir) => editor.show_message(dir.display().to_string()),
        Err(e) => editor.show_message(format!("{e}")),
    }
}

fn cmd_change_directory(editor: &mut Editor, location: Option<&str>, _force: bool) {
    let Some(location) = location else {
        return editor.show_message("Argument required");
    };
    if let Err(e) = std::env::set_current_dir(location) {
        editor.show_message(format!("{e}"));
    }
}

// ---------------------------------------------------------------------------
// Set options
// ---------------------------------------------------------------------------

fn handle_set(editor: &mut Editor, name: &str, value: Option<&str>) {
    match name {
        "nu" | "number" => editor.options.show_line_numbers = true,
        "nonu" | "nonumber" => editor.options.show_line_numbers = false,
        "rnu" | "relativenumber" => editor.options.relative_number = true,
        "nornu" | "norelativenumber" => editor.options.relative_number = false,
        "hls" | "hlsearch" => editor.options.highlight_search = true,
        "nohls" | "nohlsearch" => editor.options.highlight_search = false,
        "paste" => editor.options.paste_mode = true,
        "nopaste" => editor.options.paste_mode = false,
        "ru" | "ruler" => editor.options.show_ruler = true,
        "noru" | "noruler" => editor.options.show_ruler = false,
        "wmnu" | "wildmenu" => editor.options.show_wildmenu = true,
        "nowmnu" | "nowildmenu" => editor.options.show_wildmenu = false,
        "ai" | "autoindent" => editor.options.autoindent = true,
        "noai" | "noautoindent" => editor.options.autoindent = false,
        "et" | "expandtab" => editor.options.expand_tab = true,
        "noet" | "noexpandtab" => editor.options.expand_tab = false,
        "is" | "incsearch" => editor.options.incsearch = true,
        "nois" | "noincsearch" => editor.options.incsearch = false,
        "ic" | "ignorecase" => editor.options.ignore_case = true,
        "noic" | "noignorecase" => editor.options.ignore_case = false,
        "list" => editor.options.display_unprintable_characters = true,
        "nolist" => editor.options.display_unprintable_characters = false,
        "ws" | "wrapscan" => editor.options.enable_wrapscan = true,
        "nows" | "nowrapscan" => editor.options.enable_wrapscan = false,
        "wrap" => editor.options.wrap_lines = true,
        "nowrap" => editor.options.wrap_lines = false,
        "bri" | "breakindent" => editor.options.break_indent = true,
        "nobri" | "nobreakindent" => editor.options.break_indent = false,
        "mouse" => editor.options.enable_mouse_support = true,
        "nomouse" => editor.options.enable_mouse_support = false,
        "top" | "tildeop" => editor.vi_state.tilde_operator = true,
        "notop" | "notildeop" => editor.vi_state.tilde_operator = false,
        "cul" | "cursorline" => editor.options.cursorline = true,
        "nocul" | "nocursorline" => editor.options.cursorline = false,
        "cuc" | "cursorcolumn" => editor.options.cursorcolumn = true,
        "nocuc" | "nocursorcolumn" => editor.options.cursorcolumn = false,
        "ts" | "tabstop" => set_positive(editor, value, |editor, n| editor.options.tabstop = n),
        "sw" | "shiftwidth" => {
            set_positive(editor, value, |editor, n| editor.options.shiftwidth = n);
        }
        "so" | "scrolloff" => match value.map(str::parse::<usize>) {
            Some(Ok(n)) => editor.options.scroll_offset = n,
            _ => editor.show_message(MSG_NUMBER_REQUIRED),
        },
        "ft" | "filetype" => match value {
            Some(value) => {
                editor.current_buffer_mut().options.filetype = Some(value.to_string());
            }
            None => {
                let filetype = editor
                    .current_buffer()
                    .options
                    .filetype
                    .clone()
                    .unwrap_or_default();
                editor.show_message(format!("filetype={filetype}"));
            }
        },
        "cc" | "colorcolumn" => set_colorcolumn(editor, value),
        "all" => {
            let listing = option_listing(editor);
            editor.show_message(listing);
        }
        _ => editor.show_message(format!("Unknown option: {name}")),
    }
}

fn set_positive(editor: &mut Editor, value: Option<&str>, apply: fn(&mut Editor, usize)) {
    match value.map(str::parse::<isize>) {
        None | Some(Err(_)) => editor.show_message(MSG_NUMBER_REQUIRED),
        Some(Ok(n)) if n <= 0 => editor.show_message(MSG_MUST_BE_POSITIVE),
        Some(Ok(n)) => apply(editor, n.unsigned_abs()),
    }
}

fn set_colorcolumn(editor: &mut Editor, value: Option<&str>) {
    let Some(value) = value else {
        return editor.show_message(MSG_NUMBER_REQUIRED);
    };
    if value.is_empty() {
        editor.options.colorcolumn.clear();
        return;
    }
    let columns: Result<Vec<usize>, _> = value.split(',').map(str::parse).collect();
    match columns {
        Ok(columns) => editor.options.colorcolumn = columns,
        Err(_) => editor.show_message(MSG_INVALID_COLORCOLUMN),
    }
}

/// The `:set all` listing: one option per line, sorted, `no` prefix for
/// unset booleans and `=value` for valued options.
fn option_listing(editor: &Editor) -> String {
    let o = &editor.options;
    let flag = |name: &str, on: bool| {
        if on {
            format!("  {name}")
        } else {
            format!("no{name}")
        }
    };
    let colorcolumn = o
        .colorcolumn
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let mut entries = vec![
        flag("number", o.show_line_numbers),
        flag("relativenumber", o.relative_number),
        flag("hlsearch", o.highlight_search),
        flag("paste", o.paste_mode),
        flag("ruler", o.show_ruler),
        flag("wildmenu", o.show_wildmenu),
        flag("autoindent", o.autoindent),
        flag("expandtab", o.expand_tab),
        flag("incsearch", o.incsearch),
        flag("ignorecase", o.ignore_case),
        flag("list", o.display_unprintable_characters),
        flag("wrapscan", o.enable_wrapscan),
        flag("wrap", o.wrap_lines),
        flag("breakindent", o.break_indent),
        flag("mouse", o.enable_mouse_support),
        flag("tildeop", editor.vi_state.tilde_operator),
        flag("cursorline", o.cursorline),
        flag("cursorcolumn", o.cursorcolumn),
        format!("  tabstop={}", o.tabstop),
        format!("  shiftwidth={}", o.shiftwidth),
        format!("  scrolloff={}", o.scroll_offset),
        format!("  colorcolumn={colorcolumn}"),
    ];
    entries.sort_by(|a, b| a.trim_start().trim_start_matches("no").cmp(b.trim_start().trim_start_matches("no")));
    entries.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
