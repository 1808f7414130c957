//! The `:` command-line grammar.
//!
//! A typed command line is matched against an ordered list of anchored
//! alternatives; the first one that matches wins (PEG semantics, not
//! longest-match). Leading colons and whitespace are ignored, trailing
//! whitespace is allowed, and the empty line parses to an empty
//! descriptor.
//!
//! The location-command alternative is built from the names the command
//! registry declares as location-taking, so the registry must exist
//! before the grammar can be compiled.

use regex::{Captures, Regex};

// ---------------------------------------------------------------------------
// CommandDescriptor
// ---------------------------------------------------------------------------

/// The structured result of a successful parse.
///
/// At most one of `command`, `go_to_line`, `shell_command` is set; the
/// remaining fields are the captures of whichever alternative matched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub command: Option<String>,
    /// Trailing `!`.
    pub force: bool,
    pub range_start: Option<String>,
    pub range_end: Option<String>,
    /// Substitute pattern. `Some("")` when typed as `:s//…/`.
    pub search: Option<String>,
    /// Substitute replacement. `None` when the second `/` was never typed.
    pub replace: Option<String>,
    /// Substitute flags with the delimiter stripped (`"g"` or `""`).
    pub flags: String,
    pub target_line: Option<String>,
    pub location: Option<String>,
    pub buffer_name: Option<String>,
    pub go_to_line: Option<String>,
    pub set_option: Option<String>,
    pub set_value: Option<String>,
    pub colorscheme: Option<String>,
    pub shell_command: Option<String>,
}

// ---------------------------------------------------------------------------
// CommandGrammar
// ---------------------------------------------------------------------------

/// Range bounds: line number, `.`, a mark, or `%` (whole buffer) at the
/// start; `$` is additionally allowed as an end bound.
const RANGE_START: &str = r"\d+|\.|'[a-z]|%";
const RANGE_END: &str = r"\d+|\.|'[a-z]|\$";

/// A `/`-delimited field: any run of chars where `/` only appears escaped.
const SLASH_FIELD: &str = r"(?:[^/\\]|\\.)*";

/// The compiled command-line grammar.
#[derive(Debug)]
pub struct CommandGrammar {
    alternatives: Vec<Regex>,
    empty: Regex,
}

impl CommandGrammar {
    /// Compile the grammar. `location_commands` is the set of command
    /// names that accept a trailing path argument.
    pub fn compile(location_commands: &[&str]) -> Result<Self, regex::Error> {
        let range = format!(r"(?:(?P<range_start>{RANGE_START})(?:,(?P<range_end>{RANGE_END}))?)?");
        let location_names = location_commands
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");

        // Ordered alternatives; first match wins.
        let bodies = [
            // Substitute.
            format!(
                r"{range}(?P<command>s|substitute)\s*/(?P<search>{SLASH_FIELD})(?:/(?P<replace>{SLASH_FIELD})(?:/(?P<flags>g?))?)?"
            ),
            // Yank.
            format!(r"{range}(?P<command>ya|yank\S+)"),
            // Delete.
            format!(r"{range}(?P<command>d|delete\S+)"),
            // Copy.
            format!(r"{range}(?P<command>co)\s*(?P<target_line>{RANGE_START})"),
            // Commands accepting a location.
            format!(r"(?P<command>{location_names})(?P<force>!?)\s+(?P<location>\S+)"),
            // Commands accepting a buffer name.
            r"(?P<command>b|buffer)(?P<force>!?)\s+(?P<buffer_name>\S+)".to_string(),
            // Jump to a line number.
            r"(?P<go_to_line>\d+)".to_string(),
            // Set an option.
            r"(?P<command>set)\s+(?P<set_option>[^\s=]+)(?:=(?P<set_value>\S+))?".to_string(),
            // Colorscheme.
            r"(?P<command>colorscheme|colo)\s+(?P<colorscheme>\S+)".to_string(),
            // Shell escape.
            r"!(?P<shell_command>.*)".to_string(),
            // Any other plain command.
            r"(?P<command>[^\s!]+)(?P<force>!?)".to_string(),
        ];

        let alternatives = bodies
            .iter()
            .map(|body| Regex::new(&format!(r"^:*\s*(?:{body})\s*$")))
            .collect::<Result<Vec<_>, _>>()?;
        let empty = Regex::new(r"^:*\s*$")?;

        Ok(Self { alternatives, empty })
    }

    /// Parse one command line. `None` means no alternative matched and
    /// nothing must execute.
    #[must_use]
    pub fn parse(&self, input: &str) -> Option<CommandDescriptor> {
        for regex in &self.alternatives {
            if let Some(caps) = regex.captures(input) {
                return Some(descriptor_from(&caps));
            }
        }
        if self.empty.is_match(input) {
            return Some(CommandDescriptor::default());
        }
        None
    }
}

fn descriptor_from(caps: &Captures<'_>) -> CommandDescriptor {
    let get = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
    CommandDescriptor {
        command: get("command"),
        force: caps.name("force").is_some_and(|m| !m.as_str().is_empty()),
        range_start: get("range_start"),
        range_end: get("range_end"),
        search: get("search").map(|s| unescape_slashes(&s)),
        replace: get("replace").map(|s| unescape_slashes(&s)),
        flags: get("flags").unwrap_or_default(),
        target_line: get("target_line"),
        location: get("location"),
        buffer_name: get("buffer_name"),
        go_to_line: get("go_to_line"),
        set_option: get("set_option"),
        set_value: get("set_value"),
        colorscheme: get("colorscheme"),
        shell_command: get("shell_command"),
    }
}

/// Undo the `\/` escaping used inside substitute fields. Other escapes
/// pass through untouched; they are regex syntax.
fn unescape_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'/') {
            out.push('/');
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
