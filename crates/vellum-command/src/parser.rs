//! The modal command-line parser.
//!
//! Input is trimmed; one optional leading `:` (the modal command-line
//! sentinel) is stripped; the remainder splits on runs of whitespace into
//! a command word and arguments. The word matches case-insensitively
//! against a static alias table. This is a plain string-to-identifier
//! lookup with no
//! fuzzy matching, no abbreviation inference beyond the explicit table.

use crate::CommandError;

/// A parsed command-line: target identifier plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub id: &'static str,
    pub args: Vec<String>,
}

/// Command-line parse failures. Both are user-input errors: non-fatal,
/// logged, and the state is left unchanged beyond closing the command
/// line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command line")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl From<ParseError> for CommandError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Empty => CommandError::Usage("empty command line".into()),
            ParseError::UnknownCommand(word) => CommandError::UnknownCommand(word),
        }
    }
}

/// Alias words for each target identifier.
const ALIASES: &[(&[&str], &str)] = &[
    (&["w", "write", "save"], "file.save"),
    (&["e", "edit", "o", "open"], "file.open"),
    (&["n", "new"], "file.new"),
    (&["sa", "saveas"], "file.saveAs"),
    (&["q", "quit", "exit"], "app.quit"),
    (&["close", "bd", "bdelete"], "tab.close"),
    (&["bn", "bnext", "tabnext"], "tab.next"),
    (&["bp", "bprev", "tabprev"], "tab.prev"),
    (&["sp", "split"], "pane.splitHorizontal"),
    (&["vs", "vsplit"], "pane.splitVertical"),
    (&["term", "terminal"], "terminal.open"),
    (&["theme"], "theme.set"),
    (&["ws", "workspace", "cd"], "workspace.open"),
    (&["clear"], "diagnostics.clear"),
];

/// Parses one command-line input into an identifier and argument list.
pub fn parse_command_line(input: &str) -> Result<ParsedCommand, ParseError> {
    let trimmed = input.trim();
    let stripped = trimmed.strip_prefix(':').unwrap_or(trimmed);

    let mut words = stripped.split_whitespace();
    let Some(word) = words.next() else {
        return Err(ParseError::Empty);
    };
    let needle = word.to_lowercase();

    let id = ALIASES
        .iter()
        .find(|(aliases, _)| aliases.contains(&needle.as_str()))
        .map(|(_, id)| *id)
        .ok_or_else(|| ParseError::UnknownCommand(word.to_string()))?;

    Ok(ParsedCommand {
        id,
        args: words.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_and_padding_are_stripped() {
        let parsed = parse_command_line(" :w ").unwrap();
        assert_eq!(parsed.id, "file.save");
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn bare_word_with_args_parses() {
        let parsed = parse_command_line("open /tmp/x").unwrap();
        assert_eq!(parsed.id, "file.open");
        assert_eq!(parsed.args, vec!["/tmp/x"]);
    }

    #[test]
    fn aliases_share_a_target() {
        for input in ["w", "write", "save", ":W", "SAVE"] {
            assert_eq!(parse_command_line(input).unwrap().id, "file.save");
        }
    }

    #[test]
    fn whitespace_runs_split_arguments() {
        let parsed = parse_command_line(":saveas   /a/b.rs   extra").unwrap();
        assert_eq!(parsed.id, "file.saveAs");
        assert_eq!(parsed.args, vec!["/a/b.rs", "extra"]);
    }

    #[test]
    fn unknown_word_is_an_error() {
        assert_eq!(
            parse_command_line("bogus"),
            Err(ParseError::UnknownCommand("bogus".to_string()))
        );
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(parse_command_line("   "), Err(ParseError::Empty));
        assert_eq!(parse_command_line(":"), Err(ParseError::Empty));
    }

    #[test]
    fn only_one_sentinel_is_stripped() {
        // "::w" leaves ":w", which is not an alias.
        assert!(matches!(
            parse_command_line("::w"),
            Err(ParseError::UnknownCommand(_))
        ));
    }
}
