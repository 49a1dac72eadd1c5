//! Parse and dispatch errors.
//!
//! An [`ArgumentParseError`] remembers the raw input and the byte offset of
//! the token that failed so it can be rendered with a caret under the
//! offending position:
//!
//! ```text
//! Expected an integer, but input 'ten' was not
//! give alice ten
//!            ^
//! ```

use thiserror::Error;

pub type ParseResult<T> = std::result::Result<T, ArgumentParseError>;

/// Longest input rendered without windowing around the error position.
const MAX_RENDERED_WIDTH: usize = 80;
/// Characters kept on each side of the position when windowing.
const WINDOW_RADIUS: usize = 37;

/// A failure to turn raw command input into arguments.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}", self.render())]
pub struct ArgumentParseError {
    message: String,
    input: String,
    position: usize,
    usage: Option<String>,
}

impl ArgumentParseError {
    /// Creates an error at byte offset `position` of `input`.
    pub fn new(message: impl Into<String>, input: impl Into<String>, position: usize) -> Self {
        let input = input.into();
        let position = position.min(input.len());
        Self {
            message: message.into(),
            input,
            position,
            usage: None,
        }
    }

    /// Attaches a usage line shown under the annotated input.
    #[must_use]
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        let usage = usage.into();
        self.usage = (!usage.trim().is_empty()).then_some(usage);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Byte offset into [`ArgumentParseError::input`].
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    /// The input with a caret line under the error position.
    ///
    /// Inputs longer than 80 characters are cut to a window around the
    /// position, with `...` marking the elided ends.
    pub fn annotated_position(&self) -> String {
        let chars: Vec<char> = self.input.chars().collect();
        let mut column = self
            .input
            .get(..self.position)
            .map_or(chars.len(), |prefix| prefix.chars().count());

        let shown: String = if chars.len() <= MAX_RENDERED_WIDTH {
            chars.iter().collect()
        } else if column >= WINDOW_RADIUS {
            let start = column - WINDOW_RADIUS;
            let end = chars.len().min(column + WINDOW_RADIUS);
            let window: String = chars[start..end].iter().collect();
            column = column - start + 3;
            if end < chars.len() {
                format!("...{window}...")
            } else {
                format!("...{window}")
            }
        } else {
            let head: String = chars[..MAX_RENDERED_WIDTH - 3].iter().collect();
            format!("{head}...")
        };

        format!("{shown}\n{}^", " ".repeat(column))
    }

    fn render(&self) -> String {
        let mut text = self.message.clone();
        if !self.input.is_empty() {
            text.push('\n');
            text.push_str(&self.annotated_position());
        }
        if let Some(usage) = &self.usage {
            text.push_str("\nUsage: ");
            text.push_str(usage);
        }
        text
    }
}

/// Errors raised while running a [`CommandSpec`](crate::CommandSpec).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ArgumentParseError),

    #[error("You do not have permission to use this command!")]
    PermissionDenied { permission: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_points_at_position() {
        let error = ArgumentParseError::new("bad", "give alice ten", 11);
        assert_eq!(error.annotated_position(), "give alice ten\n           ^");
        assert_eq!(error.to_string(), "bad\ngive alice ten\n           ^");
    }

    #[test]
    fn empty_input_renders_message_only() {
        let error = ArgumentParseError::new("Not enough arguments!", "", 0);
        assert_eq!(error.to_string(), "Not enough arguments!");
    }

    #[test]
    fn usage_is_appended() {
        let error = ArgumentParseError::new("bad", "x", 0).with_usage("<player>");
        assert_eq!(error.to_string(), "bad\nx\n^\nUsage: <player>");
        assert_eq!(
            ArgumentParseError::new("bad", "x", 0).with_usage(" ").usage(),
            None
        );
    }

    #[test]
    fn long_input_is_windowed_around_position() {
        let input = "a".repeat(50) + "X" + &"b".repeat(50);
        let error = ArgumentParseError::new("bad", input, 50);
        let rendered = error.annotated_position();
        let (line, caret) = rendered.split_once('\n').unwrap();

        assert!(line.starts_with("...") && line.ends_with("..."));
        assert_eq!(line.chars().nth(caret.len() - 1), Some('X'));
    }

    #[test]
    fn long_input_with_early_position_is_truncated() {
        let input = "x".repeat(100);
        let error = ArgumentParseError::new("bad", input, 2);
        let rendered = error.annotated_position();
        let (line, caret) = rendered.split_once('\n').unwrap();

        assert_eq!(line.len(), 80);
        assert!(line.ends_with("..."));
        assert_eq!(caret, "  ^");
    }

    #[test]
    fn position_is_clamped_to_input() {
        assert_eq!(ArgumentParseError::new("bad", "abc", 99).position(), 3);
    }
}
