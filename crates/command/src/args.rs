//! Cursor over tokenized command input.

use crate::error::{ArgumentParseError, ParseResult};

/// One token together with its byte range in the raw input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleArg {
    value: String,
    start: usize,
    end: usize,
}

impl SingleArg {
    pub fn new(value: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            value: value.into(),
            start,
            end,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Byte offset where the token starts in the raw input.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset just past the token in the raw input.
    pub fn end(&self) -> usize {
        self.end
    }
}

/// Saved cursor and token list, restored when a branch backtracks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgsSnapshot {
    cursor: usize,
    args: Vec<SingleArg>,
}

impl ArgsSnapshot {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn token_count(&self) -> usize {
        self.args.len()
    }
}

/// Tokens of one command line plus a cursor.
///
/// The cursor counts consumed tokens: it starts at 0, before the first
/// token, and `next` moves it past the token it returns. The most recently
/// returned token is the "current" one used for error positions.
#[derive(Clone, Debug)]
pub struct CommandArgs {
    raw: String,
    args: Vec<SingleArg>,
    cursor: usize,
}

impl CommandArgs {
    pub fn new(raw: impl Into<String>, args: Vec<SingleArg>) -> Self {
        Self {
            raw: raw.into(),
            args,
            cursor: 0,
        }
    }

    /// The untokenized input.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.args.len()
    }

    /// Consumes and returns the next token.
    pub fn next(&mut self) -> ParseResult<String> {
        if !self.has_next() {
            return Err(self.create_error("Not enough arguments!"));
        }
        self.cursor += 1;
        Ok(self.args[self.cursor - 1].value.clone())
    }

    /// Consumes the next token if there is one.
    pub fn next_if_present(&mut self) -> Option<String> {
        self.has_next().then(|| {
            self.cursor += 1;
            self.args[self.cursor - 1].value.clone()
        })
    }

    /// Returns the next token without consuming it.
    pub fn peek(&self) -> ParseResult<&str> {
        self.args
            .get(self.cursor)
            .map(SingleArg::value)
            .ok_or_else(|| self.create_error("Not enough arguments!"))
    }

    /// Steps the cursor back over the current token.
    pub fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor; positions past the end are clamped.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.args.len());
    }

    pub fn snapshot(&self) -> ArgsSnapshot {
        ArgsSnapshot {
            cursor: self.cursor,
            args: self.args.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: ArgsSnapshot) {
        self.cursor = snapshot.cursor;
        self.args = snapshot.args;
    }

    /// Byte offset of the current token, or 0 before the first `next`.
    pub fn raw_position(&self) -> usize {
        self.current().map_or(0, SingleArg::start)
    }

    /// Removes tokens `start..end` (token indices, end exclusive).
    ///
    /// A cursor inside or past the removed range is pulled back so the
    /// token that followed the range is next.
    pub fn remove_args(&mut self, start: usize, end: usize) {
        let end = end.min(self.args.len());
        if start >= end {
            return;
        }
        self.args.drain(start..end);
        if self.cursor >= end {
            self.cursor -= end - start;
        } else if self.cursor > start {
            self.cursor = start;
        }
    }

    /// Inserts `value` as the next token, positioned at the end of the
    /// current one.
    pub fn insert_arg(&mut self, value: impl Into<String>) {
        let at = self.current().map_or(0, SingleArg::end);
        self.args
            .insert(self.cursor, SingleArg::new(value, at, at));
    }

    /// Every remaining and consumed token value, in order.
    pub fn all(&self) -> Vec<&str> {
        self.args.iter().map(SingleArg::value).collect()
    }

    pub fn get(&self, index: usize) -> Option<&SingleArg> {
        self.args.get(index)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Builds an error positioned at the current token.
    pub fn create_error(&self, message: impl Into<String>) -> ArgumentParseError {
        ArgumentParseError::new(message, self.raw.clone(), self.raw_position())
    }

    fn current(&self) -> Option<&SingleArg> {
        self.cursor.checked_sub(1).and_then(|i| self.args.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tokenizer;

    fn args(input: &str) -> CommandArgs {
        CommandArgs::new(input, Tokenizer::QuotedStrings.tokenize(input, false).unwrap())
    }

    #[test]
    fn next_walks_tokens_in_order() {
        let mut args = args("a b");
        assert_eq!(args.peek().unwrap(), "a");
        assert_eq!(args.next().unwrap(), "a");
        assert_eq!(args.next().unwrap(), "b");
        assert!(!args.has_next());
        assert_eq!(args.next_if_present(), None);
    }

    #[test]
    fn exhausted_error_points_at_last_token() {
        let mut args = args("give alice");
        args.next().unwrap();
        args.next().unwrap();
        let error = args.next().unwrap_err();
        assert_eq!(error.message(), "Not enough arguments!");
        assert_eq!(error.position(), 5);
    }

    #[test]
    fn snapshot_restores_cursor_and_tokens() {
        let mut args = args("a b c");
        args.next().unwrap();
        let snapshot = args.snapshot();
        args.next().unwrap();
        args.remove_args(0, 2);
        assert_eq!(args.all(), ["c"]);

        args.restore(snapshot);
        assert_eq!(args.cursor(), 1);
        assert_eq!(args.all(), ["a", "b", "c"]);
    }

    #[test]
    fn remove_args_rewinds_cursor() {
        let mut args = args("x -f v y");
        args.next().unwrap();
        args.next().unwrap();
        args.next().unwrap();
        args.remove_args(1, 3);
        assert_eq!(args.all(), ["x", "y"]);
        assert_eq!(args.cursor(), 1);
        assert_eq!(args.next().unwrap(), "y");
    }

    #[test]
    fn insert_arg_becomes_next() {
        let mut args = args("--foo=bar baz");
        args.next().unwrap();
        args.insert_arg("bar");
        assert_eq!(args.next().unwrap(), "bar");
        assert_eq!(args.raw_position(), 9);
        assert_eq!(args.next().unwrap(), "baz");
    }

    #[test]
    fn previous_steps_back() {
        let mut args = args("a b");
        args.next().unwrap();
        args.previous();
        args.previous();
        assert_eq!(args.cursor(), 0);
        assert_eq!(args.next().unwrap(), "a");
    }
}
