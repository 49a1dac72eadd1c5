//! Splitting raw input into positioned arguments.

use crate::args::SingleArg;
use crate::error::{ArgumentParseError, ParseResult};

/// Strategy used to split raw command input into arguments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tokenizer {
    /// Split on single spaces; empty segments are kept.
    SpaceSplit,
    /// Split on whitespace, honoring `"..."`/`'...'` quoting and `\` escapes.
    #[default]
    QuotedStrings,
    /// The whole input is one argument.
    RawInput,
}

impl Tokenizer {
    /// Tokenizes `input`.
    ///
    /// `lenient` tolerates unterminated quotes instead of failing.
    pub fn tokenize(self, input: &str, lenient: bool) -> ParseResult<Vec<SingleArg>> {
        match self {
            Self::SpaceSplit => Ok(space_split(input)),
            Self::QuotedStrings => QuotedScanner::new(input, lenient).scan(),
            Self::RawInput if input.is_empty() => Ok(Vec::new()),
            Self::RawInput => Ok(vec![SingleArg::new(input, 0, input.len())]),
        }
    }

    /// Tokenizes possibly incomplete input for completion.
    ///
    /// Parsing is lenient and trailing whitespace yields a final empty
    /// argument, so completion offers candidates for the next word.
    pub fn tokenize_partial(self, input: &str) -> Vec<SingleArg> {
        let mut args = self.tokenize(input, true).unwrap_or_default();
        let trailing_space = input.ends_with(char::is_whitespace);
        // Space splitting already yields the empty word after a final space.
        let ends_empty = args
            .last()
            .is_some_and(|arg| arg.value().is_empty() && arg.start() == input.len());
        if args.is_empty() || (trailing_space && self != Self::RawInput && !ends_empty) {
            args.push(SingleArg::new("", input.len(), input.len()));
        }
        args
    }
}

fn space_split(input: &str) -> Vec<SingleArg> {
    if input.is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut start = 0;
    for part in input.split(' ') {
        let end = start + part.len();
        args.push(SingleArg::new(part, start, end));
        start = end + 1;
    }
    args
}

struct QuotedScanner<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    lenient: bool,
}

impl<'a> QuotedScanner<'a> {
    fn new(input: &'a str, lenient: bool) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            lenient,
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |(i, _)| *i)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn scan(mut self) -> ParseResult<Vec<SingleArg>> {
        let mut args = Vec::new();
        self.skip_whitespace();
        while self.chars.peek().is_some() {
            let start = self.offset();
            let value = self.next_arg()?;
            let end = self.offset();
            args.push(SingleArg::new(value, start, end));
            self.skip_whitespace();
        }
        Ok(args)
    }

    fn next_arg(&mut self) -> ParseResult<String> {
        let mut value = String::new();
        while let Some((_, c)) = self.chars.peek().copied() {
            match c {
                '"' | '\'' => self.quoted(&mut value)?,
                '\\' => self.escape(&mut value),
                c if c.is_whitespace() => break,
                c => {
                    value.push(c);
                    self.chars.next();
                }
            }
        }
        Ok(value)
    }

    fn quoted(&mut self, value: &mut String) -> ParseResult<()> {
        let Some((open_at, quote)) = self.chars.next() else {
            return Ok(());
        };
        loop {
            match self.chars.peek().copied() {
                None if self.lenient => return Ok(()),
                None => {
                    return Err(ArgumentParseError::new(
                        "Unterminated quoted string",
                        self.input,
                        open_at,
                    ));
                }
                Some((_, c)) if c == quote => {
                    self.chars.next();
                    return Ok(());
                }
                Some((_, '\\')) => self.escape(value),
                Some((_, c)) => {
                    value.push(c);
                    self.chars.next();
                }
            }
        }
    }

    fn escape(&mut self, value: &mut String) {
        // Consume the backslash; a trailing one is kept literally.
        self.chars.next();
        match self.chars.next() {
            Some((_, escaped)) => value.push(escaped),
            None => value.push('\\'),
        }
    }
}
