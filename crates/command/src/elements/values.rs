//! Elements that read tokens into values.

use strum::IntoEnumIterator;

use crate::args::CommandArgs;
use crate::context::CommandContext;
use crate::element::{CommandElement, filter_prefix};
use crate::error::ParseResult;
use crate::source::CommandSource;
use crate::value::Value;

/// Spellings accepted by [`BooleanElement`].
const TRUE_WORDS: [&str; 6] = ["true", "t", "yes", "y", "verify", "1"];
const FALSE_WORDS: [&str; 5] = ["false", "f", "no", "n", "0"];

/// Choice lists at most this long are spelled out in usage under
/// [`ChoiceUsage::Auto`].
const MAX_INLINE_CHOICES: usize = 5;

// ============================================================================
// Strings
// ============================================================================

/// One token, as-is.
pub struct StringElement {
    key: String,
}

impl StringElement {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl CommandElement for StringElement {
    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        Ok(Some(Value::Str(args.next()?)))
    }
}

/// Every remaining token as one string.
///
/// The joined form glues token values with single spaces; the raw form
/// slices the untokenized input from the first remaining token, keeping
/// quotes and spacing exactly as typed.
pub struct RemainingJoinedStrings {
    key: String,
    raw: bool,
}

impl RemainingJoinedStrings {
    pub fn new(key: impl Into<String>, raw: bool) -> Self {
        Self {
            key: key.into(),
            raw,
        }
    }
}

impl CommandElement for RemainingJoinedStrings {
    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        let first = args.next()?;
        if self.raw {
            let start = args.raw_position();
            while args.next_if_present().is_some() {}
            let raw = args.raw().get(start..).unwrap_or_default();
            return Ok(Some(Value::Str(raw.to_string())));
        }
        let mut words = vec![first];
        while let Some(word) = args.next_if_present() {
            words.push(word);
        }
        Ok(Some(Value::Str(words.join(" "))))
    }

    fn usage(&self, _source: &dyn CommandSource) -> String {
        format!("<{}...>", self.key)
    }
}

// ============================================================================
// Numbers
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Long,
    Double,
}

impl NumberKind {
    fn parse(self, input: &str) -> Option<Value> {
        match self {
            Self::Integer => parse_whole(input)
                .and_then(|value| i32::try_from(value).ok())
                .map(Value::Integer),
            Self::Long => parse_whole(input).map(Value::Long),
            Self::Double => input.parse::<f64>().ok().map(Value::Double),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Integer => "an integer",
            Self::Long => "a long",
            Self::Double => "a number",
        }
    }
}

/// Parses a whole number with an optional sign and `0x`/`0b` radix prefix.
fn parse_whole(input: &str) -> Option<i64> {
    let (negative, unsigned) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(binary) = unsigned
        .strip_prefix("0b")
        .or_else(|| unsigned.strip_prefix("0B"))
    {
        (2, binary)
    } else {
        (10, unsigned)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

/// One numeric token.
pub struct NumberElement {
    key: String,
    kind: NumberKind,
}

impl NumberElement {
    pub fn new(key: impl Into<String>, kind: NumberKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }
}

impl CommandElement for NumberElement {
    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        let input = args.next()?;
        match self.kind.parse(&input) {
            Some(value) => Ok(Some(value)),
            None => Err(args.create_error(format!(
                "Expected {}, but input '{input}' was not",
                self.kind.expected()
            ))),
        }
    }
}

// ============================================================================
// Choices
// ============================================================================

/// Whether a choice element spells its choices out in usage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChoiceUsage {
    Always,
    Never,
    /// Spell them out when there are at most five.
    #[default]
    Auto,
}

/// One token looked up in a fixed table of named values.
pub struct Choices {
    key: String,
    choices: Vec<(String, Value)>,
    usage: ChoiceUsage,
    case_sensitive: bool,
}

impl Choices {
    pub fn new(key: impl Into<String>, choices: Vec<(String, Value)>) -> Self {
        Self {
            key: key.into(),
            choices,
            usage: ChoiceUsage::default(),
            case_sensitive: true,
        }
    }

    #[must_use]
    pub fn with_usage(mut self, usage: ChoiceUsage) -> Self {
        self.usage = usage;
        self
    }

    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|(name, _)| name.as_str())
    }

    fn lookup(&self, input: &str) -> Option<&Value> {
        self.choices
            .iter()
            .find(|(name, _)| {
                if self.case_sensitive {
                    name == input
                } else {
                    name.eq_ignore_ascii_case(input)
                }
            })
            .map(|(_, value)| value)
    }

    fn inline(&self) -> bool {
        match self.usage {
            ChoiceUsage::Always => true,
            ChoiceUsage::Never => false,
            ChoiceUsage::Auto => self.choices.len() <= MAX_INLINE_CHOICES,
        }
    }
}

impl CommandElement for Choices {
    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        let input = args.next()?;
        match self.lookup(&input) {
            Some(value) => Ok(Some(value.clone())),
            None => Err(args.create_error(format!(
                "Argument was not a valid choice. Valid choices: {}",
                self.names().collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    fn complete(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
        _context: &mut CommandContext,
    ) -> Vec<String> {
        let prefix = args.next_if_present().unwrap_or_default();
        filter_prefix(self.names(), &prefix)
    }

    fn usage(&self, _source: &dyn CommandSource) -> String {
        if self.inline() {
            format!("<{}>", self.names().collect::<Vec<_>>().join("|"))
        } else {
            format!("<{}>", self.key)
        }
    }
}

/// Choices over every variant of a strum enum, matched case-insensitively.
pub fn enum_choices<E>(key: impl Into<String>) -> Choices
where
    E: IntoEnumIterator + AsRef<str> + Send + Sync + 'static,
{
    let choices = E::iter()
        .map(|variant| (variant.as_ref().to_string(), Value::any(variant)))
        .collect();
    Choices::new(key, choices).case_insensitive()
}

/// A yes/no token.
pub struct BooleanElement {
    key: String,
}

impl BooleanElement {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl CommandElement for BooleanElement {
    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        let input = args.next()?.to_lowercase();
        if TRUE_WORDS.contains(&input.as_str()) {
            Ok(Some(Value::Bool(true)))
        } else if FALSE_WORDS.contains(&input.as_str()) {
            Ok(Some(Value::Bool(false)))
        } else {
            let valid: Vec<&str> = TRUE_WORDS.iter().chain(&FALSE_WORDS).copied().collect();
            Err(args.create_error(format!(
                "Argument was not a valid choice. Valid choices: {}",
                valid.join(", ")
            )))
        }
    }

    fn complete(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
        _context: &mut CommandContext,
    ) -> Vec<String> {
        let prefix = args.next_if_present().unwrap_or_default();
        filter_prefix(["true", "false"], &prefix)
    }
}

// ============================================================================
// Literals
// ============================================================================

/// A fixed run of words, matched case-insensitively, binding a preset value.
pub struct Literal {
    key: String,
    value: Value,
    expected: Vec<String>,
}

impl Literal {
    pub fn new(key: impl Into<String>, value: Value, expected: Vec<String>) -> Self {
        Self {
            key: key.into(),
            value,
            expected,
        }
    }
}

impl CommandElement for Literal {
    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        for expected in &self.expected {
            let input = args.next()?;
            if !input.eq_ignore_ascii_case(expected) {
                return Err(args.create_error(format!(
                    "Argument {input} did not match expected next argument {expected}"
                )));
            }
        }
        Ok(Some(self.value.clone()))
    }

    fn complete(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
        _context: &mut CommandContext,
    ) -> Vec<String> {
        for expected in &self.expected {
            let Some(input) = args.next_if_present() else {
                break;
            };
            if args.has_next() {
                if !input.eq_ignore_ascii_case(expected) {
                    break;
                }
            } else if expected.to_lowercase().starts_with(&input.to_lowercase()) {
                return vec![expected.clone()];
            }
        }
        Vec::new()
    }

    fn usage(&self, _source: &dyn CommandSource) -> String {
        self.expected.join(" ")
    }
}
