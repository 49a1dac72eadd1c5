//! Flag extraction around a positional element.
//!
//! `--name`, `--name=value` and `-abc` tokens are parsed by the flag's
//! element and then removed from [`CommandArgs`], so the wrapped element only
//! ever sees positional tokens. Unanchored flags may appear anywhere;
//! anchored flags must come before the first positional token.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::args::CommandArgs;
use crate::context::CommandContext;
use crate::element::{Checkpoint, CommandElement, Element, filter_prefix};
use crate::error::ParseResult;
use crate::source::CommandSource;
use crate::value::Value;

use super::structural::{MarkTrue, NoneElement, RequiringPermission};

/// What to do with a flag nobody registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownFlagBehavior {
    /// Fail the parse.
    #[default]
    Error,
    /// Leave the token for the wrapped element.
    Ignore,
    /// Bind `true` (or the inline `=value`) under the flag name.
    AcceptNonValue,
    /// Bind the inline `=value` or the following token under the flag name.
    AcceptValue,
}

struct FlagUsage {
    names: Vec<String>,
    element: Arc<dyn CommandElement>,
    takes_value: bool,
}

/// Collects flag definitions, then wraps a positional element.
#[derive(Default)]
pub struct CommandFlagsBuilder {
    short: BTreeMap<char, Arc<dyn CommandElement>>,
    long: BTreeMap<String, Arc<dyn CommandElement>>,
    usage: Vec<FlagUsage>,
    unknown_long: UnknownFlagBehavior,
    unknown_short: UnknownFlagBehavior,
    anchored: bool,
}

impl CommandFlagsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A boolean flag, bound as `true` when present.
    ///
    /// Specs starting with `-` name a long flag (`"-all"` is `--all`); any
    /// other spec is a run of short flags (`"a"` is `-a`). The first spec
    /// names the key.
    #[must_use]
    pub fn flag(self, specs: &[&str]) -> Self {
        let element: Element = Box::new(MarkTrue::new(flag_key(specs)));
        self.register(Arc::from(element), specs, false)
    }

    /// A boolean flag only sources holding `permission` may pass.
    #[must_use]
    pub fn permission_flag(self, permission: impl Into<String>, specs: &[&str]) -> Self {
        let element: Element = Box::new(RequiringPermission::new(
            Box::new(MarkTrue::new(flag_key(specs))),
            permission,
        ));
        self.register(Arc::from(element), specs, false)
    }

    /// A flag whose value `element` parses from the following token.
    #[must_use]
    pub fn value_flag(self, element: Element, specs: &[&str]) -> Self {
        self.register(Arc::from(element), specs, true)
    }

    #[must_use]
    pub fn unknown_long_flags(mut self, behavior: UnknownFlagBehavior) -> Self {
        self.unknown_long = behavior;
        self
    }

    #[must_use]
    pub fn unknown_short_flags(mut self, behavior: UnknownFlagBehavior) -> Self {
        self.unknown_short = behavior;
        self
    }

    /// Only accept flags before the first positional token.
    #[must_use]
    pub fn anchor_flags(mut self, anchored: bool) -> Self {
        self.anchored = anchored;
        self
    }

    /// Flags wrapping `child`.
    pub fn build_with(self, child: Element) -> Element {
        Box::new(CommandFlags {
            short: self.short,
            long: self.long,
            usage: self.usage,
            unknown_long: self.unknown_long,
            unknown_short: self.unknown_short,
            anchored: self.anchored,
            child,
        })
    }

    /// Flags with no positional arguments.
    pub fn build(self) -> Element {
        self.build_with(Box::new(NoneElement))
    }

    fn register(
        mut self,
        element: Arc<dyn CommandElement>,
        specs: &[&str],
        takes_value: bool,
    ) -> Self {
        let mut names = Vec::new();
        for spec in specs {
            if let Some(long) = spec.strip_prefix('-') {
                let long = long.to_lowercase();
                names.push(format!("--{long}"));
                self.long.insert(long, Arc::clone(&element));
            } else {
                for short in spec.chars() {
                    names.push(format!("-{short}"));
                    self.short.insert(short, Arc::clone(&element));
                }
            }
        }
        self.usage.push(FlagUsage {
            names,
            element,
            takes_value,
        });
        self
    }
}

fn flag_key(specs: &[&str]) -> String {
    match specs.first() {
        Some(spec) => match spec.strip_prefix('-') {
            Some(long) => long.to_lowercase(),
            None => spec.chars().take(1).collect(),
        },
        None => String::new(),
    }
}

/// Short flag groups start with a single `-` followed by a non-digit, so
/// negative numbers stay positional.
fn is_short_group(token: &str) -> bool {
    token
        .strip_prefix('-')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|first| first != '-' && !first.is_ascii_digit())
}

fn is_long_flag(token: &str) -> bool {
    token.len() > 2 && token.starts_with("--")
}

/// Element produced by [`CommandFlagsBuilder`].
pub struct CommandFlags {
    short: BTreeMap<char, Arc<dyn CommandElement>>,
    long: BTreeMap<String, Arc<dyn CommandElement>>,
    usage: Vec<FlagUsage>,
    unknown_long: UnknownFlagBehavior,
    unknown_short: UnknownFlagBehavior,
    anchored: bool,
    child: Element,
}

impl CommandFlags {
    /// Parses the flag in `token`, which was just consumed.
    ///
    /// Returns whether the token was taken as a flag; `None` means the token
    /// is positional.
    fn parse_flag(
        &self,
        token: &str,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<Option<bool>> {
        if is_long_flag(token) {
            self.parse_long(&token[2..], source, args, context).map(Some)
        } else if is_short_group(token) {
            self.parse_short(&token[1..], source, args, context).map(Some)
        } else {
            Ok(None)
        }
    }

    fn parse_long(
        &self,
        flag: &str,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<bool> {
        let (name, inline) = match flag.split_once('=') {
            Some((name, value)) => (name.to_lowercase(), Some(value)),
            None => (flag.to_lowercase(), None),
        };
        let Some(element) = self.long.get(&name) else {
            return match self.unknown_long {
                UnknownFlagBehavior::Error => {
                    Err(args.create_error(format!("Unknown long flag {name} specified")))
                }
                UnknownFlagBehavior::Ignore => Ok(false),
                UnknownFlagBehavior::AcceptNonValue => {
                    let value = inline.map_or(Value::Bool(true), Value::from);
                    context.put_arg(name, value);
                    Ok(true)
                }
                UnknownFlagBehavior::AcceptValue => {
                    let value = match inline {
                        Some(value) => value.to_string(),
                        None => args.next()?,
                    };
                    context.put_arg(name, value);
                    Ok(true)
                }
            };
        };
        if let Some(value) = inline {
            args.insert_arg(value);
        }
        tracing::trace!(flag = %name, "parsing long flag");
        element.parse(source, args, context)?;
        Ok(true)
    }

    fn parse_short(
        &self,
        flags: &str,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<bool> {
        for (index, flag) in flags.chars().enumerate() {
            if let Some(element) = self.short.get(&flag) {
                element.parse(source, args, context)?;
                continue;
            }
            match self.unknown_short {
                UnknownFlagBehavior::Ignore if index == 0 => return Ok(false),
                UnknownFlagBehavior::Error | UnknownFlagBehavior::Ignore => {
                    return Err(args.create_error(format!("Unknown short flag {flag} specified")));
                }
                UnknownFlagBehavior::AcceptNonValue => context.put_arg(flag.to_string(), true),
                UnknownFlagBehavior::AcceptValue => {
                    let value = args.next()?;
                    context.put_arg(flag.to_string(), value);
                }
            }
        }
        Ok(true)
    }

    /// Element parsing the value of the flag in `token`, if known.
    fn value_element(&self, token: &str) -> Option<&Arc<dyn CommandElement>> {
        if is_long_flag(token) {
            self.long.get(&token[2..].to_lowercase())
        } else if is_short_group(token) {
            token.chars().last().and_then(|flag| self.short.get(&flag))
        } else {
            None
        }
    }

    fn flag_names(&self, prefix: &str) -> Vec<String> {
        filter_prefix(
            self.usage
                .iter()
                .flat_map(|flag| flag.names.iter().map(String::as_str)),
            prefix,
        )
    }
}

impl CommandElement for CommandFlags {
    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        _args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        Ok(None)
    }

    fn parse(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<()> {
        let start = args.cursor();
        while let Some(token) = args.next_if_present() {
            let index = args.cursor() - 1;
            match self.parse_flag(&token, source, args, context)? {
                Some(true) => args.remove_args(index, args.cursor()),
                Some(false) => {}
                None if self.anchored => break,
                None => {}
            }
        }
        args.set_cursor(start);
        self.child.parse(source, args, context)
    }

    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        let start = args.cursor();
        while let Some(token) = args.next_if_present() {
            let index = args.cursor() - 1;
            if !args.has_next() && token.starts_with('-') {
                return self.flag_names(&token);
            }
            let checkpoint = Checkpoint::take(args, context);
            match self.parse_flag(&token, source, args, context) {
                Ok(Some(true)) if args.has_next() => args.remove_args(index, args.cursor()),
                Ok(Some(false)) => {}
                Ok(None) if self.anchored => break,
                Ok(None) => {}
                // The flag's value is the token being completed.
                Ok(Some(true)) | Err(_) => {
                    checkpoint.rollback(args, context);
                    return match self.value_element(&token) {
                        Some(element) => element.complete(source, args, context),
                        None => Vec::new(),
                    };
                }
            }
        }
        args.set_cursor(start);
        self.child.complete(source, args, context)
    }

    fn usage(&self, source: &dyn CommandSource) -> String {
        let mut parts: Vec<String> = self
            .usage
            .iter()
            .map(|flag| {
                let names = flag.names.join("|");
                if flag.takes_value {
                    format!("[{names} {}]", flag.element.usage(source))
                } else {
                    format!("[{names}]")
                }
            })
            .collect();
        let child = self.child.usage(source);
        if !child.is_empty() {
            parts.push(child);
        }
        parts.join(" ")
    }
}
