//! Core element trait.
//!
//! A [`CommandElement`] consumes tokens from [`CommandArgs`] and binds what it
//! parsed into a [`CommandContext`]. Elements compose: sequences, fallbacks,
//! optional and repeated elements all wrap other elements, the same way
//! composite nodes wrap children in a tree.

use std::sync::Arc;

use crate::args::{ArgsSnapshot, CommandArgs};
use crate::context::{CommandContext, ContextSnapshot};
use crate::error::ParseResult;
use crate::source::CommandSource;
use crate::value::Value;

/// Boxed element, the unit the builder functions hand around.
pub type Element = Box<dyn CommandElement>;

/// One piece of a command's argument grammar.
pub trait CommandElement: Send + Sync {
    /// Key values are bound under, if the element binds anything.
    fn key(&self) -> Option<&str> {
        None
    }

    /// Reads a value without binding it.
    ///
    /// `Ok(None)` means the element consumed input but has nothing to bind.
    fn parse_value(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>>;

    /// Reads a value and binds it under [`CommandElement::key`].
    ///
    /// A [`Value::List`] binds each of its items separately.
    fn parse(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<()> {
        let value = self.parse_value(source, args)?;
        if let (Some(key), Some(value)) = (self.key(), value) {
            bind(context, key, value);
        }
        Ok(())
    }

    /// Candidates for the token under the cursor.
    fn complete(
        &self,
        _source: &dyn CommandSource,
        _args: &mut CommandArgs,
        _context: &mut CommandContext,
    ) -> Vec<String> {
        Vec::new()
    }

    /// Human-readable usage, `<key>` unless overridden.
    fn usage(&self, _source: &dyn CommandSource) -> String {
        self.key().map(|key| format!("<{key}>")).unwrap_or_default()
    }
}

/// Binds `value` under `key`, spreading lists.
pub(crate) fn bind(context: &mut CommandContext, key: &str, value: Value) {
    match value {
        Value::List(values) => {
            for value in values {
                context.put_arg(key, value);
            }
        }
        value => context.put_arg(key, value),
    }
}

impl CommandElement for Box<dyn CommandElement> {
    #[inline]
    fn key(&self) -> Option<&str> {
        (**self).key()
    }

    #[inline]
    fn parse_value(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        (**self).parse_value(source, args)
    }

    #[inline]
    fn parse(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<()> {
        (**self).parse(source, args, context)
    }

    #[inline]
    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        (**self).complete(source, args, context)
    }

    #[inline]
    fn usage(&self, source: &dyn CommandSource) -> String {
        (**self).usage(source)
    }
}

impl CommandElement for Arc<dyn CommandElement> {
    #[inline]
    fn key(&self) -> Option<&str> {
        (**self).key()
    }

    #[inline]
    fn parse_value(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        (**self).parse_value(source, args)
    }

    #[inline]
    fn parse(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<()> {
        (**self).parse(source, args, context)
    }

    #[inline]
    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        (**self).complete(source, args, context)
    }

    #[inline]
    fn usage(&self, source: &dyn CommandSource) -> String {
        (**self).usage(source)
    }
}

/// Keeps the candidates that start with `prefix`, ignoring case.
pub(crate) fn filter_prefix<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    prefix: &str,
) -> Vec<String> {
    let prefix = prefix.to_lowercase();
    candidates
        .into_iter()
        .filter(|candidate| candidate.to_lowercase().starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

/// Cursor, tokens and bindings saved before a branch that may backtrack.
#[derive(Clone)]
pub(crate) struct Checkpoint {
    args: ArgsSnapshot,
    context: ContextSnapshot,
}

impl Checkpoint {
    pub(crate) fn take(args: &CommandArgs, context: &CommandContext) -> Self {
        Self {
            args: args.snapshot(),
            context: context.snapshot(),
        }
    }

    /// Whether anything ran since the checkpoint consumed a token.
    pub(crate) fn consumed(&self, args: &CommandArgs) -> bool {
        args.cursor() != self.args.cursor() || args.len() != self.args.token_count()
    }

    pub(crate) fn rollback(self, args: &mut CommandArgs, context: &mut CommandContext) {
        args.restore(self.args);
        context.restore(self.context);
    }
}
