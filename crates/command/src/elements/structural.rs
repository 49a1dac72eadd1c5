//! Elements that wrap or combine other elements.
//!
//! None of these read tokens themselves. They decide how, how often and
//! whether their children run, restoring [`CommandArgs`] and
//! [`CommandContext`] whenever a child's failure is absorbed so a failed
//! branch never leaves bindings behind.

use crate::args::CommandArgs;
use crate::context::CommandContext;
use crate::element::{Checkpoint, CommandElement, Element, bind};
use crate::error::{ArgumentParseError, ParseResult};
use crate::source::CommandSource;
use crate::value::Value;

// ============================================================================
// Leaves
// ============================================================================

/// Consumes nothing and binds nothing.
pub struct NoneElement;

impl CommandElement for NoneElement {
    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        _args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        Ok(None)
    }
}

/// Consumes nothing and binds `true` under its key.
pub struct MarkTrue {
    key: String,
}

impl MarkTrue {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl CommandElement for MarkTrue {
    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        _args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        Ok(Some(Value::Bool(true)))
    }

    fn usage(&self, _source: &dyn CommandSource) -> String {
        String::new()
    }
}

// ============================================================================
// Composites
// ============================================================================

/// Parses every child in order; the first failure aborts.
pub struct Sequence {
    elements: Vec<Element>,
}

impl Sequence {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }
}

impl CommandElement for Sequence {
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
        for element in &self.elements {
            element.parse(source, args, context)?;
        }
        Ok(())
    }

    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        let mut candidates = Vec::new();
        for element in &self.elements {
            let checkpoint = Checkpoint::take(args, context);
            match element.parse(source, args, context) {
                // Nothing consumed: offer its candidates, then let the next
                // element look at the same token.
                Ok(()) if !checkpoint.consumed(args) => {
                    let parsed = Checkpoint::take(args, context);
                    candidates.extend(element.complete(source, args, context));
                    parsed.rollback(args, context);
                }
                Ok(()) if args.has_next() => candidates.clear(),
                Ok(()) | Err(_) => {
                    checkpoint.rollback(args, context);
                    candidates.extend(element.complete(source, args, context));
                    break;
                }
            }
        }
        candidates
    }

    fn usage(&self, source: &dyn CommandSource) -> String {
        join_usages(&self.elements, source, " ")
    }
}

/// Tries each child in turn and keeps the first that parses.
///
/// Cursor and bindings are restored between attempts. When every child
/// fails, the last failure is returned.
pub struct FirstParsing {
    elements: Vec<Element>,
}

impl FirstParsing {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }
}

impl CommandElement for FirstParsing {
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
        let mut last_error = None;
        for element in &self.elements {
            let checkpoint = Checkpoint::take(args, context);
            match element.parse(source, args, context) {
                Ok(()) => return Ok(()),
                Err(error) => {
                    tracing::trace!(error = %error.message(), "alternative did not parse");
                    checkpoint.rollback(args, context);
                    last_error = Some(error);
                }
            }
        }
        last_error.map_or(Ok(()), Err)
    }

    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();
        for element in &self.elements {
            let checkpoint = Checkpoint::take(args, context);
            for candidate in element.complete(source, args, context) {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
            checkpoint.rollback(args, context);
        }
        candidates
    }

    fn usage(&self, source: &dyn CommandSource) -> String {
        join_usages(&self.elements, source, "|")
    }
}

// ============================================================================
// Decorators
// ============================================================================

/// Makes its child optional.
///
/// With no tokens left the child is skipped and the default, if any, is
/// bound. A failing child is skipped the same way when tokens remain after
/// the failure or the element is weak; otherwise the failure propagates so
/// malformed trailing input is not silently accepted.
pub struct Optional {
    element: Element,
    default: Option<Value>,
    weak: bool,
}

impl Optional {
    pub fn new(element: Element, default: Option<Value>, weak: bool) -> Self {
        Self {
            element,
            default,
            weak,
        }
    }

    fn bind_default(&self, context: &mut CommandContext) {
        if let (Some(key), Some(default)) = (self.element.key(), &self.default) {
            bind(context, key, default.clone());
        }
    }
}

impl CommandElement for Optional {
    fn key(&self) -> Option<&str> {
        self.element.key()
    }

    fn parse_value(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        if !args.has_next() {
            return Ok(self.default.clone());
        }
        let snapshot = args.snapshot();
        match self.element.parse_value(source, args) {
            Ok(value) => Ok(value),
            Err(_) if self.weak || args.has_next() => {
                args.restore(snapshot);
                Ok(self.default.clone())
            }
            Err(error) => Err(error),
        }
    }

    fn parse(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<()> {
        if !args.has_next() {
            self.bind_default(context);
            return Ok(());
        }
        let checkpoint = Checkpoint::take(args, context);
        match self.element.parse(source, args, context) {
            Ok(()) => Ok(()),
            Err(error) if self.weak || args.has_next() => {
                tracing::trace!(error = %error.message(), "optional element skipped");
                checkpoint.rollback(args, context);
                self.bind_default(context);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        self.element.complete(source, args, context)
    }

    fn usage(&self, source: &dyn CommandSource) -> String {
        let usage = self.element.usage(source);
        if usage.is_empty() {
            usage
        } else {
            format!("[{usage}]")
        }
    }
}

/// Parses its child exactly `times` times.
pub struct Repeated {
    element: Element,
    times: usize,
}

impl Repeated {
    pub fn new(element: Element, times: usize) -> Self {
        Self { element, times }
    }
}

impl CommandElement for Repeated {
    fn key(&self) -> Option<&str> {
        self.element.key()
    }

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
        for _ in 0..self.times {
            self.element.parse(source, args, context)?;
        }
        Ok(())
    }

    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        complete_repeatedly(&self.element, Some(self.times), source, args, context)
    }

    fn usage(&self, source: &dyn CommandSource) -> String {
        format!("{}*{}", self.times, self.element.usage(source))
    }
}

/// Parses its child until the input runs out.
pub struct AllOf {
    element: Element,
}

impl AllOf {
    pub fn new(element: Element) -> Self {
        Self { element }
    }
}

impl CommandElement for AllOf {
    fn key(&self) -> Option<&str> {
        self.element.key()
    }

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
        while args.has_next() {
            let before = (args.cursor(), args.len());
            self.element.parse(source, args, context)?;
            if (args.cursor(), args.len()) == before {
                break;
            }
        }
        Ok(())
    }

    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        complete_repeatedly(&self.element, None, source, args, context)
    }

    fn usage(&self, source: &dyn CommandSource) -> String {
        format!("{}+", self.element.usage(source))
    }
}

/// Fails when its child leaves more than one value under its key.
pub struct OnlyOne {
    element: Element,
}

impl OnlyOne {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    fn too_many(&self, args: &CommandArgs) -> ArgumentParseError {
        let key = self.element.key().unwrap_or_default();
        args.create_error(format!("Argument {key} may have only one value!"))
    }
}

impl CommandElement for OnlyOne {
    fn key(&self) -> Option<&str> {
        self.element.key()
    }

    fn parse_value(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        match self.element.parse_value(source, args)? {
            Some(Value::List(values)) if values.len() > 1 => Err(self.too_many(args)),
            value => Ok(value),
        }
    }

    fn parse(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<()> {
        self.element.parse(source, args, context)?;
        match self.element.key() {
            Some(key) if context.count(key) > 1 => Err(self.too_many(args)),
            _ => Ok(()),
        }
    }

    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        self.element.complete(source, args, context)
    }

    fn usage(&self, source: &dyn CommandSource) -> String {
        self.element.usage(source)
    }
}

/// Fails unless the source holds `permission`.
pub struct RequiringPermission {
    element: Element,
    permission: String,
}

impl RequiringPermission {
    pub fn new(element: Element, permission: impl Into<String>) -> Self {
        Self {
            element,
            permission: permission.into(),
        }
    }

    fn check(&self, source: &dyn CommandSource, args: &CommandArgs) -> ParseResult<()> {
        if source.has_permission(&self.permission) {
            return Ok(());
        }
        tracing::debug!(
            source = source.name(),
            permission = %self.permission,
            "argument permission denied"
        );
        let name = self
            .element
            .key()
            .map_or_else(|| self.element.usage(source), str::to_string);
        Err(args.create_error(format!(
            "You do not have permission to use the {name} argument"
        )))
    }
}

impl CommandElement for RequiringPermission {
    fn key(&self) -> Option<&str> {
        self.element.key()
    }

    fn parse_value(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        self.check(source, args)?;
        self.element.parse_value(source, args)
    }

    fn parse(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> ParseResult<()> {
        self.check(source, args)?;
        self.element.parse(source, args, context)
    }

    fn complete(
        &self,
        source: &dyn CommandSource,
        args: &mut CommandArgs,
        context: &mut CommandContext,
    ) -> Vec<String> {
        if source.has_permission(&self.permission) {
            self.element.complete(source, args, context)
        } else {
            Vec::new()
        }
    }

    fn usage(&self, source: &dyn CommandSource) -> String {
        self.element.usage(source)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn join_usages(elements: &[Element], source: &dyn CommandSource, separator: &str) -> String {
    elements
        .iter()
        .map(|element| element.usage(source))
        .filter(|usage| !usage.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Parses `element` until it fails or reaches the last token, then
/// completes that token. `times` caps the repetitions.
fn complete_repeatedly(
    element: &Element,
    times: Option<usize>,
    source: &dyn CommandSource,
    args: &mut CommandArgs,
    context: &mut CommandContext,
) -> Vec<String> {
    let mut remaining = times;
    while remaining != Some(0) {
        let checkpoint = Checkpoint::take(args, context);
        match element.parse(source, args, context) {
            Ok(()) if args.has_next() && checkpoint.consumed(args) => {
                remaining = remaining.map(|n| n - 1);
            }
            _ => {
                checkpoint.rollback(args, context);
                return element.complete(source, args, context);
            }
        }
    }
    Vec::new()
}
