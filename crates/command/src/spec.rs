//! A complete command: grammar, permission and tokenizer.

use crate::args::CommandArgs;
use crate::context::CommandContext;
use crate::element::{CommandElement, Element};
use crate::error::CommandError;
use crate::source::CommandSource;
use crate::tokenizer::Tokenizer;

/// Everything needed to turn a raw input line into a [`CommandContext`].
pub struct CommandSpec {
    element: Element,
    permission: Option<String>,
    description: Option<String>,
    tokenizer: Tokenizer,
}

impl CommandSpec {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            permission: None,
            description: None,
            tokenizer: Tokenizer::default(),
        }
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn test_permission(&self, source: &dyn CommandSource) -> Result<(), CommandError> {
        match &self.permission {
            Some(permission) if !source.has_permission(permission) => {
                Err(CommandError::PermissionDenied {
                    permission: permission.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Parses `input` for `source`.
    ///
    /// The whole input must be consumed; leftovers fail with
    /// "Too many arguments!". Parse errors carry this command's usage.
    pub fn parse(
        &self,
        source: &dyn CommandSource,
        input: &str,
    ) -> Result<CommandContext, CommandError> {
        self.test_permission(source)?;
        let usage = self.usage(source);

        let tokens = self
            .tokenizer
            .tokenize(input, false)
            .map_err(|error| error.with_usage(usage.clone()))?;
        let mut args = CommandArgs::new(input, tokens);
        let mut context = CommandContext::new();

        self.element
            .parse(source, &mut args, &mut context)
            .map_err(|error| error.with_usage(usage.clone()))?;
        if args.has_next() {
            args.next_if_present();
            return Err(args.create_error("Too many arguments!").with_usage(usage).into());
        }

        tracing::debug!(source = source.name(), input, "parsed command");
        Ok(context)
    }

    /// Completion candidates for the last word of `input`.
    pub fn complete(&self, source: &dyn CommandSource, input: &str) -> Vec<String> {
        if self.test_permission(source).is_err() {
            return Vec::new();
        }
        let tokens = self.tokenizer.tokenize_partial(input);
        let mut args = CommandArgs::new(input, tokens);
        let mut context = CommandContext::new();
        self.element.complete(source, &mut args, &mut context)
    }

    pub fn usage(&self, source: &dyn CommandSource) -> String {
        self.element.usage(source)
    }
}
