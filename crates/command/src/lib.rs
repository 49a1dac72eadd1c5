//! Combinator-style parsing of textual command arguments.
//!
//! A command line is split by a [`Tokenizer`] into positioned tokens, walked
//! by a [`CommandArgs`] cursor, and parsed by a tree of [`CommandElement`]s
//! that bind values into a [`CommandContext`].
//!
//! # Architecture
//!
//! - [`CommandElement`]: core trait for every grammar node
//! - [`builder`]: shorthand constructors (`seq`, `first_parsing`, `optional`, ...)
//! - [`elements`]: the built-in element types, including [`CommandFlags`]
//! - [`CommandSpec`]: a whole command, checking permission and leftovers
//!
//! Failed branches restore both the cursor and the bindings, so a
//! [`CommandContext`] only ever holds values from branches that parsed.

pub mod args;
pub mod builder;
pub mod context;
pub mod element;
pub mod elements;
pub mod error;
pub mod source;
pub mod spec;
pub mod tokenizer;
pub mod value;

pub use args::{ArgsSnapshot, CommandArgs, SingleArg};
pub use context::{CommandContext, ContextSnapshot};
pub use element::{CommandElement, Element};
pub use elements::{ChoiceUsage, CommandFlags, CommandFlagsBuilder, UnknownFlagBehavior};
pub use error::{ArgumentParseError, CommandError, ParseResult};
pub use source::{CommandSource, Console};
pub use spec::CommandSpec;
pub use tokenizer::Tokenizer;
pub use value::{FromValue, Value};
