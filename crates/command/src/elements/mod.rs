//! Built-in command elements.
//!
//! - [`structural`]: sequences, fallbacks and decorators over other elements
//! - [`values`]: strings, numbers, booleans, choices and literals
//! - [`flags`]: `-f`/`--flag` extraction around a positional element
//!
//! Most callers build grammars through the shorthand functions in
//! [`crate::builder`].

pub mod flags;
pub mod structural;
pub mod values;

pub use flags::{CommandFlags, CommandFlagsBuilder, UnknownFlagBehavior};
pub use structural::{
    AllOf, FirstParsing, MarkTrue, NoneElement, OnlyOne, Optional, RequiringPermission, Repeated,
    Sequence,
};
pub use values::{
    BooleanElement, ChoiceUsage, Choices, Literal, NumberElement, NumberKind,
    RemainingJoinedStrings, StringElement, enum_choices,
};
