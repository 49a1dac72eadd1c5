//! Shorthand constructors for command grammars.
//!
//! Instead of writing `Box::new(Sequence::new(vec![...]))`, grammars are
//! assembled from these functions:
//!
//! ```
//! use command_core::builder::{integer, optional_with_default, seq, string};
//!
//! let give = seq(vec![
//!     string("player"),
//!     string("item"),
//!     optional_with_default(integer("amount"), 1),
//! ]);
//! ```

use strum::IntoEnumIterator;

use crate::element::Element;
use crate::elements::{
    AllOf, BooleanElement, ChoiceUsage, Choices, CommandFlagsBuilder, FirstParsing, Literal,
    MarkTrue, NoneElement, NumberElement, NumberKind, OnlyOne, Optional, RemainingJoinedStrings,
    Repeated, RequiringPermission, Sequence, StringElement, enum_choices,
};
use crate::value::Value;

/// Consumes nothing.
#[inline]
pub fn none() -> Element {
    Box::new(NoneElement)
}

/// Binds `true` under `key` without consuming input.
#[inline]
pub fn mark_true(key: impl Into<String>) -> Element {
    Box::new(MarkTrue::new(key))
}

/// Parses every element in order.
#[inline]
pub fn seq(elements: Vec<Element>) -> Element {
    Box::new(Sequence::new(elements))
}

/// Keeps the first element that parses.
#[inline]
pub fn first_parsing(elements: Vec<Element>) -> Element {
    Box::new(FirstParsing::new(elements))
}

/// One of `choices`, matched exactly.
pub fn choices<S: Into<String>>(key: impl Into<String>, choices: Vec<(S, Value)>) -> Element {
    Box::new(build_choices(key, choices))
}

/// One of `choices`, matched ignoring case.
pub fn choices_insensitive<S: Into<String>>(
    key: impl Into<String>,
    choices: Vec<(S, Value)>,
) -> Element {
    Box::new(build_choices(key, choices).case_insensitive())
}

/// One of `choices`, with explicit control over the usage text.
pub fn choices_with_usage<S: Into<String>>(
    key: impl Into<String>,
    choices: Vec<(S, Value)>,
    usage: ChoiceUsage,
) -> Element {
    Box::new(build_choices(key, choices).with_usage(usage))
}

fn build_choices<S: Into<String>>(key: impl Into<String>, choices: Vec<(S, Value)>) -> Choices {
    Choices::new(
        key,
        choices
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect(),
    )
}

/// The words `expected`, binding `value` under `key`.
pub fn literal(key: impl Into<String>, value: impl Into<Value>, expected: &[&str]) -> Element {
    Box::new(Literal::new(
        key,
        value.into(),
        expected.iter().map(|word| (*word).to_string()).collect(),
    ))
}

/// A variant of `E` by name, ignoring case.
pub fn enum_value<E>(key: impl Into<String>) -> Element
where
    E: IntoEnumIterator + AsRef<str> + Send + Sync + 'static,
{
    Box::new(enum_choices::<E>(key))
}

/// One token.
#[inline]
pub fn string(key: impl Into<String>) -> Element {
    Box::new(StringElement::new(key))
}

/// Every remaining token, joined with spaces.
#[inline]
pub fn remaining_joined_strings(key: impl Into<String>) -> Element {
    Box::new(RemainingJoinedStrings::new(key, false))
}

/// The rest of the raw input, exactly as typed.
#[inline]
pub fn remaining_raw_joined_strings(key: impl Into<String>) -> Element {
    Box::new(RemainingJoinedStrings::new(key, true))
}

#[inline]
pub fn integer(key: impl Into<String>) -> Element {
    Box::new(NumberElement::new(key, NumberKind::Integer))
}

#[inline]
pub fn long_num(key: impl Into<String>) -> Element {
    Box::new(NumberElement::new(key, NumberKind::Long))
}

#[inline]
pub fn double_num(key: impl Into<String>) -> Element {
    Box::new(NumberElement::new(key, NumberKind::Double))
}

#[inline]
pub fn boolean(key: impl Into<String>) -> Element {
    Box::new(BooleanElement::new(key))
}

/// `element` or nothing; failures with input left over are skipped.
#[inline]
pub fn optional(element: Element) -> Element {
    Box::new(Optional::new(element, None, false))
}

/// Like [`optional`], binding `default` when skipped.
#[inline]
pub fn optional_with_default(element: Element, default: impl Into<Value>) -> Element {
    Box::new(Optional::new(element, Some(default.into()), false))
}

/// `element` or nothing; every failure is skipped.
#[inline]
pub fn optional_weak(element: Element) -> Element {
    Box::new(Optional::new(element, None, true))
}

/// Like [`optional_weak`], binding `default` when skipped.
#[inline]
pub fn optional_weak_with_default(element: Element, default: impl Into<Value>) -> Element {
    Box::new(Optional::new(element, Some(default.into()), true))
}

/// `element` exactly `times` times.
#[inline]
pub fn repeated(element: Element, times: usize) -> Element {
    Box::new(Repeated::new(element, times))
}

/// `element` until the input runs out.
#[inline]
pub fn all_of(element: Element) -> Element {
    Box::new(AllOf::new(element))
}

/// `element`, rejecting more than one value under its key.
#[inline]
pub fn only_one(element: Element) -> Element {
    Box::new(OnlyOne::new(element))
}

/// `element`, only for sources holding `permission`.
#[inline]
pub fn requiring_permission(element: Element, permission: impl Into<String>) -> Element {
    Box::new(RequiringPermission::new(element, permission))
}

/// Starts a flag set; finish it with [`CommandFlagsBuilder::build_with`].
#[inline]
pub fn flags() -> CommandFlagsBuilder {
    CommandFlagsBuilder::new()
}
