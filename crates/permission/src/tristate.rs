//! Three-valued permission result.

/// The value bound to a permission node.
///
/// `Undefined` means "no opinion": resolution keeps looking at ancestors,
/// parents and defaults until something defined is found.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Tristate {
    True,
    False,
    #[default]
    Undefined,
}

impl Tristate {
    /// Converts a boolean into `True` or `False`.
    #[inline]
    pub const fn from_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }

    /// Returns `true` only for `True`.
    #[inline]
    pub const fn as_bool(self) -> bool {
        matches!(self, Self::True)
    }

    /// Returns `true` unless this is `Undefined`.
    #[inline]
    pub const fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Logical AND where `Undefined` defers to the other operand.
    pub const fn and(self, other: Self) -> Self {
        match self {
            Self::True => match other {
                Self::True | Self::Undefined => Self::True,
                Self::False => Self::False,
            },
            Self::False => Self::False,
            Self::Undefined => other,
        }
    }

    /// Logical OR where `Undefined` defers to the other operand.
    pub const fn or(self, other: Self) -> Self {
        match self {
            Self::True => Self::True,
            Self::False => match other {
                Self::True => Self::True,
                Self::False | Self::Undefined => Self::False,
            },
            Self::Undefined => other,
        }
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn and_defers_on_undefined() {
        assert_eq!(Tristate::Undefined.and(Tristate::False), Tristate::False);
        assert_eq!(Tristate::True.and(Tristate::Undefined), Tristate::True);
        assert_eq!(Tristate::True.and(Tristate::False), Tristate::False);
        assert_eq!(Tristate::False.and(Tristate::True), Tristate::False);
    }

    #[test]
    fn or_defers_on_undefined() {
        assert_eq!(Tristate::Undefined.or(Tristate::True), Tristate::True);
        assert_eq!(Tristate::False.or(Tristate::Undefined), Tristate::False);
        assert_eq!(Tristate::False.or(Tristate::True), Tristate::True);
        assert_eq!(Tristate::True.or(Tristate::False), Tristate::True);
    }

    #[test]
    fn only_true_is_truthy() {
        assert!(Tristate::True.as_bool());
        assert!(!Tristate::False.as_bool());
        assert!(!Tristate::Undefined.as_bool());
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Tristate::from_str("TRUE").unwrap(), Tristate::True);
        assert_eq!(Tristate::from_str("Undefined").unwrap(), Tristate::Undefined);
        assert!(Tristate::from_str("maybe").is_err());
        assert_eq!(Tristate::False.to_string(), "false");
    }
}
