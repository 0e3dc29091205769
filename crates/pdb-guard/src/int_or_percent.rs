//! Thresholds expressed either as an absolute number of replicas or as a
//! percentage of the replica count.
//!
//! A [`IntOrPercent`] never carries a resolved number. The total it is resolved
//! against is only known once a budget is matched with a concrete workload, so
//! resolution always happens fresh through [`IntOrPercent::resolve`].
use std::{fmt::Display, num::ParseIntError, str::FromStr};

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use snafu::{ResultExt, Snafu, ensure};

type Result<T, E = ParseIntOrPercentError> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Snafu)]
pub enum ParseIntOrPercentError {
    #[snafu(display("literal value {value} must not be negative"))]
    NegativeLiteral { value: i64 },

    #[snafu(display("failed to parse literal value {input:?}"))]
    InvalidLiteral {
        source: ParseIntError,
        input: String,
    },

    #[snafu(display("invalid value {input:?}, string values must be a percentage like \"50%\""))]
    NotAPercentage { input: String },

    #[snafu(display("failed to parse percentage {input:?}"))]
    InvalidPercentage {
        source: ParseIntError,
        input: String,
    },

    #[snafu(display("percentage {input:?} must be between 0% and 100%"))]
    PercentageOutOfRange { input: String },
}

/// Controls how a percentage that does not divide the total evenly is turned
/// into a whole number of replicas.
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Rounding {
    /// Round towards the next whole replica, e.g. 50% of 3 is 2.
    ///
    /// This matches what the Kubernetes disruption controller does.
    #[default]
    Up,

    /// Round towards zero, e.g. 50% of 3 is 1.
    Down,
}

/// A threshold which is either a literal replica count or a percentage of the
/// total replica count.
///
/// The [`Display`] implementation renders the value in its textual manifest
/// form, `5` or `50%`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntOrPercent {
    Literal(u32),
    Percentage(u8),
}

impl IntOrPercent {
    /// The upper bound (inclusive) of a [`IntOrPercent::Percentage`].
    pub const MAX_PERCENTAGE: u8 = 100;

    /// Resolves the threshold to a number of replicas out of `total`.
    ///
    /// Literal values are returned as is. Percentages are scaled to `total`
    /// and rounded according to `rounding`. The computation is done with
    /// integers only, so `resolve(Percentage(p), total, Rounding::Up)` is
    /// exactly `ceil(p * total / 100)`.
    pub fn resolve(&self, total: u32, rounding: Rounding) -> i64 {
        match *self {
            Self::Literal(value) => i64::from(value),
            Self::Percentage(percentage) => {
                let scaled = i64::from(percentage) * i64::from(total);
                let divisor = i64::from(Self::MAX_PERCENTAGE);

                match rounding {
                    Rounding::Up => (scaled + divisor - 1) / divisor,
                    Rounding::Down => scaled / divisor,
                }
            }
        }
    }

    fn parse_percentage(input: &str) -> Result<Self> {
        let Some(number) = input.strip_suffix('%') else {
            return NotAPercentageSnafu { input }.fail();
        };

        let percentage = number
            .parse::<u8>()
            .context(InvalidPercentageSnafu { input })?;
        ensure!(
            percentage <= Self::MAX_PERCENTAGE,
            PercentageOutOfRangeSnafu { input }
        );

        Ok(Self::Percentage(percentage))
    }
}

impl Display for IntOrPercent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Percentage(percentage) => write!(f, "{percentage}%"),
        }
    }
}

impl FromStr for IntOrPercent {
    type Err = ParseIntOrPercentError;

    /// Parses `50%` as a percentage and `5` as a literal.
    fn from_str(input: &str) -> Result<Self> {
        if input.ends_with('%') {
            return Self::parse_percentage(input);
        }

        let value = input
            .parse::<i64>()
            .context(InvalidLiteralSnafu { input })?;
        let value = u32::try_from(value).map_err(|_| NegativeLiteralSnafu { value }.build())?;

        Ok(Self::Literal(value))
    }
}

impl TryFrom<&IntOrString> for IntOrPercent {
    type Error = ParseIntOrPercentError;

    /// Converts the Kubernetes representation.
    ///
    /// In line with the API server, string values are only accepted when they
    /// are percentages. A quoted number like `"5"` is rejected.
    fn try_from(value: &IntOrString) -> Result<Self> {
        match value {
            IntOrString::Int(value) => u32::try_from(*value)
                .map(Self::Literal)
                .map_err(|_| {
                    NegativeLiteralSnafu {
                        value: i64::from(*value),
                    }
                    .build()
                }),
            IntOrString::String(input) => Self::parse_percentage(input),
        }
    }
}

/// An [`IntOrPercent`] together with the text it was read from.
///
/// Messages about a threshold quote it the way it was written in the
/// manifest, so `"0100%"` is shown as `0100%` and not as `100%`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntOrPercentInput {
    pub value: IntOrPercent,
    pub input: String,
}

impl Display for IntOrPercentInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.input)
    }
}

impl From<IntOrPercent> for IntOrPercentInput {
    fn from(value: IntOrPercent) -> Self {
        Self {
            input: value.to_string(),
            value,
        }
    }
}

impl FromStr for IntOrPercentInput {
    type Err = ParseIntOrPercentError;

    fn from_str(input: &str) -> Result<Self> {
        Ok(Self {
            value: input.parse()?,
            input: input.to_owned(),
        })
    }
}

impl TryFrom<&IntOrString> for IntOrPercentInput {
    type Error = ParseIntOrPercentError;

    fn try_from(value: &IntOrString) -> Result<Self> {
        let input = match value {
            IntOrString::Int(value) => value.to_string(),
            IntOrString::String(input) => input.clone(),
        };

        Ok(Self {
            value: IntOrPercent::try_from(value)?,
            input,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(IntOrPercent::Literal(0), 3, 0)]
    #[case(IntOrPercent::Literal(5), 3, 5)]
    #[case(IntOrPercent::Percentage(50), 3, 2)]
    #[case(IntOrPercent::Percentage(90), 3, 3)]
    #[case(IntOrPercent::Percentage(100), 3, 3)]
    #[case(IntOrPercent::Percentage(34), 3, 2)]
    #[case(IntOrPercent::Percentage(33), 3, 1)]
    #[case(IntOrPercent::Percentage(0), 3, 0)]
    #[case(IntOrPercent::Percentage(1), 1, 1)]
    fn resolve_rounding_up(
        #[case] threshold: IntOrPercent,
        #[case] total: u32,
        #[case] expected: i64,
    ) {
        assert_eq!(threshold.resolve(total, Rounding::Up), expected);
    }

    #[rstest]
    #[case(IntOrPercent::Percentage(50), 3, 1)]
    #[case(IntOrPercent::Percentage(90), 3, 2)]
    #[case(IntOrPercent::Percentage(100), 3, 3)]
    #[case(IntOrPercent::Percentage(1), 1, 0)]
    #[case(IntOrPercent::Literal(2), 3, 2)]
    fn resolve_rounding_down(
        #[case] threshold: IntOrPercent,
        #[case] total: u32,
        #[case] expected: i64,
    ) {
        assert_eq!(threshold.resolve(total, Rounding::Down), expected);
    }

    #[test]
    fn resolve_matches_ceiling_of_scaled_percentage() {
        for percentage in 0..=IntOrPercent::MAX_PERCENTAGE {
            for total in 1..=50u32 {
                let expected = (f64::from(u32::from(percentage) * total) / 100.0).ceil() as i64;
                let threshold = IntOrPercent::Percentage(percentage);

                assert_eq!(
                    threshold.resolve(total, Rounding::Up),
                    expected,
                    "{threshold} of {total}"
                );
                assert_eq!(
                    threshold.resolve(total, Rounding::Up),
                    threshold.resolve(total, Rounding::Up)
                );
            }
        }
    }

    #[rstest]
    #[case("5", IntOrPercent::Literal(5))]
    #[case("0", IntOrPercent::Literal(0))]
    #[case("50%", IntOrPercent::Percentage(50))]
    #[case("100%", IntOrPercent::Percentage(100))]
    #[case("0%", IntOrPercent::Percentage(0))]
    fn parse_valid(#[case] input: &str, #[case] expected: IntOrPercent) {
        assert_eq!(IntOrPercent::from_str(input).unwrap(), expected);
    }

    #[rstest]
    #[case("-1")]
    #[case("abc")]
    #[case("101%")]
    #[case("-10%")]
    #[case("%")]
    #[case("fifty%")]
    fn parse_invalid(#[case] input: &str) {
        assert!(IntOrPercent::from_str(input).is_err());
    }

    #[test]
    fn negative_literal_error() {
        assert_eq!(
            IntOrPercent::from_str("-3"),
            Err(ParseIntOrPercentError::NegativeLiteral { value: -3 })
        );
        assert_eq!(
            IntOrPercent::try_from(&IntOrString::Int(-1)),
            Err(ParseIntOrPercentError::NegativeLiteral { value: -1 })
        );
    }

    #[rstest]
    #[case(IntOrString::Int(3), IntOrPercent::Literal(3))]
    #[case(IntOrString::String("25%".to_owned()), IntOrPercent::Percentage(25))]
    fn from_int_or_string(#[case] input: IntOrString, #[case] expected: IntOrPercent) {
        assert_eq!(IntOrPercent::try_from(&input).unwrap(), expected);
    }

    #[test]
    fn quoted_number_is_not_a_percentage() {
        assert_eq!(
            IntOrPercent::try_from(&IntOrString::String("5".to_owned())),
            Err(ParseIntOrPercentError::NotAPercentage {
                input: "5".to_owned()
            })
        );
    }

    #[rstest]
    #[case(IntOrPercent::Literal(5), "5")]
    #[case(IntOrPercent::Percentage(90), "90%")]
    fn display_textual_form(#[case] threshold: IntOrPercent, #[case] expected: &str) {
        assert_eq!(threshold.to_string(), expected);
    }

    #[rstest]
    #[case(IntOrString::Int(5), IntOrPercent::Literal(5), "5")]
    #[case(IntOrString::String("50%".to_owned()), IntOrPercent::Percentage(50), "50%")]
    #[case(IntOrString::String("0100%".to_owned()), IntOrPercent::Percentage(100), "0100%")]
    #[case(IntOrString::String("+5%".to_owned()), IntOrPercent::Percentage(5), "+5%")]
    fn input_keeps_manifest_text(
        #[case] raw: IntOrString,
        #[case] expected_value: IntOrPercent,
        #[case] expected_text: &str,
    ) {
        let input = IntOrPercentInput::try_from(&raw).unwrap();

        assert_eq!(input.value, expected_value);
        assert_eq!(input.to_string(), expected_text);
    }

    #[test]
    fn input_from_str() {
        let input: IntOrPercentInput = "090%".parse().unwrap();

        assert_eq!(input, IntOrPercentInput {
            value: IntOrPercent::Percentage(90),
            input: "090%".to_owned(),
        });
        assert_eq!(
            IntOrPercentInput::from(IntOrPercent::Literal(2)).to_string(),
            "2"
        );
        assert!("many".parse::<IntOrPercentInput>().is_err());
    }

    #[rstest]
    #[case("up", Rounding::Up)]
    #[case("down", Rounding::Down)]
    fn parse_rounding(#[case] input: &str, #[case] expected: Rounding) {
        assert_eq!(Rounding::from_str(input).unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }
}
