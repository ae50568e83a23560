use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;

use crate::table::is_missing;

/// Sample number of any width
///
/// Held as its decimal digits without leading zeros, so numbers
/// wider than any integer type still order numerically: shorter
/// digit strings are smaller, equal lengths compare lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleNumber(String);

impl SampleNumber {
    pub fn zero() -> Self {
        Self(String::from("0"))
    }
    fn from_digits(digits: &str) -> Self {
        match digits.trim_start_matches('0') {
            "" => Self::zero(),
            trimmed => Self(trimmed.to_string()),
        }
    }
}
impl Ord for SampleNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}
impl PartialOrd for SampleNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq<u64> for SampleNumber {
    fn eq(&self, other: &u64) -> bool {
        self.0 == other.to_string()
    }
}
impl fmt::Display for SampleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric ordering key of a sample identifier
///
/// Identifiers are split on underscores and the parts are scanned
/// from last to first; the first part made only of decimal digits
/// is the sample number. Identifiers without an underscore, or
/// without any numeric part, have key zero.
///
/// ```
/// use virmerge::sample::sample_number;
///
/// assert_eq!(sample_number("sample_3"), 3);
/// assert_eq!(sample_number("sample_10_rep2"), 10);
/// assert_eq!(sample_number("control"), 0);
/// ```
pub fn sample_number(sample_id: &str) -> SampleNumber {
    if !sample_id.contains('_') {
        return SampleNumber::zero();
    }
    sample_id
        .rsplit('_')
        .find(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .map(SampleNumber::from_digits)
        .unwrap_or_else(SampleNumber::zero)
}

/// Sample numbers for a column of identifiers
pub fn sample_numbers(sample_ids: &[&str]) -> Vec<SampleNumber> {
    sample_ids.iter().map(|id| sample_number(id)).collect()
}

/// Distinct sample identifiers ordered by sample number
///
/// Identifiers sharing a number keep the order in which they
/// first appear. Missing identifiers are not samples.
pub fn sample_order(sample_ids: &[&str]) -> Vec<String> {
    let mut keyed: Vec<(SampleNumber, String)> = sample_ids
        .iter()
        .filter(|id| !is_missing(id))
        .unique()
        .map(|id| (sample_number(id), id.to_string()))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));

    keyed.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
#[cfg(not(tarpaulin_include))]
mod tests {

    use super::*;

    #[test]
    fn sample_number_trailing_token() {
        assert_eq!(sample_number("sample_3"), 3);
        assert_eq!(sample_number("batch_007"), 7);
        assert_eq!(sample_number("batch_000"), 0);
    }

    #[test]
    fn sample_number_rightmost_numeric_token() {
        assert_eq!(sample_number("sample_10_rep2"), 10);
        assert_eq!(sample_number("run2_sample_10"), 10);
        assert_eq!(sample_number("run_2_sample_10"), 10);
        assert_eq!(sample_number("run2_sample10"), 0);
    }

    #[test]
    fn sample_number_defaults_to_zero() {
        assert_eq!(sample_number("control"), 0);
        assert_eq!(sample_number("12"), 0);
        assert_eq!(sample_number("neg_control"), 0);
        assert_eq!(sample_number("sample_"), 0);
        assert_eq!(sample_number(""), 0);
    }

    #[test]
    fn sample_number_rejects_signed_and_decimal_tokens() {
        assert_eq!(sample_number("sample_-3"), 0);
        assert_eq!(sample_number("sample_3.5"), 0);
        assert_eq!(sample_number("sample_٣"), 0);
    }

    #[test]
    fn sample_number_wider_than_integers_orders_numerically() {
        let wide = sample_number("sample_99999999999999999999999");
        let wider = sample_number("sample_100000000000000000000000");
        let padded = sample_number("sample_0000000000000000000000000000012");

        assert_eq!(wide.to_string(), "99999999999999999999999");
        assert!(wide < wider);
        assert!(padded < wide);
        assert_eq!(padded, 12);
        assert!(sample_number("s_9") < sample_number("s_10"));
    }

    #[test]
    fn sample_order_by_number_then_first_appearance() {
        let ids = vec!["s_10", "s_2", "b_1", "a_1", "s_2", "control", ""];
        let order = sample_order(&ids);
        assert_eq!(order, vec!["control", "b_1", "a_1", "s_2", "s_10"]);
    }

    #[test]
    fn sample_order_ties_keep_load_order_against_lexical_order() {
        let ids = vec!["neg_ctrl", "blank", "sample_1", "neg_ctrl"];
        let order = sample_order(&ids);
        assert_eq!(order, vec!["neg_ctrl", "blank", "sample_1"]);
    }

    #[test]
    fn sample_order_skips_missing_identifiers() {
        let ids = vec!["s_2", "NA", "s_1", "nan"];
        assert_eq!(sample_order(&ids), vec!["s_1", "s_2"]);
    }
}
