//! Brazilian tax identifier validation and formatting.
//!
//! Individuals register with an 11-digit CPF, organizations with a 14-digit CNPJ.
//! Both carry two trailing modulo-11 check digits. Validation is a pure predicate:
//! it strips punctuation, checks length, rejects repeated-digit placeholders and
//! then verifies both check digits. Formatting re-punctuates cleaned digits into
//! the canonical display form without re-validating.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

const INDIVIDUAL_LEN: usize = 11;
const ORGANIZATION_LEN: usize = 14;

const ORGANIZATION_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const ORGANIZATION_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Which identifier an account registers with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// 11-digit CPF
    #[sea_orm(string_value = "individual")]
    Individual,
    /// 14-digit CNPJ
    #[sea_orm(string_value = "organization")]
    Organization,
}

impl DocumentKind {
    /// Number of digits after normalization.
    #[must_use]
    pub const fn expected_len(self) -> usize {
        match self {
            Self::Individual => INDIVIDUAL_LEN,
            Self::Organization => ORGANIZATION_LEN,
        }
    }

    /// Validates `raw` as this kind of document.
    #[must_use]
    pub fn is_valid(self, raw: &str) -> bool {
        match self {
            Self::Individual => is_valid_individual_id(raw),
            Self::Organization => is_valid_organization_id(raw),
        }
    }

    /// Formats `raw` into this kind's display form.
    ///
    /// Non-digits are dropped first. Fewer digits than [`Self::expected_len`] come
    /// back bare; digits past it are kept after the last group.
    #[must_use]
    pub fn format(self, raw: &str) -> String {
        let clean = normalize(raw);
        if clean.len() < self.expected_len() {
            return clean;
        }
        let (groups, separators) = self.layout();
        let (head, tail) = clean.split_at(self.expected_len());
        let mut out = punctuate(head, groups, separators);
        out.push_str(tail);
        out
    }

    const fn layout(self) -> (&'static [usize], &'static [char]) {
        match self {
            Self::Individual => (&[3, 3, 3, 2], &['.', '.', '-']),
            Self::Organization => (&[2, 3, 3, 4, 2], &['.', '.', '/', '-']),
        }
    }

    /// Short label used in messages ("CPF" / "CNPJ").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Individual => "CPF",
            Self::Organization => "CNPJ",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Keeps only the ASCII decimal digits of `raw`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Parses a normalized string into digit values, or `None` on the wrong length.
fn digits_of(raw: &str, len: usize) -> Option<Vec<u32>> {
    let digits: Vec<u32> = normalize(raw)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    (digits.len() == len).then_some(digits)
}

/// Placeholder values like `00000000000` are never valid.
fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|pair| pair[0] == pair[1])
}

fn weighted_sum(digits: &[u32], weights: impl IntoIterator<Item = u32>) -> u32 {
    digits.iter().zip(weights).map(|(d, w)| d * w).sum()
}

fn individual_check_digit(sum: u32) -> u32 {
    let digit = 11 - (sum % 11);
    if digit >= 10 { 0 } else { digit }
}

fn organization_check_digit(sum: u32) -> u32 {
    let rem = sum % 11;
    if rem < 2 { 0 } else { 11 - rem }
}

/// Returns true if `raw` is a structurally valid CPF.
///
/// Non-digit characters are ignored, so both `111.444.777-35` and `11144477735`
/// are accepted.
#[must_use]
pub fn is_valid_individual_id(raw: &str) -> bool {
    let Some(digits) = digits_of(raw, INDIVIDUAL_LEN) else {
        return false;
    };
    if all_same(&digits) {
        return false;
    }

    let first = individual_check_digit(weighted_sum(&digits[..9], (2..=10).rev()));
    if first != digits[9] {
        return false;
    }

    let second = individual_check_digit(weighted_sum(&digits[..10], (2..=11).rev()));
    second == digits[10]
}

/// Returns true if `raw` is a structurally valid CNPJ.
#[must_use]
pub fn is_valid_organization_id(raw: &str) -> bool {
    let Some(digits) = digits_of(raw, ORGANIZATION_LEN) else {
        return false;
    };
    if all_same(&digits) {
        return false;
    }

    let first = organization_check_digit(weighted_sum(
        &digits[..12],
        ORGANIZATION_FIRST_WEIGHTS,
    ));
    if first != digits[12] {
        return false;
    }

    let second = organization_check_digit(weighted_sum(
        &digits[..13],
        ORGANIZATION_SECOND_WEIGHTS,
    ));
    second == digits[13]
}

/// Splits `digits` at `groups` and joins the pieces with `separators`.
fn punctuate(digits: &str, groups: &[usize], separators: &[char]) -> String {
    let mut out = String::with_capacity(digits.len() + separators.len());
    let mut start = 0;
    for (i, len) in groups.iter().enumerate() {
        if i > 0 {
            out.push(separators[i - 1]);
        }
        out.push_str(&digits[start..start + len]);
        start += len;
    }
    out
}

/// Formats CPF digits as `XXX.XXX.XXX-XX`.
///
/// See [`DocumentKind::format`] for input that is not exactly 11 digits.
#[must_use]
pub fn format_individual_id(raw: &str) -> String {
    DocumentKind::Individual.format(raw)
}

/// Formats CNPJ digits as `XX.XXX.XXX/XXXX-XX`.
#[must_use]
pub fn format_organization_id(raw: &str) -> String {
    DocumentKind::Organization.format(raw)
}
