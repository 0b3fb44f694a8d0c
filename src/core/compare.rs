//! Ordering helpers for sort keys and partition names.
//!
//! Identifiers such as `pr-9` and `pr-10` must order by their embedded numbers,
//! so strings are compared run by run: digit runs numerically, other runs
//! lexicographically.

use std::cmp::Ordering;

/// Compare two strings treating each run of ASCII digits as a number.
///
/// ```
/// use std::cmp::Ordering;
/// use env_reaper::core::compare_numeric_str;
///
/// assert_eq!(compare_numeric_str("a-2", "a-10"), Ordering::Less);
/// assert_eq!(compare_numeric_str("a-1-100", "a-1-99"), Ordering::Greater);
/// ```
#[must_use]
pub fn compare_numeric_str(a: &str, b: &str) -> Ordering {
    let mut left = Runs::new(a);
    let mut right = Runs::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = if is_digits(x) && is_digits(y) {
                    compare_digit_runs(x, y)
                } else {
                    x.cmp(y)
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn is_digits(run: &str) -> bool {
    run.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

// Arbitrary-length digit runs: strip leading zeros, then longer means larger.
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Iterator over alternating digit / non-digit runs of a string.
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Runs<'a> {
    const fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = *self.rest.as_bytes().first()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .bytes()
            .position(|c| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(run)
    }
}
