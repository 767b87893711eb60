use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use crate::fs::node::Node;

/// Sort order for the children of a directory: directories first, then
/// natural name order. Names that only differ in bytes lost to the lossy
/// display form fall back to raw name order.
pub fn compare_nodes(a: &Node, b: &Node) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| natural_cmp(a.name(), b.name()))
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Natural ("alphanumeric") string comparison.
///
/// Digit runs compare by numeric value, everything else compares
/// case-insensitively. Names equal under that rule are ordered by case at the
/// first differing character (lowercase first, so `b` < `B`), and finally by
/// raw bytes so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    folded_cmp(a, b)
        .then_with(|| case_cmp(a, b))
        .then_with(|| a.cmp(b))
}

fn folded_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        let (x, y) = match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => (x, y),
        };

        let ord = if x.is_ascii_digit() && y.is_ascii_digit() {
            let left = take_digits(&mut a);
            let right = take_digits(&mut b);
            digits_cmp(&left, &right)
        } else {
            a.next();
            b.next();
            Iterator::cmp(x.to_lowercase(), y.to_lowercase())
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

/// Compare two digit runs by value without parsing, so arbitrarily long runs
/// cannot overflow. Equal values with fewer leading zeros sort first.
fn digits_cmp(a: &str, b: &str) -> Ordering {
    let trimmed_a = a.trim_start_matches('0');
    let trimmed_b = b.trim_start_matches('0');
    trimmed_a
        .len()
        .cmp(&trimmed_b.len())
        .then_with(|| trimmed_a.cmp(trimmed_b))
        .then_with(|| a.len().cmp(&b.len()))
}

fn case_cmp(a: &str, b: &str) -> Ordering {
    let rank = |c: char| if c.is_lowercase() { 0 } else { 1 };
    a.chars()
        .zip(b.chars())
        .find(|(x, y)| x != y)
        .map(|(x, y)| rank(x).cmp(&rank(y)))
        .unwrap_or(Ordering::Equal)
}
