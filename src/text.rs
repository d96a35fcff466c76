//! Small text helpers shared by the store, registry and capability.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

static NEWLINE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Character used to escape LIKE wildcards in search patterns.
pub const LIKE_ESCAPE: char = '\\';

/// Insert `<br />` before every line break, keeping the break itself.
///
/// Recognises `\r\n`, `\n\r`, `\n` and `\r` as single breaks.
pub fn nl2br(text: &str) -> String {
    let regex = NEWLINE_REGEX.get_or_init(|| {
        Regex::new(r"\r\n|\n\r|\n|\r").expect("newline pattern is valid")
    });
    regex.replace_all(text, "<br />${0}").into_owned()
}

/// Escape `%`, `_` and the escape character so a LIKE pattern matches them literally.
pub fn escape_like(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive natural ordering: digit runs compare by numeric value,
/// so "Page 2" sorts before "Page 10".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let ordering = compare_digit_runs(&l_run, &r_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }

    // Equal ignoring case; keep the order total.
    a.cmp(b)
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}
