//! Column comparators used when sorting table rows.
//!
//! The comparator is picked from the header column flags: durations and
//! capacities are parsed to numbers, numeric columns drop thousands
//! separators, everything else uses natural ordering. Equal values fall back
//! to the row id so results never depend on the input order.

use std::cmp::Ordering;

/// Marker for a value that does not apply. Sorts after every duration.
pub const NA_VALUE: &str = "n/a";

/// How a column's values should be compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnKind {
    pub numeric: bool,
    pub duration: bool,
    pub capacity: bool,
}

/// Compares two cells of the same column, breaking ties with the row ids.
pub fn compare_cells(kind: ColumnKind, id1: &str, id2: &str, v1: &str, v2: &str) -> Ordering {
    compare_values(kind, v1, v2).then_with(|| natural_cmp(id1, id2))
}

/// Compares two values of a column using the comparator picked by `kind`.
pub fn compare_values(kind: ColumnKind, v1: &str, v2: &str) -> Ordering {
    if v1 == v2 {
        return Ordering::Equal;
    }
    if kind.numeric {
        cmp_number(v1, v2)
    } else if kind.duration {
        duration_to_seconds(v1).cmp(&duration_to_seconds(v2))
    } else if kind.capacity {
        cmp_capacity(v1, v2)
    } else {
        natural_cmp(v1, v2)
    }
}

/// Returns true if `v1` sorts strictly before `v2`.
pub fn less(kind: ColumnKind, id1: &str, id2: &str, v1: &str, v2: &str) -> bool {
    compare_cells(kind, id1, id2, v1, v2) == Ordering::Less
}

fn cmp_number(s1: &str, s2: &str) -> Ordering {
    natural_cmp(&s1.replace(',', ""), &s2.replace(',', ""))
}

// Unparsable quantities sort after every valid one.
fn cmp_capacity(s1: &str, s2: &str) -> Ordering {
    match (parse_quantity(s1), parse_quantity(s2)) {
        (Some(q1), Some(q2)) => q1.total_cmp(&q2),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => natural_cmp(s1, s2),
    }
}

/// Human ordering: runs of digits compare by value, the rest byte-wise.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let start_b = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let na = trim_zeros(&a[start_a..i]);
            let nb = trim_zeros(&b[start_b..j]);
            let ord = na.len().cmp(&nb.len()).then_with(|| na.cmp(nb));
            if ord != Ordering::Equal {
                return ord;
            }
            // 01 vs 1: fewer leading zeros first
            let ord = (i - start_a).cmp(&(j - start_b));
            if ord != Ordering::Equal {
                return ord;
            }
            continue;
        }
        if a[i] != b[j] {
            return a[i].cmp(&b[j]);
        }
        i += 1;
        j += 1;
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let first = digits.iter().position(|d| *d != b'0').unwrap_or(digits.len());
    &digits[first..]
}

/// Converts a compound age such as `2y263d` or `5m12s` into seconds.
///
/// `n/a` maps to `i64::MAX`; an empty string is zero.
pub fn duration_to_seconds(duration: &str) -> i64 {
    if duration.is_empty() {
        return 0;
    }
    if duration == NA_VALUE {
        return i64::MAX;
    }

    let mut total: i64 = 0;
    let mut num: i64 = 0;
    for c in duration.chars() {
        let unit = match c {
            'y' => 365 * 24 * 60 * 60,
            'd' => 24 * 60 * 60,
            'h' => 60 * 60,
            'm' => 60,
            's' => 1,
            _ => {
                if let Some(d) = c.to_digit(10) {
                    num = num.saturating_mul(10).saturating_add(i64::from(d));
                }
                continue;
            }
        };
        total = total.saturating_add(num.saturating_mul(unit));
        num = 0;
    }

    total
}

const QUANTITY_SUFFIXES: &[(&str, f64)] = &[
    ("Ki", 1024.0),
    ("Mi", 1024.0 * 1024.0),
    ("Gi", 1024.0 * 1024.0 * 1024.0),
    ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Ei", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("n", 1e-9),
    ("u", 1e-6),
    ("m", 1e-3),
    ("k", 1e3),
    ("K", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

/// Parses a resource quantity (`1Gi`, `1.1G`, `12e6`, `500m`) into its value.
pub fn parse_quantity(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // binary suffixes are two chars, so check them before the decimal ones
    for (suffix, multiplier) in QUANTITY_SUFFIXES {
        if let Some(n) = s.strip_suffix(suffix) {
            return n.parse::<f64>().ok().map(|v| v * multiplier);
        }
    }

    s.parse::<f64>().ok()
}
