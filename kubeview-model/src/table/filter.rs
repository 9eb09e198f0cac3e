use regex::{Regex, RegexBuilder};

use super::fuzzy;

const FUZZY_PREFIX: &str = "-f ";
const LABEL_PREFIX: &str = "-l ";

/// True when the query selects by labels (`-l app=nginx` or `app=nginx`).
/// Label selectors are applied by the accessor, not by the table.
pub fn is_label_selector(q: &str) -> bool {
    if q.is_empty() {
        return false;
    }
    if q.starts_with(LABEL_PREFIX) {
        return true;
    }
    !q.contains(' ') && q.contains('=')
}

/// Returns the fuzzy query when `q` is a `-f <query>` selector.
pub fn is_fuzzy_selector(q: &str) -> Option<&str> {
    q.strip_prefix(FUZZY_PREFIX).map(str::trim)
}

pub fn is_inverse_selector(q: &str) -> bool {
    q.len() > 1 && q.starts_with('!')
}

/// Strips a leading `-l ` from a label selector.
pub fn label_selector(q: &str) -> &str {
    q.strip_prefix(LABEL_PREFIX).map(str::trim).unwrap_or(q)
}

/// Compiles a case-insensitive filter regex.
pub fn compile(q: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(q).case_insensitive(true).build()
}

/// A line that matched a viewer filter and the char positions that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub index: usize,
    pub positions: Vec<usize>,
}

/// Matches `q` against every line, using the fuzzy matcher for `-f` queries
/// and a case-insensitive regex otherwise. An empty query matches nothing.
pub fn match_lines(q: &str, lines: &[String]) -> Result<Vec<LineMatch>, regex::Error> {
    if q.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(f) = is_fuzzy_selector(q) {
        return Ok(fuzzy::find(f, lines)
            .into_iter()
            .map(|m| LineMatch {
                index: m.index,
                positions: m.positions,
            })
            .collect());
    }

    let rx = compile(q)?;
    Ok(lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| {
            let positions: Vec<usize> = rx
                .find_iter(line)
                .flat_map(|m| {
                    let start = line[..m.start()].chars().count();
                    start..start + m.as_str().chars().count()
                })
                .collect();
            (!positions.is_empty()).then_some(LineMatch { index, positions })
        })
        .collect())
}
