//! Subsequence fuzzy matching used by the `-f` filters.
//!
//! Every query character must appear in order in the target, not necessarily
//! adjacent. Matching is case-insensitive. Scores favor consecutive runs and
//! matches at the start of a segment (after `/`, `-`, `_`, `.` or a space).

mod score {
    pub const MATCH: i32 = 1;
    pub const CONSECUTIVE: i32 = 32;
    pub const SEGMENT_START: i32 = 16;
    pub const START_OF_STRING: i32 = 32;
    pub const GAP_PENALTY: i32 = -3;
}

/// One target that matched a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    /// Position of the target in the searched collection.
    pub index: usize,
    pub score: i32,
    /// Char indices of the matched query characters within the target.
    pub positions: Vec<usize>,
}

fn is_separator(c: char) -> bool {
    matches!(c, '/' | '-' | '_' | '.' | ' ' | ':')
}

// One folded char per input char, so match indices are input char indices.
fn fold(s: &str) -> Vec<char> {
    s.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// Matches `query` against one target, returning the score and positions.
pub fn fuzzy_match(query: &str, target: &str) -> Option<(i32, Vec<usize>)> {
    let query = fold(query);
    if query.is_empty() {
        return Some((0, Vec::new()));
    }
    let target = fold(target);

    let mut positions = Vec::with_capacity(query.len());
    let mut total = 0;
    let mut qi = 0;
    let mut last: Option<usize> = None;
    for (ti, tc) in target.iter().enumerate() {
        if qi == query.len() {
            break;
        }
        if *tc != query[qi] {
            continue;
        }

        total += score::MATCH;
        if ti == 0 {
            total += score::START_OF_STRING;
        } else if is_separator(target[ti - 1]) {
            total += score::SEGMENT_START;
        }
        match last {
            Some(l) if l + 1 == ti => total += score::CONSECUTIVE,
            Some(l) => total += score::GAP_PENALTY * (ti - l - 1) as i32,
            None => {}
        }
        positions.push(ti);
        last = Some(ti);
        qi += 1;
    }

    (qi == query.len()).then_some((total, positions))
}

/// Matches `query` against every target, best scores first. Ties keep the
/// targets' order.
pub fn find<S: AsRef<str>>(query: &str, targets: &[S]) -> Vec<FuzzyMatch> {
    let mut matches: Vec<FuzzyMatch> = targets
        .iter()
        .enumerate()
        .filter_map(|(index, t)| {
            fuzzy_match(query, t.as_ref()).map(|(score, positions)| FuzzyMatch {
                index,
                score,
                positions,
            })
        })
        .collect();
    matches.sort_by(|a, b| b.score.cmp(&a.score));

    matches
}
