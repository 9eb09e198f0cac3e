use std::collections::{BTreeSet, HashSet};

use tracing::warn;

use super::sort::ColumnKind;
use crate::scope;

pub const AGE_COL: &str = "AGE";
pub const NAME_COL: &str = "NAME";
pub const NAMESPACE_COL: &str = "NAMESPACE";
pub const LABELS_COL: &str = "LABELS";
pub const VALID_COL: &str = "VALID";

/// One column of a table header and the flags driving its sort and display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderColumn {
    pub name: String,
    /// Hidden unless the wide layout is requested.
    pub wide: bool,
    pub hide: bool,
    /// Metrics column, values compare as numbers.
    pub numeric: bool,
    pub duration: bool,
    pub capacity: bool,
    /// Timestamp column; excluded from change highlighting.
    pub time: bool,
}

impl HeaderColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn wide(name: impl Into<String>) -> Self {
        Self {
            wide: true,
            ..Self::new(name)
        }
    }

    /// Comparator selection for this column. Time columns hold ages, so they
    /// sort as durations.
    pub fn kind(&self) -> ColumnKind {
        ColumnKind {
            numeric: self.numeric,
            duration: self.duration || self.time,
            capacity: self.capacity,
        }
    }
}

/// Header is the ordered column schema of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header(pub Vec<HeaderColumn>);

impl Header {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&HeaderColumn> {
        self.0.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderColumn> {
        self.0.iter()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Locates a column by name. Wide columns are skipped unless `include_wide`.
    pub fn index_of(&self, name: &str, include_wide: bool) -> Option<usize> {
        self.0
            .iter()
            .position(|c| (include_wide || !c.wide) && c.name == name)
    }

    /// Builds the layout for the requested column names.
    ///
    /// Unknown names become blank placeholder columns. Requested columns lose
    /// their wide flag; with `wide` set, every other column is appended as a
    /// wide column.
    pub fn customize(&self, cols: &[String], wide: bool) -> Header {
        if cols.is_empty() {
            return self.clone();
        }

        let mut seen = HashSet::with_capacity(cols.len());
        let mut out = Vec::with_capacity(self.len());
        for c in cols {
            match self.index_of(c, true) {
                Some(idx) => {
                    seen.insert(idx);
                    out.push(HeaderColumn {
                        wide: false,
                        ..self.0[idx].clone()
                    });
                }
                None => {
                    warn!(column = %c, "column is not available on this resource");
                    out.push(HeaderColumn::new(c.clone()));
                }
            }
        }
        if wide {
            out.extend(
                self.0
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !seen.contains(i))
                    .map(|(_, c)| HeaderColumn {
                        wide: true,
                        ..c.clone()
                    }),
            );
        }

        Header(out)
    }

    /// Source indices matching `customize(cols, wide)`, `None` for unknown
    /// columns.
    pub fn map_indices(&self, cols: &[String], wide: bool) -> Vec<Option<usize>> {
        let mut seen = HashSet::with_capacity(cols.len());
        let mut out: Vec<Option<usize>> = cols
            .iter()
            .map(|c| {
                let idx = self.index_of(c, true);
                match idx {
                    Some(i) => {
                        seen.insert(i);
                    }
                    None => warn!(column = %c, "column not found on resource"),
                }
                idx
            })
            .collect();
        if wide {
            out.extend((0..self.len()).filter(|i| !seen.contains(i)).map(Some));
        }

        out
    }

    /// Keeps `cols` and appends one plain column per label key.
    pub fn labelize(&self, cols: &[usize], labels: &[String]) -> Header {
        let mut out: Vec<HeaderColumn> = cols.iter().filter_map(|c| self.0.get(*c).cloned()).collect();
        out.extend(labels.iter().map(|l| HeaderColumn::new(l.clone())));

        Header(out)
    }

    /// Returns true if the header changed.
    pub fn diff(&self, other: &Header) -> bool {
        self != other
    }

    pub fn column_names(&self, wide: bool) -> Vec<String> {
        self.0
            .iter()
            .filter(|c| wide || !c.wide)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Indices of the columns that should be displayed for this scope.
    pub fn filter_col_indices(&self, ns: &str, wide: bool) -> BTreeSet<usize> {
        let namespaced = scope::is_namespaced(ns);
        self.0
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                !(c.name == AGE_COL
                    || (!wide && c.wide)
                    || c.hide
                    || (namespaced && c.name == NAMESPACE_COL))
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_age(&self) -> bool {
        self.index_of(AGE_COL, true).is_some()
    }

    pub fn is_metrics_col(&self, col: usize) -> bool {
        self.0.get(col).is_some_and(|c| c.numeric)
    }

    pub fn is_time_col(&self, col: usize) -> bool {
        self.0.get(col).is_some_and(|c| c.time)
    }

    pub fn is_capacity_col(&self, col: usize) -> bool {
        self.0.get(col).is_some_and(|c| c.capacity)
    }
}

impl From<Vec<HeaderColumn>> for Header {
    fn from(cols: Vec<HeaderColumn>) -> Self {
        Self(cols)
    }
}
