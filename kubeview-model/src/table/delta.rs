use super::header::Header;
use super::row::{labelize, Row};

/// Previous values of the fields that changed during the last reconciliation.
///
/// Each slot is parallel to the row fields and is blank when the field did
/// not change. A blank slot cannot carry a blank previous value, so a field
/// that goes from empty to set never highlights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaRow(pub Vec<String>);

impl DeltaRow {
    /// Computes the deltas between an old and a new row. Time columns are
    /// skipped since their values change on every tick.
    pub fn new(old: &Row, new: &Row, header: &Header) -> Self {
        let deltas = old
            .fields
            .iter()
            .enumerate()
            .map(|(i, prev)| match new.fields.get(i) {
                Some(cur) if !prev.is_empty() && prev != cur && !header.is_time_col(i) => {
                    prev.clone()
                }
                _ => String::new(),
            })
            .collect();

        Self(deltas)
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(String::is_empty)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Projects the deltas onto `cols`, mirroring `Row::customize`.
    pub fn customize(&self, cols: &[Option<usize>]) -> DeltaRow {
        if self.is_blank() {
            return DeltaRow::default();
        }
        DeltaRow(super::row::customize_fields(&self.0, cols))
    }

    /// Expands the label column deltas into one slot per label key.
    ///
    /// A label slot carries the previous label value when that label changed
    /// between `self` (previous label string) and the current row.
    pub fn labelize(&self, cols: &[usize], label_col: usize, current: &Row, labels: &[String]) -> DeltaRow {
        if self.is_empty() {
            return self.clone();
        }
        let mut out = Vec::with_capacity(cols.len() + labels.len());
        out.extend(cols.iter().map(|c| self.0.get(*c).cloned().unwrap_or_default()));

        let prev = labelize(self.0.get(label_col).map(String::as_str).unwrap_or(""));
        let cur = labelize(current.fields.get(label_col).map(String::as_str).unwrap_or(""));
        out.extend(labels.iter().map(|l| match prev.get(l) {
            Some(p) if !p.is_empty() && cur.get(l) != Some(p) => p.clone(),
            _ => String::new(),
        }));

        DeltaRow(out)
    }

    /// Returns true if the deltas differ, ignoring the age column.
    pub fn diff(&self, other: &DeltaRow, age_col: Option<usize>) -> bool {
        super::row::fields_diff(&self.0, &other.0, age_col)
    }
}
