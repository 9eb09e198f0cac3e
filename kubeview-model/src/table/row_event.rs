use std::collections::{BTreeSet, HashMap};

use super::delta::DeltaRow;
use super::row::{labelize, Row};
use super::sort::{compare_values, natural_cmp, ColumnKind};
use crate::error::{ModelError, Result};

/// Resource event kinds tracked per row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResEvent {
    #[default]
    Unchanged,
    Add,
    Update,
    Delete,
    Clear,
}

/// A row together with how it changed during the last reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowEvent {
    pub kind: ResEvent,
    pub row: Row,
    pub deltas: DeltaRow,
}

impl RowEvent {
    pub fn new(kind: ResEvent, row: Row) -> Self {
        Self {
            kind,
            row,
            deltas: DeltaRow::default(),
        }
    }

    /// An update event carrying the previous values of the changed fields.
    pub fn with_deltas(row: Row, deltas: DeltaRow) -> Self {
        Self {
            kind: ResEvent::Update,
            row,
            deltas,
        }
    }

    pub fn id(&self) -> &str {
        &self.row.id
    }

    pub fn customize(&self, cols: &[Option<usize>]) -> RowEvent {
        RowEvent {
            kind: self.kind,
            row: self.row.customize(cols),
            deltas: self.deltas.customize(cols),
        }
    }

    pub fn labelize(&self, cols: &[usize], label_col: usize, labels: &[String]) -> RowEvent {
        RowEvent {
            kind: self.kind,
            row: self.row.labelize(cols, label_col, labels),
            deltas: self.deltas.labelize(cols, label_col, &self.row, labels),
        }
    }

    /// Label keys found in the label column of this row.
    pub fn extract_header_labels(&self, label_col: usize) -> Vec<String> {
        let labels = self.row.fields.get(label_col).map(String::as_str).unwrap_or("");
        labelize(labels).into_keys().collect()
    }

    /// Returns true if the event changed, ignoring the age column.
    pub fn diff(&self, other: &RowEvent, age_col: Option<usize>) -> bool {
        self.kind != other.kind
            || self.deltas.diff(&other.deltas, age_col)
            || self.row.diff(&other.row, age_col)
    }
}

/// An ordered collection of row events indexed by row id.
///
/// The index always maps an id to its current position; deletes and sorts
/// rebuild it.
#[derive(Debug, Clone, Default)]
pub struct RowEvents {
    events: Vec<RowEvent>,
    index: HashMap<String, usize>,
}

impl PartialEq for RowEvents {
    fn eq(&self, other: &Self) -> bool {
        self.events == other.events
    }
}

impl Eq for RowEvents {}

impl RowEvents {
    pub fn with_capacity(size: usize) -> Self {
        Self {
            events: Vec::with_capacity(size),
            index: HashMap::with_capacity(size),
        }
    }

    pub fn from_events(events: impl IntoIterator<Item = RowEvent>) -> Self {
        let mut re = Self::default();
        for e in events {
            re.add(e);
        }
        re
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, e) in self.events.iter().enumerate() {
            self.index.insert(e.row.id.clone(), i);
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn at(&self, idx: usize) -> Option<&RowEvent> {
        self.events.get(idx)
    }

    pub fn get(&self, id: &str) -> Option<&RowEvent> {
        self.find_index(id).and_then(|i| self.events.get(i))
    }

    pub fn find_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RowEvent> {
        self.events.iter()
    }

    pub fn add(&mut self, re: RowEvent) {
        self.index.insert(re.row.id.clone(), self.events.len());
        self.events.push(re);
    }

    /// Replaces the event at `idx`. Out of range indices are ignored.
    pub fn set(&mut self, idx: usize, re: RowEvent) {
        if let Some(slot) = self.events.get_mut(idx) {
            self.index.insert(re.row.id.clone(), idx);
            *slot = re;
        }
    }

    /// Overwrites the event with the same id in place, or appends it.
    pub fn upsert(&mut self, re: RowEvent) {
        match self.find_index(&re.row.id) {
            Some(idx) => self.events[idx] = re,
            None => self.add(re),
        }
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let victim = self
            .find_index(id)
            .ok_or_else(|| ModelError::RowNotFound(id.to_string()))?;
        self.events.remove(victim);
        self.reindex();

        Ok(())
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.index.clear();
    }

    /// Sorted union of the label keys across all rows.
    pub fn extract_header_labels(&self, label_col: usize) -> Vec<String> {
        self.events
            .iter()
            .flat_map(|re| re.extract_header_labels(label_col))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn labelize(&self, cols: &[usize], label_col: usize, labels: &[String]) -> RowEvents {
        Self::from_events(self.events.iter().map(|re| re.labelize(cols, label_col, labels)))
    }

    pub fn customize(&self, cols: &[Option<usize>]) -> RowEvents {
        Self::from_events(self.events.iter().map(|re| re.customize(cols)))
    }

    /// Returns true if any event differs, ignoring the age column.
    pub fn diff(&self, other: &RowEvents, age_col: Option<usize>) -> bool {
        self.len() != other.len()
            || self
                .events
                .iter()
                .zip(&other.events)
                .any(|(a, b)| a.diff(b, age_col))
    }

    /// Sorts the events on column `col`. Equal values order by row id
    /// ascending whatever the direction.
    pub fn sort(&mut self, col: usize, kind: ColumnKind, asc: bool) {
        self.events.sort_by(|e1, e2| {
            let v1 = e1.row.fields.get(col).map(String::as_str).unwrap_or("");
            let v2 = e2.row.fields.get(col).map(String::as_str).unwrap_or("");
            let ord = compare_values(kind, v1, v2);
            let ord = if asc { ord } else { ord.reverse() };
            ord.then_with(|| natural_cmp(&e1.row.id, &e2.row.id))
        });
        self.reindex();
    }
}

impl<'a> IntoIterator for &'a RowEvents {
    type Item = &'a RowEvent;
    type IntoIter = std::slice::Iter<'a, RowEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::super::row::fields;
    use super::*;

    fn ev(id: &str, ff: &[&str]) -> RowEvent {
        RowEvent::new(ResEvent::Unchanged, Row::new(id, fields(ff)))
    }

    fn ids(re: &RowEvents) -> Vec<&str> {
        re.iter().map(RowEvent::id).collect()
    }

    fn abc() -> RowEvents {
        RowEvents::from_events([
            ev("A", &["1", "2", "3"]),
            ev("B", &["0", "2", "3"]),
            ev("C", &["10", "2", "3"]),
        ])
    }

    fn namespaced() -> RowEvents {
        RowEvents::from_events([
            ev("ns1/B", &["B", "2", "3", "1Gi"]),
            ev("ns1/A", &["A", "2", "3", "1.1G"]),
            ev("ns1/C", &["C", "2", "3", "0.5Ti"]),
            ev("ns2/B", &["B", "2", "3", "12e6"]),
            ev("ns2/A", &["A", "2", "3", "1234"]),
            ev("ns2/C", &["C", "2", "3", "0.1Ei"]),
        ])
    }

    #[test]
    fn test_row_event_customize() {
        let mut re = ev("A", &["1", "2", "3"]);
        re.kind = ResEvent::Add;

        assert!(re.customize(&[]).row.fields.is_empty());
        assert_eq!(re.customize(&[Some(0), Some(1), Some(2)]), re);
        assert_eq!(
            re.customize(&[Some(2), Some(10), Some(0)]).row.fields,
            fields(&["3", "", "1"])
        );

        re.deltas = DeltaRow(fields(&["a", "b", "c"]));
        let c = re.customize(&[Some(2), Some(0)]);
        assert_eq!(c.row.fields, fields(&["3", "1"]));
        assert_eq!(c.deltas, DeltaRow(fields(&["c", "a"])));
        assert_eq!(c.kind, ResEvent::Add);
    }

    #[test]
    fn test_row_event_diff() {
        let re = ev("A", &["1", "2", "3"]);

        assert!(!re.diff(&ev("A", &["1", "2", "3"]), None));
        assert!(re.diff(&ev("B", &["1", "2", "3"]), None));
        assert!(re.diff(&RowEvent::new(ResEvent::Add, re.row.clone()), None));
        assert!(re.diff(&ev("A", &["1", "2", "4"]), None));
        assert!(!re.diff(&ev("A", &["1", "2", "4"]), Some(2)));
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut re = abc();
        re.upsert(ev("B", &["zorg", "2", "3"]));
        re.upsert(ev("D", &["4", "2", "3"]));

        assert_eq!(ids(&re), vec!["A", "B", "C", "D"]);
        assert_eq!(re.get("B").map(|e| e.row.fields[0].as_str()), Some("zorg"));
        assert_eq!(re.find_index("D"), Some(3));
    }

    #[test]
    fn test_delete_reindexes() {
        for (victim, left) in [("A", ["B", "C"]), ("B", ["A", "C"]), ("C", ["A", "B"])] {
            let mut re = abc();
            assert!(re.delete(victim).is_ok());
            assert_eq!(ids(&re), left.to_vec());
            for (i, id) in left.iter().enumerate() {
                assert_eq!(re.find_index(id), Some(i));
            }
            assert_eq!(re.find_index(victim), None);
        }
    }

    #[test]
    fn test_delete_unknown_id() {
        let mut re = abc();

        assert!(matches!(re.delete("bozo"), Err(ModelError::RowNotFound(id)) if id == "bozo"));
        assert_eq!(re.len(), 3);
    }

    #[test]
    fn test_diff() {
        let re = abc();

        assert!(!re.diff(&abc(), None));
        assert!(re.diff(&RowEvents::default(), None));
        let mut other = abc();
        other.set(0, ev("A", &["1", "2", "4"]));
        assert!(re.diff(&other, None));
        assert!(!re.diff(&other, Some(2)));
    }

    #[test]
    fn test_sort_numeric_text() {
        let mut re = abc();
        re.sort(0, ColumnKind::default(), true);

        assert_eq!(ids(&re), vec!["B", "A", "C"]);
        assert_eq!(re.find_index("B"), Some(0));
    }

    #[test]
    fn test_sort_duration() {
        let mut re = RowEvents::from_events([
            ev("A", &["1", "2", "2m"]),
            ev("B", &["0", "2", "90s"]),
            ev("C", &["10", "2", "1h"]),
        ]);
        let kind = ColumnKind {
            duration: true,
            ..Default::default()
        };
        re.sort(2, kind, true);
        assert_eq!(ids(&re), vec!["B", "A", "C"]);

        re.sort(2, kind, false);
        assert_eq!(ids(&re), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_sort_equal_values_order_by_id() {
        let mut re = namespaced();
        re.sort(1, ColumnKind::default(), true);

        assert_eq!(
            ids(&re),
            vec!["ns1/A", "ns1/B", "ns1/C", "ns2/A", "ns2/B", "ns2/C"]
        );

        re.sort(1, ColumnKind::default(), false);
        assert_eq!(
            ids(&re),
            vec!["ns1/A", "ns1/B", "ns1/C", "ns2/A", "ns2/B", "ns2/C"]
        );
    }

    #[test]
    fn test_sort_capacity() {
        let mut re = namespaced();
        re.sort(
            3,
            ColumnKind {
                capacity: true,
                ..Default::default()
            },
            true,
        );

        assert_eq!(
            ids(&re),
            vec!["ns2/A", "ns2/B", "ns1/B", "ns1/A", "ns1/C", "ns2/C"]
        );
        assert_eq!(re.find_index("ns2/C"), Some(5));
    }

    #[test]
    fn test_clone_is_deep() {
        let re = namespaced();
        let mut c = re.clone();
        c.events[0].row.fields[0] = "blee".to_string();

        assert_eq!(re.at(0).map(|e| e.row.fields[0].as_str()), Some("B"));
        assert_eq!(c.len(), re.len());
    }

    #[test]
    fn test_extract_header_labels() {
        let re = RowEvents::from_events([
            ev("a", &["a", "tier=web,app=nginx"]),
            ev("b", &["b", "app=redis,release=v1"]),
            ev("c", &["c", ""]),
        ]);

        assert_eq!(re.extract_header_labels(1), vec!["app", "release", "tier"]);
    }

    #[test]
    fn test_labelize() {
        let re = RowEvents::from_events([
            ev("a", &["a", "tier=web,app=nginx"]),
            ev("b", &["b", "app=redis,release=v1"]),
        ]);
        let labels = re.extract_header_labels(1);
        let l = re.labelize(&[0], 1, &labels);

        assert_eq!(l.at(0).map(|e| e.row.fields.clone()), Some(fields(&["a", "nginx", "", "web"])));
        assert_eq!(l.at(1).map(|e| e.row.fields.clone()), Some(fields(&["b", "redis", "v1", ""])));
        assert_eq!(l.find_index("b"), Some(1));
    }
}
