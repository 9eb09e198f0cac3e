use std::{
    collections::HashSet,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use kube::api::DynamicObject;
use rayon::prelude::*;
use tracing::{debug, error};

use super::{
    delta::DeltaRow,
    filter::{compile, is_fuzzy_selector, is_inverse_selector, is_label_selector},
    fuzzy,
    header::{Header, HeaderColumn, AGE_COL, LABELS_COL, NAMESPACE_COL, NAME_COL, VALID_COL},
    row::Row,
    row_event::{ResEvent, RowEvent, RowEvents},
};
use crate::{
    config::ViewSetting,
    error::{BoxError, ModelError, Result},
    render::Renderer,
    scope,
};

const SPACER: &str = " ";

/// A column to sort on and its direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortColumn {
    pub name: String,
    pub asc: bool,
}

impl SortColumn {
    pub fn new(name: impl Into<String>, asc: bool) -> Self {
        Self {
            name: name.into(),
            asc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOpts {
    /// Keep only the rows flagged by the VALID column.
    pub toast: bool,
    pub filter: String,
    pub invert: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TableState {
    header: Header,
    row_events: RowEvents,
    namespace: String,
}

/// Tabular data for one resource kind in one namespace scope.
///
/// The refresher mutates it under the write lock while renderers read it
/// under the read lock. Derived tables (filter, customize, labelize, clone)
/// own their rows and never alias this one.
#[derive(Debug, Default)]
pub struct TableData {
    kind: String,
    state: RwLock<TableState>,
}

impl Clone for TableData {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            state: RwLock::new(self.read().clone()),
        }
    }
}

impl PartialEq for TableData {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && *self.read() == *other.read()
    }
}

impl TableData {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            state: RwLock::default(),
        }
    }

    pub fn with_rows(kind: impl Into<String>, header: Header, row_events: RowEvents) -> Self {
        Self::full(kind, "", header, row_events)
    }

    pub fn full(
        kind: impl Into<String>,
        ns: impl Into<String>,
        header: Header,
        row_events: RowEvents,
    ) -> Self {
        Self {
            kind: kind.into(),
            state: RwLock::new(TableState {
                header,
                row_events,
                namespace: ns.into(),
            }),
        }
    }

    // Every critical section leaves the state consistent, so a poisoned lock
    // is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, TableState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn namespace(&self) -> String {
        self.read().namespace.clone()
    }

    pub fn header(&self) -> Header {
        self.read().header.clone()
    }

    pub fn header_count(&self) -> usize {
        self.read().header.len()
    }

    pub fn row_count(&self) -> usize {
        self.read().row_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().row_events.is_empty()
    }

    pub fn column_names(&self, wide: bool) -> Vec<String> {
        self.read().header.column_names(wide)
    }

    pub fn index_of_header(&self, name: &str) -> Option<usize> {
        self.read().header.index_of(name, false)
    }

    pub fn head_col(&self, name: &str, wide: bool) -> Option<(HeaderColumn, usize)> {
        let state = self.read();
        let idx = state.header.index_of(name, wide)?;
        state.header.get(idx).map(|c| (c.clone(), idx))
    }

    /// A snapshot of the row events.
    pub fn row_events(&self) -> RowEvents {
        self.read().row_events.clone()
    }

    pub fn add_row(&self, re: RowEvent) {
        self.write().row_events.add(re);
    }

    pub fn set_row(&self, idx: usize, re: RowEvent) {
        self.write().row_events.set(idx, re);
    }

    pub fn find_row(&self, id: &str) -> Option<RowEvent> {
        self.read().row_events.get(id).cloned()
    }

    pub fn row_at(&self, idx: usize) -> Option<RowEvent> {
        self.read().row_events.at(idx).cloned()
    }

    /// Visits rows in order under the read lock until `f` returns false.
    pub fn rows_range<F>(&self, mut f: F)
    where
        F: FnMut(usize, &RowEvent) -> bool,
    {
        let state = self.read();
        for (i, re) in state.row_events.iter().enumerate() {
            if !f(i, re) {
                return;
            }
        }
    }

    /// Switches scope, dropping both header and rows.
    pub fn reset(&self, ns: impl Into<String>) {
        let mut state = self.write();
        state.namespace = ns.into();
        state.header.clear();
        state.row_events.clear();
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.header.clear();
        state.row_events.clear();
    }

    pub fn set_header(&self, ns: impl Into<String>, header: Header) {
        let mut state = self.write();
        state.namespace = ns.into();
        state.header = header;
    }

    /// Renders `objects`, listed in scope `ns`, and merges the resulting rows
    /// into the table.
    ///
    /// A single render failure aborts the whole pass before anything is
    /// mutated. A listing for a scope the table has since left is dropped.
    /// An empty header afterwards means the listing was unusable.
    #[tracing::instrument(skip(self, renderer, objects), fields(kind = %self.kind, count = objects.len()))]
    pub fn reconcile(
        &self,
        ns: &str,
        renderer: &dyn Renderer,
        objects: &[DynamicObject],
    ) -> Result<()> {
        let header = renderer.header(ns);
        let rows = objects
            .par_iter()
            .map(|obj| {
                let mut row = Row::with_size(header.len());
                renderer.render(obj, ns, &mut row).map(|_| row)
            })
            .collect::<std::result::Result<Vec<_>, BoxError>>()
            .map_err(|source| ModelError::Render {
                kind: self.kind.clone(),
                source,
            })?;

        let mut state = self.write();
        if state.namespace != ns {
            debug!(current = %state.namespace, "scope changed, dropping listing");
            return Ok(());
        }
        merge_rows(&mut state, rows);
        state.header = header;
        if state.header.is_empty() {
            return Err(ModelError::NoColumns(self.kind.clone()));
        }

        Ok(())
    }

    /// Computes row events for a new snapshot of rows.
    ///
    /// From an empty table every row is an add. Otherwise known rows become
    /// updates or unchanged events, unknown rows are appended and rows absent
    /// from the snapshot are dropped.
    pub fn update(&self, rows: Vec<Row>) {
        merge_rows(&mut self.write(), rows);
    }

    /// Drops every row whose id is not in `keys`.
    pub fn delete(&self, keys: &HashSet<String>) {
        delete_stale(&mut self.write().row_events, keys);
    }

    /// Sorts the rows in place on the named column. Unknown columns are ignored.
    pub fn sort(&self, sc: &SortColumn) {
        let mut state = self.write();
        let Some(idx) = state.header.index_of(&sc.name, false) else {
            return;
        };
        let kind = state.header.0[idx].kind();
        state.row_events.sort(idx, kind, sc.asc);
    }

    /// Returns a filtered copy of the table.
    ///
    /// Label selectors are left to the accessor. `-f` queries fuzzy match the
    /// row ids, anything else is a case-insensitive regex over the visible
    /// fields, inverted by a leading `!` or `opts.invert`. An invalid regex
    /// leaves the rows unfiltered.
    pub fn filter(&self, opts: &FilterOpts) -> TableData {
        let state = self.read();
        let mut rows = if opts.toast {
            filter_toast(&state.header, &state.row_events)
        } else {
            state.row_events.clone()
        };

        let q = opts.filter.as_str();
        if !q.is_empty() && !is_label_selector(q) {
            if let Some(f) = is_fuzzy_selector(q) {
                rows = fuzzy_filter(f, &rows);
            } else {
                let inverse = is_inverse_selector(q);
                let q = if inverse { &q[1..] } else { q };
                match rx_filter(q, inverse != opts.invert, &state, &rows) {
                    Ok(filtered) => rows = filtered,
                    Err(e) => error!(error = %e, query = q, "rx filter failed"),
                }
            }
        }

        TableData::full(self.kind.clone(), state.namespace.clone(), state.header.clone(), rows)
    }

    /// Expands the LABELS column into one column per label key.
    ///
    /// With no `labels` every key found across the rows is used. Tables
    /// without a LABELS column are returned as is.
    pub fn labelize(&self, labels: &[String]) -> TableData {
        let idx = self.read().header.index_of(LABELS_COL, true);
        let Some(idx) = idx else {
            return self.clone();
        };
        let state = self.read();
        let cols: &[usize] = if scope::is_namespaced(&state.namespace) {
            &[1]
        } else {
            &[0, 1]
        };
        let labels = if labels.is_empty() {
            state.row_events.extract_header_labels(idx)
        } else {
            labels.to_vec()
        };

        TableData::full(
            self.kind.clone(),
            state.namespace.clone(),
            state.header.labelize(cols, &labels),
            state.row_events.labelize(cols, idx, &labels),
        )
    }

    /// Applies a custom column layout, returning the new table and the sort
    /// column to use with it.
    ///
    /// Unless `manual` is set, the sort column comes from the view setting,
    /// falling back to NAMESPACE (all namespaces), NAME or the first column.
    pub fn customize(
        &self,
        vs: &ViewSetting,
        sc: SortColumn,
        manual: bool,
        wide: bool,
    ) -> (TableData, SortColumn) {
        if vs.is_blank() {
            if !sc.name.is_empty() {
                return (self.clone(), sc);
            }
            return match self.sort_col(vs) {
                Some(psc) => (self.clone(), psc),
                None => (self.clone(), sc),
            };
        }

        let cdata = if vs.has_cols() {
            let state = self.read();
            let ids = state.header.map_indices(&vs.columns, wide);
            TableData::full(
                self.kind.clone(),
                state.namespace.clone(),
                state.header.customize(&vs.columns, wide),
                state.row_events.customize(&ids),
            )
        } else {
            self.clone()
        };
        if manual {
            return (cdata, sc);
        }
        match cdata.sort_col(vs) {
            Some(psc) => (cdata, psc),
            None => (cdata, sc),
        }
    }

    fn sort_col(&self, vs: &ViewSetting) -> Option<SortColumn> {
        let state = self.read();
        let first = state.header.get(0)?;

        let (name, asc) = vs.sort_col().unwrap_or_default();
        if state.header.index_of(&name, false).is_some() {
            return Some(SortColumn::new(name, asc));
        }

        let has = |col: &str| state.header.index_of(col, false).is_some();
        let name = if scope::is_all_namespaces(&state.namespace) && has(NAMESPACE_COL) {
            NAMESPACE_COL
        } else if has(NAME_COL) {
            NAME_COL
        } else {
            first.name.as_str()
        };
        debug!(kind = %self.kind, column = name, "falling back to default sort column");

        Some(SortColumn::new(name, true))
    }

    /// Returns true if the tables differ, ignoring the age column.
    pub fn diff(&self, other: &TableData) -> bool {
        let (a, b) = (self.read(), other.read());
        if a.namespace != b.namespace || a.header.diff(&b.header) {
            return true;
        }
        let age = a.header.index_of(AGE_COL, true);

        a.row_events.diff(&b.row_events, age)
    }
}

fn merge_rows(state: &mut TableState, rows: Vec<Row>) {
    if state.row_events.is_empty() {
        for row in rows {
            state.row_events.add(RowEvent::new(ResEvent::Add, row));
        }
        return;
    }

    let mut keys = HashSet::with_capacity(rows.len());
    for row in rows {
        keys.insert(row.id.clone());
        let Some(idx) = state.row_events.find_index(&row.id) else {
            state.row_events.add(RowEvent::new(ResEvent::Add, row));
            continue;
        };
        let Some(prev) = state.row_events.at(idx) else {
            continue;
        };
        let delta = DeltaRow::new(&prev.row, &row, &state.header);
        let re = if delta.is_blank() {
            RowEvent::new(ResEvent::Unchanged, row)
        } else {
            RowEvent::with_deltas(row, delta)
        };
        state.row_events.set(idx, re);
    }

    delete_stale(&mut state.row_events, &keys);
}

fn delete_stale(row_events: &mut RowEvents, keys: &HashSet<String>) {
    let victims: Vec<String> = row_events
        .iter()
        .filter(|re| !keys.contains(re.id()))
        .map(|re| re.id().to_string())
        .collect();
    for id in victims {
        if let Err(e) = row_events.delete(&id) {
            error!(error = %e, id = %id, "table delete failed");
        }
    }
}

fn filter_toast(header: &Header, rows: &RowEvents) -> RowEvents {
    let Some(idx) = header.index_of(VALID_COL, true) else {
        return RowEvents::default();
    };

    RowEvents::from_events(
        rows.iter()
            .filter(|re| re.row.fields.get(idx).is_some_and(|v| !v.is_empty()))
            .cloned(),
    )
}

fn fuzzy_filter(q: &str, rows: &RowEvents) -> RowEvents {
    let ids: Vec<&str> = rows.iter().map(RowEvent::id).collect();

    RowEvents::from_events(
        fuzzy::find(q, &ids)
            .into_iter()
            .filter_map(|m| rows.at(m.index).cloned()),
    )
}

fn rx_filter(
    q: &str,
    inverse: bool,
    state: &TableState,
    rows: &RowEvents,
) -> std::result::Result<RowEvents, regex::Error> {
    let rx = compile(q)?;
    let ns_col = state
        .header
        .index_of(NAMESPACE_COL, true)
        .filter(|_| scope::is_namespaced(&state.namespace));
    let age_col = state.header.index_of(AGE_COL, true);

    Ok(RowEvents::from_events(
        rows.iter()
            .filter(|re| {
                let line = re
                    .row
                    .fields
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| Some(*i) != ns_col && Some(*i) != age_col)
                    .map(|(_, f)| f.as_str())
                    .collect::<Vec<_>>()
                    .join(SPACER);
                rx.is_match(&line) != inverse
            })
            .cloned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::row::fields;
    use super::*;
    use crate::render::{tests::pod, GenericRenderer};

    fn ev(id: &str, ff: &[&str]) -> RowEvent {
        RowEvent::new(ResEvent::Unchanged, Row::new(id, fields(ff)))
    }

    fn row(id: &str, ff: &[&str]) -> Row {
        Row::new(id, fields(ff))
    }

    fn header(cc: &[&str]) -> Header {
        Header(cc.iter().map(|c| HeaderColumn::new(*c)).collect())
    }

    fn abc() -> TableData {
        TableData::with_rows(
            "test",
            header(&["A", "B", "C"]),
            RowEvents::from_events([
                ev("A", &["1", "2", "3"]),
                ev("B", &["0", "2", "3"]),
                ev("C", &["10", "2", "3"]),
            ]),
        )
    }

    fn kinds(t: &TableData) -> Vec<ResEvent> {
        t.row_events().iter().map(|re| re.kind).collect()
    }

    fn ids(t: &TableData) -> Vec<String> {
        t.row_events().iter().map(|re| re.id().to_string()).collect()
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn header(&self, _ns: &str) -> Header {
            header(&["NAME"])
        }

        fn render(&self, obj: &DynamicObject, _ns: &str, row: &mut Row) -> Result<(), BoxError> {
            match obj.metadata.name.as_deref() {
                Some("bad") => Err("boom".into()),
                name => {
                    row.id = name.unwrap_or_default().to_string();
                    row.fields = vec![row.id.clone()];
                    Ok(())
                }
            }
        }
    }

    struct HeadlessRenderer;

    impl Renderer for HeadlessRenderer {
        fn header(&self, _ns: &str) -> Header {
            Header::default()
        }

        fn render(&self, _obj: &DynamicObject, _ns: &str, _row: &mut Row) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[test]
    fn test_update_from_empty_adds_in_order() {
        let t = TableData::new("test");
        t.update(vec![row("C", &["c"]), row("A", &["a"]), row("B", &["b"])]);

        assert_eq!(ids(&t), vec!["C", "A", "B"]);
        assert_eq!(kinds(&t), vec![ResEvent::Add; 3]);
    }

    #[test]
    fn test_update_is_idempotent() {
        let t = abc();
        let rows = vec![row("A", &["1", "2", "3"]), row("B", &["0", "2", "3"]), row("C", &["10", "2", "3"])];
        t.update(rows.clone());
        t.update(rows);

        assert_eq!(kinds(&t), vec![ResEvent::Unchanged; 3]);
        assert!(t.row_events().iter().all(|re| re.deltas.is_blank()));
    }

    #[test]
    fn test_update_records_deltas() {
        let t = abc();
        t.update(vec![row("A", &["10", "2", "3"]), row("B", &["0", "2", "3"]), row("C", &["10", "2", "3"])]);

        let a = t.find_row("A").unwrap();
        assert_eq!(a.kind, ResEvent::Update);
        assert_eq!(a.deltas, DeltaRow(fields(&["1", "", ""])));
        assert_eq!(a.row.fields, fields(&["10", "2", "3"]));
        assert_eq!(t.find_row("B").unwrap().kind, ResEvent::Unchanged);
    }

    #[test]
    fn test_update_adds_and_collects_garbage() {
        let t = abc();
        t.update(vec![row("A", &["1", "2", "3"]), row("C", &["10", "2", "3"]), row("D", &["4", "2", "3"])]);

        assert_eq!(ids(&t), vec!["A", "C", "D"]);
        assert_eq!(
            kinds(&t),
            vec![ResEvent::Unchanged, ResEvent::Unchanged, ResEvent::Add]
        );
        assert!(t.find_row("B").is_none());
        assert_eq!(t.row_events().find_index("D"), Some(2));
    }

    #[test]
    fn test_update_ignores_time_columns() {
        let mut h = header(&["NAME", "AGE"]);
        h.0[1].time = true;
        let t = TableData::with_rows("test", h, RowEvents::from_events([ev("a", &["a", "1m"])]));
        t.update(vec![row("a", &["a", "2m"])]);

        let a = t.find_row("a").unwrap();
        assert_eq!(a.kind, ResEvent::Unchanged);
        assert_eq!(a.row.fields[1], "2m");
    }

    #[test]
    fn test_delete() {
        let t = abc();
        t.delete(&HashSet::from(["B".to_string()]));

        assert_eq!(ids(&t), vec!["B"]);
    }

    fn letters(ids: &[&str]) -> TableData {
        TableData::with_rows(
            "test",
            header(&["A"]),
            RowEvents::from_events(ids.iter().map(|id| ev(id, &[id]))),
        )
    }

    #[test]
    fn test_delete_scattered_rows_keeps_index() {
        let t = letters(&["A", "B", "C", "D", "E", "F"]);
        t.delete(&HashSet::from(["B".to_string(), "E".to_string(), "F".to_string()]));

        assert_eq!(ids(&t), vec!["B", "E", "F"]);
        let re = t.row_events();
        assert_eq!(re.find_index("B"), Some(0));
        assert_eq!(re.find_index("E"), Some(1));
        assert_eq!(re.find_index("F"), Some(2));
        for gone in ["A", "C", "D"] {
            assert_eq!(re.find_index(gone), None);
        }
    }

    #[test]
    fn test_update_collects_unordered_garbage() {
        let t = letters(&["A", "B", "C", "D", "E", "F"]);
        t.update(vec![row("F", &["F"]), row("B", &["B"]), row("D", &["D"])]);

        assert_eq!(ids(&t), vec!["B", "D", "F"]);
        assert_eq!(kinds(&t), vec![ResEvent::Unchanged; 3]);
        let re = t.row_events();
        for (i, id) in ["B", "D", "F"].iter().enumerate() {
            assert_eq!(re.find_index(id), Some(i));
            assert_eq!(re.at(i).unwrap().id(), *id);
        }
        for gone in ["A", "C", "E"] {
            assert!(t.find_row(gone).is_none());
        }
    }

    #[test]
    fn test_reconcile() {
        let t = TableData::new("pods");
        let objects = vec![pod("ns1", "fred", &[]), pod("ns2", "blee", &[("app", "blee")])];
        t.reconcile("", &GenericRenderer, &objects).unwrap();

        assert_eq!(t.header(), GenericRenderer.header(""));
        assert_eq!(ids(&t), vec!["ns1/fred", "ns2/blee"]);
        assert_eq!(kinds(&t), vec![ResEvent::Add; 2]);

        t.reconcile("", &GenericRenderer, &objects[1..]).unwrap();
        assert_eq!(ids(&t), vec!["ns2/blee"]);
        assert_eq!(kinds(&t), vec![ResEvent::Unchanged]);
    }

    #[test]
    fn test_reconcile_render_failure_leaves_table_untouched() {
        let t = TableData::new("pods");
        t.reconcile("", &FailingRenderer, &[pod("ns", "good", &[])]).unwrap();
        let before = t.clone();

        let err = t
            .reconcile("", &FailingRenderer, &[pod("ns", "fred", &[]), pod("ns", "bad", &[])])
            .unwrap_err();
        assert!(matches!(err, ModelError::Render { ref kind, .. } if kind == "pods"));
        assert_eq!(t, before);
    }

    #[test]
    fn test_reconcile_drops_listing_for_stale_scope() {
        let t = TableData::new("pods");
        t.reset("ns1");
        t.reconcile("ns1", &GenericRenderer, &[pod("ns1", "fred", &[])]).unwrap();
        assert_eq!(ids(&t), vec!["ns1/fred"]);

        t.reset("ns2");
        t.reconcile("ns1", &GenericRenderer, &[pod("ns1", "blee", &[])]).unwrap();

        assert!(t.is_empty());
        assert_eq!(t.header_count(), 0);
        assert_eq!(t.namespace(), "ns2");
    }

    #[test]
    fn test_reconcile_without_columns_fails() {
        let t = TableData::new("bozos");
        let err = t.reconcile("", &HeadlessRenderer, &[]).unwrap_err();

        assert!(matches!(err, ModelError::NoColumns(kind) if kind == "bozos"));
    }

    #[test]
    fn test_reset() {
        let t = abc();
        t.reset("ns1");

        assert!(t.is_empty());
        assert_eq!(t.header_count(), 0);
        assert_eq!(t.namespace(), "ns1");
    }

    #[test]
    fn test_diff_ignores_age() {
        let mk = |age: &str| {
            TableData::with_rows(
                "test",
                header(&["NAME", "AGE"]),
                RowEvents::from_events([ev("a", &["a", age])]),
            )
        };

        assert!(!mk("1m").diff(&mk("2m")));
        assert!(mk("1m").diff(&abc()));
        assert!(!abc().diff(&abc()));

        let t = abc();
        t.set_row(0, ev("A", &["1", "2", "4"]));
        assert!(t.diff(&abc()));
    }

    #[test]
    fn test_clone_is_independent() {
        let t = abc();
        let c = t.clone();
        t.update(vec![row("A", &["blee", "2", "3"])]);

        assert_eq!(c, abc());
        assert_ne!(t, c);
    }

    #[test]
    fn test_customize_round_trip() {
        let vs = ViewSetting {
            columns: vec!["A".into(), "B".into(), "C".into()],
            ..Default::default()
        };
        let (t, _) = abc().customize(&vs, SortColumn::default(), false, false);

        assert_eq!(t, abc());
    }

    #[test]
    fn test_customize_wide() {
        let mut h = header(&["A", "B", "C"]);
        h.0[1].wide = true;
        let t = TableData::with_rows("test", h, abc().row_events());
        let vs = ViewSetting {
            columns: vec!["A".into(), "C".into()],
            ..Default::default()
        };
        let (c, sc) = t.customize(&vs, SortColumn::default(), false, true);

        assert_eq!(
            c.header(),
            Header(vec![
                HeaderColumn::new("A"),
                HeaderColumn::new("C"),
                HeaderColumn::wide("B"),
            ])
        );
        assert_eq!(c.row_at(2).unwrap().row.fields, fields(&["10", "3", "2"]));
        assert_eq!(sc, SortColumn::new("A", true));
    }

    #[test]
    fn test_customize_sort_column() {
        let t = TableData::with_rows("test", header(&["NAMESPACE", "NAME", "AGE"]), RowEvents::default());
        let vs = |sort: &str| ViewSetting {
            sort_column: sort.to_string(),
            ..Default::default()
        };

        let (_, sc) = t.customize(&vs("AGE:desc"), SortColumn::default(), false, false);
        assert_eq!(sc, SortColumn::new("AGE", false));

        let (_, sc) = t.customize(&vs("BLEE:desc"), SortColumn::default(), false, false);
        assert_eq!(sc, SortColumn::new("NAMESPACE", true));

        t.set_header("ns1", t.header());
        let (_, sc) = t.customize(&vs("BLEE:desc"), SortColumn::default(), false, false);
        assert_eq!(sc, SortColumn::new("NAME", true));

        let manual = SortColumn::new("AGE", true);
        let (_, sc) = t.customize(&vs("NAME:desc"), manual.clone(), true, false);
        assert_eq!(sc, manual);

        let (_, sc) = t.customize(&ViewSetting::default(), manual.clone(), false, false);
        assert_eq!(sc, manual);
    }

    #[test]
    fn test_sort() {
        let t = abc();
        t.sort(&SortColumn::new("A", true));
        assert_eq!(ids(&t), vec!["B", "A", "C"]);

        t.sort(&SortColumn::new("A", false));
        assert_eq!(ids(&t), vec!["C", "A", "B"]);

        t.sort(&SortColumn::new("BLEE", true));
        assert_eq!(ids(&t), vec!["C", "A", "B"]);
    }

    fn pods() -> TableData {
        TableData::full(
            "pods",
            "",
            header(&["NAMESPACE", "NAME", "STATUS", "AGE"]),
            RowEvents::from_events([
                ev("default/nginx", &["default", "nginx", "Running", "1m"]),
                ev("kube-system/coredns", &["kube-system", "coredns", "Running", "2m"]),
                ev("default/redis", &["default", "redis", "Pending", "3m"]),
            ]),
        )
    }

    fn filtered(t: &TableData, q: &str) -> Vec<String> {
        ids(&t.filter(&FilterOpts {
            filter: q.to_string(),
            ..Default::default()
        }))
    }

    #[test]
    fn test_filter_rx() {
        let t = pods();

        assert_eq!(filtered(&t, "PENDING"), vec!["default/redis"]);
        assert_eq!(filtered(&t, "default"), vec!["default/nginx", "default/redis"]);
        assert_eq!(filtered(&t, "!running"), vec!["default/redis"]);
        assert_eq!(filtered(&t, "1m"), Vec::<String>::new());
        assert_eq!(filtered(&t, ""), ids(&t));
    }

    #[test]
    fn test_filter_skips_namespace_when_namespaced() {
        let t = pods();
        t.set_header("default", t.header());

        assert!(filtered(&t, "default").is_empty());
    }

    #[test]
    fn test_filter_label_selector_and_invalid_rx() {
        let t = pods();

        assert_eq!(filtered(&t, "app=nginx"), ids(&t));
        assert_eq!(filtered(&t, "(nginx"), ids(&t));
    }

    #[test]
    fn test_filter_fuzzy() {
        assert_eq!(filtered(&pods(), "-f cdns"), vec!["kube-system/coredns"]);
    }

    #[test]
    fn test_filter_toast() {
        let t = TableData::with_rows(
            "pods",
            header(&["NAME", "VALID"]),
            RowEvents::from_events([ev("a", &["a", ""]), ev("b", &["b", "bad image"])]),
        );
        let f = t.filter(&FilterOpts {
            toast: true,
            ..Default::default()
        });

        assert_eq!(ids(&f), vec!["b"]);
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn test_labelize() {
        let t = TableData::full(
            "pods",
            "",
            Header(vec![
                HeaderColumn::new("NAMESPACE"),
                HeaderColumn::new("NAME"),
                HeaderColumn::wide("LABELS"),
            ]),
            RowEvents::from_events([
                ev("ns/a", &["ns", "a", "tier=web,app=nginx"]),
                ev("ns/b", &["ns", "b", "app=redis"]),
            ]),
        );
        let l = t.labelize(&[]);

        assert_eq!(l.column_names(true), vec!["NAMESPACE", "NAME", "app", "tier"]);
        assert_eq!(l.row_at(0).unwrap().row.fields, fields(&["ns", "a", "nginx", "web"]));
        assert_eq!(l.row_at(1).unwrap().row.fields, fields(&["ns", "b", "redis", ""]));

        t.set_header("ns", t.header());
        assert_eq!(t.labelize(&["app".into()]).column_names(true), vec!["NAME", "app"]);
        assert_eq!(abc().labelize(&[]), abc());
    }
}
