use std::collections::BTreeMap;

use super::sort::{compare_values, natural_cmp, ColumnKind};

/// The rendered values of one row, parallel to the table header.
pub type Fields = Vec<String>;

/// Projects `fields` onto `cols`; missing or out-of-range indices yield "".
pub fn customize_fields(fields: &[String], cols: &[Option<usize>]) -> Fields {
    cols.iter()
        .map(|col| {
            col.and_then(|c| fields.get(c))
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

/// Returns true if the two field sets differ outside of `age_col`.
pub fn fields_diff(f1: &[String], f2: &[String], age_col: Option<usize>) -> bool {
    if f1.len() != f2.len() {
        return true;
    }
    f1.iter()
        .zip(f2)
        .enumerate()
        .any(|(i, (a, b))| Some(i) != age_col && a != b)
}

/// Parses a serialized label set (`k1=v1,k2=v2`) into a sorted map.
pub fn labelize(labels: &str) -> BTreeMap<String, String> {
    labels
        .split(',')
        .filter_map(|kv| {
            let mut tokens = kv.split('=');
            match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(k), Some(v), None) => Some((k.to_string(), v.to_string())),
                _ => None,
            }
        })
        .collect()
}

/// Row represents a collection of columns identified by a stable id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub id: String,
    pub fields: Fields,
}

impl Row {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// A row with `size` blank fields, ready for a renderer to fill in.
    pub fn with_size(size: usize) -> Self {
        Self {
            id: String::new(),
            fields: vec![String::new(); size],
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn customize(&self, cols: &[Option<usize>]) -> Row {
        Row {
            id: self.id.clone(),
            fields: customize_fields(&self.fields, cols),
        }
    }

    /// Keeps `cols` and appends one field per label key, blank when absent.
    pub fn labelize(&self, cols: &[usize], label_col: usize, labels: &[String]) -> Row {
        let mut fields = Vec::with_capacity(cols.len() + labels.len());
        fields.extend(
            cols.iter()
                .map(|c| self.fields.get(*c).cloned().unwrap_or_default()),
        );
        let kv = labelize(self.fields.get(label_col).map(String::as_str).unwrap_or(""));
        fields.extend(labels.iter().map(|l| kv.get(l).cloned().unwrap_or_default()));

        Row {
            id: self.id.clone(),
            fields,
        }
    }

    pub fn diff(&self, other: &Row, age_col: Option<usize>) -> bool {
        self.id != other.id || fields_diff(&self.fields, &other.fields, age_col)
    }
}

/// Rows is a plain ordered collection of rows, used on the rendering side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rows(pub Vec<Row>);

impl Rows {
    pub fn find(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|r| r.id == id)
    }

    pub fn upsert(&mut self, row: Row) {
        match self.find(&row.id) {
            Some(idx) => self.0[idx] = row,
            None => self.0.push(row),
        }
    }

    /// Removes the row with `id`; unknown ids are ignored.
    pub fn delete(&mut self, id: &str) {
        if let Some(idx) = self.find(id) {
            self.0.remove(idx);
        }
    }

    pub fn sort(&mut self, col: usize, asc: bool, kind: ColumnKind) {
        self.0.sort_by(|r1, r2| {
            let v1 = r1.fields.get(col).map(String::as_str).unwrap_or("");
            let v2 = r2.fields.get(col).map(String::as_str).unwrap_or("");
            let ord = compare_values(kind, v1, v2);
            let ord = if asc { ord } else { ord.reverse() };
            ord.then_with(|| natural_cmp(&r1.id, &r2.id))
        });
    }
}

impl From<Vec<Row>> for Rows {
    fn from(rows: Vec<Row>) -> Self {
        Self(rows)
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
pub(crate) fn fields(ff: &[&str]) -> Fields {
    ff.iter().map(|f| f.to_string()).collect()
}
