use serde::Serialize;

/// A single cell as it came off the source. No type guarantee: sheet entries
/// and automation grids hand back text, catalog pages mix text and numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Text(String),
    Number(f64),
    Empty,
}

impl RawCell {
    /// Render the cell as text, for header naming and type coercion.
    pub fn as_text(&self) -> String {
        match self {
            RawCell::Text(s) => s.clone(),
            RawCell::Number(n) => n.to_string(),
            RawCell::Empty => String::new(),
        }
    }

    /// Empty, or text that trims to nothing.
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Number(_) => false,
            RawCell::Empty => true,
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        RawCell::Text(s.to_string())
    }
}

impl From<String> for RawCell {
    fn from(s: String) -> Self {
        RawCell::Text(s)
    }
}

/// Unprocessed grid of values from one source fetch. Row lengths may be
/// irregular and there is no declared header row.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, row: Vec<RawCell>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a table of text cells from string rows.
    pub fn from_strings<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<RawCell>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

/// A typed cell value in a normalized table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Text(String),
    Number(f64),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a delimited-text field. `Missing` is the empty
    /// field; numbers use the plain `f64` display (no trailing `.0`).
    pub fn render(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Missing => String::new(),
        }
    }
}

/// Rectangular, typed result of normalization. Column names are unique and
/// trimmed; every row holds exactly one value per column, positionally.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl NormalizedTable {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Look up a cell by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells() {
        assert!(RawCell::Empty.is_blank());
        assert!(RawCell::Text("   ".into()).is_blank());
        assert!(!RawCell::Text("x".into()).is_blank());
        assert!(!RawCell::Number(0.0).is_blank());
    }

    #[test]
    fn render_drops_trailing_zero() {
        assert_eq!(Value::Number(1234.0).render(), "1234");
        assert_eq!(Value::Number(1234.5).render(), "1234.5");
        assert_eq!(Value::Missing.render(), "");
    }

    #[test]
    fn value_lookup_by_column_name() {
        let table = NormalizedTable {
            columns: vec!["ID".into(), "Name".into()],
            rows: vec![vec![Value::Text("1".into()), Value::Text("Widget".into())]],
        };
        assert_eq!(table.value(0, "Name"), Some(&Value::Text("Widget".into())));
        assert_eq!(table.value(0, "Price"), None);
        assert_eq!(table.value(1, "ID"), None);
    }
}
