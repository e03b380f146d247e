//! Generated-document table built from the server's CSV responses.
//!
//! The first CSV row is the header; each following row becomes a
//! [`ResultRow`] keyed by that header. The server writes its index column
//! under an empty header name, which is dropped before a row is sent back
//! to `/build_pdf`.

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};

/// Split CSV text into records. Handles quoted fields (with `""` escapes
/// and embedded newlines) and both `\n` and `\r\n` line endings. Blank
/// lines are skipped.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(anyhow!("unterminated quoted field"));
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}

/// One generated document: `(column, value)` pairs in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    cells: Vec<(String, String)>,
}

impl ResultRow {
    pub fn from_record(header: &[String], record: &[String]) -> Self {
        let mut cells: Vec<(String, String)> = Vec::with_capacity(header.len());
        for (i, column) in header.iter().enumerate() {
            let value = record.get(i).cloned().unwrap_or_default();
            // later duplicate columns win, like keyed object construction
            match cells.iter_mut().find(|(c, _)| c == column) {
                Some(cell) => cell.1 = value,
                None => cells.push((column.clone(), value)),
            }
        }
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, v)| v.as_str())
    }

    /// Body for `POST /build_pdf`: every column except the unnamed index.
    pub fn build_payload(&self) -> Map<String, Value> {
        self.cells
            .iter()
            .filter(|(c, _)| !c.is_empty())
            .map(|(c, v)| (c.clone(), Value::String(v.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    header: Vec<String>,
    rows: Vec<ResultRow>,
    visible: bool,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&ResultRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Empties the table and hides it until the next fill.
    pub fn clear(&mut self) {
        self.header.clear();
        self.rows.clear();
        self.visible = false;
    }

    /// Adds the rows of one CSV response. In reset mode the table is
    /// cleared and takes its header from the response; otherwise rows are
    /// appended under the existing header. Returns the number of rows
    /// added.
    pub fn fill(&mut self, csv: &str, reset: bool) -> Result<usize> {
        let records = parse_csv(csv)?;
        if reset {
            self.clear();
        }
        let Some((header, body)) = records.split_first() else {
            self.visible = true;
            return Ok(0);
        };
        if reset || self.header.is_empty() {
            self.header = header.clone();
        }
        for record in body {
            self.rows.push(ResultRow::from_record(header, record));
        }
        self.visible = true;
        Ok(body.len())
    }

    /// Plain-text rendering for terminals.
    pub fn render(&self) -> String {
        let columns = self.header.len();
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, v) in row.values().enumerate().take(columns) {
                widths[i] = widths[i].max(v.chars().count());
            }
        }
        let line = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{:<w$}", c, w = widths.get(i).copied().unwrap_or(0)))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };
        let mut out = vec![line(self.header.iter().map(String::as_str).collect())];
        out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
        for row in &self.rows {
            out.push(line(row.values().take(columns).collect()));
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CSV: &str = ",flag,font,nbPages\n0,True,serif,3\n1,False,\"sans, light\",5\n";

    #[test]
    fn test_parse_csv_quotes() {
        let rows = parse_csv("a,\"b \"\"q\"\"\",c\r\n\"multi\nline\",,x\n\n").unwrap();
        assert_eq!(rows[0], vec!["a", "b \"q\"", "c"]);
        assert_eq!(rows[1], vec!["multi\nline", "", "x"]);
        assert_eq!(rows.len(), 2);
        assert!(parse_csv("\"open").is_err());
        assert_eq!(parse_csv("a,b").unwrap(), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_fill_reset_then_append() {
        let mut t = ResultsTable::new();
        assert_eq!(t.fill(CSV, true).unwrap(), 2);
        assert!(t.is_visible());
        assert_eq!(t.header(), &["", "flag", "font", "nbPages"]);
        assert_eq!(t.row(1).unwrap().get("font"), Some("sans, light"));

        assert_eq!(t.fill(CSV, false).unwrap(), 2);
        assert_eq!(t.len(), 4);

        assert_eq!(t.fill(CSV, true).unwrap(), 2);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_build_payload_drops_index() {
        let mut t = ResultsTable::new();
        t.fill(CSV, true).unwrap();
        let payload = t.row(0).unwrap().build_payload();
        assert_eq!(
            Value::Object(payload),
            json!({"flag": "True", "font": "serif", "nbPages": "3"})
        );
    }

    #[test]
    fn test_render_aligns_columns() {
        let mut t = ResultsTable::new();
        t.fill("id,name\n1,alpha\n22,b\n", true).unwrap();
        let text = t.render();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "id | name");
        assert_eq!(lines[2], "1  | alpha");
        assert_eq!(lines[3], "22 | b");
    }
}
