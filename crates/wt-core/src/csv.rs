use regex::Regex;
use std::sync::LazyLock;

static LINE_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\n\r|\n|\r").unwrap());

/// Header plus raw rows of one comma-separated file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    /// Data rows in file order. Row `i` here is line `i + 1` of the file.
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Split text into a header row and data rows.
    /// Returns `None` when the text has no header line.
    ///
    /// Lines are split before quotes are considered, so a quoted field
    /// cannot span a line break: it ends up as two broken rows.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = LINE_SPLIT.split(text);
        let header = split_fields(lines.next()?);
        if header.len() == 1 && header[0].is_empty() {
            return None;
        }
        let rows = lines.map(split_fields).collect();
        Some(Self { header, rows })
    }
}

/// Split one line on commas that are not inside double quotes.
///
/// Quoted fields lose their enclosing quotes and `""` collapses to `"`.
/// An empty line yields a single empty field.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_split() {
        assert_eq!(split_fields("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_quoted_delimiter() {
        assert_eq!(
            split_fields(r#"2020-01-01,"hello, world",3"#),
            vec!["2020-01-01", "hello, world", "3"]
        );
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(split_fields(r#""say ""hi""",1"#), vec![r#"say "hi""#, "1"]);
    }

    #[test]
    fn test_empty_fields_kept() {
        assert_eq!(split_fields(",,"), vec!["", "", ""]);
        assert_eq!(split_fields(""), vec![""]);
    }

    #[test]
    fn test_table_mixed_line_endings() {
        let table = CsvTable::parse("date,word,count\r\n2020-01-01,a,1\n2020-01-02,b,2\r").unwrap();
        assert_eq!(table.header, vec!["date", "word", "count"]);
        // trailing separator leaves one blank row
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1], vec!["2020-01-02", "b", "2"]);
        assert_eq!(table.rows[2], vec![""]);
    }

    #[test]
    fn test_quoted_line_break_splits_row() {
        let table = CsvTable::parse("date,word,count\n2020-01-01,\"two\nlines\",1").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["2020-01-01", "two"]);
        assert_eq!(table.rows[1], vec!["lines,1"]);
    }

    #[test]
    fn test_table_empty_text() {
        assert!(CsvTable::parse("").is_none());
    }
}
