//! Output formatting for CLI

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Render `rows` in the selected format. `text` renders one row as a line.
pub fn render_rows<T, F>(rows: &[T], format: OutputFormat, text: F) -> anyhow::Result<String>
where
    T: Serialize + Tabled,
    F: Fn(&T) -> String,
{
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(rows)?,
        OutputFormat::Table => Table::new(rows).with(Style::rounded()).to_string(),
        OutputFormat::Text => rows.iter().map(text).collect::<Vec<_>>().join("\n"),
    })
}

pub fn optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Tabled)]
    struct Row {
        id: String,
        seconds: f64,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: "a".to_string(),
                seconds: 1.5,
            },
            Row {
                id: "b".to_string(),
                seconds: 0.0,
            },
        ]
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_render_json() {
        let out = render_rows(&rows(), OutputFormat::Json, |_| String::new()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[1]["id"], "b");
    }

    #[test]
    fn test_render_text_and_table() {
        let text = render_rows(&rows(), OutputFormat::Text, |r| r.id.clone()).unwrap();
        assert_eq!(text, "a\nb");

        let table = render_rows(&rows(), OutputFormat::Table, |_| String::new()).unwrap();
        assert!(table.contains("seconds"));
        assert!(table.contains("1.5"));
    }
}
