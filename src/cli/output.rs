// Output formatting for CLI

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use super::config::OutputFormat;

/// Tag fields of one file, as printed by `read`
#[derive(Debug, Serialize)]
pub struct TagReport<'a> {
    pub path: String,
    pub format: &'a str,
    pub tag_format: &'a str,
    pub fields: BTreeMap<String, String>,
}

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Output the tag fields of one file
    pub fn output_tag(&self, report: &TagReport<'_>, writer: &mut impl Write) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(writer, "{} ({}, {})", report.path, report.format, report.tag_format)?;
                if report.fields.is_empty() {
                    writeln!(writer, "  (no tag fields)")?;
                }
                let width = report.fields.keys().map(|key| key.len()).max().unwrap_or(0);
                for (key, value) in &report.fields {
                    writeln!(writer, "  {:<width$}  {}", key, value, width = width)?;
                }
            }
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(report)?)?;
            }
            OutputFormat::KeyValue => {
                for (key, value) in &report.fields {
                    writeln!(writer, "{}={}", key, value)?;
                }
            }
        }
        Ok(())
    }

    /// Output any serializable record; pretty and key-value formats flatten one level
    pub fn output_value(&self, value: &serde_json::Value, writer: &mut impl Write) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(value)?)?;
            }
            OutputFormat::Pretty => {
                if let Some(obj) = value.as_object() {
                    let width = obj.keys().map(|key| key.len()).max().unwrap_or(0);
                    for (key, value) in obj {
                        writeln!(writer, "{:<width$}  {}", key, format_value(value), width = width)?;
                    }
                }
            }
            OutputFormat::KeyValue => {
                if let Some(obj) = value.as_object() {
                    for (key, value) in obj {
                        writeln!(writer, "{}={}", key, format_value(value))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            println!("✓ {}", message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
}

/// Format a JSON value for display
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Array(arr) => {
            if arr.is_empty() {
                "[]".to_string()
            } else {
                arr.iter().map(format_value).collect::<Vec<_>>().join(", ")
            }
        }
        serde_json::Value::Object(obj) => {
            if obj.is_empty() {
                "{}".to_string()
            } else {
                obj.iter()
                    .map(|(key, value)| format!("{}: {}", key, format_value(value)))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> TagReport<'static> {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "Naima".to_string());
        fields.insert("artist".to_string(), "Coltrane".to_string());
        TagReport {
            path: "a.wav".to_string(),
            format: "WAV",
            tag_format: "WAV",
            fields,
        }
    }

    #[test]
    fn key_value_lines() {
        let mut out = Vec::new();
        OutputFormatter::new(OutputFormat::KeyValue, false)
            .output_tag(&report(), &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "artist=Coltrane\ntitle=Naima\n");
    }

    #[test]
    fn json_document() {
        let mut out = Vec::new();
        OutputFormatter::new(OutputFormat::Json, false)
            .output_tag(&report(), &mut out)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["fields"]["title"], "Naima");
        assert_eq!(value["format"], "WAV");
    }

    #[test]
    fn flattens_nested_values() {
        let value = serde_json::json!({"chunks": [{"id": "fmt "}, {"id": "data"}], "rate": null});
        assert_eq!(format_value(&value["chunks"]), "id: fmt , id: data");
        assert_eq!(format_value(&value["rate"]), "-");
    }
}
