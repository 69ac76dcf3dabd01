//! Rendering of API responses.
//!
//! Every command ends by handing a JSON value to [`print`]. JSON goes to stdout
//! unchanged (compact unless `--pretty`), tables and markdown are derived from
//! the shape of the value.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use crate::{Error, Res, warning};

const MAX_CELL_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
    #[value(alias = "md")]
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "table" => Some(OutputFormat::Table),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputOptions {
    /// Combines `--output`, `GPLAY_DEFAULT_OUTPUT` and `--pretty`.
    pub fn resolve(flag: Option<OutputFormat>, env_default: Option<&str>, pretty: bool) -> Res<Self> {
        let format = match (flag, env_default) {
            (Some(format), _) => format,
            (None, Some(value)) => OutputFormat::parse(value).unwrap_or_else(|| {
                warning!(
                    "invalid GPLAY_DEFAULT_OUTPUT value {:?}, falling back to json",
                    value
                );
                OutputFormat::Json
            }),
            (None, None) => OutputFormat::Json,
        };

        if pretty && format != OutputFormat::Json {
            return Err(Error::usage("--pretty is only valid with JSON output"));
        }

        Ok(Self { format, pretty })
    }
}

/// Serializes `value` and writes it to stdout in the selected format.
pub fn print<T: Serialize + ?Sized>(value: &T, opts: OutputOptions) -> Res<()> {
    let value = serde_json::to_value(value)?;
    println!("{}", render(&value, opts)?);
    Ok(())
}

pub fn render(value: &Value, opts: OutputOptions) -> Res<String> {
    match opts.format {
        OutputFormat::Json if opts.pretty => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::Table => Ok(render_rows(value, false)),
        OutputFormat::Markdown => Ok(render_rows(value, true)),
    }
}

fn render_rows(value: &Value, markdown: bool) -> String {
    let Some((header, rows)) = to_rows(value) else {
        return cell(value);
    };
    if rows.is_empty() {
        return "No results found.".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    if markdown {
        table.with(Style::markdown());
    }
    table.to_string()
}

/// Flattens a value into a header and rows, or `None` for scalars.
pub fn to_rows(value: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    if let Some(items) = list_items(value) {
        return Some(item_rows(items));
    }

    let object = value.as_object()?;
    let rows = object
        .iter()
        .map(|(key, value)| vec![key.clone(), cell(value)])
        .collect();
    Some((vec!["field".to_string(), "value".to_string()], rows))
}

// an array, or an object carrying exactly one array field (`{"tracks": [...]}`)
fn list_items(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(object) => {
            let mut arrays = object.values().filter_map(Value::as_array);
            match (arrays.next(), arrays.next()) {
                (Some(items), None) if items.iter().all(Value::is_object) => Some(items),
                _ => None,
            }
        }
        _ => None,
    }
}

fn item_rows(items: &[Value]) -> (Vec<String>, Vec<Vec<String>>) {
    if !items.iter().all(Value::is_object) {
        let rows = items.iter().map(|item| vec![cell(item)]).collect();
        return (vec!["value".to_string()], rows);
    }

    let mut columns: Vec<String> = Vec::new();
    for item in items {
        if let Some(object) = item.as_object() {
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let rows = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|column| item.get(column).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();

    (columns, rows)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => truncate(&value.to_string(), MAX_CELL_WIDTH),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max - 3).collect();
    short.push_str("...");
    short
}
