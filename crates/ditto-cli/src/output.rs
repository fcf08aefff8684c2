//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use colored::Colorize;
use ditto_api_models::{ApiResource, Connection, NormalizedRecord, Thing, WhoAmI};
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};

use crate::client::{CliError, CliResult};

/// Rendering mode chosen once per invocation by the global `--table` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum OutputFormat {
    #[default]
    Json,
    Table,
}

impl OutputFormat {
    pub(crate) const fn from_table_flag(table: bool) -> Self {
        if table { Self::Table } else { Self::Json }
    }
}

/// Pretty-print a value with two-space indentation.
pub(crate) fn render_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = render_json(value)?;
    println!("{text}");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn alignment(self) -> Alignment {
        match self {
            Self::Left => Alignment::left(),
            Self::Center => Alignment::center(),
            Self::Right => Alignment::right(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnStyle {
    Cyan,
    Green,
    Yellow,
    Blue,
}

impl ColumnStyle {
    fn paint(self, text: &str) -> String {
        match self {
            Self::Cyan => text.cyan().to_string(),
            Self::Green => text.green().to_string(),
            Self::Yellow => text.yellow().to_string(),
            Self::Blue => text.blue().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Column {
    pub(crate) name: &'static str,
    pub(crate) align: Align,
    pub(crate) style: ColumnStyle,
}

impl Column {
    pub(crate) const fn new(name: &'static str, align: Align, style: ColumnStyle) -> Self {
        Self { name, align, style }
    }
}

/// Titled table description, discarded after rendering.
#[derive(Debug, Clone)]
pub(crate) struct TableSpec {
    pub(crate) title: &'static str,
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Vec<String>>,
}

impl TableSpec {
    pub(crate) const fn new(title: &'static str, columns: Vec<Column>) -> Self {
        Self {
            title,
            columns,
            rows: Vec::new(),
        }
    }

    pub(crate) fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub(crate) fn render(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|column| column.name.to_string()));
        for row in &self.rows {
            builder.push_record(
                row.iter()
                    .zip(&self.columns)
                    .map(|(cell, column)| column.style.paint(cell)),
            );
        }

        let mut table = builder.build();
        table.with(Style::modern());
        for (index, column) in self.columns.iter().enumerate() {
            table.with(Modify::new(Columns::single(index)).with(column.align.alignment()));
        }
        format!("{}\n{table}", self.title.bold())
    }

    pub(crate) fn print(&self) {
        println!("{}", self.render());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl MessageLevel {
    const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

pub(crate) fn format_message(level: MessageLevel, text: &str) -> String {
    format!("[{}] {text}", level.label())
}

/// Print a leveled status line; errors go to stderr.
pub(crate) fn emit(level: MessageLevel, text: &str) {
    let line = format_message(level, text);
    if level == MessageLevel::Error {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

/// Render a list of things as a JSON array of normalized records or as a table.
pub(crate) fn render_thing_list(things: &[Thing], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&records(things)),
        OutputFormat::Table => {
            if things.is_empty() {
                emit(MessageLevel::Warning, "No things found");
            } else {
                thing_table(things).print();
            }
            Ok(())
        }
    }
}

pub(crate) fn render_connection_list(
    connections: &[Connection],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&records(connections)),
        OutputFormat::Table => {
            if connections.is_empty() {
                emit(MessageLevel::Warning, "No connections found");
            } else {
                connection_table(connections).print();
            }
            Ok(())
        }
    }
}

pub(crate) fn render_whoami(identity: &WhoAmI, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&identity.to_record()),
        OutputFormat::Table => {
            whoami_table(identity).print();
            Ok(())
        }
    }
}

fn records<R: ApiResource>(resources: &[R]) -> Vec<NormalizedRecord> {
    resources.iter().map(ApiResource::to_record).collect()
}

pub(crate) fn thing_table(things: &[Thing]) -> TableSpec {
    let mut table = TableSpec::new(
        "Ditto Things",
        vec![
            Column::new("Thing ID", Align::Left, ColumnStyle::Cyan),
            Column::new("Features", Align::Center, ColumnStyle::Yellow),
        ],
    );
    for thing in things {
        table.push_row(vec![
            thing.thing_id.clone().unwrap_or_default(),
            thing.feature_count().to_string(),
        ]);
    }
    table
}

pub(crate) fn connection_table(connections: &[Connection]) -> TableSpec {
    let mut table = TableSpec::new(
        "Ditto Connections",
        vec![
            Column::new("Connection ID", Align::Left, ColumnStyle::Cyan),
            Column::new("Status", Align::Center, ColumnStyle::Green),
            Column::new("Type", Align::Center, ColumnStyle::Yellow),
            Column::new("URI", Align::Left, ColumnStyle::Blue),
        ],
    );
    for connection in connections {
        table.push_row(vec![
            connection.id.clone().unwrap_or_default(),
            connection.connection_status.clone().unwrap_or_default(),
            connection.connection_type.clone().unwrap_or_default(),
            connection
                .uri
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
        ]);
    }
    table
}

pub(crate) fn whoami_table(identity: &WhoAmI) -> TableSpec {
    let mut table = TableSpec::new(
        "Current User Information",
        vec![
            Column::new("Property", Align::Right, ColumnStyle::Cyan),
            Column::new("Value", Align::Left, ColumnStyle::Green),
        ],
    );
    table.push_row(vec![
        "Default Subject".to_string(),
        identity
            .default_subject
            .clone()
            .unwrap_or_else(|| "N/A".to_string()),
    ]);
    let subjects = if identity.subjects.is_empty() {
        "None".to_string()
    } else {
        identity.subjects.join(", ")
    };
    table.push_row(vec!["Subjects".to_string(), subjects]);
    table
}

/// Whether a response document carries anything worth printing.
pub(crate) fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}
