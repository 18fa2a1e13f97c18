use colored::Colorize;
use edflow::api::{CmdMessage, CmdResult, FieldValue, MessageLevel};
use edflow::error::{EdflowError, Result};
use edflow::model::{Kind, Record};
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const ID_WIDTH: usize = 6;
const NAME_WIDTH: usize = 22;
const TAG_WIDTH: usize = 12;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
        }
    }
}

pub(super) fn print_json(result: &CmdResult) -> Result<()> {
    let out = serde_json::to_string_pretty(result).map_err(EdflowError::Serialization)?;
    println!("{}", out);
    Ok(())
}

pub(super) fn print_list(kind: Kind, records: &[Record]) {
    if records.is_empty() {
        let noun = match kind {
            Kind::Status => "statuses",
            Kind::MetadataField => "metadata fields",
        };
        println!("No {} found.", noun);
        return;
    }

    for record in records {
        println!("{}", format_row(record));
    }
}

/// One list row: position, id, name, a kind-specific tag, description.
pub(super) fn format_row(record: &Record) -> String {
    let position = format!("{:>3}. ", record.position);
    let id = format!("{:<width$}", format!("#{}", record.id), width = ID_WIDTH);
    let name = pad_to_width(&truncate_to_width(&record.name, NAME_WIDTH), NAME_WIDTH);
    let tag = pad_to_width(&kind_tag(record), TAG_WIDTH);

    let fixed = position.width() + ID_WIDTH + NAME_WIDTH + TAG_WIDTH + 3;
    let description = truncate_to_width(&record.description, LINE_WIDTH.saturating_sub(fixed));

    format!(
        "{}{} {} {} {}",
        position.yellow(),
        id.dimmed(),
        name.bold(),
        tag.cyan(),
        description.dimmed()
    )
    .trim_end()
    .to_string()
}

pub(super) fn print_record(record: &Record) {
    println!("{} {}", format!("#{}", record.id).yellow(), record.name.bold());
    println!("--------------------------------");
    println!("slug:        {}", record.slug);
    println!("position:    {}", record.position);
    match record.kind {
        Kind::Status => println!(
            "review:      {}",
            if record.is_review_required() { "required" } else { "no" }
        ),
        Kind::MetadataField => {
            if let Some(metadata_type) = record.metadata_type {
                println!("type:        {}", metadata_type);
            }
            if let Some(key) = &record.storage_key {
                println!("storage key: {}", key);
            }
        }
    }
    if !record.description.is_empty() {
        println!("description: {}", record.description);
    }
}

pub(super) fn print_values(values: &[FieldValue]) {
    let width = values.iter().map(|v| v.field.width()).max().unwrap_or(0);
    for value in values {
        println!(
            "{}  {}",
            pad_to_width(&value.field, width).bold(),
            format_value(&value.value)
        );
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind_tag(record: &Record) -> String {
    match record.kind {
        Kind::Status if record.is_review_required() => "review".to_string(),
        Kind::Status => String::new(),
        Kind::MetadataField => record
            .metadata_type
            .map(|t| t.to_string())
            .unwrap_or_default(),
    }
}

fn pad_to_width(s: &str, width: usize) -> String {
    let padding = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(padding))
}

pub(super) fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}
