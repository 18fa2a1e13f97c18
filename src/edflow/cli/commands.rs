//! # CLI Layer
//!
//! One possible client of [`edflow::api::WorkflowApi`]. This is the only place
//! that parses arguments, writes to stdout/stderr and installs a tracing
//! subscriber.
//!
//! ## Structure
//!
//! - `run()`: main dispatch logic (called by `main.rs`)
//! - `handle_*()`: per-command handlers that call the API and print results
//! - `emit()`: prints a `CmdResult` as text or, with `--json`, as JSON
//!
//! With `--json`, failures are printed to stdout as an `ErrorResponse` before
//! the process exits non-zero.

use super::render::{print_json, print_list, print_messages, print_record, print_values};
use super::setup::{Cli, CommonAttrs, Commands, FieldCommands, MetaCommands, StatusCommands};
use clap::Parser;
use edflow::api::{CmdMessage, CmdResult, TermInput};
use edflow::error::{EdflowError, Result};
use edflow::init::{ensure_config, initialize, EdflowContext};
use edflow::model::Kind;

struct AppContext {
    ctx: EdflowContext,
    json: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let json = cli.json;
    let outcome = initialize(cli.dir).and_then(|ctx| {
        let mut app = AppContext { ctx, json };
        dispatch(&mut app, cli.command)
    });

    if let Err(err) = &outcome {
        if json {
            report_json_error(err)?;
        }
    }
    outcome
}

fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}

fn dispatch(app: &mut AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Status(cmd) => handle_status(app, cmd),
        Commands::Field(cmd) => handle_field(app, cmd),
        Commands::Meta(cmd) => handle_meta(app, cmd),
        Commands::Init => handle_init(app),
    }
}

fn handle_status(app: &mut AppContext, cmd: StatusCommands) -> Result<()> {
    let kind = Kind::Status;
    let api = &mut app.ctx.api;
    let result = match cmd {
        StatusCommands::List => api.list(kind)?,
        StatusCommands::Add {
            name,
            attrs,
            review,
        } => api.create(kind, &name, term_input(attrs, Some(review), None))?,
        StatusCommands::Edit {
            id,
            name,
            attrs,
            review,
        } => api.update(kind, &id, name.as_deref(), term_input(attrs, review, None))?,
        StatusCommands::Rm { id } => api.delete(kind, &id)?,
        StatusCommands::Reorder { ids } => api.reorder_ids(kind, &ids)?,
        StatusCommands::Show { key } => api.get(kind, &key)?,
        StatusCommands::Next { slug } => api.next_status(&slug)?,
    };
    emit(app, kind, &result)
}

fn handle_field(app: &mut AppContext, cmd: FieldCommands) -> Result<()> {
    let kind = Kind::MetadataField;
    let api = &mut app.ctx.api;
    let result = match cmd {
        FieldCommands::List => api.list(kind)?,
        FieldCommands::Add {
            name,
            metadata_type,
            attrs,
        } => api.create(kind, &name, term_input(attrs, None, Some(metadata_type)))?,
        FieldCommands::Edit {
            id,
            name,
            metadata_type,
            attrs,
        } => api.update(
            kind,
            &id,
            name.as_deref(),
            term_input(attrs, None, metadata_type),
        )?,
        FieldCommands::Rm { id } => api.delete(kind, &id)?,
        FieldCommands::Reorder { ids } => api.reorder_ids(kind, &ids)?,
        FieldCommands::Show { key } => api.get(kind, &key)?,
    };
    emit(app, kind, &result)
}

fn handle_meta(app: &mut AppContext, cmd: MetaCommands) -> Result<()> {
    let api = &mut app.ctx.api;
    let result = match cmd {
        MetaCommands::Set {
            post_id,
            field,
            value,
        } => api.set_field_value(post_id, &field, &value)?,
        MetaCommands::Show { post_id } => api.post_values(post_id)?,
    };
    emit(app, Kind::MetadataField, &result)
}

fn handle_init(app: &mut AppContext) -> Result<()> {
    let wrote_config = ensure_config(&app.ctx)?;
    let mut result = app.ctx.api.install_defaults()?;
    if wrote_config {
        result.messages.insert(
            0,
            CmdMessage::info(format!(
                "Wrote {}",
                app.ctx.data_dir.join("config.json").display()
            )),
        );
    }
    if app.json {
        return print_json(&result);
    }
    print_messages(&result.messages);
    Ok(())
}

fn emit(app: &AppContext, kind: Kind, result: &CmdResult) -> Result<()> {
    if app.json {
        return print_json(result);
    }

    let is_empty =
        result.affected.is_empty() && result.values.is_empty() && result.messages.is_empty();
    if !result.listed.is_empty() || is_empty {
        print_list(kind, &result.listed);
    }
    for (i, record) in result.affected.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_record(record);
    }
    print_values(&result.values);
    print_messages(&result.messages);
    Ok(())
}

fn report_json_error(err: &EdflowError) -> Result<()> {
    let body =
        serde_json::to_string_pretty(&err.response()).map_err(EdflowError::Serialization)?;
    println!("{}", body);
    Ok(())
}

fn term_input(
    attrs: CommonAttrs,
    review_required: Option<bool>,
    metadata_type: Option<String>,
) -> TermInput {
    TermInput {
        description: attrs.description,
        review_required,
        metadata_type,
        position: attrs.position,
    }
}
