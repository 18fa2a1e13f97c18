use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "edflow", bin_name = "edflow", version)]
#[command(
    about = "Ordered editorial statuses and metadata fields",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (defaults to $EDFLOW_HOME, then the platform data dir)
    #[arg(long, global = true, help_heading = "Options")]
    pub dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage custom statuses
    #[command(subcommand)]
    Status(StatusCommands),

    /// Manage editorial metadata fields
    #[command(subcommand)]
    Field(FieldCommands),

    /// Read and write metadata values of a post
    #[command(subcommand)]
    Meta(MetaCommands),

    /// Write a default config and install the stock statuses and fields
    Init,
}

#[derive(Subcommand, Debug)]
pub enum StatusCommands {
    /// List statuses in workflow order
    #[command(alias = "ls")]
    List,

    /// Add a status
    Add {
        /// Display name
        name: String,

        #[command(flatten)]
        attrs: CommonAttrs,

        /// Posts in this status need an editor's review
        #[arg(long)]
        review: bool,
    },

    /// Change a status
    Edit {
        /// Status id
        id: String,

        /// New display name (the slug follows it)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        attrs: CommonAttrs,

        /// Whether posts in this status need an editor's review
        #[arg(long)]
        review: Option<bool>,
    },

    /// Delete a status
    #[command(alias = "delete")]
    Rm {
        /// Status id
        id: String,
    },

    /// Put statuses in the given order
    Reorder {
        /// Status ids, first to last
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show one status by id, slug or name
    Show {
        key: String,
    },

    /// Show the status that follows the given one
    Next {
        slug: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum FieldCommands {
    /// List metadata fields in order
    #[command(alias = "ls")]
    List,

    /// Add a metadata field
    Add {
        /// Display name
        name: String,

        /// Value type: checkbox or text
        #[arg(long = "type", short = 't')]
        metadata_type: String,

        #[command(flatten)]
        attrs: CommonAttrs,
    },

    /// Change a metadata field
    Edit {
        /// Field id
        id: String,

        /// New display name (the slug follows it)
        #[arg(long)]
        name: Option<String>,

        /// Value type; cannot change once the field has a storage key
        #[arg(long = "type", short = 't')]
        metadata_type: Option<String>,

        #[command(flatten)]
        attrs: CommonAttrs,
    },

    /// Delete a metadata field and every value stored for it
    #[command(alias = "delete")]
    Rm {
        /// Field id
        id: String,
    },

    /// Put fields in the given order
    Reorder {
        /// Field ids, first to last
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show one field by id, slug or name
    Show {
        key: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MetaCommands {
    /// Store a value for a post
    Set {
        post_id: u64,

        /// Field id, slug or name
        field: String,

        value: String,
    },

    /// Show the values stored for a post
    Show {
        post_id: u64,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonAttrs {
    /// Description shown next to the name
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// 1-based position in the list
    #[arg(long, short = 'p')]
    pub position: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("edflow").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_status_add() {
        let cli = parse(&["status", "add", "Copy Edit", "--review", "-d", "Line edits"]);
        match cli.command {
            Commands::Status(StatusCommands::Add { name, attrs, review }) => {
                assert_eq!(name, "Copy Edit");
                assert!(review);
                assert_eq!(attrs.description.as_deref(), Some("Line edits"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_field_add_requires_type() {
        assert!(Cli::try_parse_from(["edflow", "field", "add", "Due"]).is_err());
        let cli = parse(&["field", "add", "Due", "--type", "text"]);
        assert!(matches!(
            cli.command,
            Commands::Field(FieldCommands::Add { .. })
        ));
    }

    #[test]
    fn test_parse_status_edit_review_value() {
        let cli = parse(&["status", "edit", "3", "--review", "false"]);
        match cli.command {
            Commands::Status(StatusCommands::Edit { id, review, .. }) => {
                assert_eq!(id, "3");
                assert_eq!(review, Some(false));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["status", "list", "--json", "-v", "--dir", "/tmp/x"]);
        assert!(cli.json);
        assert!(cli.verbose);
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_reorder_needs_ids() {
        assert!(Cli::try_parse_from(["edflow", "status", "reorder"]).is_err());
        let cli = parse(&["field", "reorder", "3", "1", "2"]);
        match cli.command {
            Commands::Field(FieldCommands::Reorder { ids }) => assert_eq!(ids, vec!["3", "1", "2"]),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
