use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "recordctl")]
#[command(about = "Inspect and drive a record-file / linear-hash-index storage core")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Operate on record (table) files
    Table {
        #[command(subcommand)]
        command: TableCommand,
    },
    /// Operate on linear-hash index files
    Index {
        #[command(subcommand)]
        command: IndexCommand,
    },
}

#[derive(Subcommand)]
pub enum TableCommand {
    /// Create a new, empty record file
    Create {
        /// Table name (file is created as `<name>.tbl`)
        name: String,
        /// Schema as comma-separated `name:kind[:len]` columns, e.g.
        /// `id:int,score:real,note:varchar:64`
        #[arg(short, long)]
        schema: String,
    },

    /// Insert one record
    Insert {
        name: String,
        #[arg(short, long)]
        schema: String,
        /// Comma-separated values, in schema order
        #[arg(short, long)]
        values: String,
    },

    /// Scan every live record, optionally filtered and projected
    Scan {
        name: String,
        #[arg(short, long)]
        schema: String,
        /// `attr:op:value`, op one of eq,lt,gt,le,ge,ne
        #[arg(short, long)]
        filter: Option<String>,
        /// Comma-separated attribute names to project; all if omitted
        #[arg(short, long)]
        project: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Report free-space and page statistics
    Stats { name: String },
}

#[derive(Subcommand)]
pub enum IndexCommand {
    /// Create a new index file pair
    Create {
        name: String,
        /// Must be a power of two
        #[arg(short, long)]
        initial_buckets: u32,
        #[arg(short, long, value_enum)]
        key_type: CliAttrKind,
    },

    /// Insert one `(key, rid)` entry
    Insert {
        name: String,
        #[arg(short, long, value_enum)]
        key_type: CliAttrKind,
        key: String,
        #[arg(long)]
        rid_page: u32,
        #[arg(long)]
        rid_slot: u16,
    },

    /// Delete one `(key, rid)` entry
    Delete {
        name: String,
        #[arg(short, long, value_enum)]
        key_type: CliAttrKind,
        key: String,
        #[arg(long)]
        rid_page: u32,
        #[arg(long)]
        rid_slot: u16,
    },

    /// Point- or range-scan the index
    Scan {
        name: String,
        #[arg(short, long, value_enum)]
        key_type: CliAttrKind,
        #[arg(long)]
        low: Option<String>,
        #[arg(long)]
        high: Option<String>,
        #[arg(long)]
        low_exclusive: bool,
        #[arg(long)]
        high_exclusive: bool,
        #[arg(long)]
        json: bool,
    },

    /// Report bucket and page counts
    Stats {
        name: String,
        #[arg(short, long, value_enum)]
        key_type: CliAttrKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CliAttrKind {
    Int,
    Real,
    Varchar,
}
