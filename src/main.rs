#[cfg(not(feature = "cli"))]
compile_error!("The `recordctl` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::process;

use reldb_core::cli;
use reldb_core::cli::app::{Cli, CliAttrKind, ColorMode, Commands, IndexCommand, TableCommand};
use reldb_core::rbf::AttrKind;

fn to_attr_kind(kind: CliAttrKind) -> AttrKind {
    match kind {
        CliAttrKind::Int => AttrKind::Int,
        CliAttrKind::Real => AttrKind::Real,
        CliAttrKind::Varchar => AttrKind::VarChar,
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let mut writer = match cli::open_writer(&cli.output) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Table { command } => match command {
            TableCommand::Create { name, schema } => {
                cli::table::create(&cli::table::CreateOptions { name, schema }, &mut writer)
            }
            TableCommand::Insert { name, schema, values } => cli::table::insert(
                &cli::table::InsertOptions { name, schema, values },
                &mut writer,
            ),
            TableCommand::Scan { name, schema, filter, project, json } => cli::table::scan(
                &cli::table::ScanOptions { name, schema, filter, project, json },
                &mut writer,
            ),
            TableCommand::Stats { name } => {
                cli::table::stats(&cli::table::StatsOptions { name }, &mut writer)
            }
        },
        Commands::Index { command } => match command {
            IndexCommand::Create { name, initial_buckets, key_type } => cli::index::create(
                &cli::index::CreateOptions { name, initial_buckets, key_type: to_attr_kind(key_type) },
                &mut writer,
            ),
            IndexCommand::Insert { name, key_type, key, rid_page, rid_slot } => cli::index::insert(
                &cli::index::InsertOptions { name, key_type: to_attr_kind(key_type), key, rid_page, rid_slot },
                &mut writer,
            ),
            IndexCommand::Delete { name, key_type, key, rid_page, rid_slot } => cli::index::delete(
                &cli::index::DeleteOptions { name, key_type: to_attr_kind(key_type), key, rid_page, rid_slot },
                &mut writer,
            ),
            IndexCommand::Scan { name, key_type, low, high, low_exclusive, high_exclusive, json } => {
                cli::index::scan(
                    &cli::index::ScanOptions {
                        name,
                        key_type: to_attr_kind(key_type),
                        low,
                        high,
                        low_exclusive,
                        high_exclusive,
                        json,
                    },
                    &mut writer,
                )
            }
            IndexCommand::Stats { name, key_type } => cli::index::stats(
                &cli::index::StatsOptions { name, key_type: to_attr_kind(key_type) },
                &mut writer,
            ),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
