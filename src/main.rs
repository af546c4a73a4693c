// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use prorata::{cli, commands, db};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("operation", sub)) => commands::operations::handle(&conn, sub)?,
        Some(("basis", sub)) => commands::basis::handle(&conn, sub)?,
        Some(("source", sub)) => commands::sources::handle(&conn, sub)?,
        Some(("preset", sub)) => commands::presets::handle(&conn, sub)?,
        Some(("distribution", sub)) => commands::distributions::handle(&conn, sub)?,
        Some(("allocate", sub)) => commands::allocate::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("period", sub)) => commands::periods::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
