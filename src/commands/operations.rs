// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let code = sub.get_one::<String>("code").unwrap().to_uppercase();
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute(
                "INSERT INTO operations(code, name) VALUES (?1, ?2)",
                params![code, name],
            )?;
            println!("Added operation '{}' ({})", code, name);
        }
        Some(("list", _)) => {
            let mut stmt =
                conn.prepare("SELECT code, name, created_at FROM operations ORDER BY code")?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (c, n, cr) = row?;
                data.push(vec![c, n, cr]);
            }
            println!("{}", pretty_table(&["Code", "Name", "Created"], data));
        }
        Some(("rm", sub)) => {
            let code = sub.get_one::<String>("code").unwrap().to_uppercase();
            conn.execute("DELETE FROM operations WHERE code=?1", params![code])?;
            println!("Removed operation '{}'", code);
        }
        _ => {}
    }
    Ok(())
}
