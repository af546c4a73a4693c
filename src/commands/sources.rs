// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{id_for_source_account, parse_decimal, parse_period, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let value = match sub.get_one::<String>("value") {
        Some(v) => Some(parse_decimal(v.trim())?.to_string()),
        None => None,
    };
    conn.execute(
        "INSERT INTO source_accounts(name, value) VALUES (?1, ?2)",
        params![name, value],
    )?;
    println!("Added source account '{}'", name);
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let value = parse_decimal(sub.get_one::<String>("value").unwrap().trim())?;
    let id = id_for_source_account(conn, &name)?;
    if let Some(period) = sub.get_one::<String>("period") {
        let period = parse_period(period.trim())?;
        conn.execute(
            "INSERT INTO source_values(account_id, period, value) VALUES (?1,?2,?3)
             ON CONFLICT(account_id, period) DO UPDATE SET value=excluded.value",
            params![id, period, value.to_string()],
        )?;
        println!("Set {} = {} for {}", name, value, period);
    } else {
        conn.execute(
            "UPDATE source_accounts SET value=?1 WHERE id=?2",
            params![value.to_string(), id],
        )?;
        println!("Set {} default = {}", name, value);
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = match sub.get_one::<String>("period") {
        Some(p) => Some(parse_period(p.trim())?),
        None => None,
    };
    let mut stmt = conn.prepare("SELECT id, name, value FROM source_accounts ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, name, value) = row?;
        let mut cols = vec![name, value.unwrap_or_else(|| "-".into())];
        if let Some(ref p) = period {
            let v: Option<String> = conn
                .query_row(
                    "SELECT value FROM source_values WHERE account_id=?1 AND period=?2",
                    params![id, p],
                    |r| r.get(0),
                )
                .optional()?;
            cols.push(v.unwrap_or_else(|| "-".into()));
        }
        data.push(cols);
    }
    if let Some(ref p) = period {
        println!("{}", pretty_table(&["Source", "Default", p.as_str()], data));
    } else {
        println!("{}", pretty_table(&["Source", "Default"], data));
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    conn.execute("DELETE FROM source_accounts WHERE name=?1", params![name])?;
    println!("Removed source account '{}'", name);
    Ok(())
}
