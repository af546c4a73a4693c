// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    id_for_basis_account, id_for_operation, id_for_preset, load_basis_accounts, load_preset,
    pretty_table,
};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            let note = sub.get_one::<String>("note").map(|s| s.to_string());
            conn.execute(
                "INSERT INTO presets(name, note) VALUES (?1, ?2)",
                params![name, note],
            )?;
            println!("Added preset '{}'", name);
        }
        Some(("add-row", sub)) => add_row(conn, sub)?,
        Some(("rm-row", sub)) => rm_row(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            conn.execute("DELETE FROM presets WHERE name=?1", params![name])?;
            println!("Removed preset '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

fn add_row(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let preset = sub.get_one::<String>("preset").unwrap().trim().to_string();
    let basis = sub.get_one::<String>("basis").unwrap().trim().to_string();
    let op = sub.get_one::<String>("operation").unwrap();
    let preset_id = id_for_preset(conn, &preset)?;
    let basis_id = id_for_basis_account(conn, &basis)?;
    let op_id = id_for_operation(conn, op)?;
    conn.execute(
        "INSERT INTO preset_rows(preset_id, basis_account_id, operation_id) VALUES (?1,?2,?3)",
        params![preset_id, basis_id, op_id],
    )?;
    println!("Added row {} -> {} to preset '{}'", basis, op.to_uppercase(), preset);
    Ok(())
}

fn rm_row(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let preset = sub.get_one::<String>("preset").unwrap().trim().to_string();
    let basis = sub.get_one::<String>("basis").unwrap().trim().to_string();
    let op = sub.get_one::<String>("operation").unwrap();
    let preset_id = id_for_preset(conn, &preset)?;
    let basis_id = id_for_basis_account(conn, &basis)?;
    let op_id = id_for_operation(conn, op)?;
    conn.execute(
        "DELETE FROM preset_rows WHERE preset_id=?1 AND basis_account_id=?2 AND operation_id=?3",
        params![preset_id, basis_id, op_id],
    )?;
    println!("Removed row {} -> {} from preset '{}'", basis, op.to_uppercase(), preset);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    if let Some(name) = sub.get_one::<String>("name") {
        // One preset: show its rows with currently resolved basis values.
        let preset = load_preset(conn, name.trim())?;
        let accounts = load_basis_accounts(conn)?;
        let period = sub.get_one::<String>("period").map(|s| s.trim().to_string());
        let members =
            crate::allocation::preset_member_values(&preset, &accounts, period.as_deref());
        let mut data = Vec::new();
        for (row, member) in preset.rows.iter().zip(members.iter()) {
            data.push(vec![
                row.basis_account.clone(),
                row.operation_code.clone(),
                member.value.to_string(),
            ]);
        }
        println!("{}", pretty_table(&["Basis", "Operation", "Value"], data));
        if let Some(note) = preset.note {
            println!("Note: {}", note);
        }
    } else {
        let mut stmt = conn.prepare(
            "SELECT p.name, COUNT(pr.id), IFNULL(p.note,'') FROM presets p
             LEFT JOIN preset_rows pr ON pr.preset_id=p.id
             GROUP BY p.id ORDER BY p.name",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?;
        let mut data = Vec::new();
        for row in rows {
            let (name, count, note) = row?;
            data.push(vec![name, count.to_string(), note]);
        }
        println!("{}", pretty_table(&["Preset", "Rows", "Note"], data));
    }
    Ok(())
}
