// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{id_for_operation, id_for_preset, id_for_source_account, parse_pct, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Per-operation rule rows parsed from repeated `--op CODE[:PCT]` flags.
fn parse_ops(sub: &clap::ArgMatches) -> Result<Vec<(String, Option<String>)>> {
    let mut ops = Vec::new();
    if let Some(values) = sub.get_many::<String>("op") {
        for v in values {
            match v.split_once(':') {
                Some((code, pct)) => {
                    ops.push((code.trim().to_uppercase(), Some(parse_pct(pct.trim())?.to_string())))
                }
                None => ops.push((v.trim().to_uppercase(), None)),
            }
        }
    }
    Ok(ops)
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let source = sub.get_one::<String>("source").unwrap().trim().to_string();
    let dist_type = sub.get_one::<String>("type").unwrap().to_lowercase();
    let source_id = id_for_source_account(conn, &source)?;
    let ops = parse_ops(sub)?;

    match dist_type.as_str() {
        "direct" => {
            if ops.len() != 1 {
                return Err(anyhow::anyhow!(
                    "direct distribution takes exactly one --op CODE"
                ));
            }
        }
        "percentage" => {
            if ops.is_empty() || ops.iter().any(|(_, pct)| pct.is_none()) {
                return Err(anyhow::anyhow!(
                    "percentage distribution needs one or more --op CODE:PCT"
                ));
            }
        }
        "dynamic" => {
            if sub.get_one::<String>("preset").is_none() {
                return Err(anyhow::anyhow!("dynamic distribution needs --preset"));
            }
        }
        other => return Err(anyhow::anyhow!("Unknown distribution type '{}'", other)),
    }

    let preset_id = match sub.get_one::<String>("preset") {
        Some(p) => Some(id_for_preset(conn, p.trim())?),
        None => None,
    };

    conn.execute(
        "INSERT INTO distributions(source_account_id, dist_type, preset_id, status, updated_at)
         VALUES (?1, ?2, ?3, 'Undistributed', datetime('now'))
         ON CONFLICT(source_account_id) DO UPDATE SET
           dist_type=excluded.dist_type,
           preset_id=excluded.preset_id,
           status='Undistributed',
           updated_at=datetime('now')",
        params![source_id, dist_type, preset_id],
    )?;
    let dist_id: i64 = conn.query_row(
        "SELECT id FROM distributions WHERE source_account_id=?1",
        params![source_id],
        |r| r.get(0),
    )?;

    sync_details(conn, dist_id, &ops)?;
    println!("Set {} distribution for '{}'", dist_type, source);
    Ok(())
}

/// Reconcile stored detail rows with the requested set: delete rows no
/// longer present, update rows whose pct changed, insert new ones.
fn sync_details(conn: &Connection, dist_id: i64, ops: &[(String, Option<String>)]) -> Result<()> {
    let mut desired: HashMap<String, Option<String>> = ops.iter().cloned().collect();

    let mut stmt = conn.prepare(
        "SELECT dd.id, o.code, dd.pct FROM distribution_details dd
         JOIN operations o ON dd.operation_id=o.id
         WHERE dd.distribution_id=?1",
    )?;
    let existing = stmt
        .query_map(params![dist_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (row_id, code, pct) in existing {
        match desired.remove(&code) {
            None => {
                conn.execute(
                    "DELETE FROM distribution_details WHERE id=?1",
                    params![row_id],
                )?;
            }
            Some(target_pct) => {
                if target_pct != pct {
                    conn.execute(
                        "UPDATE distribution_details SET pct=?1 WHERE id=?2",
                        params![target_pct, row_id],
                    )?;
                }
            }
        }
    }

    // Insert what remains, in the order the rows were given.
    for (code, _) in ops {
        if let Some(pct) = desired.remove(code) {
            let op_id = id_for_operation(conn, code)?;
            conn.execute(
                "INSERT INTO distribution_details(distribution_id, operation_id, pct) VALUES (?1,?2,?3)",
                params![dist_id, op_id, pct],
            )?;
        }
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut stmt = conn.prepare(
        "SELECT s.name, d.dist_type, IFNULL(p.name,''), d.status, d.id
         FROM distributions d
         JOIN source_accounts s ON d.source_account_id=s.id
         LEFT JOIN presets p ON d.preset_id=p.id
         ORDER BY s.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, i64>(4)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (source, dist_type, preset, status, dist_id) = row?;
        let mut dstmt = conn.prepare(
            "SELECT o.code, dd.pct FROM distribution_details dd
             JOIN operations o ON dd.operation_id=o.id
             WHERE dd.distribution_id=?1 ORDER BY o.code",
        )?;
        let details = dstmt
            .query_map(params![dist_id], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, Option<String>>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let detail_s = details
            .iter()
            .map(|(code, pct)| match pct {
                Some(p) => format!("{}:{}", code, p),
                None => code.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        data.push(vec![source, dist_type, preset, detail_s, status]);
    }
    if !crate::utils::maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Source", "Type", "Preset", "Operations", "Status"], data)
        );
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let source = sub.get_one::<String>("source").unwrap().trim().to_string();
    let source_id = id_for_source_account(conn, &source)?;
    let dist_id: Option<i64> = conn
        .query_row(
            "SELECT id FROM distributions WHERE source_account_id=?1",
            params![source_id],
            |r| r.get(0),
        )
        .optional()?;
    let dist_id = dist_id.with_context(|| format!("No distribution for '{}'", source))?;
    conn.execute("DELETE FROM distributions WHERE id=?1", params![dist_id])?;
    println!("Removed distribution for '{}'", source);
    Ok(())
}
