// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("allocations", sub)) => export_allocations(conn, sub),
        _ => Ok(()),
    }
}

fn export_allocations(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT a.run_at, s.name as source, a.period, o.code as operation, a.amount, a.basis_value, a.ratio, p.name as preset
         FROM allocations a
         JOIN source_accounts s ON a.source_account_id=s.id
         JOIN operations o ON a.operation_id=o.id
         LEFT JOIN presets p ON a.preset_id=p.id
         ORDER BY a.run_at, a.id")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
            r.get::<_, Option<String>>(7)?,
        ))
    })?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "run_at", "source", "period", "operation", "amount", "basis_value", "ratio",
                "preset",
            ])?;
            for row in rows {
                let (run_at, source, period, op, amount, basis, ratio, preset) = row?;
                wtr.write_record([
                    run_at,
                    source,
                    period.unwrap_or_default(),
                    op,
                    amount,
                    basis,
                    ratio,
                    preset.unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (run_at, source, period, op, amount, basis, ratio, preset) = row?;
                items.push(json!({
                    "run_at": run_at, "source": source, "period": period, "operation": op,
                    "amount": amount, "basis_value": basis, "ratio": ratio, "preset": preset
                }));
            }
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => {
            return Err(anyhow::anyhow!("Unknown format: {} (use csv|json)", fmt));
        }
    }
    println!("Exported allocations to {}", out);
    Ok(())
}
