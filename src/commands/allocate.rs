// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::allocation::{
    allocate_flat, allocate_with_presets, basis_value, source_value, PresetAllocation,
    PresetBasisRow, StandaloneWeight,
};
use crate::utils::{
    get_default_period, id_for_operation, load_basis_accounts, load_preset, load_source_account,
    maybe_print_json, parse_decimal, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("run", sub)) => run(conn, sub)?,
        Some(("split", sub)) => split(sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct RunReport {
    source: String,
    period: Option<String>,
    amount: Decimal,
    #[serde(flatten)]
    result: PresetAllocation,
}

fn run(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let save = sub.get_flag("save");
    let source = sub.get_one::<String>("source").unwrap().trim().to_string();
    let period = match sub.get_one::<String>("period") {
        Some(p) => Some(crate::utils::parse_period(p.trim())?),
        None => get_default_period(conn)?,
    };

    let account = load_source_account(conn, &source)?;
    let amount = source_value(&account, period.as_deref());

    let dist: Option<(i64, String, Option<i64>)> = conn
        .query_row(
            "SELECT id, dist_type, preset_id FROM distributions WHERE source_account_id=?1",
            params![account.id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let (dist_id, dist_type, preset_id) =
        dist.with_context(|| format!("No distribution rule for '{}'", source))?;

    let mut stmt = conn.prepare(
        "SELECT o.code, dd.pct FROM distribution_details dd
         JOIN operations o ON dd.operation_id=o.id
         WHERE dd.distribution_id=?1 ORDER BY dd.id",
    )?;
    let details = stmt
        .query_map(params![dist_id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, Option<String>>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut preset_rows: Vec<PresetBasisRow> = Vec::new();
    let mut standalone: Vec<StandaloneWeight> = Vec::new();

    match dist_type.as_str() {
        "direct" => {
            let (code, _) = details
                .first()
                .context("direct distribution has no operation row")?;
            standalone.push(StandaloneWeight {
                operation_code: code.clone(),
                basis_value: Decimal::ONE,
            });
        }
        "percentage" => {
            for (code, pct) in &details {
                let pct = pct
                    .as_deref()
                    .with_context(|| format!("Missing percentage for operation {}", code))?;
                standalone.push(StandaloneWeight {
                    operation_code: code.clone(),
                    basis_value: parse_decimal(pct)?,
                });
            }
        }
        "dynamic" => {
            let preset_id = preset_id.context("dynamic distribution has no preset")?;
            let preset_name: String = conn.query_row(
                "SELECT name FROM presets WHERE id=?1",
                params![preset_id],
                |r| r.get(0),
            )?;
            let preset = load_preset(conn, &preset_name)?;
            let accounts = load_basis_accounts(conn)?;
            for row in &preset.rows {
                let basis = accounts.iter().find(|a| a.name == row.basis_account);
                let value = basis
                    .map(|a| basis_value(a, period.as_deref()))
                    .unwrap_or(Decimal::ZERO);
                preset_rows.push(PresetBasisRow {
                    basis_account: row.basis_account.clone(),
                    operation_code: row.operation_code.clone(),
                    basis_value: value,
                    preset_id: preset.id.to_string(),
                    preset_name: preset.name.clone(),
                });
            }
            // Percentage rows on a dynamic rule act as standalone weights
            // alongside the preset pool.
            for (code, pct) in &details {
                if let Some(pct) = pct {
                    standalone.push(StandaloneWeight {
                        operation_code: code.clone(),
                        basis_value: parse_decimal(pct)?,
                    });
                }
            }
        }
        other => return Err(anyhow::anyhow!("Unknown distribution type '{}'", other)),
    }

    let result = allocate_with_presets(amount, &preset_rows, &standalone)
        .context("provide nonzero basis values before allocating")?;

    if save {
        for entry in &result.allocations {
            let op_id = id_for_operation(conn, &entry.operation_code)?;
            let entry_preset_id: Option<i64> =
                entry.preset_id.as_deref().and_then(|s| s.parse().ok());
            conn.execute(
                "INSERT INTO allocations(source_account_id, period, operation_id, amount, basis_value, ratio, preset_id)
                 VALUES (?1,?2,?3,?4,?5,?6,?7)",
                params![
                    account.id,
                    period,
                    op_id,
                    format!("{:.2}", entry.value),
                    entry.basis_value.to_string(),
                    entry.ratio.to_string(),
                    entry_preset_id
                ],
            )?;
        }
        conn.execute(
            "UPDATE distributions SET status='Distributed', updated_at=datetime('now') WHERE id=?1",
            params![dist_id],
        )?;
    }

    let report = RunReport {
        source: source.clone(),
        period: period.clone(),
        amount,
        result,
    };
    if maybe_print_json(json_flag, jsonl_flag, &report)? {
        return Ok(());
    }
    print_report(&report);
    if save {
        println!("Saved {} allocation rows", report.result.allocations.len());
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let mut data = Vec::new();
    for entry in &report.result.allocations {
        let preset = report
            .result
            .preset_allocations
            .iter()
            .find(|p| Some(&p.preset_id) == entry.preset_id.as_ref())
            .map(|p| p.preset_name.clone())
            .unwrap_or_default();
        data.push(vec![
            entry.operation_code.clone(),
            format!("{:.2}", entry.basis_value),
            format!("{:.4}", entry.ratio),
            format!("{:.2}", entry.value),
            preset,
        ]);
    }
    println!(
        "Allocating {:.2} from '{}'{}",
        report.amount,
        report.source,
        report
            .period
            .as_deref()
            .map(|p| format!(" for {}", p))
            .unwrap_or_default()
    );
    println!(
        "{}",
        pretty_table(&["Operation", "Basis", "Ratio", "Amount", "Preset"], data)
    );
    for preset in &report.result.preset_allocations {
        println!(
            "Preset '{}': basis {:.2}, allocated {:.2}",
            preset.preset_name, preset.total_basis, preset.allocated_amount
        );
    }
    if let Some(i) = report.result.adjustment_index {
        println!(
            "Rounding adjustment of {:.2} applied to {}",
            report.result.adjustment_amount, report.result.allocations[i].operation_code
        );
    }
}

fn split(sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let weights = sub
        .get_one::<String>("weights")
        .unwrap()
        .split(',')
        .map(|w| parse_decimal(w.trim()))
        .collect::<Result<Vec<Decimal>>>()?;

    let result = allocate_flat(amount, &weights)
        .context("provide nonzero basis values before allocating")?;

    if maybe_print_json(json_flag, jsonl_flag, &result)? {
        return Ok(());
    }
    let mut data = Vec::new();
    for (w, a) in weights.iter().zip(result.allocations.iter()) {
        data.push(vec![format!("{:.2}", w), format!("{:.2}", a)]);
    }
    println!("{}", pretty_table(&["Weight", "Amount"], data));
    if let Some(i) = result.adjustment_index {
        println!(
            "Rounding adjustment of {:.2} applied to weight #{}",
            result.adjustment_amount,
            i + 1
        );
    }
    Ok(())
}
