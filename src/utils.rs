// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{AllocationPreset, BasisAccount, PresetRow, SourceAccount};
use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Reporting periods are YYYY-MM keys.
pub fn parse_period(s: &str) -> Result<String> {
    let parts: Vec<&str> = s.split('-').collect();
    let valid = parts.len() == 2
        && parts[0].len() == 4
        && parts[0].parse::<i32>().is_ok()
        && matches!(parts[1].parse::<u32>(), Ok(m) if (1..=12).contains(&m) && parts[1].len() == 2);
    if !valid {
        return Err(anyhow::anyhow!("Invalid period '{}', expected YYYY-MM", s));
    }
    Ok(s.to_string())
}

/// Percentages are clamped to 0..=100 rather than rejected.
pub fn parse_pct(s: &str) -> Result<Decimal> {
    let pct = parse_decimal(s)?;
    Ok(pct.clamp(Decimal::ZERO, Decimal::from(100)))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn id_for_operation(conn: &Connection, code: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM operations WHERE code=?1")?;
    let id: i64 = stmt
        .query_row(params![code.to_uppercase()], |r| r.get(0))
        .with_context(|| format!("Operation '{}' not found", code))?;
    Ok(id)
}

pub fn id_for_basis_account(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM basis_accounts WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Basis account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_source_account(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM source_accounts WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Source account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_preset(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM presets WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Preset '{}' not found", name))?;
    Ok(id)
}

// Default reporting period settings
pub fn get_default_period(conn: &Connection) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='default_period'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_default_period(conn: &Connection, period: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('default_period', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![period],
    )?;
    Ok(())
}

fn period_values(conn: &Connection, table: &str, owner_id: i64) -> Result<HashMap<String, Decimal>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT period, value FROM {} WHERE account_id=?1",
        table
    ))?;
    let mut cur = stmt.query(params![owner_id])?;
    let mut map = HashMap::new();
    while let Some(r) = cur.next()? {
        let period: String = r.get(0)?;
        let value: String = r.get(1)?;
        let d = value
            .parse::<Decimal>()
            .with_context(|| format!("Invalid value '{}' for period {}", value, period))?;
        map.insert(period, d);
    }
    Ok(map)
}

pub fn load_basis_accounts(conn: &Connection) -> Result<Vec<BasisAccount>> {
    let mut stmt = conn.prepare("SELECT id, name, value FROM basis_accounts ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
        ))
    })?;
    let mut accounts = Vec::new();
    for row in rows {
        let (id, name, value_s) = row?;
        let value = match value_s {
            Some(s) => Some(
                s.parse::<Decimal>()
                    .with_context(|| format!("Invalid value '{}' for basis account {}", s, name))?,
            ),
            None => None,
        };
        let values_by_period = period_values(conn, "basis_values", id)?;
        accounts.push(BasisAccount {
            id,
            name,
            value,
            values_by_period,
        });
    }
    Ok(accounts)
}

pub fn load_source_account(conn: &Connection, name: &str) -> Result<SourceAccount> {
    let id = id_for_source_account(conn, name)?;
    let value_s: Option<String> = conn.query_row(
        "SELECT value FROM source_accounts WHERE id=?1",
        params![id],
        |r| r.get(0),
    )?;
    let value = match value_s {
        Some(s) => Some(
            s.parse::<Decimal>()
                .with_context(|| format!("Invalid value '{}' for source account {}", s, name))?,
        ),
        None => None,
    };
    let values_by_period = period_values(conn, "source_values", id)?;
    Ok(SourceAccount {
        id,
        name: name.to_string(),
        value,
        values_by_period,
    })
}

pub fn load_preset(conn: &Connection, name: &str) -> Result<AllocationPreset> {
    let id = id_for_preset(conn, name)?;
    let note: Option<String> =
        conn.query_row("SELECT note FROM presets WHERE id=?1", params![id], |r| {
            r.get(0)
        })?;
    let mut stmt = conn.prepare(
        "SELECT b.name, o.code FROM preset_rows pr
         JOIN basis_accounts b ON pr.basis_account_id=b.id
         JOIN operations o ON pr.operation_id=o.id
         WHERE pr.preset_id=?1 ORDER BY pr.id",
    )?;
    let rows = stmt.query_map(params![id], |r| {
        Ok(PresetRow {
            basis_account: r.get(0)?,
            operation_code: r.get(1)?,
        })
    })?;
    let mut preset_rows = Vec::new();
    for row in rows {
        preset_rows.push(row?);
    }
    Ok(AllocationPreset {
        id,
        name: name.to_string(),
        rows: preset_rows,
        note,
    })
}
