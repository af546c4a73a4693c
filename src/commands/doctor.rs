// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::allocation::preset_total;
use crate::utils::{get_default_period, load_basis_accounts, load_preset, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Sources with no distribution rule
    let mut stmt = conn.prepare(
        "SELECT s.name FROM source_accounts s
         LEFT JOIN distributions d ON d.source_account_id=s.id
         WHERE d.id IS NULL ORDER BY s.name",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        rows.push(vec!["source_without_rule".into(), name]);
    }

    // 2) Presets with no rows
    let mut stmt2 = conn.prepare(
        "SELECT p.name FROM presets p
         LEFT JOIN preset_rows pr ON pr.preset_id=p.id
         GROUP BY p.id HAVING COUNT(pr.id)=0 ORDER BY p.name",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let name: String = r.get(0)?;
        rows.push(vec!["empty_preset".into(), name]);
    }

    // 3) Percentage rules whose operations do not sum to 100
    let mut stmt3 = conn.prepare(
        "SELECT s.name, d.id FROM distributions d
         JOIN source_accounts s ON d.source_account_id=s.id
         WHERE d.dist_type='percentage' ORDER BY s.name",
    )?;
    let dists = stmt3
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (source, dist_id) in dists {
        let mut pstmt = conn.prepare(
            "SELECT pct FROM distribution_details WHERE distribution_id=?1 AND pct IS NOT NULL",
        )?;
        let mut pcur = pstmt.query([dist_id])?;
        let mut total = Decimal::ZERO;
        while let Some(r) = pcur.next()? {
            let pct: String = r.get(0)?;
            total += pct
                .parse::<Decimal>()
                .with_context(|| format!("Invalid pct '{}' for {}", pct, source))?;
        }
        if total != Decimal::from(100) {
            rows.push(vec![
                "pct_sum_not_100".into(),
                format!("{} ({})", source, total),
            ]);
        }
    }

    // 4) Dynamic rules whose preset currently resolves to zero basis;
    //    allocate run would reject these with the default period.
    let period = get_default_period(conn)?;
    let accounts = load_basis_accounts(conn)?;
    let mut stmt4 = conn.prepare(
        "SELECT s.name, p.name FROM distributions d
         JOIN source_accounts s ON d.source_account_id=s.id
         JOIN presets p ON d.preset_id=p.id
         WHERE d.dist_type='dynamic' ORDER BY s.name",
    )?;
    let dynamics = stmt4
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (source, preset_name) in dynamics {
        let preset = load_preset(conn, &preset_name)?;
        let total = preset_total(&preset, &accounts, period.as_deref());
        if total <= Decimal::ZERO {
            rows.push(vec![
                "zero_basis_preset".into(),
                format!("{} via '{}'", source, preset_name),
            ]);
        }
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
