// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use prorata::{cli, commands::allocate};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE settings(key TEXT PRIMARY KEY, value TEXT NOT NULL);
        CREATE TABLE operations(id INTEGER PRIMARY KEY AUTOINCREMENT, code TEXT NOT NULL UNIQUE, name TEXT NOT NULL);
        CREATE TABLE basis_accounts(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, value TEXT);
        CREATE TABLE basis_values(id INTEGER PRIMARY KEY AUTOINCREMENT, account_id INTEGER NOT NULL, period TEXT NOT NULL, value TEXT NOT NULL, UNIQUE(account_id, period));
        CREATE TABLE source_accounts(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, value TEXT);
        CREATE TABLE source_values(id INTEGER PRIMARY KEY AUTOINCREMENT, account_id INTEGER NOT NULL, period TEXT NOT NULL, value TEXT NOT NULL, UNIQUE(account_id, period));
        CREATE TABLE presets(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, note TEXT);
        CREATE TABLE preset_rows(id INTEGER PRIMARY KEY AUTOINCREMENT, preset_id INTEGER NOT NULL, basis_account_id INTEGER NOT NULL, operation_id INTEGER NOT NULL);
        CREATE TABLE distributions(id INTEGER PRIMARY KEY AUTOINCREMENT, source_account_id INTEGER NOT NULL UNIQUE, dist_type TEXT NOT NULL, preset_id INTEGER, status TEXT NOT NULL DEFAULT 'Undistributed', updated_at TEXT NOT NULL DEFAULT (datetime('now')));
        CREATE TABLE distribution_details(id INTEGER PRIMARY KEY AUTOINCREMENT, distribution_id INTEGER NOT NULL, operation_id INTEGER NOT NULL, pct TEXT, UNIQUE(distribution_id, operation_id));
        CREATE TABLE allocations(id INTEGER PRIMARY KEY AUTOINCREMENT, run_at TEXT NOT NULL DEFAULT (datetime('now')), source_account_id INTEGER NOT NULL, period TEXT, operation_id INTEGER NOT NULL, amount TEXT NOT NULL, basis_value TEXT NOT NULL, ratio TEXT NOT NULL, preset_id INTEGER);
    "#).unwrap();

    for (code, name) in [("OPS-A", "Plant A"), ("OPS-B", "Plant B"), ("OPS-C", "Plant C")] {
        conn.execute(
            "INSERT INTO operations(code,name) VALUES (?1,?2)",
            params![code, name],
        )
        .unwrap();
    }
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(args.iter().copied());
    if let Some(("allocate", sub)) = matches.subcommand() {
        allocate::handle(conn, sub)
    } else {
        panic!("allocate command not parsed");
    }
}

fn seed_dynamic(conn: &Connection) {
    conn.execute(
        "INSERT INTO basis_accounts(name,value) VALUES('Headcount','60'),('SqFt','40')",
        [],
    )
    .unwrap();
    // 2025-06 overrides: Headcount 50 (SqFt keeps its default)
    conn.execute(
        "INSERT INTO basis_values(account_id,period,value) VALUES(1,'2025-06','50')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO source_accounts(name,value) VALUES('Rent','1300')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO source_values(account_id,period,value) VALUES(1,'2025-06','2600')",
        [],
    )
    .unwrap();
    conn.execute("INSERT INTO presets(name) VALUES('Facilities')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO preset_rows(preset_id,basis_account_id,operation_id) VALUES(1,1,1),(1,2,2)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO distributions(source_account_id,dist_type,preset_id) VALUES(1,'dynamic',1)",
        [],
    )
    .unwrap();
}

fn saved_amounts(conn: &Connection) -> Vec<(String, String)> {
    let mut stmt = conn
        .prepare(
            "SELECT o.code, a.amount FROM allocations a
             JOIN operations o ON a.operation_id=o.id ORDER BY a.id",
        )
        .unwrap();
    stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}

#[test]
fn dynamic_run_uses_default_values() {
    let conn = setup();
    seed_dynamic(&conn);
    run(
        &conn,
        &[
            "prorata", "allocate", "run", "--source", "Rent", "--save",
        ],
    )
    .unwrap();

    // 1300 split on 60/40
    assert_eq!(
        saved_amounts(&conn),
        vec![
            ("OPS-A".to_string(), "780.00".to_string()),
            ("OPS-B".to_string(), "520.00".to_string()),
        ]
    );
    let status: String = conn
        .query_row("SELECT status FROM distributions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(status, "Distributed");
}

#[test]
fn dynamic_run_resolves_period_overrides() {
    let conn = setup();
    seed_dynamic(&conn);
    run(
        &conn,
        &[
            "prorata", "allocate", "run", "--source", "Rent", "--period", "2025-06", "--save",
        ],
    )
    .unwrap();

    // Source 2600 for the period; basis 50/40 -> 1444.44 + 1155.56
    let rows = saved_amounts(&conn);
    assert_eq!(
        rows,
        vec![
            ("OPS-A".to_string(), "1444.44".to_string()),
            ("OPS-B".to_string(), "1155.56".to_string()),
        ]
    );
    let total: Decimal = rows
        .iter()
        .map(|(_, amount)| amount.parse::<Decimal>().unwrap())
        .sum();
    assert_eq!(total, Decimal::from_str_exact("2600.00").unwrap());
    let period: Option<String> = conn
        .query_row("SELECT period FROM allocations LIMIT 1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(period.as_deref(), Some("2025-06"));
}

#[test]
fn run_without_save_records_nothing() {
    let conn = setup();
    seed_dynamic(&conn);
    run(&conn, &["prorata", "allocate", "run", "--source", "Rent"]).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM allocations", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
    let status: String = conn
        .query_row("SELECT status FROM distributions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(status, "Undistributed");
}

#[test]
fn percentage_run_splits_on_specified_pcts() {
    let conn = setup();
    conn.execute(
        "INSERT INTO source_accounts(name,value) VALUES('Utilities','100')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO distributions(source_account_id,dist_type) VALUES(1,'percentage')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO distribution_details(distribution_id,operation_id,pct) VALUES(1,1,'50'),(1,2,'30'),(1,3,'20')",
        [],
    )
    .unwrap();

    run(
        &conn,
        &[
            "prorata", "allocate", "run", "--source", "Utilities", "--save",
        ],
    )
    .unwrap();
    assert_eq!(
        saved_amounts(&conn),
        vec![
            ("OPS-A".to_string(), "50.00".to_string()),
            ("OPS-B".to_string(), "30.00".to_string()),
            ("OPS-C".to_string(), "20.00".to_string()),
        ]
    );
}

#[test]
fn direct_run_sends_whole_amount_to_one_operation() {
    let conn = setup();
    conn.execute(
        "INSERT INTO source_accounts(name,value) VALUES('Insurance','432.10')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO distributions(source_account_id,dist_type) VALUES(1,'direct')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO distribution_details(distribution_id,operation_id,pct) VALUES(1,2,NULL)",
        [],
    )
    .unwrap();

    run(
        &conn,
        &[
            "prorata", "allocate", "run", "--source", "Insurance", "--save",
        ],
    )
    .unwrap();
    assert_eq!(
        saved_amounts(&conn),
        vec![("OPS-B".to_string(), "432.10".to_string())]
    );
}

#[test]
fn zero_basis_dynamic_run_fails_whole() {
    let conn = setup();
    seed_dynamic(&conn);
    conn.execute("UPDATE basis_accounts SET value='0'", []).unwrap();
    conn.execute("DELETE FROM basis_values", []).unwrap();

    let err = run(
        &conn,
        &[
            "prorata", "allocate", "run", "--source", "Rent", "--save",
        ],
    );
    assert!(err.is_err());
    // No partial rows survive a failed allocation.
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM allocations", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn run_uses_default_period_setting() {
    let conn = setup();
    seed_dynamic(&conn);
    conn.execute(
        "INSERT INTO settings(key,value) VALUES('default_period','2025-06')",
        [],
    )
    .unwrap();
    run(
        &conn,
        &[
            "prorata", "allocate", "run", "--source", "Rent", "--save",
        ],
    )
    .unwrap();
    let rows = saved_amounts(&conn);
    assert_eq!(rows[0].1, "1444.44");
    assert_eq!(rows[1].1, "1155.56");
}
