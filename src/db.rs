// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Prorata", "prorata"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("prorata.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS operations(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS basis_accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        value TEXT, -- default weight; NULL resolves to zero
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS basis_values(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        period TEXT NOT NULL, -- YYYY-MM
        value TEXT NOT NULL,
        UNIQUE(account_id, period),
        FOREIGN KEY(account_id) REFERENCES basis_accounts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS source_accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        value TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS source_values(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        period TEXT NOT NULL,
        value TEXT NOT NULL,
        UNIQUE(account_id, period),
        FOREIGN KEY(account_id) REFERENCES source_accounts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS presets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS preset_rows(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        preset_id INTEGER NOT NULL,
        basis_account_id INTEGER NOT NULL,
        operation_id INTEGER NOT NULL,
        UNIQUE(preset_id, basis_account_id, operation_id),
        FOREIGN KEY(preset_id) REFERENCES presets(id) ON DELETE CASCADE,
        FOREIGN KEY(basis_account_id) REFERENCES basis_accounts(id) ON DELETE CASCADE,
        FOREIGN KEY(operation_id) REFERENCES operations(id) ON DELETE CASCADE
    );

    -- One allocation rule per source account.
    CREATE TABLE IF NOT EXISTS distributions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_account_id INTEGER NOT NULL UNIQUE,
        dist_type TEXT NOT NULL CHECK(dist_type IN ('direct','percentage','dynamic')),
        preset_id INTEGER,
        status TEXT NOT NULL DEFAULT 'Undistributed',
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(source_account_id) REFERENCES source_accounts(id) ON DELETE CASCADE,
        FOREIGN KEY(preset_id) REFERENCES presets(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS distribution_details(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        distribution_id INTEGER NOT NULL,
        operation_id INTEGER NOT NULL,
        pct TEXT, -- 0..=100; NULL for dynamic rows fed by a preset
        UNIQUE(distribution_id, operation_id),
        FOREIGN KEY(distribution_id) REFERENCES distributions(id) ON DELETE CASCADE,
        FOREIGN KEY(operation_id) REFERENCES operations(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS allocations(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_at TEXT NOT NULL DEFAULT (datetime('now')),
        source_account_id INTEGER NOT NULL,
        period TEXT,
        operation_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        basis_value TEXT NOT NULL,
        ratio TEXT NOT NULL,
        preset_id INTEGER,
        FOREIGN KEY(source_account_id) REFERENCES source_accounts(id) ON DELETE CASCADE,
        FOREIGN KEY(operation_id) REFERENCES operations(id) ON DELETE CASCADE,
        FOREIGN KEY(preset_id) REFERENCES presets(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_allocations_source ON allocations(source_account_id);
    "#,
    )?;
    Ok(())
}
