// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_default_period, parse_period, set_default_period};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let period = parse_period(sub.get_one::<String>("period").unwrap().trim())?;
            set_default_period(conn, &period)?;
            println!("Default period set to {}", period);
        }
        Some(("show", _)) => match get_default_period(conn)? {
            Some(p) => println!("Default period: {}", p),
            None => println!("No default period set"),
        },
        _ => {}
    }
    Ok(())
}
