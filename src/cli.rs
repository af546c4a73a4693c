// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON instead of a table"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print JSON lines instead of a table"),
    )
}

pub fn build_cli() -> Command {
    Command::new("prorata")
        .version(clap::crate_version!())
        .about("Chart-of-accounts mapping and proportional allocation")
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("operation")
                .about("Manage target operations")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("code").long("code").required(true))
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm").arg(Arg::new("code").long("code").required(true)),
                ),
        )
        .subcommand(
            Command::new("basis")
                .about("Manage basis accounts (weighting datapoints)")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("value").long("value")),
                )
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("value").long("value").required(true))
                        .arg(Arg::new("period").long("period")),
                )
                .subcommand(Command::new("list").arg(Arg::new("period").long("period")))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("source")
                .about("Manage source accounts (amounts to distribute)")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("value").long("value")),
                )
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("value").long("value").required(true))
                        .arg(Arg::new("period").long("period")),
                )
                .subcommand(Command::new("list").arg(Arg::new("period").long("period")))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("preset")
                .about("Manage allocation presets")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("add-row")
                        .arg(Arg::new("preset").long("preset").required(true))
                        .arg(Arg::new("basis").long("basis").required(true))
                        .arg(Arg::new("operation").long("operation").required(true)),
                )
                .subcommand(
                    Command::new("rm-row")
                        .arg(Arg::new("preset").long("preset").required(true))
                        .arg(Arg::new("basis").long("basis").required(true))
                        .arg(Arg::new("operation").long("operation").required(true)),
                )
                .subcommand(
                    Command::new("list")
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("period").long("period")),
                )
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("distribution")
                .about("Manage allocation rules for source accounts")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("source").long("source").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .help("direct | percentage | dynamic"),
                        )
                        .arg(Arg::new("preset").long("preset"))
                        .arg(
                            Arg::new("op")
                                .long("op")
                                .action(ArgAction::Append)
                                .help("Operation row as CODE or CODE:PCT; repeatable"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rm").arg(Arg::new("source").long("source").required(true)),
                ),
        )
        .subcommand(
            Command::new("allocate")
                .about("Compute allocations")
                .subcommand(json_flags(
                    Command::new("run")
                        .arg(Arg::new("source").long("source").required(true))
                        .arg(Arg::new("period").long("period"))
                        .arg(
                            Arg::new("save")
                                .long("save")
                                .action(ArgAction::SetTrue)
                                .help("Record the computed rows as allocation activity"),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("split")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("weights")
                                .long("weights")
                                .required(true)
                                .help("Comma-separated basis weights, e.g. 50,30,20"),
                        ),
                )),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("allocations")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .required(true)
                            .help("csv | json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("period")
                .about("Default reporting period")
                .subcommand(
                    Command::new("set").arg(Arg::new("period").long("period").required(true)),
                )
                .subcommand(Command::new("show")),
        )
        .subcommand(Command::new("doctor").about("Run catalog integrity checks"))
}
