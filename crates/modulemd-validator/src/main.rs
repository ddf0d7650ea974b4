// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/spkenv/spk

use clap::Parser;
use colored::Colorize;
use modulemd_validator::{Opt, configure_logging, run};

fn main() {
    let opt = Opt::parse();
    if let Err(err) = configure_logging(&opt) {
        eprintln!("{}", format!("{err:?}").red());
        std::process::exit(1);
    }
    let code = match run(&opt, &mut std::io::stdout().lock()) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:?}");
            1
        }
    };
    std::process::exit(code);
}
