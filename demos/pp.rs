extern crate anyhow;
extern crate c_pp;
extern crate clap;
extern crate env_logger;

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{App, Arg};

use c_pp::Resolver;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let matches = App::new("pp")
        .arg(Arg::with_name("SOURCE_FILE").index(1).required(true))
        .arg(Arg::with_name("SILENT").long("silent"))
        .arg(
            Arg::with_name("INCLUDE_DIR")
                .short("I")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1),
        )
        .arg(
            Arg::with_name("DEFINE")
                .short("D")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("NAME or NAME=VALUE"),
        )
        .get_matches();
    let src_file = Path::new(matches.value_of("SOURCE_FILE").expect("required arg"));
    let silent = matches.is_present("SILENT");

    let mut resolver = Resolver::new();
    if let Some(dirs) = matches.values_of("INCLUDE_DIR") {
        for dir in dirs {
            resolver.search_paths_mut().push(dir.into());
        }
    }
    if let Some(defines) = matches.values_of("DEFINE") {
        for define in defines {
            match define.split_once('=') {
                Some((name, value)) => resolver.predefine(name, value),
                None => resolver.predefine(define, "1"),
            }
        }
    }

    let start_time = Instant::now();
    let expanded = match resolver.resolve(src_file) {
        Ok(expanded) => expanded,
        Err(aborted) => {
            for diagnostic in &aborted.diagnostics {
                eprintln!("{}", diagnostic);
            }
            return Err(aborted).with_context(|| format!("cannot resolve {:?}", src_file));
        }
    };
    for diagnostic in &expanded.diagnostics {
        eprintln!("{}", diagnostic);
    }
    if !silent {
        print!("{}", expanded.text);
    }
    eprintln!("INCLUDES: {}", expanded.includes.len());
    eprintln!(
        "ELAPSED: {:?} seconds",
        to_seconds(Instant::now() - start_time)
    );
    Ok(())
}

fn to_seconds(duration: Duration) -> f64 {
    duration.as_secs() as f64 + f64::from(duration.subsec_nanos()) / 1_000_000_000.0
}
