//! # resetprop
//!
//! Reads, writes and deletes system properties, including the persistent
//! `persist.` store.

use env_logger::Env;
use log::LevelFilter;
use persist_store::StoreConfig;
use prop_area::MemoryPropertyArea;
use prop_resolver::PropertyResolver;
use resetprop::{parse_args, run, Command};
use std::env;
use std::io;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("resetprop");

    let invocation = parse_args(args.get(1..).unwrap_or_default()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(program);
        process::exit(1);
    });
    if invocation.command == Command::Help {
        print_usage(program);
        process::exit(0);
    }

    init_logging(invocation.verbose);

    let config = match &invocation.config {
        Some(path) => StoreConfig::load_from_path(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => StoreConfig::default(),
    };

    // No host registry is linked in; live values last for this process only.
    let mut resolver = PropertyResolver::new(MemoryPropertyArea::new(), config);
    let status = run(&invocation, &mut resolver, &mut io::stdout().lock());
    process::exit(status);
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp(None);
    let _ = builder.try_init();
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [flags] [arguments...]", program);
    eprintln!();
    eprintln!("Read, set or delete system properties.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  (no arguments)           Print all properties");
    eprintln!("  NAME                     Get property");
    eprintln!("  NAME VALUE               Set property entry NAME with VALUE");
    eprintln!("  -f, --file FILE          Load props from FILE");
    eprintln!("  -d, --delete NAME        Delete property");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  -v                       Print verbose output to stderr");
    eprintln!("  -n                       Set props without going through the property service");
    eprintln!("                           (this flag only affects setprop)");
    eprintln!("  -p                       Also read or write persistent props from storage");
    eprintln!("  -P                       Only read persistent props from storage");
    eprintln!("  -Z                       Get property contexts instead of values");
    eprintln!("  -N                       Use the property service for ro.* props");
    eprintln!("  --config FILE            Load store configuration from a JSON file");
    eprintln!("  -h, --help               Show this help message");
}
