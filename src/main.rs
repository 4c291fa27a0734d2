use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::IsTerminal;
use std::path::Path;
use tracing::debug;

use turnstile::formatting::{self, Identity, Terminal};
use turnstile::parsing;
use turnstile::problem::{
    concise_diagnostic, concise_loading_error, full_diagnostic, sort_diagnostics,
    Diagnostic,
};

fn main() {
    const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    let matches = Command::new("turnstile")
        .version(VERSION)
        .propagate_version(true)
        .about("Grammar productions and the typing rules that go with them.")
        .disable_help_subcommand(true)
        .arg(
            Arg::new("debug")
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging to standard error."),
        )
        .subcommand(
            Command::new("check")
                .about("Parse the given specification and check its variable bindings")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the diagnostics as a JSON array."),
                )
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .short('v')
                        .action(ArgAction::SetTrue)
                        .help("Show the offending source line along with each diagnostic."),
                )
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The file containing the productions and typing rules you want to check."),
                ),
        )
        .subcommand(
            Command::new("format")
                .about("Code format the given specification")
                .arg(
                    Arg::new("raw-control-chars")
                        .short('R')
                        .long("raw-control-chars")
                        .action(ArgAction::SetTrue)
                        .help("Emit ANSI escape codes for syntax highlighting even if output is redirected to a pipe or file."),
                )
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The file containing the specification you want to format."),
                ),
        )
        .get_matches();

    let level = if matches.get_flag("debug") {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match matches.subcommand() {
        Some(("check", submatches)) => check(submatches),
        Some(("format", submatches)) => format(submatches),
        Some(_) => {
            println!("No valid subcommand was used")
        }
        None => {
            println!("usage: turnstile [COMMAND] ...");
            println!("Try '--help' for more information.");
        }
    }
}

fn check(submatches: &ArgMatches) {
    let filename = match submatches.get_one::<String>("filename") {
        Some(filename) => Path::new(filename),
        None => std::process::exit(1),
    };
    debug!(?filename);

    let content = match parsing::load(filename) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("{}", concise_loading_error(&error));
            std::process::exit(1);
        }
    };

    let diagnostics = match turnstile::parse_and_validate(&content) {
        Ok(_) => Vec::new(),
        Err(diagnostics) => diagnostics,
    };

    if submatches.get_flag("json") {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{}", json),
            Err(error) => {
                eprintln!("{}", error);
                std::process::exit(1);
            }
        }
    } else if submatches.get_flag("verbose") {
        for diagnostic in &diagnostics {
            eprintln!("{}\n", full_diagnostic(diagnostic, filename, &content));
        }
    } else {
        for diagnostic in &diagnostics {
            eprintln!("{}", concise_diagnostic(diagnostic, filename));
        }
    }

    std::process::exit(exit_code(&diagnostics));
}

fn format(submatches: &ArgMatches) {
    let filename = match submatches.get_one::<String>("filename") {
        Some(filename) => Path::new(filename),
        None => std::process::exit(1),
    };
    debug!(?filename);

    let raw_output = submatches.get_flag("raw-control-chars");

    let content = match parsing::load(filename) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("{}", concise_loading_error(&error));
            std::process::exit(1);
        }
    };

    let document = match parsing::parse(&content) {
        Ok(document) => document,
        Err(errors) => {
            let mut diagnostics: Vec<Diagnostic> = errors
                .iter()
                .map(|error| Diagnostic::from_parsing(error, None, &content))
                .collect();
            sort_diagnostics(&mut diagnostics);
            for diagnostic in &diagnostics {
                eprintln!("{}", concise_diagnostic(diagnostic, filename));
            }
            std::process::exit(exit_code(&diagnostics));
        }
    };

    let result = if raw_output
        || std::io::stdout()
            .is_terminal()
    {
        formatting::render(&Terminal, &document)
    } else {
        formatting::render(&Identity, &document)
    };

    print!("{}", result);
}

fn exit_code(diagnostics: &[Diagnostic]) -> i32 {
    diagnostics
        .len()
        .min(255) as i32
}
