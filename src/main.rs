//! # rmake
//!
//! A small, make-compatible build tool: reads a makefile, resolves the target graph (including
//! chained inference rules and automatic variables), schedules out-of-date targets, and runs the
//! resulting commands with `/bin/sh`.

mod args;

use std::path::Path;

use clap::Parser;

use args::Args;
use rmake::{parser, runner, Engine};

const MAKEFILE_SEARCH: [&str; 6] = [
    "Makefile",
    "makefile",
    "BSDMakefile",
    "BSDmakefile",
    "GNUMakefile",
    "GNUmakefile",
];

fn find_makefile() -> Option<String> {
    MAKEFILE_SEARCH
        .iter()
        .find(|f| Path::new(f).is_file())
        .map(|f| f.to_string())
}

fn exit_with<S: Into<String>>(msg: S) -> ! {
    eprintln!("rmake: {}", msg.into());
    std::process::exit(2)
}

fn main() {
    let args = Args::parse();
    let options = args.to_options();

    // `-C DIRECTORY`: change directory before reading the makefile or doing anything else.
    if let Some(dir) = &args.directory {
        std::env::set_current_dir(dir)
            .unwrap_or_else(|e| exit_with(format!("cannot change to directory '{}' ({})", dir, e)));
    }
    let working_dir = std::env::current_dir()
        .unwrap_or_else(|e| exit_with(format!("cannot get working directory ({})", e)));

    let makefile_fn = match &args.file {
        Some(f) => f.clone(),
        None => find_makefile().unwrap_or_else(|| exit_with("no makefile found")),
    };

    let mut engine = Engine::new(working_dir);
    let root = engine.root_scope();

    for file in &options.old_file {
        engine.force_old_named(root, file);
    }
    for file in &options.new_file {
        engine.force_new_named(root, file);
    }

    {
        let mut p = parser::Parser::new(&mut engine, root);
        if let Err(e) = p.parse_file(Path::new(&makefile_fn)) {
            exit_with(e.to_string());
        }
    }

    let requested: Vec<_> = if args.targets.is_empty() {
        match engine.default_target() {
            Some(t) => vec![t],
            None => exit_with("no target specified and no default target found"),
        }
    } else {
        args.targets
            .iter()
            .map(|name| {
                engine
                    .declare_target(root, name)
                    .unwrap_or_else(|e| exit_with(e.to_string()))
            })
            .collect()
    };

    for target in requested {
        let result = if options.always_make {
            engine.force_dependencies_for_target(target)
        } else {
            engine.determine_dependencies_for_target(target)
        };
        if let Err(e) = result {
            exit_with(e.to_string());
        }
    }

    if let Err(e) = runner::run(&mut engine) {
        exit_with(e.to_string());
    }
}
