//! `clap`-derived `Args` struct, plus a translation to a `clap`-free `Options` the library side
//! can consume: `-f/--file`, `-B/--always-make`, `-o/--old-file`, `-n/--new-file`, and
//! `-C/--directory`, following GNU make's documented flag names and semantics.

use clap::Parser;
use const_format::formatcp;

/// Library-facing options, free of any `clap` dependency.
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub always_make: bool,
    pub old_file: Vec<String>,
    pub new_file: Vec<String>,
}

#[derive(Clone, Debug, Parser)]
#[clap(
    name = "rmake",
    version,
    about,
    after_help = formatcp!(
        "License:  {}\nSource:   {}", env!("CARGO_PKG_LICENSE"), env!("CARGO_PKG_REPOSITORY")
    ),
)]
pub struct Args {
    /// Target(s) (if none specified, use the first regular target).
    #[arg()]
    pub targets: Vec<String>,

    /// Read FILE as the makefile.
    #[arg(short, long, visible_alias("makefile"))]
    pub file: Option<String>,

    /// Change to DIRECTORY before reading the makefile or doing anything else.
    #[arg(short = 'C', long, value_name = "DIRECTORY")]
    pub directory: Option<String>,

    /// Unconditionally make all targets.
    #[arg(short = 'B', long = "always-make")]
    pub always_make: bool,

    /// Consider FILE to be very old and do not remake it.
    #[arg(short, long, value_name = "FILE", visible_alias("assume-old"))]
    pub old_file: Vec<String>,

    /// Consider FILE to be infinitely new.
    #[arg(short, long, value_name = "FILE", visible_alias("assume-new"))]
    pub new_file: Vec<String>,

    /// Ignored for compatibility.
    #[arg(short = 'b')]
    pub b: bool,
    /// Ignored for compatibility.
    #[arg(short = 'm')]
    pub m: Option<Option<String>>,
}

impl Args {
    pub fn to_options(&self) -> Options {
        Options {
            always_make: self.always_make,
            old_file: self.old_file.clone(),
            new_file: self.new_file.clone(),
        }
    }
}
