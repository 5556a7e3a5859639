//! A minimal sequential runner: echo each displayed command, then shell out to it. Not parallel --
//! the engine only produces an order to run targets in, and driving a worker pool from that order
//! is left to a future runner.

use std::process::Command;

use crate::context::Context;
use crate::error::{log_warn, ErrorKind, MakeError};
use crate::Engine;

const SHELL: &str = "/bin/sh";
const SHELL_ARG: &str = "-c";

/// Drain `engine.targets_ready`, running each target's compiled commands in order and promoting
/// newly-unblocked children via `Engine::complete_target`, until no target remains ready.
///
/// Returns an error (and stops) on the first command that fails without `ignore_errors` set.
pub fn run(engine: &mut Engine) -> Result<(), MakeError> {
    while let Some(target) = engine.targets_ready.pop_front() {
        let cmds = engine.target(target).exec_cmds.clone();
        for cmd in cmds {
            if cmd.display_cmd {
                println!("{}", cmd.cmd);
            }

            let status = Command::new(SHELL)
                .arg(SHELL_ARG)
                .arg(&cmd.cmd)
                .status()
                .map_err(|e| MakeError::new(ErrorKind::Io, e.to_string(), Context::new()))?;

            if !status.success() {
                if cmd.ignore_errors {
                    log_warn(format!("[{}] Error ignored", cmd.cmd), None);
                } else {
                    return Err(MakeError::new(
                        ErrorKind::Io,
                        format!("command failed: {}", cmd.cmd),
                        Context::new(),
                    ));
                }
            }
        }

        engine.complete_target(target);
    }

    Ok(())
}
