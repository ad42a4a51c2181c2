use std::env;
use std::ffi::OsStr;
use std::io;
use std::process::{Command, ExitStatus};
use std::time::Duration;

use tracing::info;

use crate::error::{Error, Result};

/// Runs external commands as named build steps.
///
/// Under GitHub Actions each step is wrapped in a collapsible `::group::`.
#[derive(Debug, Clone)]
pub struct Runner {
    github_actions: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        let github_actions = env::var("GITHUB_ACTIONS")
            .map(|v| v == "true")
            .unwrap_or(false);
        Self { github_actions }
    }

    /// Run `cmd` to completion and return its exit status. Spawn failures are errors; a non-zero
    /// exit is left to the caller.
    pub fn run_step(&self, desc: &str, cmd: &mut Command) -> Result<ExitStatus> {
        println!();
        if self.github_actions {
            println!("::group::{desc}");
        } else {
            println!("==> {desc}");
        }
        let program = program_name(cmd.get_program());
        info!(step = desc, program = %program, "running step");

        let status = {
            let mut attempts = 0u32;
            loop {
                match cmd.status() {
                    Ok(status) => break Ok(status),
                    Err(err) => {
                        // Freshly written executables (shell stubs in tests, npm shims) can
                        // briefly report ETXTBUSY ("Text file busy").
                        #[cfg(unix)]
                        let should_retry = err.raw_os_error() == Some(26);
                        #[cfg(not(unix))]
                        let should_retry = false;

                        if should_retry && attempts < 3 {
                            attempts += 1;
                            std::thread::sleep(Duration::from_millis(10 * attempts as u64));
                            continue;
                        }

                        break Err(err);
                    }
                }
            }
        };

        if self.github_actions {
            println!("::endgroup::");
        }

        status.map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::MissingTool { program },
            _ => Error::Spawn {
                program,
                source: err,
            },
        })
    }
}

fn program_name(value: &OsStr) -> String {
    value.to_string_lossy().to_string()
}
