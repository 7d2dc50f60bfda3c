//! The external editor that an edit session hands the plaintext to.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::errors::{Result, SecretsError};

/// Something that edits a file in place and returns once the user is done.
pub trait Editor {
    fn edit(&self, path: &Path) -> Result<()>;
}

impl<F> Editor for F
where
    F: Fn(&Path) -> Result<()>,
{
    fn edit(&self, path: &Path) -> Result<()> {
        self(path)
    }
}

/// `$EDITOR` run as a blocking subprocess on the caller's terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEditor {
    program: String,
    args: Vec<String>,
}

impl ExternalEditor {
    /// Build the editor from `$EDITOR`.
    ///
    /// Unset or blank is `EditorNotConfigured`.
    pub fn from_env() -> Result<Self> {
        match std::env::var("EDITOR") {
            Ok(command) => Self::parse(&command),
            Err(_) => Err(SecretsError::EditorNotConfigured),
        }
    }

    /// Split an editor command such as `code --wait` into program and args.
    pub fn parse(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(SecretsError::EditorNotConfigured)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        debug!(editor = %self.program, "launching editor");

        // stdin/stdout/stderr are inherited so the editor owns the terminal.
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(path);

        let status = {
            // Ctrl-C and hangups belong to the editor; this process must
            // outlive them to remove the plaintext.  Installed before spawn
            // so there is no window where a signal kills us first.
            #[cfg(unix)]
            let _guard = IgnoreInterrupts::install();
            #[cfg(unix)]
            restore_default_signals_in_child(&mut command);

            let mut child = command.spawn().map_err(|e| {
                SecretsError::EditorError(format!("failed to launch '{}': {e}", self.program))
            })?;
            child.wait()?
        };

        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) => Err(SecretsError::EditorError(format!(
                "editor exited with code {code}"
            ))),
            None => Err(SecretsError::EditorError(
                "editor terminated by signal".into(),
            )),
        }
    }
}

/// Signals the parent ignores while the editor runs.
#[cfg(unix)]
const INTERRUPTS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGQUIT, libc::SIGHUP];

/// Ignores [`INTERRUPTS`] until dropped, then restores the old handlers.
#[cfg(unix)]
struct IgnoreInterrupts {
    previous: [libc::sighandler_t; 3],
}

#[cfg(unix)]
impl IgnoreInterrupts {
    fn install() -> Self {
        let mut previous = [libc::SIG_DFL; 3];
        for (slot, signal) in previous.iter_mut().zip(INTERRUPTS) {
            // SAFETY: SIG_IGN is a valid disposition and the previous
            // handler is restored unchanged in `drop`.
            *slot = unsafe { libc::signal(signal, libc::SIG_IGN) };
        }
        Self { previous }
    }
}

#[cfg(unix)]
impl Drop for IgnoreInterrupts {
    fn drop(&mut self) {
        for (handler, signal) in self.previous.into_iter().zip(INTERRUPTS) {
            // SAFETY: restores a handler previously returned by `signal`.
            unsafe {
                libc::signal(signal, handler);
            }
        }
    }
}

/// Ignored dispositions survive `exec`, so reset them for the editor.
#[cfg(unix)]
fn restore_default_signals_in_child(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    // SAFETY: the closure runs between fork and exec and only calls
    // `signal`, which touches no locks or allocations.
    unsafe {
        command.pre_exec(|| {
            for signal in INTERRUPTS {
                libc::signal(signal, libc::SIG_DFL);
            }
            Ok(())
        });
    }
}
