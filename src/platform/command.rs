use std::path::PathBuf;
use std::process::Command;

/// Locates executables on the search path.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandService;

impl CommandService {
    /// Returns the first executable named `command` found on `PATH`.
    pub fn find_command(&self, command: &str) -> Option<PathBuf> {
        which::which(command).ok()
    }

    /// Prepares a [`Command`] for `command` if it can be found.
    pub fn command(&self, command: &str) -> Option<Command> {
        self.find_command(command).map(Command::new)
    }
}
