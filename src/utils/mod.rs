pub mod connection;

use std::path::PathBuf;

use which::which;

use crate::errors::{BackupError, Result};

/// Finds the dump executable in the system PATH (or checks an explicit path).
pub fn find_executable(program: &str) -> Result<PathBuf> {
    which(program).map_err(|e| BackupError::Spawn {
        program: PathBuf::from(program),
        source: std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!(
                "{} not found in PATH ({}). Please ensure the MongoDB database tools are installed.",
                program, e
            ),
        ),
    })
}

/// Renders an argument list as a single POSIX shell command line.
///
/// Arguments made only of characters the shell leaves alone are emitted as-is;
/// everything else is single-quoted.
pub fn quote_command_line<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| quote_arg(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_arg(arg: &str) -> String {
    let is_plain = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c);
    if !arg.is_empty() && arg.chars().all(is_plain) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r#"'"'"'"#))
}
