use std::path::Path;

/// Check that the path points to a file that exists — used by the CLI's
/// `--key`/`--cert` value parsers (teacher convention: CLI validators
/// live here rather than inline closures in `main.rs`).
pub fn is_file(file_str: &str) -> Result<(), String> {
    match Path::new(file_str).is_file() {
        true => Ok(()),
        false => Err(format!("file does not exist: {file_str}")),
    }
}
