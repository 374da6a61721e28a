pub mod file;

use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Typed input from `--input <file>`, or JSON piped on stdin.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_json(path);
    }
    // Interactive terminal: nothing is being piped in.
    if atty::is(atty::Stream::Stdin) {
        return Err("--input <file.json> or stdin required".into());
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Err("stdin was empty; expected a JSON proposal".into());
    }
    Ok(serde_json::from_str(buffer.trim())?)
}
