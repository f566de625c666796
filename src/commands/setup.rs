//! The `setup` command: store the OpenAI API key.

use crate::credentials::{Credentials, credentials_path};
use crate::error::{EmissaryError, Result};
use std::io::{BufRead, Write};

pub fn cmd_setup() -> Result<()> {
    eprint!("OpenAI API key: ");
    std::io::stderr().flush().ok();

    let mut key = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut key)
        .map_err(|e| EmissaryError::Usage(format!("cannot read API key: {e}")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(EmissaryError::Usage("API key must not be empty".to_string()));
    }

    let path = credentials_path()?;
    let mut credentials = Credentials::load(&path)?;
    credentials.openai_api_key = Some(key.to_string());
    credentials.save(&path)?;

    println!("Saved credentials to {}", path.display());
    Ok(())
}
