//! The `list` command: print declared agents.

use crate::cli::ListArgs;
use crate::config::ConfigDocument;
use crate::error::Result;

pub fn cmd_list(args: ListArgs) -> Result<()> {
    let doc = ConfigDocument::load(&args.config)?;
    if doc.agents.is_empty() {
        println!("No agents declared in {}", args.config);
        return Ok(());
    }

    let width = doc
        .agents
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0);
    for (name, spec) in &doc.agents {
        let summary = summary_line(&spec.description);
        if summary.is_empty() {
            println!("{name}");
        } else {
            println!("{name:width$}  {summary}");
        }
    }
    Ok(())
}

/// First line of a description; multi-line prose would break the column
/// alignment.
fn summary_line(description: &str) -> &str {
    description.lines().next().unwrap_or("").trim()
}
