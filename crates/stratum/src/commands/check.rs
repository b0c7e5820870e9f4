//! `stratum check` implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stratum_schema::Schema;
use tracing::{debug, warn};

/// Execute the check command
pub fn execute(files: &[PathBuf], schema_path: &Path) -> Result<()> {
    let schema = Schema::from_file(schema_path)
        .with_context(|| format!("Failed to load schema {}", schema_path.display()))?;

    let mut failed = 0;
    for file in files {
        let problems = check_file(&schema, file)?;
        if problems.is_empty() {
            debug!(file = %file.display(), "File is valid");
            println!("{}: ok", file.display());
            continue;
        }

        failed += 1;
        warn!(file = %file.display(), violations = problems.len(), "File is invalid");
        for problem in problems {
            println!("{}: {}", file.display(), problem);
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed validation", failed, files.len());
    }
    Ok(())
}

/// Parse a file and list everything wrong with it.
fn check_file(schema: &Schema, path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let document = match stratum_xml::parse(&content) {
        Ok(document) => document,
        Err(err) => return Ok(vec![err.to_string()]),
    };

    Ok(schema
        .validate(&document.root)
        .into_iter()
        .map(|violation| {
            let (line, column) = violation.span.line_col(&content);
            format!("{}:{}: {}", line, column, violation)
        })
        .collect())
}
