//! Merge a hand-written WAT fragment into compiler-generated WAT.
//!
//! The AssemblyScript source declares `ethash_keccak256` as an import; the fragment supplies a
//! real function with the same symbolic name. Splicing the fragment in and deleting the import
//! line turns every call site into a direct call to the fragment's implementation.

use tracing::{debug, warn};

use crate::config::{InsertionRule, MissingImportPolicy, SpliceOptions};
use crate::error::{Error, Result};
use crate::normalize::normalize;

/// What [`splice_lines`] did to the line list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpliceReport {
    /// Lines in the compiler output (after normalization).
    pub main_lines: usize,
    pub fragment_lines: usize,
    /// Index at which the first fragment line now sits.
    pub insert_at: usize,
    /// Index the import occupied (post-insertion) before it was removed.
    pub removed_import: Option<usize>,
    pub output_lines: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Spliced {
    pub text: String,
    pub report: SpliceReport,
}

/// Normalize `main`, insert `fragment`, and drop the placeholder import.
///
/// Both inputs are split on `\n`, so a trailing newline shows up as a final empty line; the
/// default insertion rule depends on that.
pub fn splice(main: &str, fragment: &str, options: &SpliceOptions) -> Result<Spliced> {
    let main = normalize(main);
    let mut lines: Vec<&str> = main.split('\n').collect();
    let fragment: Vec<&str> = fragment.split('\n').collect();

    let report = splice_lines(&mut lines, &fragment, options)?;
    Ok(Spliced {
        text: lines.join("\n"),
        report,
    })
}

pub fn splice_lines<'a>(
    lines: &mut Vec<&'a str>,
    fragment: &[&'a str],
    options: &SpliceOptions,
) -> Result<SpliceReport> {
    let mut report = SpliceReport {
        main_lines: lines.len(),
        fragment_lines: fragment.len(),
        ..SpliceReport::default()
    };
    debug!(lines = lines.len(), "main wat line count");

    let insert_at = insertion_index(lines, options.insertion)?;
    lines.splice(insert_at..insert_at, fragment.iter().copied());
    report.insert_at = insert_at;
    debug!(
        insert_at,
        lines = lines.len(),
        "inserted {} fragment line(s)",
        fragment.len()
    );

    match find_import(lines, options) {
        Some(idx) => {
            debug!(line = idx, "deleting import statement");
            lines.remove(idx);
            // The fragment shifts down by one when the import sat above it.
            if idx < report.insert_at {
                report.insert_at -= 1;
            }
            report.removed_import = Some(idx);
        }
        None => {
            let import = options.import.describe();
            match options.on_missing_import {
                MissingImportPolicy::Error => {
                    return Err(Error::ImportNotFound {
                        import,
                        window: options.scan_window,
                    });
                }
                MissingImportPolicy::Warn => {
                    let msg = format!(
                        "couldn't find import statement in the first {} lines, wat parsing will probably fail: {import}",
                        options.scan_window
                    );
                    warn!("{msg}");
                    report.warnings.push(msg);
                }
            }
        }
    }

    report.output_lines = lines.len();
    Ok(report)
}

fn insertion_index(lines: &[&str], rule: InsertionRule) -> Result<usize> {
    match rule {
        InsertionRule::FixedOffset { from_end } => Ok(lines.len().saturating_sub(from_end)),
        InsertionRule::ClosingDelimiter => lines
            .iter()
            .rposition(|line| line.trim() == ")")
            .ok_or(Error::NoClosingDelimiter { lines: lines.len() }),
    }
}

fn find_import(lines: &[&str], options: &SpliceOptions) -> Option<usize> {
    lines
        .iter()
        .take(options.scan_window)
        .position(|line| options.import.matches(line))
}
