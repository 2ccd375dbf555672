//! Output file naming and writing
//!
//! A run produces two files: the rule document for `iptables-restore` and the
//! answers record for a later `load`. Both are rendered in memory first and
//! written atomically, so an error never leaves one without the other.

use crate::core::answers::AnswersMap;
use crate::core::assembler::Document;
use crate::core::error::{Error, Result};
use crate::core::record;
use crate::utils::write_atomic;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Paths of the two files written by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub rules: PathBuf,
    pub answers: PathBuf,
}

impl OutputPaths {
    /// Default names: `rules_<ts>.txt` and `questions_rules<ts>.json` inside `dir`.
    pub fn timestamped<Tz>(dir: &Path, now: &DateTime<Tz>, format: &str) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let timestamp = now.format(format).to_string();
        Self {
            rules: dir.join(format!("rules_{timestamp}.txt")),
            answers: dir.join(format!("questions_rules{timestamp}.json")),
        }
    }

    /// Names derived from a user-chosen rules path: the answers go next to it
    /// as `questions_<name up to the first dot>.json`.
    pub fn for_rules_file(rules: &Path) -> Self {
        let file_name = rules
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file_name.split('.').next().unwrap_or_default();
        Self {
            rules: rules.to_path_buf(),
            answers: rules.with_file_name(format!("questions_{stem}.json")),
        }
    }
}

/// Writes the answers record and the rule document.
///
/// If any write fails, the record and its sidecar are removed again.
pub fn write_outputs(
    paths: &OutputPaths,
    document: &Document,
    answers: &AnswersMap,
    with_checksum: bool,
) -> Result<()> {
    let mut rules = document.render();
    rules.push('\n');

    let written = record::save(&paths.answers, answers, with_checksum)
        .and_then(|()| write_atomic(&paths.rules, rules.as_bytes()).map_err(Error::from));

    if let Err(e) = written {
        tracing::error!(path = %paths.rules.display(), "failed to write outputs: {e}");
        let _ = std::fs::remove_file(&paths.answers);
        let _ = std::fs::remove_file(record::checksum_path(&paths.answers));
        return Err(e);
    }

    tracing::info!(
        path = %paths.rules.display(),
        rules = document.bodies().len(),
        "wrote rule file"
    );
    Ok(())
}
