//! FireWALL-E - iptables rule wizard
//!
//! Asks a handful of questions about a host's network role and produces an
//! `iptables-restore` rule file plus a record of the answers that a later run
//! can reload and amend.
//!
//! # Architecture
//!
//! - [`core`] - Question registry, rule assembly, and the answers record
//! - [`wizard`] - Interactive, line-based answer collection
//! - [`validators`] - Input validation for yes/no, selections, and addresses
//! - [`output`] - Output file naming and atomic writes
//! - [`config`] - Optional user configuration
//! - [`utils`] - Utility functions (XDG directories, atomic writes)
//!
//! Applying the generated rules is left to `iptables-restore`.

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod core;
pub mod output;
pub mod utils;
pub mod validators;
pub mod wizard;

// Re-export commonly used types
pub use crate::core::answers::{AnswerValue, AnswersMap};
pub use crate::core::assembler::{Document, assemble};
pub use crate::core::error::{Error, Result};
pub use crate::core::registry::{QuestionSpec, Registry};
