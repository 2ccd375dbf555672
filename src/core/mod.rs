//! Core rule generation functionality
//!
//! This module contains the question catalog and the engine that turns answers
//! into an ordered iptables rule document. It provides:
//!
//! - [`registry`]: The static question catalog with priorities and rule templates
//! - [`answers`]: Collected answer values
//! - [`assembler`]: Ordering and rendering of the rule document
//! - [`record`]: Persisted answers record (JSON codec and file I/O)
//! - [`error`]: Error types for rule generation

pub mod answers;
pub mod assembler;
pub mod error;
pub mod record;
pub mod registry;
