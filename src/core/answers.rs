//! Collected answers
//!
//! An [`AnswersMap`] holds one [`AnswerValue`] per question that was actually
//! asked. Questions that were skipped are simply absent; a `cancel` response is
//! recorded as [`AnswerValue::Cancelled`].

use crate::core::registry::QuestionKind;
use std::collections::BTreeMap;

/// The answer given to a single question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    Boolean(bool),
    /// Selected option numbers of a composite question, as displayed (1-based, 0 = none)
    IntList(Vec<u32>),
    /// Addresses in the order they were entered
    AddressList(Vec<String>),
    Cancelled,
}

impl AnswerValue {
    pub fn kind(&self) -> Option<AnswerKind> {
        match self {
            AnswerValue::Boolean(_) => Some(AnswerKind::Boolean),
            AnswerValue::IntList(_) => Some(AnswerKind::IntList),
            AnswerValue::AddressList(_) => Some(AnswerKind::AddressList),
            AnswerValue::Cancelled => None,
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, AnswerValue::Boolean(true))
    }
}

/// Value shape, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AnswerKind {
    #[strum(serialize = "a yes/no value")]
    Boolean,
    #[strum(serialize = "a list of option numbers")]
    IntList,
    #[strum(serialize = "a list of addresses")]
    AddressList,
}

impl From<QuestionKind> for AnswerKind {
    fn from(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::YesNo => AnswerKind::Boolean,
            QuestionKind::Composite { .. } => AnswerKind::IntList,
            QuestionKind::AddressList => AnswerKind::AddressList,
        }
    }
}

/// Question id → answer, ordered by id so serialization is stable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswersMap {
    entries: BTreeMap<String, AnswerValue>,
}

impl AnswersMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an answer, replacing any earlier one for the same id.
    pub fn insert(&mut self, id: impl Into<String>, value: AnswerValue) {
        self.entries.insert(id.into(), value);
    }

    pub fn get(&self, id: &str) -> Option<&AnswerValue> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether `id` was answered with `Boolean(true)`.
    pub fn is_true(&self, id: &str) -> bool {
        self.get(id).is_some_and(AnswerValue::is_true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AnswerValue)> for AnswersMap {
    fn from_iter<I: IntoIterator<Item = (K, AnswerValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(id, value)| (id.into(), value)).collect(),
        }
    }
}
