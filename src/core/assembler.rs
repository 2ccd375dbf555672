//! Rule assembly
//!
//! Turns a registry and a set of collected answers into the final
//! `iptables-restore` document. Assembly is a pure function: the registry is
//! never modified, address-derived rule text lives only in the returned
//! [`Document`], and any error aborts before a single line is produced.
//!
//! # Ordering
//!
//! Every included question contributes one [`RuleBody`]. Bodies are emitted in
//! ascending priority; equal priorities keep registry declaration order. The
//! same registry and answers always yield byte-identical output.
//!
//! # Example
//!
//! ```
//! use firewalle::core::answers::{AnswersMap, AnswerValue};
//! use firewalle::core::assembler::assemble;
//! use firewalle::core::registry::{ids, Registry};
//!
//! let mut answers = AnswersMap::new();
//! answers.insert(ids::EXPERIENCED, AnswerValue::Boolean(false));
//! answers.insert(ids::SSH_NO_EXP, AnswerValue::Boolean(true));
//!
//! let document = assemble(Registry::builtin(), &answers).unwrap();
//! assert!(document.render().contains("--dport 22"));
//! ```

use crate::core::answers::{AnswerValue, AnswersMap};
use crate::core::error::{Error, Result};
use crate::core::registry::{QuestionKind, QuestionSpec, Registry, RuleTemplate};
use crate::validators::validate_address;
use std::collections::HashSet;
use std::fmt;

/// Fixed framing emitted before the ordered rules
pub const PROLOGUE: &str = "#iptables firewall implementation\n\
*filter\n\
:INPUT DROP [0:0]\n\
:FORWARD ACCEPT [0:0]\n\
:OUTPUT ACCEPT [0:0]\n\
-A INPUT -i lo -j ACCEPT\n";

/// Fixed framing emitted after the ordered rules
pub const EPILOGUE: &str = "-A INPUT -m conntrack --ctstate RELATED,ESTABLISHED -j ACCEPT\n\nCOMMIT";

/// Expanded rule text of one included question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBody {
    pub id: &'static str,
    pub priority: u8,
    /// Position of the question in the registry, the tie-breaker for equal priorities
    pub declaration: usize,
    pub text: String,
}

/// Ordered rule bodies ready to be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    bodies: Vec<RuleBody>,
}

impl Document {
    pub fn bodies(&self) -> &[RuleBody] {
        &self.bodies
    }

    /// Renders the full document, framing included.
    ///
    /// The result ends with `COMMIT` and no trailing newline.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PROLOGUE)?;
        for body in &self.bodies {
            writeln!(f, "{}", body.text)?;
        }
        f.write_str(EPILOGUE)
    }
}

/// Assembles the rule document for `answers`.
///
/// # Errors
///
/// - [`Error::UnknownQuestionId`] if an answer names a question missing from `registry`
/// - [`Error::InvalidSelection`] if a composite selection names a nonexistent option
/// - [`Error::MalformedAddress`] if an address list contains an invalid address
pub fn assemble(registry: &Registry, answers: &AnswersMap) -> Result<Document> {
    for (id, _) in answers.iter() {
        registry.lookup(id)?;
    }

    let activated = activated_children(registry, answers)?;

    let mut bodies = Vec::new();
    for id in registry.eligible_ids() {
        let spec = registry.lookup(id)?;
        let (Some(priority), Some(declaration)) = (spec.priority, registry.declaration_index(id))
        else {
            continue;
        };

        if let Some(text) = rule_text(spec, answers.get(spec.id), &activated)? {
            tracing::debug!(id = spec.id, priority, "including rule body");
            bodies.push(RuleBody {
                id: spec.id,
                priority,
                declaration,
                text,
            });
        }
    }

    // Stable sort; declaration index makes the key total anyway
    bodies.sort_by_key(|body| (body.priority, body.declaration));

    Ok(Document { bodies })
}

/// Expanded text for one eligible question, or `None` when its answer is not affirmative.
fn rule_text(
    spec: &QuestionSpec,
    answer: Option<&AnswerValue>,
    activated: &HashSet<&'static str>,
) -> Result<Option<String>> {
    match (spec.template, answer) {
        (_, Some(AnswerValue::Cancelled)) => Ok(None),
        (RuleTemplate::PerAddress(_), Some(AnswerValue::AddressList(addresses))) => {
            if addresses.is_empty() {
                return Ok(None);
            }
            let validated = addresses
                .iter()
                .map(|value| {
                    validate_address(value).map_err(|_| Error::MalformedAddress {
                        id: spec.id.to_string(),
                        value: value.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(spec.template.expand(validated.as_slice())))
        }
        (RuleTemplate::Fixed(_), Some(AnswerValue::Boolean(true))) => {
            Ok(Some(spec.template.expand::<&str>(&[])))
        }
        (RuleTemplate::Fixed(_), _) if activated.contains(spec.id) => {
            Ok(Some(spec.template.expand::<&str>(&[])))
        }
        _ => Ok(None),
    }
}

/// Child ids switched on by composite selections.
fn activated_children(
    registry: &Registry,
    answers: &AnswersMap,
) -> Result<HashSet<&'static str>> {
    let mut activated = HashSet::new();

    for spec in registry.iter() {
        let QuestionKind::Composite { sub_ids } = spec.kind else {
            continue;
        };
        let Some(AnswerValue::IntList(selection)) = answers.get(spec.id) else {
            continue;
        };

        for &option in selection {
            // 0 is the explicit "nothing" choice
            if option == 0 {
                continue;
            }
            let child = usize::try_from(option - 1)
                .ok()
                .and_then(|index| sub_ids.get(index))
                .ok_or_else(|| Error::InvalidSelection {
                    id: spec.id.to_string(),
                    option,
                })?;
            activated.insert(*child);
        }
    }

    Ok(activated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ids;

    fn builtin(answers: &[(&str, AnswerValue)]) -> Result<String> {
        let answers: AnswersMap = answers.iter().cloned().collect();
        assemble(Registry::builtin(), &answers).map(|doc| doc.render())
    }

    #[test]
    fn test_no_answers_yields_framing_only() {
        let text = builtin(&[]).unwrap();
        assert_eq!(text, format!("{PROLOGUE}{EPILOGUE}"));
    }

    #[test]
    fn test_exact_framing() {
        let text = builtin(&[(ids::SSH_NO_EXP, AnswerValue::Boolean(true))]).unwrap();
        assert_eq!(
            text,
            "#iptables firewall implementation\n\
             *filter\n\
             :INPUT DROP [0:0]\n\
             :FORWARD ACCEPT [0:0]\n\
             :OUTPUT ACCEPT [0:0]\n\
             -A INPUT -i lo -j ACCEPT\n\
             -A INPUT -p tcp -m tcp --dport 22 -m conntrack --ctstate NEW -j ACCEPT\n\
             -A INPUT -m conntrack --ctstate RELATED,ESTABLISHED -j ACCEPT\n\
             \n\
             COMMIT"
        );
    }

    #[test]
    fn test_experienced_services_selection() {
        let text = builtin(&[
            (ids::EXPERIENCED, AnswerValue::Boolean(true)),
            (ids::SERVICES_EXP, AnswerValue::Boolean(true)),
            (ids::SERVER_EXP, AnswerValue::IntList(vec![1, 4])),
            (ids::SSH_EXP, AnswerValue::Boolean(true)),
            (ids::HTTPS_EXP, AnswerValue::Boolean(true)),
            (ids::BLOCKED_IPS, AnswerValue::AddressList(vec![])),
        ])
        .unwrap();

        let ssh = text.find("--dport 22 ").unwrap();
        let https = text.find("--dport 443 ").unwrap();
        let loopback = text.find("-i lo -j ACCEPT").unwrap();
        let established = text.find("RELATED,ESTABLISHED").unwrap();
        assert!(loopback < ssh && ssh < https && https < established);
        assert!(!text.contains("--dport 80 "));
        assert!(!text.contains("--dport 21 "));
        assert!(!text.contains("--dport 20 "));
    }

    #[test]
    fn test_selection_alone_activates_children() {
        let text = builtin(&[(ids::SERVER_EXP, AnswerValue::IntList(vec![3]))]).unwrap();
        assert!(text.contains("--dport 80 -j ACCEPT"));
        assert!(!text.contains("--dport 443"));
    }

    #[test]
    fn test_zero_selection_activates_nothing() {
        let text = builtin(&[(ids::SERVER_EXP, AnswerValue::IntList(vec![0]))]).unwrap();
        assert_eq!(text, format!("{PROLOGUE}{EPILOGUE}"));
    }

    #[test]
    fn test_out_of_range_selection() {
        let err = builtin(&[(ids::SERVER_EXP, AnswerValue::IntList(vec![5]))]).unwrap_err();
        assert!(matches!(err, Error::InvalidSelection { option: 5, .. }));
    }

    #[test]
    fn test_composite_parent_never_emits_a_line() {
        let text = builtin(&[(ids::SERVER_EXP, AnswerValue::IntList(vec![]))]).unwrap();
        assert_eq!(text, format!("{PROLOGUE}{EPILOGUE}"));

        let doc = assemble(
            Registry::builtin(),
            &[(ids::SERVER_EXP, AnswerValue::IntList(vec![1, 2, 3, 4]))]
                .into_iter()
                .collect(),
        )
        .unwrap();
        assert!(doc.bodies().iter().all(|body| body.id != ids::SERVER_EXP));
    }

    #[test]
    fn test_ftp_child_has_no_rule_of_its_own() {
        let doc = assemble(
            Registry::builtin(),
            &[
                (ids::SERVER_EXP, AnswerValue::IntList(vec![2])),
                (ids::FTP_EXP, AnswerValue::Boolean(true)),
            ]
            .into_iter()
            .collect(),
        )
        .unwrap();
        assert!(doc.bodies().is_empty());
    }

    #[test]
    fn test_ftp_addresses_expand_in_input_order() {
        let doc = assemble(
            Registry::builtin(),
            &[(
                ids::FTP_IPS,
                AnswerValue::AddressList(vec!["10.0.0.1".into(), "10.0.0.2".into()]),
            )]
            .into_iter()
            .collect(),
        )
        .unwrap();

        let body = &doc.bodies()[0];
        let lines: Vec<_> = body.text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "-A INPUT -s 10.0.0.1 -p tcp -m tcp --dport 20 -j ACCEPT",
                "-A INPUT -s 10.0.0.1 -p tcp -m tcp --dport 21 -j ACCEPT",
                "-A INPUT -s 10.0.0.2 -p tcp -m tcp --dport 20 -j ACCEPT",
                "-A INPUT -s 10.0.0.2 -p tcp -m tcp --dport 21 -j ACCEPT",
            ]
        );
    }

    #[test]
    fn test_malformed_address_rejected() {
        let err = builtin(&[(
            ids::BLOCKED_IPS,
            AnswerValue::AddressList(vec!["10.0.0.1".into(), "999.999.999.999".into()]),
        )])
        .unwrap_err();
        match err {
            Error::MalformedAddress { id, value } => {
                assert_eq!(id, ids::BLOCKED_IPS);
                assert_eq!(value, "999.999.999.999");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_answer_id_rejected() {
        let err = builtin(&[("telnet_exp", AnswerValue::Boolean(true))]).unwrap_err();
        assert!(matches!(err, Error::UnknownQuestionId(_)));
    }

    #[test]
    fn test_false_and_cancelled_are_skipped() {
        let text = builtin(&[
            (ids::PUBLIC_NO_EXP, AnswerValue::Boolean(false)),
            (ids::SSH_NO_EXP, AnswerValue::Cancelled),
        ])
        .unwrap();
        assert_eq!(text, format!("{PROLOGUE}{EPILOGUE}"));
    }

    #[test]
    fn test_boolean_on_address_question_is_not_affirmative() {
        let text = builtin(&[(ids::BLOCKED_IPS, AnswerValue::Boolean(true))]).unwrap();
        assert_eq!(text, format!("{PROLOGUE}{EPILOGUE}"));
    }

    #[test]
    fn test_equal_priorities_keep_declaration_order() {
        let registry = Registry::new(vec![
            QuestionSpec::yes_no("late", "Late?")
                .with_priority(9)
                .with_rule(&["-A INPUT -j LATE"]),
            QuestionSpec::yes_no("tie_b", "B?")
                .with_priority(3)
                .with_rule(&["-A INPUT -j B"]),
            QuestionSpec::yes_no("tie_a", "A?")
                .with_priority(3)
                .with_rule(&["-A INPUT -j A"]),
        ])
        .unwrap();
        let answers: AnswersMap = ["late", "tie_a", "tie_b"]
            .into_iter()
            .map(|id| (id, AnswerValue::Boolean(true)))
            .collect();

        let doc = assemble(&registry, &answers).unwrap();
        let order: Vec<_> = doc.bodies().iter().map(|body| body.id).collect();
        assert_eq!(order, vec!["tie_b", "tie_a", "late"]);
    }

    #[test]
    fn test_only_eligible_questions_emit_bodies() {
        let registry = Registry::new(vec![
            QuestionSpec::yes_no("no_priority", "?").with_rule(&["-A INPUT -j NOPRIO"]),
            QuestionSpec::yes_no("no_rule", "?").with_priority(1),
            QuestionSpec::composite("parent", "?", &["child"])
                .with_priority(1)
                .with_rule(&["-A INPUT -j PARENT"]),
            QuestionSpec::yes_no("child", "?")
                .with_priority(2)
                .with_rule(&["-A INPUT -j CHILD"]),
        ])
        .unwrap();
        let answers: AnswersMap = [
            ("no_priority", AnswerValue::Boolean(true)),
            ("no_rule", AnswerValue::Boolean(true)),
            ("parent", AnswerValue::IntList(vec![1])),
        ]
        .into_iter()
        .collect();

        let doc = assemble(&registry, &answers).unwrap();
        let emitted: Vec<_> = doc.bodies().iter().map(|body| body.id).collect();
        assert_eq!(emitted, registry.eligible_ids().collect::<Vec<_>>());
        assert_eq!(emitted, vec!["child"]);
        assert_eq!(doc.bodies()[0].declaration, 3);
    }

    #[test]
    fn test_registry_is_not_mutated() {
        let before = Registry::builtin().lookup(ids::BLOCKED_IPS).unwrap().template;
        builtin(&[(
            ids::BLOCKED_IPS,
            AnswerValue::AddressList(vec!["192.0.2.7".into()]),
        )])
        .unwrap();
        let after = Registry::builtin().lookup(ids::BLOCKED_IPS).unwrap().template;
        assert_eq!(before, after);
    }
}
