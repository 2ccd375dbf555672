//! Interactive answer collection
//!
//! The [`Wizard`] asks the registry's questions over any line-based reader and
//! writer, re-prompting until each response is well formed. A `cancel`
//! response (or end of input) aborts the whole run with
//! [`Collection::Cancelled`]; nothing is assembled or written in that case.
//!
//! When answers from an earlier run are supplied with
//! [`Wizard::with_previous`], each question shows its previous answer and
//! yes/no questions keep it when the user just presses Enter.

use crate::core::answers::{AnswerValue, AnswersMap};
use crate::core::error::Result;
use crate::core::registry::{Registry, ids};
use crate::validators::{
    YesNo, check_reserved_address, is_cancel, parse_selection, parse_yes_no, validate_address,
};
use std::io::{BufRead, Write};

/// Outcome of a wizard run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    Completed(AnswersMap),
    Cancelled,
}

pub struct Wizard<'r, R, W> {
    registry: &'r Registry,
    input: R,
    output: W,
    previous: AnswersMap,
}

impl<'r, R: BufRead, W: Write> Wizard<'r, R, W> {
    pub fn new(registry: &'r Registry, input: R, output: W) -> Self {
        Self {
            registry,
            input,
            output,
            previous: AnswersMap::new(),
        }
    }

    /// Shows `previous` answers alongside each question.
    pub fn with_previous(mut self, previous: AnswersMap) -> Self {
        self.previous = previous;
        self
    }

    /// Runs the full question flow.
    pub fn run(&mut self) -> Result<Collection> {
        writeln!(self.output, "****** Welcome to FireWALL-E ******")?;
        writeln!(
            self.output,
            "Unless instructed otherwise, answer the questions with 'yes'/'y', or 'no'/'n'"
        )?;
        writeln!(self.output, "You can also cancel with 'cancel' or 'c'")?;
        writeln!(self.output, "---------------\n")?;

        let mut answers = AnswersMap::new();
        let collected = self.collect(&mut answers)?;

        if collected {
            tracing::debug!(answers = answers.len(), "collection completed");
            Ok(Collection::Completed(answers))
        } else {
            tracing::info!("collection cancelled by user");
            Ok(Collection::Cancelled)
        }
    }

    /// Fills `answers`; returns false when the user cancelled.
    fn collect(&mut self, answers: &mut AnswersMap) -> Result<bool> {
        let Some(experienced) = self.ask_yes_no(ids::EXPERIENCED)? else {
            return Ok(false);
        };
        answers.insert(ids::EXPERIENCED, AnswerValue::Boolean(experienced));

        if !experienced {
            for id in [
                ids::PUBLIC_NO_EXP,
                ids::SERVER_NO_EXP,
                ids::WEBSERVER_NO_EXP,
                ids::SSH_NO_EXP,
            ] {
                let Some(answer) = self.ask_yes_no(id)? else {
                    return Ok(false);
                };
                answers.insert(id, AnswerValue::Boolean(answer));
            }
            return Ok(true);
        }

        let Some(hosts_services) = self.ask_yes_no(ids::SERVICES_EXP)? else {
            return Ok(false);
        };
        answers.insert(ids::SERVICES_EXP, AnswerValue::Boolean(hosts_services));

        if hosts_services {
            let Some(selection) = self.ask_selection(ids::SERVER_EXP)? else {
                return Ok(false);
            };
            let sub_ids = self.registry.lookup(ids::SERVER_EXP)?.sub_ids();
            for &option in &selection {
                if let Some(child) = option.checked_sub(1).and_then(|i| sub_ids.get(i as usize)) {
                    answers.insert(*child, AnswerValue::Boolean(true));
                }
            }
            answers.insert(ids::SERVER_EXP, AnswerValue::IntList(selection));

            if answers.is_true(ids::FTP_EXP) {
                let Some(addresses) = self.ask_addresses(ids::FTP_IPS)? else {
                    return Ok(false);
                };
                answers.insert(ids::FTP_IPS, AnswerValue::AddressList(addresses));
            }
        }

        let Some(addresses) = self.ask_addresses(ids::BLOCKED_IPS)? else {
            return Ok(false);
        };
        answers.insert(ids::BLOCKED_IPS, AnswerValue::AddressList(addresses));

        Ok(true)
    }

    /// Asks a registry yes/no question. `None` means cancelled.
    pub fn ask_yes_no(&mut self, id: &str) -> Result<Option<bool>> {
        let prompt = self.registry.lookup(id)?.prompt;
        let previous = match self.previous.get(id) {
            Some(AnswerValue::Boolean(b)) => Some(*b),
            _ => None,
        };
        self.prompt_yes_no(prompt, previous)
    }

    /// Asks a free-standing yes/no question. `None` means cancelled.
    pub fn prompt_yes_no(
        &mut self,
        question: &str,
        previous: Option<bool>,
    ) -> Result<Option<bool>> {
        loop {
            writeln!(self.output, "{question}")?;
            if let Some(previous) = previous {
                writeln!(
                    self.output,
                    "Previous answer: {} (press Enter to keep it)",
                    if previous { "yes" } else { "no" }
                )?;
            }

            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.trim().is_empty()
                && let Some(previous) = previous
            {
                return Ok(Some(previous));
            }

            match parse_yes_no(&line) {
                Ok(YesNo::Yes) => return Ok(Some(true)),
                Ok(YesNo::No) => return Ok(Some(false)),
                Ok(YesNo::Cancel) => return Ok(None),
                Err(hint) => writeln!(self.output, "{hint}")?,
            }
        }
    }

    /// Asks a composite multi-choice question. `None` means cancelled.
    pub fn ask_selection(&mut self, id: &str) -> Result<Option<Vec<u32>>> {
        let spec = *self.registry.lookup(id)?;
        let sub_ids = spec.sub_ids();

        let mut menu = String::from(spec.prompt);
        let mut allowed = vec![0];
        for (number, child) in (1u32..).zip(sub_ids) {
            menu.push_str(&format!("\n{number}. {}", self.registry.lookup(child)?.prompt));
            allowed.push(number);
        }

        let previous = self.previous_selection(id, sub_ids)?;

        loop {
            writeln!(self.output, "{menu}")?;
            if !previous.is_empty() {
                writeln!(self.output, "Previous answer: {}", previous.join(", "))?;
            }

            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if is_cancel(&line) {
                return Ok(None);
            }

            match parse_selection(&line, &allowed) {
                Ok(selection) => return Ok(Some(selection)),
                Err(hint) => writeln!(self.output, "{hint}")?,
            }
        }
    }

    /// Names of previously selected options, from either the selection itself
    /// or the per-option booleans older records carry.
    fn previous_selection(&self, id: &str, sub_ids: &[&str]) -> Result<Vec<&'static str>> {
        let mut names = Vec::new();
        for (number, child) in (1u32..).zip(sub_ids) {
            let selected = match self.previous.get(id) {
                Some(AnswerValue::IntList(selection)) => selection.contains(&number),
                _ => self.previous.is_true(child),
            };
            if selected {
                names.push(self.registry.lookup(child)?.prompt);
            }
        }
        Ok(names)
    }

    /// Asks for a list of addresses, one per line, ending with an empty line.
    /// `None` means cancelled.
    pub fn ask_addresses(&mut self, id: &str) -> Result<Option<Vec<String>>> {
        let prompt = self.registry.lookup(id)?.prompt;
        writeln!(self.output, "{prompt}")?;
        if let Some(AnswerValue::AddressList(previous)) = self.previous.get(id)
            && !previous.is_empty()
        {
            writeln!(self.output, "Previous answer: {}", previous.join(", "))?;
        }

        let mut addresses = Vec::new();
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                return Ok(Some(addresses));
            }

            match validate_address(&line) {
                Ok(address) => {
                    if let Some(warning) = check_reserved_address(&address) {
                        writeln!(self.output, "Warning: {warning}")?;
                    }
                    addresses.push(address);
                }
                Err(_) if is_cancel(&line) => return Ok(None),
                Err(_) => writeln!(
                    self.output,
                    "The Ip address isn't valid or isn't in the right format. Please enter it again."
                )?,
            }
        }
    }

    /// Reads one line without its terminator; `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(input: &str) -> (Collection, String) {
        run_with_previous(input, AnswersMap::new())
    }

    fn run_with_previous(input: &str, previous: AnswersMap) -> (Collection, String) {
        let mut output = Vec::new();
        let outcome = Wizard::new(Registry::builtin(), Cursor::new(input), &mut output)
            .with_previous(previous)
            .run()
            .unwrap();
        (outcome, String::from_utf8(output).unwrap())
    }

    fn completed(outcome: Collection) -> AnswersMap {
        match outcome {
            Collection::Completed(answers) => answers,
            Collection::Cancelled => panic!("wizard was cancelled"),
        }
    }

    #[test]
    fn test_beginner_flow() {
        let (outcome, output) = run("n\ny\nn\nyes\nNO\n");
        let answers = completed(outcome);

        assert_eq!(answers.get(ids::EXPERIENCED), Some(&AnswerValue::Boolean(false)));
        assert!(answers.is_true(ids::PUBLIC_NO_EXP));
        assert!(!answers.is_true(ids::SERVER_NO_EXP));
        assert!(answers.is_true(ids::WEBSERVER_NO_EXP));
        assert!(!answers.is_true(ids::SSH_NO_EXP));
        assert!(!answers.contains(ids::SERVICES_EXP));
        assert!(output.contains("Welcome to FireWALL-E"));
    }

    #[test]
    fn test_experienced_flow_with_ftp() {
        let (outcome, _) = run("y\ny\n2 4\n192.0.2.10\n\n203.0.113.5\n\n");
        let answers = completed(outcome);

        assert_eq!(answers.get(ids::SERVER_EXP), Some(&AnswerValue::IntList(vec![2, 4])));
        assert!(answers.is_true(ids::FTP_EXP));
        assert!(answers.is_true(ids::HTTPS_EXP));
        assert!(!answers.contains(ids::SSH_EXP));
        assert_eq!(
            answers.get(ids::FTP_IPS),
            Some(&AnswerValue::AddressList(vec!["192.0.2.10".into()]))
        );
        assert_eq!(
            answers.get(ids::BLOCKED_IPS),
            Some(&AnswerValue::AddressList(vec!["203.0.113.5".into()]))
        );
    }

    #[test]
    fn test_experienced_without_services_skips_selection() {
        let (outcome, output) = run("y\nn\n\n");
        let answers = completed(outcome);

        assert!(!answers.contains(ids::SERVER_EXP));
        assert_eq!(answers.get(ids::BLOCKED_IPS), Some(&AnswerValue::AddressList(vec![])));
        assert!(!output.contains("1. SSH"));
    }

    #[test]
    fn test_ftp_addresses_only_asked_when_ftp_selected() {
        let (outcome, output) = run("y\ny\n1 3\n\n");
        let answers = completed(outcome);
        assert!(!answers.contains(ids::FTP_IPS));
        assert!(!output.contains("FTP server"));
    }

    #[test]
    fn test_invalid_responses_reprompt() {
        let (outcome, output) = run("maybe\nn\ny\ny\ny\ny\n");
        completed(outcome);
        assert!(output.contains(r#"The answer must be of form, "yes""#));
    }

    #[test]
    fn test_invalid_selection_reprompts() {
        let (outcome, output) = run("y\ny\n1 1\n9\nssh\n1\n\n");
        let answers = completed(outcome);
        assert_eq!(answers.get(ids::SERVER_EXP), Some(&AnswerValue::IntList(vec![1])));
        assert_eq!(output.matches("no numbers are repeated").count(), 3);
    }

    #[test]
    fn test_invalid_address_reprompts() {
        let (outcome, output) = run("y\nn\n999.999.999.999\n10.0.0.1\n\n");
        let answers = completed(outcome);
        assert_eq!(
            answers.get(ids::BLOCKED_IPS),
            Some(&AnswerValue::AddressList(vec!["10.0.0.1".into()]))
        );
        assert!(output.contains("isn't valid"));
    }

    #[test]
    fn test_reserved_address_warns_but_is_kept() {
        let (outcome, output) = run("y\nn\n127.0.0.1\n\n");
        let answers = completed(outcome);
        assert!(output.contains("Warning: 127.0.0.1 is a loopback address"));
        assert_eq!(
            answers.get(ids::BLOCKED_IPS),
            Some(&AnswerValue::AddressList(vec!["127.0.0.1".into()]))
        );
    }

    #[test]
    fn test_cancel_at_each_stage() {
        for input in [
            "c\n",
            "n\ncancel\n",
            "y\nc\n",
            "y\ny\nc\n",
            "y\ny\n2\nc\n",
            "y\nn\n10.0.0.1\nC\n",
        ] {
            let (outcome, _) = run(input);
            assert_eq!(outcome, Collection::Cancelled, "input {input:?}");
        }
    }

    #[test]
    fn test_end_of_input_cancels() {
        let (outcome, _) = run("y\ny\n");
        assert_eq!(outcome, Collection::Cancelled);
    }

    #[test]
    fn test_previous_answers_shown_and_kept() {
        let previous: AnswersMap = [
            (ids::EXPERIENCED, AnswerValue::Boolean(true)),
            (ids::SERVICES_EXP, AnswerValue::Boolean(true)),
            (ids::SERVER_EXP, AnswerValue::IntList(vec![1, 4])),
            (ids::BLOCKED_IPS, AnswerValue::AddressList(vec!["198.51.100.1".into()])),
        ]
        .into_iter()
        .collect();

        let (outcome, output) = run_with_previous("\n\n1 4\n198.51.100.1\n\n", previous);
        let answers = completed(outcome);

        assert!(output.contains("Previous answer: yes"));
        assert!(output.contains("Previous answer: SSH, HTTPS"));
        assert!(output.contains("Previous answer: 198.51.100.1"));
        assert!(answers.is_true(ids::EXPERIENCED));
        assert!(answers.is_true(ids::SSH_EXP));
        assert!(answers.is_true(ids::HTTPS_EXP));
    }

    #[test]
    fn test_previous_selection_from_legacy_booleans() {
        let previous: AnswersMap = [
            (ids::HTTP_EXP, AnswerValue::Boolean(true)),
            (ids::FTP_EXP, AnswerValue::Boolean(true)),
        ]
        .into_iter()
        .collect();

        let (_, output) = run_with_previous("y\ny\n\n\n", previous);
        assert!(output.contains("Previous answer: FTP, HTTP"));
    }

    #[test]
    fn test_empty_line_without_previous_reprompts() {
        let mut output = Vec::new();
        let answer = Wizard::new(Registry::builtin(), Cursor::new("\ny\n"), &mut output)
            .prompt_yes_no("Overwrite?", None)
            .unwrap();
        assert_eq!(answer, Some(true));
        assert_eq!(String::from_utf8(output).unwrap().matches("Overwrite?").count(), 2);
    }
}
