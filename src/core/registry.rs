//! Question registry
//!
//! The registry is the static catalog of every question the wizard can ask.
//! Each [`QuestionSpec`] carries an optional ordering priority and the rule
//! text its affirmative answer contributes to the generated rule file.
//!
//! Only *eligible* questions (a priority and a non-empty template) ever reach
//! the rule body. Branch selectors such as [`ids::EXPERIENCED`] and composite
//! parents such as [`ids::SERVER_EXP`] carry neither and exist purely to drive
//! the collection flow.
//!
//! Adding a question means adding a [`QuestionSpec`] here with a fresh
//! priority; the assembler needs no change.

use crate::core::error::{Error, Result};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Placeholder substituted with each collected address in per-address templates
pub const ADDRESS_PLACEHOLDER: &str = "{addr}";

/// Question identifiers of the built-in registry
pub mod ids {
    pub const EXPERIENCED: &str = "experienced";

    pub const PUBLIC_NO_EXP: &str = "public_no_exp";
    pub const SERVER_NO_EXP: &str = "server_no_exp";
    pub const WEBSERVER_NO_EXP: &str = "webserver_no_exp";
    pub const SSH_NO_EXP: &str = "ssh_no_exp";

    pub const SERVICES_EXP: &str = "services_exp";
    pub const SERVER_EXP: &str = "server_exp";
    pub const SSH_EXP: &str = "ssh_exp";
    pub const FTP_EXP: &str = "ftp_exp";
    pub const HTTP_EXP: &str = "http_exp";
    pub const HTTPS_EXP: &str = "https_exp";
    pub const FTP_IPS: &str = "ftp_ips";
    pub const BLOCKED_IPS: &str = "blocked_ips";
}

/// Rule text attached to a question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTemplate {
    /// No rule text; the question only steers the flow
    None,
    /// Lines emitted verbatim when the answer is affirmative
    Fixed(&'static [&'static str]),
    /// Lines repeated once per collected address, with [`ADDRESS_PLACEHOLDER`] substituted
    PerAddress(&'static [&'static str]),
}

impl RuleTemplate {
    pub fn is_empty(&self) -> bool {
        match self {
            RuleTemplate::None => true,
            RuleTemplate::Fixed(lines) | RuleTemplate::PerAddress(lines) => lines.is_empty(),
        }
    }

    /// Expands a per-address template for the given addresses, in input order.
    ///
    /// Fixed templates ignore `addresses`.
    pub fn expand<S: AsRef<str>>(&self, addresses: &[S]) -> String {
        match *self {
            RuleTemplate::None => String::new(),
            RuleTemplate::Fixed(lines) => lines.join("\n"),
            RuleTemplate::PerAddress(lines) => addresses
                .iter()
                .flat_map(move |addr| {
                    lines
                        .iter()
                        .map(move |line| line.replace(ADDRESS_PLACEHOLDER, addr.as_ref()))
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Shape of the answer a question expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Answered with yes/no
    YesNo,
    /// Multi-choice; selecting option `k` (1-based, as displayed) activates `sub_ids[k - 1]`
    Composite { sub_ids: &'static [&'static str] },
    /// Answered with a list of IP addresses
    AddressList,
}

/// One entry in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionSpec {
    pub id: &'static str,
    pub priority: Option<u8>,
    pub prompt: &'static str,
    pub template: RuleTemplate,
    pub kind: QuestionKind,
}

impl QuestionSpec {
    pub const fn yes_no(id: &'static str, prompt: &'static str) -> Self {
        Self {
            id,
            priority: None,
            prompt,
            template: RuleTemplate::None,
            kind: QuestionKind::YesNo,
        }
    }

    pub const fn composite(
        id: &'static str,
        prompt: &'static str,
        sub_ids: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            priority: None,
            prompt,
            template: RuleTemplate::None,
            kind: QuestionKind::Composite { sub_ids },
        }
    }

    pub const fn address_list(id: &'static str, prompt: &'static str) -> Self {
        Self {
            id,
            priority: None,
            prompt,
            template: RuleTemplate::None,
            kind: QuestionKind::AddressList,
        }
    }

    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub const fn with_rule(mut self, lines: &'static [&'static str]) -> Self {
        self.template = RuleTemplate::Fixed(lines);
        self
    }

    pub const fn with_rule_per_address(mut self, lines: &'static [&'static str]) -> Self {
        self.template = RuleTemplate::PerAddress(lines);
        self
    }

    /// Has both a priority and rule text, and is not a composite parent.
    pub fn is_eligible(&self) -> bool {
        self.priority.is_some()
            && !self.template.is_empty()
            && !matches!(self.kind, QuestionKind::Composite { .. })
    }

    pub fn sub_ids(&self) -> &'static [&'static str] {
        match self.kind {
            QuestionKind::Composite { sub_ids } => sub_ids,
            _ => &[],
        }
    }
}

const ICMP_ECHO_LIMITED: &[&str] = &[
    "-A INPUT -p icmp -m icmp --icmp-type 8 -m limit --limit 1/sec --limit-burst 10 -j ACCEPT",
    "-A INPUT -p icmp -m icmp --icmp-type 8 -j DROP",
    "-A INPUT -p icmp -j ACCEPT",
];
const ALLOW_SSH: &[&str] =
    &["-A INPUT -p tcp -m tcp --dport 22 -m conntrack --ctstate NEW -j ACCEPT"];
const ALLOW_HTTP: &[&str] = &["-A INPUT -p tcp -m tcp --dport 80 -j ACCEPT"];
const ALLOW_HTTPS: &[&str] = &["-A INPUT -p tcp -m tcp --dport 443 -j ACCEPT"];

/// Built-in questions in declaration order
pub const BUILTIN_QUESTIONS: &[QuestionSpec] = &[
    QuestionSpec::yes_no(ids::EXPERIENCED, "Are you comfortable with network terminology ?"),
    // no experience questions
    QuestionSpec::yes_no(ids::PUBLIC_NO_EXP, "Are you on a public network?")
        .with_priority(1)
        .with_rule(&["-A OUTPUT -p tcp -m tcp --dport 80 -j DROP"]),
    QuestionSpec::yes_no(
        ids::SERVER_NO_EXP,
        "Should this device be accessible online by other people?",
    )
    .with_priority(2)
    .with_rule(ICMP_ECHO_LIMITED),
    QuestionSpec::yes_no(ids::WEBSERVER_NO_EXP, "Will you host a webserver?")
        .with_priority(3)
        .with_rule(&[
            "-A INPUT -p tcp -m tcp --dport 80 -j ACCEPT",
            "-A INPUT -p tcp -m tcp --dport 443 -j ACCEPT",
        ]),
    QuestionSpec::yes_no(
        ids::SSH_NO_EXP,
        "Do you need to connect to this device from another device?",
    )
    .with_priority(4)
    .with_rule(ALLOW_SSH),
    // experience questions
    QuestionSpec::yes_no(ids::SERVICES_EXP, "Will the device host services?")
        .with_priority(0)
        .with_rule(ICMP_ECHO_LIMITED),
    QuestionSpec::composite(
        ids::SERVER_EXP,
        "Which services will it host ?\n\
         Answer each number separated by a space character if multiple services are hosted\n\
         Enter for nothing",
        &[ids::SSH_EXP, ids::FTP_EXP, ids::HTTP_EXP, ids::HTTPS_EXP],
    ),
    QuestionSpec::yes_no(ids::SSH_EXP, "SSH")
        .with_priority(1)
        .with_rule(ALLOW_SSH),
    // FTP contributes its rules through the per-address ftp_ips entry
    QuestionSpec::yes_no(ids::FTP_EXP, "FTP").with_priority(2),
    QuestionSpec::yes_no(ids::HTTP_EXP, "HTTP")
        .with_priority(3)
        .with_rule(ALLOW_HTTP),
    QuestionSpec::yes_no(ids::HTTPS_EXP, "HTTPS")
        .with_priority(4)
        .with_rule(ALLOW_HTTPS),
    QuestionSpec::address_list(
        ids::FTP_IPS,
        "Which Ip's is your FTP server going to communicate with?\n\
         Enter one address per line, an empty line to finish",
    )
    .with_priority(5)
    .with_rule_per_address(&[
        "-A INPUT -s {addr} -p tcp -m tcp --dport 20 -j ACCEPT",
        "-A INPUT -s {addr} -p tcp -m tcp --dport 21 -j ACCEPT",
    ]),
    QuestionSpec::address_list(
        ids::BLOCKED_IPS,
        "Which Ip's do you wish to block all incoming traffic from?\n\
         Enter one address per line, an empty line to finish",
    )
    .with_priority(6)
    .with_rule_per_address(&["-A INPUT -s {addr} -j DROP"]),
];

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    Registry::new(BUILTIN_QUESTIONS.to_vec()).expect("built-in question ids are unique")
});

/// Read-only catalog of questions, indexed by id
#[derive(Debug, Clone)]
pub struct Registry {
    questions: Vec<QuestionSpec>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    /// Builds a registry, rejecting duplicate ids.
    pub fn new(questions: Vec<QuestionSpec>) -> Result<Self> {
        let mut index = HashMap::with_capacity(questions.len());
        for (position, spec) in questions.iter().enumerate() {
            if index.insert(spec.id, position).is_some() {
                return Err(Error::DuplicateQuestionId(spec.id));
            }
        }
        Ok(Self { questions, index })
    }

    /// The process-wide built-in registry.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn lookup(&self, id: &str) -> Result<&QuestionSpec> {
        self.index
            .get(id)
            .map(|&position| &self.questions[position])
            .ok_or_else(|| Error::UnknownQuestionId(id.to_string()))
    }

    /// Position of `id` in declaration order.
    pub fn declaration_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// All questions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &QuestionSpec> {
        self.questions.iter()
    }

    /// Ids that can contribute a rule body, in declaration order.
    pub fn eligible_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.questions
            .iter()
            .filter(|spec| spec.is_eligible())
            .map(|spec| spec.id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
