//! Classified results produced by workers

use crate::error::FetchError;
use serde::Serialize;
use std::fmt;

/// What a credential is checked as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CredentialKind {
    Password,
    Email,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Password => write!(f, "Password"),
            CredentialKind::Email => write!(f, "Email"),
        }
    }
}

/// Input category an item was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Passwords,
    Emails,
    /// Items checked both as a password and as an email
    Both,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Emails, Category::Passwords, Category::Both];

    /// Input file name for the category
    pub fn file_name(self) -> &'static str {
        match self {
            Category::Passwords => "passwords.txt",
            Category::Emails => "emails.txt",
            Category::Both => "both.txt",
        }
    }

    /// Checks launched per item of this category
    pub fn checks(self) -> &'static [CredentialKind] {
        match self {
            Category::Passwords => &[CredentialKind::Password],
            Category::Emails => &[CredentialKind::Email],
            Category::Both => &[CredentialKind::Email, CredentialKind::Password],
        }
    }
}

/// Why a request produced no classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    Transport(String),
    Status(u16),
    Read(String),
}

/// Coarse outcome used as the routing key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeKind {
    Clean,
    Compromised,
    Breached,
    Failure,
}

/// Terminal result of exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedResult {
    Clean(String),
    Compromised(String),
    BreachedEmail(String),
    RequestFailure {
        kind: CredentialKind,
        item: String,
        cause: FailureCause,
    },
    /// The proxied client could not be constructed
    SetupFailure {
        kind: CredentialKind,
        item: String,
        reason: String,
    },
}

impl ClassifiedResult {
    /// Map a fetch error onto the matching failure variant
    pub fn from_fetch_error(kind: CredentialKind, item: &str, error: FetchError) -> Self {
        let item = item.to_string();
        match error {
            FetchError::Setup(reason) => ClassifiedResult::SetupFailure { kind, item, reason },
            FetchError::Transport(e) => ClassifiedResult::RequestFailure {
                kind,
                item,
                cause: FailureCause::Transport(e),
            },
            FetchError::Read(e) => ClassifiedResult::RequestFailure {
                kind,
                item,
                cause: FailureCause::Read(e),
            },
        }
    }

    pub fn status_failure(kind: CredentialKind, item: &str, status: u16) -> Self {
        ClassifiedResult::RequestFailure {
            kind,
            item: item.to_string(),
            cause: FailureCause::Status(status),
        }
    }

    pub fn outcome(&self) -> OutcomeKind {
        match self {
            ClassifiedResult::Clean(_) => OutcomeKind::Clean,
            ClassifiedResult::Compromised(_) => OutcomeKind::Compromised,
            ClassifiedResult::BreachedEmail(_) => OutcomeKind::Breached,
            ClassifiedResult::RequestFailure { .. } | ClassifiedResult::SetupFailure { .. } => {
                OutcomeKind::Failure
            }
        }
    }

    /// Line written to the output sink
    pub fn to_line(&self) -> String {
        match self {
            ClassifiedResult::Clean(password) | ClassifiedResult::Compromised(password) => {
                password.clone()
            }
            ClassifiedResult::BreachedEmail(email) => format!("{} : Compromis", email),
            ClassifiedResult::RequestFailure { kind, item, cause } => match cause {
                FailureCause::Status(code) => format!("{}: {}, Status: {}", kind, item, code),
                FailureCause::Transport(e) | FailureCause::Read(e) => {
                    format!("{}: {}, Error: {}", kind, item, e)
                }
            },
            ClassifiedResult::SetupFailure { kind, item, reason } => {
                format!("{}: {}, Error: {}", kind, item, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_lines() {
        assert_eq!(ClassifiedResult::Clean("abc".into()).to_line(), "abc");
        assert_eq!(ClassifiedResult::Compromised("abc".into()).to_line(), "abc");
        assert_eq!(
            ClassifiedResult::BreachedEmail("a@b.c".into()).to_line(),
            "a@b.c : Compromis"
        );
    }

    #[test]
    fn test_failure_lines() {
        let status = ClassifiedResult::status_failure(CredentialKind::Password, "abc", 429);
        assert_eq!(status.to_line(), "Password: abc, Status: 429");

        let transport = ClassifiedResult::from_fetch_error(
            CredentialKind::Email,
            "a@b.c",
            FetchError::Transport("connection refused".into()),
        );
        assert_eq!(transport.to_line(), "Email: a@b.c, Error: connection refused");

        let setup = ClassifiedResult::from_fetch_error(
            CredentialKind::Password,
            "abc",
            FetchError::Setup("bad proxy".into()),
        );
        assert!(matches!(setup, ClassifiedResult::SetupFailure { .. }));
        assert_eq!(setup.to_line(), "Password: abc, Error: bad proxy");
    }

    #[test]
    fn test_outcome_kinds() {
        assert_eq!(ClassifiedResult::Clean("a".into()).outcome(), OutcomeKind::Clean);
        assert_eq!(
            ClassifiedResult::Compromised("a".into()).outcome(),
            OutcomeKind::Compromised
        );
        assert_eq!(
            ClassifiedResult::BreachedEmail("a".into()).outcome(),
            OutcomeKind::Breached
        );
        assert_eq!(
            ClassifiedResult::status_failure(CredentialKind::Email, "a", 500).outcome(),
            OutcomeKind::Failure
        );
    }

    #[test]
    fn test_category_checks() {
        assert_eq!(Category::Passwords.checks(), &[CredentialKind::Password]);
        assert_eq!(Category::Emails.checks(), &[CredentialKind::Email]);
        assert_eq!(Category::Both.checks().len(), 2);
        assert_eq!(Category::Both.file_name(), "both.txt");
    }
}
