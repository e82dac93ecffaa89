//! Closed vocabularies shared across the knowledge base.
//!
//! These are the categorizations that are not project-specific: bug and task
//! lifecycles, priorities, board message types, reference relationships, and
//! symbol/call kinds for the code documentation index. Project-specific
//! vocabularies (team roster, code areas) live in the config file instead.
//!
//! Every enum serializes to the same lowercase token in the database, in
//! `--json` output, and on the command line.

use anyhow::bail;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! vocab_enum {
    ($name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
        #[value(rename_all = "snake_case")]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok(Self::$variant),)+
                    other => bail!(
                        "Unknown {}: '{}'. Must be one of: {}",
                        stringify!($name),
                        other,
                        [$($token),+].join(", ")
                    ),
                }
            }
        }
    };
}

vocab_enum!(BugStatus {
    Open => "open",
    InProgress => "in_progress",
    Review => "review",
    Done => "done",
});

vocab_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

vocab_enum!(TaskStatus {
    Pending => "pending",
    InProgress => "in_progress",
    Done => "done",
});

vocab_enum!(MessageType {
    Assignment => "assignment",
    Question => "question",
    Answer => "answer",
    Status => "status",
    Blocker => "blocker",
    Announcement => "announcement",
    ReviewRequest => "review_request",
    Approval => "approval",
    Correction => "correction",
    Bug => "bug",
    Learning => "learning",
    Decision => "decision",
});

impl MessageType {
    /// Target table for auto-routed message types, if any.
    pub fn routes_to(&self) -> Option<&'static str> {
        match self {
            Self::Bug => Some("bugs"),
            Self::Learning => Some("learnings"),
            Self::Decision => Some("decisions"),
            _ => None,
        }
    }
}

vocab_enum!(Relationship {
    RootCause => "root_cause",
    FixLocation => "fix_location",
    Affected => "affected",
    Related => "related",
});

vocab_enum!(ChangeType {
    Modified => "modified",
    Added => "added",
    Removed => "removed",
    Refactored => "refactored",
});

vocab_enum!(SymbolType {
    File => "file",
    Function => "function",
    Component => "component",
    Hook => "hook",
    Class => "class",
    Interface => "interface",
    Type => "type",
    Constant => "constant",
    Export => "export",
    Variable => "variable",
});

vocab_enum!(CallType {
    Direct => "direct",
    Hook => "hook",
    Method => "method",
    Callback => "callback",
    Import => "import",
    Internal => "internal",
});

vocab_enum!(DocCategory {
    Coordination => "coordination",
    Area => "area",
    Spec => "spec",
    Project => "project",
});

vocab_enum!(BlockType {
    Content => "content",
    Prompt => "prompt",
    Tool => "tool",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_tokens() {
        for status in BugStatus::all() {
            assert_eq!(&<BugStatus as FromStr>::from_str(status.as_str()).unwrap(), status);
        }
        for mt in MessageType::all() {
            assert_eq!(&<MessageType as FromStr>::from_str(mt.as_str()).unwrap(), mt);
        }
    }

    #[test]
    fn test_snake_case_tokens() {
        assert_eq!(BugStatus::InProgress.as_str(), "in_progress");
        assert_eq!(MessageType::ReviewRequest.as_str(), "review_request");
        assert_eq!(Relationship::FixLocation.as_str(), "fix_location");
    }

    #[test]
    fn test_unknown_token_is_error() {
        assert!(<BugStatus as FromStr>::from_str("wontfix").is_err());
        assert!(<Priority as FromStr>::from_str("urgent").is_err());
    }

    #[test]
    fn test_routing_targets() {
        assert_eq!(MessageType::Bug.routes_to(), Some("bugs"));
        assert_eq!(MessageType::Learning.routes_to(), Some("learnings"));
        assert_eq!(MessageType::Decision.routes_to(), Some("decisions"));
        assert_eq!(MessageType::Status.routes_to(), None);
        assert_eq!(MessageType::Assignment.routes_to(), None);
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&BugStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: BugStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BugStatus::InProgress);
    }
}
