use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalStatus {
    Open,
    InDevelopment,
    CodeReview,
    InTest,
    Close,
}

impl CanonicalStatus {
    pub const ALL: [CanonicalStatus; 5] = [
        CanonicalStatus::Open,
        CanonicalStatus::InDevelopment,
        CanonicalStatus::CodeReview,
        CanonicalStatus::InTest,
        CanonicalStatus::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Open => "open",
            CanonicalStatus::InDevelopment => "in development",
            CanonicalStatus::CodeReview => "code review",
            CanonicalStatus::InTest => "in test",
            CanonicalStatus::Close => "close",
        }
    }

    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            CanonicalStatus::Open => &["reopen", "start over", "reset"],
            CanonicalStatus::InDevelopment => &[
                "dev",
                "developing",
                "start dev",
                "kickoff",
                "start working",
                "begin work",
            ],
            CanonicalStatus::CodeReview => &[
                "review",
                "send for review",
                "ready for review",
                "submit for review",
            ],
            CanonicalStatus::InTest => &["qa", "testing", "verify", "test it", "ready for qa"],
            CanonicalStatus::Close => &[
                "done",
                "complete",
                "finish",
                "resolved",
                "mark as done",
                "close it",
            ],
        }
    }

    fn accepts(&self, phrase: &str) -> bool {
        self.as_str() == phrase || self.synonyms().iter().any(|synonym| *synonym == phrase)
    }
}

/// Result of normalizing a status phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Canonical(CanonicalStatus),
    /// No canonical status matched; holds the trimmed input as given.
    Unrecognized(String),
}

impl Normalized {
    pub fn as_str(&self) -> &str {
        match self {
            Normalized::Canonical(status) => status.as_str(),
            Normalized::Unrecognized(raw) => raw,
        }
    }
}

pub fn normalize(input: &str) -> Normalized {
    let trimmed = input.trim();
    let phrase = trimmed.to_lowercase();
    match CanonicalStatus::ALL
        .into_iter()
        .find(|status| status.accepts(&phrase))
    {
        Some(status) => Normalized::Canonical(status),
        None => {
            warn!(input, "unknown status input received");
            Normalized::Unrecognized(trimmed.to_string())
        }
    }
}
