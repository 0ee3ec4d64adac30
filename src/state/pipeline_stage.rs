//! Stages of a single pipeline run

use std::fmt;

/// Represents where a pipeline run currently is
///
/// Runs move strictly forward through
/// `NotStarted -> Fetching -> Extracting -> Auditing -> Scoring -> Done`
/// and may drop to `Errored` from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    NotStarted,
    Fetching,
    Extracting,
    Auditing,
    Scoring,
    Done,
    Errored,
}

impl PipelineStage {
    /// The stage that follows this one on the success path
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::Fetching),
            Self::Fetching => Some(Self::Extracting),
            Self::Extracting => Some(Self::Auditing),
            Self::Auditing => Some(Self::Scoring),
            Self::Scoring => Some(Self::Done),
            Self::Done | Self::Errored => None,
        }
    }

    /// Returns true if the run has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        if next == Self::Errored {
            return !self.is_terminal();
        }
        self.next() == Some(next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Auditing => "auditing",
            Self::Scoring => "scoring",
            Self::Done => "done",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
