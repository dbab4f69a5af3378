/// Job state definitions for tracking a site crawl
///
/// This module defines every state a site crawl job passes through and the
/// transitions allowed between them.
use crate::crawler::OutcomeStatus;
use std::fmt;

/// Represents the current state of a site crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    // ===== Setup =====
    /// Job constructed but not started
    Idle,

    /// Binding the extraction contract and fetch settings
    Initializing,

    // ===== Page Cycle =====
    /// Pacing delay and navigation to the current URL
    Fetching,

    /// Waiting for the site's ready selector to appear
    WaitingForContent,

    /// Running the extraction contract on the rendered page
    Extracting,

    /// Probing for a next page
    DecidingPagination,

    /// No more pages to visit
    Done,

    // ===== Terminal =====
    /// Outcome produced
    Terminated(OutcomeStatus),
}

impl JobState {
    /// Returns true once the job has produced its outcome
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    /// Returns true while a page is being processed
    pub fn is_page_cycle(&self) -> bool {
        matches!(
            self,
            Self::Fetching | Self::WaitingForContent | Self::Extracting | Self::DecidingPagination
        )
    }

    /// Checks whether the job may move from `self` to `next`
    ///
    /// Failures inside the page cycle go back to `Fetching` (retry or next
    /// queued page) or to `Done` (retries exhausted, nothing queued, or the
    /// run was cancelled). A job cancelled before its first page goes from
    /// `Initializing` straight to `Done`.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;

        match (self, next) {
            (Idle, Initializing) => true,
            (Initializing, Fetching) => true,
            (Initializing, Done) => true,
            (Initializing, Terminated(OutcomeStatus::Error)) => true,
            (Fetching, WaitingForContent) => true,
            (WaitingForContent, Extracting) => true,
            (Extracting, DecidingPagination) => true,
            (DecidingPagination, Fetching) => true,
            (Fetching | WaitingForContent | Extracting, Fetching) => true,
            (Fetching | WaitingForContent | Extracting | DecidingPagination, Done) => true,
            (Done, Terminated(_)) => true,
            _ => false,
        }
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Fetching => "fetching",
            Self::WaitingForContent => "waiting_for_content",
            Self::Extracting => "extracting",
            Self::DecidingPagination => "deciding_pagination",
            Self::Done => "done",
            Self::Terminated(OutcomeStatus::Success) => "terminated_success",
            Self::Terminated(OutcomeStatus::Error) => "terminated_error",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!JobState::Idle.is_terminal());
        assert!(!JobState::Fetching.is_terminal());
        assert!(!JobState::Done.is_terminal());

        assert!(JobState::Terminated(OutcomeStatus::Success).is_terminal());
        assert!(JobState::Terminated(OutcomeStatus::Error).is_terminal());
    }

    #[test]
    fn test_is_page_cycle() {
        assert!(JobState::Fetching.is_page_cycle());
        assert!(JobState::WaitingForContent.is_page_cycle());
        assert!(JobState::Extracting.is_page_cycle());
        assert!(JobState::DecidingPagination.is_page_cycle());

        assert!(!JobState::Initializing.is_page_cycle());
        assert!(!JobState::Done.is_page_cycle());
    }

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            JobState::Idle,
            JobState::Initializing,
            JobState::Fetching,
            JobState::WaitingForContent,
            JobState::Extracting,
            JobState::DecidingPagination,
            JobState::Fetching,
            JobState::WaitingForContent,
            JobState::Extracting,
            JobState::DecidingPagination,
            JobState::Done,
            JobState::Terminated(OutcomeStatus::Success),
        ];

        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_retry_transitions() {
        assert!(JobState::Fetching.can_transition_to(JobState::Fetching));
        assert!(JobState::WaitingForContent.can_transition_to(JobState::Fetching));
        assert!(JobState::Extracting.can_transition_to(JobState::Fetching));
        assert!(JobState::WaitingForContent.can_transition_to(JobState::Done));
    }

    #[test]
    fn test_cancelled_before_first_page_reaches_done() {
        assert!(JobState::Initializing.can_transition_to(JobState::Done));
        assert!(JobState::Done.can_transition_to(JobState::Terminated(OutcomeStatus::Error)));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!JobState::Idle.can_transition_to(JobState::Fetching));
        assert!(!JobState::Fetching.can_transition_to(JobState::Extracting));
        assert!(!JobState::Done.can_transition_to(JobState::Fetching));
        assert!(!JobState::Initializing.can_transition_to(JobState::Terminated(
            OutcomeStatus::Success
        )));
        assert!(!JobState::Terminated(OutcomeStatus::Success).can_transition_to(JobState::Idle));
    }

    #[test]
    fn test_display() {
        assert_eq!(JobState::WaitingForContent.to_string(), "waiting_for_content");
        assert_eq!(
            JobState::Terminated(OutcomeStatus::Error).to_string(),
            "terminated_error"
        );
    }
}
