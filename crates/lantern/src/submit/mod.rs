//! Phased submission: the build → prove → submit sequence, driven to a
//! terminal outcome under the retry controller with status callbacks.

pub(crate) mod orchestrator;
pub(crate) mod phases;

pub use orchestrator::{
    NoopObserver, ObserverPair, Orchestrator, SubmissionState, SubmitObserver, SubmitOutcome,
    SubmitPhase,
};
pub use phases::{Submission, SubmissionFns};
