//! Transaction sequencing and submission.

mod sequence;
mod submitter;

pub use sequence::{SequenceManager, SequenceState};
pub use submitter::{Submitter, DEFAULT_MAX_OPS_PER_TX};
