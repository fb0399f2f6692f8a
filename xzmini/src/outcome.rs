//! Classification of engine statuses.

use crate::config::CheckPolicy;
use xzmini_core::error::XzError;
use xzmini_core::traits::{DecodeStatus, DecodeWarning};

/// What the driver does after a step.
#[derive(Debug)]
pub enum Outcome {
    /// Keep stepping.
    Continue,
    /// Surface the warning, then keep stepping.
    Warn(DecodeWarning),
    /// Decoding finished successfully.
    Done,
    /// Decoding failed.
    Fail(XzError),
}

/// Map an engine status to the driver's next move.
pub fn classify(status: DecodeStatus, policy: CheckPolicy) -> Outcome {
    match status {
        DecodeStatus::Progress => Outcome::Continue,
        DecodeStatus::Warning(warning) => match (warning, policy) {
            (_, CheckPolicy::Warn) => Outcome::Warn(warning),
            (DecodeWarning::UnsupportedCheck(check), CheckPolicy::Reject) => {
                Outcome::Fail(XzError::UnverifiedCheck { check })
            }
        },
        DecodeStatus::StreamEnd => Outcome::Done,
        DecodeStatus::Fatal(fault) => Outcome::Fail(fault.into()),
    }
}
