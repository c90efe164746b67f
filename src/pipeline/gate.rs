// file: src/pipeline/gate.rs
// description: pure continuation policy over the current records
// reference: first failing check wins

use crate::config::IntakeConfiguration;
use crate::models::FileRecordSnapshot;
use std::fmt;

/// Why continuation is currently blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateBlock {
    ConditionUnmet,
    ExactCount { required: usize, valid: usize },
    TooFewValid { min: usize, valid: usize },
    TooManyValid { max: usize, valid: usize },
    StillValidating { pending: usize },
    NoFiles,
    InvalidFiles { names: Vec<String> },
}

impl fmt::Display for GateBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateBlock::ConditionUnmet => write!(f, "Continuation condition not met"),
            GateBlock::ExactCount { required, valid } => write!(
                f,
                "Exactly {} valid file(s) required ({} valid)",
                required, valid
            ),
            GateBlock::TooFewValid { min, valid } => write!(
                f,
                "At least {} valid file(s) required ({} valid)",
                min, valid
            ),
            GateBlock::TooManyValid { max, valid } => write!(
                f,
                "At most {} valid file(s) allowed ({} valid)",
                max, valid
            ),
            GateBlock::StillValidating { pending } => {
                write!(f, "Waiting for {} file(s) to finish validating", pending)
            }
            GateBlock::NoFiles => write!(f, "No files added"),
            GateBlock::InvalidFiles { names } => {
                write!(f, "Remove or retry invalid file(s): {}", names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateVerdict {
    pub allowed: bool,
    pub reason: Option<GateBlock>,
}

impl GateVerdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn block(reason: GateBlock) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    pub fn reason_text(&self) -> Option<String> {
        self.reason.as_ref().map(ToString::to_string)
    }
}

pub fn can_continue(records: &[FileRecordSnapshot], config: &IntakeConfiguration) -> GateVerdict {
    if let Some(condition) = &config.continue_condition {
        return if condition.evaluate(records) {
            GateVerdict::allow()
        } else {
            GateVerdict::block(GateBlock::ConditionUnmet)
        };
    }

    let valid = records.iter().filter(|r| r.is_valid()).count();
    let requirement = &config.requirement;

    if let Some(required) = requirement.exact
        && valid != required
    {
        return GateVerdict::block(GateBlock::ExactCount { required, valid });
    }
    if valid < requirement.min {
        return GateVerdict::block(GateBlock::TooFewValid {
            min: requirement.min,
            valid,
        });
    }
    if let Some(max) = requirement.max
        && valid > max
    {
        return GateVerdict::block(GateBlock::TooManyValid { max, valid });
    }

    let pending = records.iter().filter(|r| r.is_validating()).count();
    if pending > 0 {
        return GateVerdict::block(GateBlock::StillValidating { pending });
    }

    if records.is_empty() {
        return GateVerdict::block(GateBlock::NoFiles);
    }

    if config.accept_invalid_files || !config.require_all_valid {
        return GateVerdict::allow();
    }

    let names: Vec<String> = records
        .iter()
        .filter(|r| r.is_invalid())
        .map(|r| r.name().to_string())
        .collect();

    if names.is_empty() {
        GateVerdict::allow()
    } else {
        GateVerdict::block(GateBlock::InvalidFiles { names })
    }
}
