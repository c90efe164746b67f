// file: src/models/notice.rs
// description: transient admission notices surfaced next to the drop zone

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeNotice {
    pub severity: NoticeSeverity,
    pub message: String,
}

impl IntakeNotice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            message: message.into(),
        }
    }

    pub fn capacity_exceeded(capacity: usize) -> Self {
        Self::warning(format!("Maximum {} files allowed", capacity))
    }

    pub fn partial_admission(admitted: usize, capacity: usize) -> Self {
        Self::warning(format!("Only {} files added ({} max)", admitted, capacity))
    }

    pub fn oversized(names: &[String], max_bytes: u64) -> Self {
        Self::error(format!(
            "{} exceeds the {} limit",
            names.join(", "),
            format_limit(max_bytes)
        ))
    }

    /// Joins two notices raised by the same admission; the more severe tag wins.
    pub fn combine(self, other: IntakeNotice) -> Self {
        let severity = if self.severity.rank() >= other.severity.rank() {
            self.severity
        } else {
            other.severity
        };
        Self {
            severity,
            message: format!("{}. {}", self.message, other.message),
        }
    }
}

impl NoticeSeverity {
    fn rank(self) -> u8 {
        match self {
            NoticeSeverity::Info => 0,
            NoticeSeverity::Warning => 1,
            NoticeSeverity::Error => 2,
        }
    }
}

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

fn format_limit(bytes: u64) -> String {
    let (unit, divisor) = match bytes {
        b if b >= MIB => ("MB", MIB),
        b if b >= KIB => ("KB", KIB),
        _ => return format!("{} bytes", bytes),
    };
    if bytes % divisor == 0 {
        format!("{} {}", bytes / divisor, unit)
    } else {
        format!("{:.1} {}", bytes as f64 / divisor as f64, unit)
    }
}

impl fmt::Display for IntakeNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
