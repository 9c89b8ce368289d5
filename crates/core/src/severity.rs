// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Severity sentinels and the five-band level classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity recorded for log-only results.
pub const SEVERITY_LOG: f64 = 0.0;
/// Severity recorded for results overridden as false positives.
pub const SEVERITY_FP: f64 = -1.0;
/// Severity recorded for scanner error messages.
pub const SEVERITY_ERROR: f64 = -3.0;
/// Upper bound of the CVSS scale.
pub const SEVERITY_MAX: f64 = 10.0;

/// Classified severity level of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    Critical,
    High,
    Medium,
    Low,
    Log,
    FalsePositive,
    Error,
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SeverityLevel::Critical => "Critical",
            SeverityLevel::High => "High",
            SeverityLevel::Medium => "Medium",
            SeverityLevel::Low => "Low",
            SeverityLevel::Log => "Log",
            SeverityLevel::FalsePositive => "False Positive",
            SeverityLevel::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Map a severity score to its level.
///
/// Sentinels match exactly; positive scores fall into the bands
/// `[9,10] Critical`, `[7,9) High`, `[4,7) Medium`, `(0,4) Low`. Any other
/// value is out of domain: a warning is logged and no level is returned.
pub fn severity_to_level(severity: f64) -> Option<SeverityLevel> {
    if severity == SEVERITY_LOG {
        return Some(SeverityLevel::Log);
    }
    if severity == SEVERITY_FP {
        return Some(SeverityLevel::FalsePositive);
    }
    if severity == SEVERITY_ERROR {
        return Some(SeverityLevel::Error);
    }
    if severity > 0.0 && severity <= SEVERITY_MAX {
        return Some(if severity >= 9.0 {
            SeverityLevel::Critical
        } else if severity >= 7.0 {
            SeverityLevel::High
        } else if severity >= 4.0 {
            SeverityLevel::Medium
        } else {
            SeverityLevel::Low
        });
    }
    tracing::warn!(severity, "severity out of range, no level assigned");
    None
}

/// Result type derived from a severity score, as shown to clients.
pub fn result_type(severity: f64) -> &'static str {
    if severity == SEVERITY_LOG {
        "Log Message"
    } else if severity == SEVERITY_FP {
        "False Positive"
    } else if severity == SEVERITY_ERROR {
        "Error Message"
    } else {
        "Alarm"
    }
}

#[cfg(test)]
#[path = "severity_tests.rs"]
mod tests;
