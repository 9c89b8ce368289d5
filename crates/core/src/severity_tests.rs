// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    critical_low_edge = { 9.0, SeverityLevel::Critical },
    critical_top = { 10.0, SeverityLevel::Critical },
    high_low_edge = { 7.0, SeverityLevel::High },
    high_below_critical = { 8.9, SeverityLevel::High },
    medium_low_edge = { 4.0, SeverityLevel::Medium },
    medium_below_high = { 6.9, SeverityLevel::Medium },
    low_smallest = { 0.1, SeverityLevel::Low },
    low_below_medium = { 3.9, SeverityLevel::Low },
    log_sentinel = { SEVERITY_LOG, SeverityLevel::Log },
    fp_sentinel = { SEVERITY_FP, SeverityLevel::FalsePositive },
    error_sentinel = { SEVERITY_ERROR, SeverityLevel::Error },
)]
fn severity_bands(severity: f64, expected: SeverityLevel) {
    assert_eq!(severity_to_level(severity), Some(expected));
}

#[parameterized(
    above_scale = { 10.1 },
    far_above = { 99.0 },
    unknown_negative = { -2.0 },
    below_error = { -4.0 },
)]
fn out_of_domain_yields_no_level(severity: f64) {
    assert_eq!(severity_to_level(severity), None);
}

#[test]
fn cvss_example_is_high() {
    assert_eq!(severity_to_level(7.5), Some(SeverityLevel::High));
}

#[test]
fn level_display() {
    assert_eq!(SeverityLevel::FalsePositive.to_string(), "False Positive");
    assert_eq!(SeverityLevel::Critical.to_string(), "Critical");
}

#[test]
fn result_types() {
    assert_eq!(result_type(7.5), "Alarm");
    assert_eq!(result_type(SEVERITY_LOG), "Log Message");
    assert_eq!(result_type(SEVERITY_FP), "False Positive");
    assert_eq!(result_type(SEVERITY_ERROR), "Error Message");
}
