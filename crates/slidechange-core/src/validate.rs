use tracing::{info, warn};

use crate::analysis::timing::round_millis;
use crate::error::ValidationError;

/// Parse a pipe-delimited list of proposed times in seconds, e.g. `"1.1|5.0"`.
pub fn parse_proposed_times(input: &str) -> Result<Vec<f64>, ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::NoTimes);
    }

    input
        .split('|')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .ok()
                .filter(|t| t.is_finite())
                .ok_or_else(|| ValidationError::InvalidTime(part.to_string()))
        })
        .collect()
}

/// Detected times that fell inside the window around one proposed time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedMatch {
    pub proposed: f64,
    pub matched: Vec<f64>,
}

impl ProposedMatch {
    pub fn is_matched(&self) -> bool {
        !self.matched.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub tolerance: f64,
    pub matches: Vec<ProposedMatch>,
}

impl ValidationReport {
    /// True when every proposed time matched at least one detected time.
    pub fn passed(&self) -> bool {
        self.matches.iter().all(ProposedMatch::is_matched)
    }
}

/// Match proposed times against detected times.
///
/// A detected time `d` matches a proposed time `t` when
/// `t - tolerance < d < t + tolerance`; the window is open.
pub fn validate(detected: &[f64], proposed: &[f64], tolerance: f64) -> ValidationReport {
    let matches = proposed
        .iter()
        .map(|&t| {
            let (low, high) = (t - tolerance, t + tolerance);
            let matched: Vec<f64> = detected
                .iter()
                .copied()
                .filter(|&d| d > low && d < high)
                .collect();

            for &d in &matched {
                info!(
                    proposed = round_millis(t),
                    detected = round_millis(d),
                    diff = round_millis(t - d),
                    "proposed time matched"
                );
            }
            if matched.is_empty() {
                warn!(proposed = t, tolerance, "no detected time matches proposed time");
            }

            ProposedMatch { proposed: t, matched }
        })
        .collect();

    ValidationReport { tolerance, matches }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn parses_pipe_delimited_times() {
        assert_eq!(parse_proposed_times("1.1|5.0"), Ok(vec![1.1, 5.0]));
        assert_eq!(parse_proposed_times(" 2 | 3.25 "), Ok(vec![2.0, 3.25]));
        assert_eq!(parse_proposed_times("7"), Ok(vec![7.0]));
    }

    #[test]
    fn rejects_bad_times() {
        assert_eq!(parse_proposed_times(""), Err(ValidationError::NoTimes));
        assert_eq!(
            parse_proposed_times("1.0||2.0"),
            Err(ValidationError::InvalidTime(String::new()))
        );
        assert_eq!(
            parse_proposed_times("1.0|abc"),
            Err(ValidationError::InvalidTime("abc".to_string()))
        );
        assert_eq!(
            parse_proposed_times("inf"),
            Err(ValidationError::InvalidTime("inf".to_string()))
        );
    }

    #[test]
    #[traced_test]
    fn one_miss_fails_the_run() {
        let proposed = parse_proposed_times("1.1|5.0").unwrap();
        let report = validate(&[1.0, 2.5], &proposed, 0.25);

        assert_eq!(report.matches[0].matched, vec![1.0]);
        assert!(report.matches[0].is_matched());
        assert!(!report.matches[1].is_matched());
        assert!(!report.passed());
        assert!(logs_contain("no detected time matches proposed time"));
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let report = validate(&[1.25], &[1.0], 0.25);
        assert!(report.matches[0].matched.is_empty());
        assert!(!report.passed());

        let report = validate(&[0.75], &[1.0], 0.25);
        assert!(!report.passed());
    }

    #[test]
    fn reports_every_match_in_window() {
        let report = validate(&[0.9, 1.0, 1.2, 3.0], &[1.0, 3.1], 0.25);
        assert_eq!(report.matches[0].matched, vec![0.9, 1.0, 1.2]);
        assert_eq!(report.matches[1].matched, vec![3.0]);
        assert!(report.passed());
    }

    #[test]
    fn no_detections_fail_every_proposed_time() {
        let report = validate(&[], &[1.0, 2.0], 0.5);
        assert!(report.matches.iter().all(|m| !m.is_matched()));
        assert!(!report.passed());
    }
}
