use std::fmt::Write as _;
use std::path::PathBuf;

use slidechange_proto::proto;

use crate::analysis::dedup::StartTimeLabel;
use crate::analysis::diff::DiffRecord;
use crate::analysis::ChangeDetection;
use crate::config::AnalysisConfig;
use crate::validate::ValidationReport;

/// Result of analyzing one video.
#[derive(Debug, Clone)]
pub struct ChangeReport {
    pub source: PathBuf,
    pub config: AnalysisConfig,
    /// Number of analyzed frames.
    pub frame_count: usize,
    /// Diff records for frames `1..frame_count`.
    pub diffs: Vec<DiffRecord>,
    pub detection: ChangeDetection,
    /// Present only when proposed times were supplied.
    pub validation: Option<ValidationReport>,
}

impl ChangeReport {
    /// Distinct change start times in seconds, ascending.
    pub fn start_times(&self) -> &[f64] {
        &self.detection.start_times
    }

    /// Overall verdict, or None when nothing was validated.
    pub fn passed(&self) -> Option<bool> {
        self.validation.as_ref().map(ValidationReport::passed)
    }

    /// Peak / start / time table in peak order.
    pub fn detections_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:^20}\t{:^20}\t{:^20}",
            "Peak Frame #", "Rise Frame #", "Rise Start Time"
        );
        for d in &self.detection.detections {
            let _ = writeln!(
                out,
                "{:^20}\t{:^20}\t{:^20}",
                d.peak_frame,
                d.start_frame,
                StartTimeLabel(d)
            );
        }
        out
    }

    /// One line per proposed time, followed by the verdict.
    pub fn validation_summary(&self) -> Option<String> {
        let validation = self.validation.as_ref()?;
        let mut out = String::new();
        for m in &validation.matches {
            if m.matched.is_empty() {
                let _ = writeln!(out, "Validation failed on time {:.3}", m.proposed);
            }
            for d in &m.matched {
                let _ = writeln!(
                    out,
                    "Matched proposed time {:.3} with detected time {:.3} (diff = {:.3})",
                    m.proposed,
                    d,
                    m.proposed - d
                );
            }
        }
        let verdict = if validation.passed() { "PASS" } else { "FAIL" };
        let _ = writeln!(out, "Test {verdict}");
        Some(out)
    }

    pub fn to_proto(&self) -> proto::ChangeReport {
        proto::ChangeReport {
            source: Some(proto::SourceMetadata {
                file_path: self.source.to_string_lossy().into_owned(),
                fps: self.config.fps,
                fps_factor: self.config.fps_factor,
                frame_count: self.frame_count as u32,
            }),
            detections: self
                .detection
                .detections
                .iter()
                .map(|d| proto::Detection {
                    peak_frame: d.peak_frame as u32,
                    start_frame: d.start_frame as u32,
                    start_seconds: d.start_seconds,
                })
                .collect(),
            start_times: self.detection.start_times.clone(),
            validation: self.validation.as_ref().map(|v| proto::Validation {
                tolerance_seconds: v.tolerance,
                matches: v
                    .matches
                    .iter()
                    .map(|m| proto::ProposedMatch {
                        proposed_seconds: m.proposed,
                        matched_seconds: m.matched.clone(),
                    })
                    .collect(),
                passed: v.passed(),
            }),
            diffs: self
                .diffs
                .iter()
                .enumerate()
                .map(|(i, d)| proto::FrameDiff {
                    frame: (i + 1) as u32,
                    total_change: d.total_change,
                    avg_change: d.avg_change,
                    subset_avg_change: d.subset_avg_change,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::dedup::Detection;
    use crate::config::RunParams;
    use crate::validate::validate;

    fn report(with_validation: bool) -> ChangeReport {
        let config = AnalysisConfig::new(30.0, RunParams::default()).unwrap();
        let detection = ChangeDetection {
            smoothed: vec![],
            peaks: vec![40, 52, 90],
            detections: vec![
                Detection {
                    peak_frame: 40,
                    start_frame: 30,
                    start_seconds: Some(1.0),
                },
                Detection {
                    peak_frame: 52,
                    start_frame: 30,
                    start_seconds: None,
                },
                Detection {
                    peak_frame: 90,
                    start_frame: 75,
                    start_seconds: Some(2.5),
                },
            ],
            starts: vec![30, 75],
            start_times: vec![1.0, 2.5],
        };
        let validation = with_validation.then(|| validate(&[1.0, 2.5], &[1.1, 5.0], 0.25));
        ChangeReport {
            source: PathBuf::from("deck.mp4"),
            config,
            frame_count: 120,
            diffs: vec![
                DiffRecord::default(),
                DiffRecord {
                    total_change: 180,
                    avg_change: 4.5,
                    subset_avg_change: 30.0,
                },
            ],
            detection,
            validation,
        }
    }

    #[test]
    fn table_marks_duplicates() {
        let table = report(false).detections_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Rise Start Time"));
        assert!(lines[1].contains("1.000"));
        assert_eq!(lines[2].split('\t').nth(2).map(str::trim), Some("-"));
        assert!(lines[3].contains("2.500"));
    }

    #[test]
    fn validation_summary_reports_failure() {
        assert_eq!(report(false).validation_summary(), None);
        assert_eq!(report(false).passed(), None);

        let report = report(true);
        let summary = report.validation_summary().unwrap();
        assert!(summary.contains("Matched proposed time 1.100 with detected time 1.000"));
        assert!(summary.contains("Validation failed on time 5.000"));
        assert!(summary.ends_with("Test FAIL\n"));
        assert_eq!(report.passed(), Some(false));
    }

    #[test]
    fn proto_keeps_placeholders_and_verdict() {
        let msg = report(true).to_proto();
        let source = msg.source.unwrap();
        assert_eq!(source.file_path, "deck.mp4");
        assert_eq!(source.frame_count, 120);
        assert_eq!(msg.detections.len(), 3);
        assert_eq!(msg.detections[1].start_seconds, None);
        assert_eq!(msg.start_times, vec![1.0, 2.5]);
        let validation = msg.validation.unwrap();
        assert!(!validation.passed);
        assert_eq!(validation.matches[0].matched_seconds, vec![1.0]);
    }

    #[test]
    fn proto_numbers_diffs_by_later_frame() {
        let msg = report(false).to_proto();
        assert_eq!(msg.diffs.len(), 2);
        assert_eq!(msg.diffs[0].frame, 1);
        assert_eq!(msg.diffs[0].total_change, 0);
        assert_eq!(msg.diffs[1].frame, 2);
        assert_eq!(msg.diffs[1].total_change, 180);
        assert_eq!(msg.diffs[1].subset_avg_change, 30.0);
        assert!(msg.validation.is_none());
    }
}
