//! Stack run result types.
//!
//! Contains types for representing the outcome of consolidation runs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::stack::SectionOutput;

/// Status of a single section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionStatus {
    /// Section consolidated and written
    Success,
    /// Section never dispatched (fail-fast stopped the run)
    Skipped,
    /// Section failed with error
    Failed(String),
}

impl SectionStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, SectionStatus::Success)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, SectionStatus::Failed(_))
    }
}

impl std::fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionStatus::Success => write!(f, "success"),
            SectionStatus::Skipped => write!(f, "skipped"),
            SectionStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of consolidating a single section.
#[derive(Debug, Clone)]
pub struct SectionResult {
    /// Section z coordinate
    pub z: f64,
    pub status: SectionStatus,
    /// Worker output, present on success
    pub output: Option<SectionOutput>,
    pub duration: Duration,
}

impl SectionResult {
    /// Create a successful result.
    pub fn success(output: SectionOutput, duration: Duration) -> Self {
        Self { z: output.z, status: SectionStatus::Success, output: Some(output), duration }
    }

    /// Create a skipped result.
    pub fn skipped(z: f64) -> Self {
        Self { z, status: SectionStatus::Skipped, output: None, duration: Duration::ZERO }
    }

    /// Create a failed result.
    pub fn failed(z: f64, error: String, duration: Duration) -> Self {
        Self { z, status: SectionStatus::Failed(error), output: None, duration }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete stack run.
#[derive(Debug, Default)]
pub struct StackResult {
    /// Output stack the sections were written to
    pub output_stack: String,
    /// Results for each selected section, in section order
    pub sections: Vec<SectionResult>,
    /// Total run duration
    pub total_duration: Duration,
}

impl StackResult {
    /// Create a new empty result for `output_stack`.
    pub fn new(output_stack: impl Into<String>) -> Self {
        Self { output_stack: output_stack.into(), ..Default::default() }
    }

    /// Add a section result.
    pub fn add_result(&mut self, result: SectionResult) {
        self.sections.push(result);
    }

    /// Get the number of successful sections.
    pub fn success_count(&self) -> usize {
        self.sections.iter().filter(|r| r.status.is_success()).count()
    }

    /// Get the number of skipped sections.
    pub fn skipped_count(&self) -> usize {
        self.sections.iter().filter(|r| r.status == SectionStatus::Skipped).count()
    }

    /// Get the number of failed sections.
    pub fn failed_count(&self) -> usize {
        self.sections.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Number of sections a worker ran, successfully or not.
    pub fn sections_processed(&self) -> usize {
        self.success_count() + self.failed_count()
    }

    /// Check if every section succeeded.
    pub fn is_success(&self) -> bool {
        self.sections.iter().all(SectionResult::is_success)
    }

    /// z of every successful section.
    pub fn succeeded_sections(&self) -> Vec<f64> {
        self.sections.iter().filter(|r| r.status.is_success()).map(|r| r.z).collect()
    }

    /// z of every failed section.
    pub fn failed_sections(&self) -> Vec<f64> {
        self.sections.iter().filter(|r| r.status.is_failure()).map(|r| r.z).collect()
    }

    /// Get failed section results.
    pub fn failures(&self) -> Vec<&SectionResult> {
        self.sections.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Total tiles rewritten across successful sections.
    pub fn tiles_processed(&self) -> usize {
        self.sections.iter().filter_map(|r| r.output.as_ref()).map(|o| o.tiles).sum()
    }

    /// Machine-readable run summary.
    pub fn to_output(&self) -> StackOutput {
        StackOutput {
            output_stack: self.output_stack.clone(),
            num_z: self.sections_processed(),
            failed_z: self.failed_sections(),
        }
    }

    /// Format a summary of the stack result.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let skipped = self.skipped_count();
        let failed = self.failed_count();
        let total = self.sections.len();

        if failed > 0 {
            lines.push(format!(
                "Consolidation of '{}' failed: {} succeeded, {} skipped, {} failed ({} total)",
                self.output_stack, success, skipped, failed, total
            ));
            for section in self.failures() {
                lines.push(format!("  - z={}: {}", section.z, section.status));
            }
        } else {
            lines.push(format!(
                "Consolidated {} sections ({} tiles) into '{}' in {:?}",
                success,
                self.tiles_processed(),
                self.output_stack,
                self.total_duration
            ));
            if skipped > 0 {
                lines.push(format!("  {} sections skipped", skipped));
            }
        }

        lines.join("\n")
    }
}

/// Summary written by `--output-json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackOutput {
    pub output_stack: String,
    #[serde(rename = "numZ")]
    pub num_z: usize,
    #[serde(rename = "failedZ", default)]
    pub failed_z: Vec<f64>,
}
