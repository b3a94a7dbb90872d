//! Reporting aggregator.
//!
//! Findings are appended in discovery order. The action outcome is derived
//! from them: `success` is true exactly when there are no findings, and the
//! summary message follows from `success`.

use serde::Serialize;

/// Summary of a test run without findings.
pub const SUMMARY_SUCCESS: &str = "Test was successful";

/// Summary of a test run with at least one finding.
pub const SUMMARY_FAILURE: &str = "Errors were encountered during test.";

/// Names of the tests in the battery, as reported to the action surface.
pub mod test_names {
    pub const STP_PROTOCOL: &str = "spanning-tree protocol version";
    pub const STP_ROOT: &str = "spanning-tree root bridge";
    pub const TRUNK_EXIST: &str = "fabric trunk exist";
    pub const TRUNK_MEMBER: &str = "fabric member test";
    pub const VPC_KEEPALIVE: &str = "vpc keepalive test";
    pub const VPC_PEERLINK: &str = "vpc peerlink test";
    pub const VPC_PEERLINK_MEMBER: &str = "vpc peerlink member test";
    pub const VPC_STATUS: &str = "vpc status test";
    pub const FEATURE_ENABLED: &str = "nxos feature enabled";
    pub const TENANT_VRFS: &str = "tenant vrfs exist";
    pub const TENANT_OSPF_VRFS: &str = "tenant ospf vrfs running";
}

/// A single test failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestFinding {
    pub test: String,
    pub message: String,
}

impl TestFinding {
    pub fn new(test: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            message: message.into(),
        }
    }
}

/// Ordered, duplicate-permitting list of findings of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestReport {
    findings: Vec<TestFinding>,
}

impl TestReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finding.
    pub fn record(&mut self, test: &str, message: impl Into<String>) {
        self.findings.push(TestFinding::new(test, message));
    }

    /// Appends every finding of `other`, keeping their order.
    pub fn merge(&mut self, other: TestReport) {
        self.findings.extend(other.findings);
    }

    pub fn findings(&self) -> &[TestFinding] {
        &self.findings
    }

    /// Findings of one test, in discovery order.
    pub fn findings_for<'a>(&'a self, test: &'a str) -> impl Iterator<Item = &'a TestFinding> {
        self.findings.iter().filter(move |f| f.test == test)
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.findings.is_empty()
    }

    /// Converts the report into the action result.
    pub fn into_output(self) -> ActionOutput {
        ActionOutput::from(self)
    }
}

/// Result of a test action: `{success, message, findings}`.
///
/// Only constructible from a [`TestReport`], so the flag and the summary can
/// never disagree with the findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutput {
    success: bool,
    message: String,
    findings: Vec<TestFinding>,
}

impl ActionOutput {
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn findings(&self) -> &[TestFinding] {
        &self.findings
    }
}

impl From<TestReport> for ActionOutput {
    fn from(report: TestReport) -> Self {
        let success = report.is_success();
        let message = if success {
            SUMMARY_SUCCESS
        } else {
            SUMMARY_FAILURE
        };
        Self {
            success,
            message: message.to_string(),
            findings: report.findings,
        }
    }
}

/// Joins sorted set contents for a finding message.
pub(crate) fn join_sorted<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut items: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    items.sort();
    items.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_report_is_success() {
        let output = TestReport::new().into_output();
        assert!(output.success());
        assert_eq!(output.message(), SUMMARY_SUCCESS);
        assert!(output.findings().is_empty());
    }

    #[test]
    fn test_findings_keep_order_and_duplicates() {
        let mut report = TestReport::new();
        report.record(test_names::VPC_KEEPALIVE, "b");
        report.record(test_names::STP_ROOT, "a");
        report.record(test_names::VPC_KEEPALIVE, "b");

        let output = report.into_output();
        assert!(!output.success());
        assert_eq!(output.message(), SUMMARY_FAILURE);
        assert_eq!(
            output.findings(),
            &[
                TestFinding::new(test_names::VPC_KEEPALIVE, "b"),
                TestFinding::new(test_names::STP_ROOT, "a"),
                TestFinding::new(test_names::VPC_KEEPALIVE, "b"),
            ]
        );
    }

    #[test]
    fn test_merge() {
        let mut first = TestReport::new();
        first.record(test_names::STP_PROTOCOL, "one");
        let mut second = TestReport::new();
        second.record(test_names::STP_ROOT, "two");
        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.findings_for(test_names::STP_ROOT).count(), 1);
    }

    #[test]
    fn test_output_json_shape() {
        let mut report = TestReport::new();
        report.record(test_names::TENANT_VRFS, "VRF acme_prod not found on device sw1.");
        let json = serde_json::to_value(report.into_output()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "message": "Errors were encountered during test.",
                "findings": [{"test": "tenant vrfs exist", "message": "VRF acme_prod not found on device sw1."}]
            })
        );
    }

    #[test]
    fn test_join_sorted() {
        assert_eq!(join_sorted(["20", "10", "30"]), "10, 20, 30");
        assert_eq!(join_sorted(Vec::<String>::new()), "");
    }
}
