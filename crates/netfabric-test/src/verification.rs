//! Plan and test-result verification helpers

use tracing::debug;

use netfabric_common::{ConfigIntent, ReconciliationPlan};
use netfabric_verify::ActionOutput;

/// Verification error
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("No intent for template {template} on device {device}")]
    IntentNotFound { template: String, device: String },

    #[error("Variable {var} not set on {template} for device {device}")]
    VarNotFound {
        template: String,
        device: String,
        var: String,
    },

    #[error("Value mismatch for {template}/{var} on {device}: expected '{expected}', got '{actual}'")]
    ValueMismatch {
        template: String,
        device: String,
        var: String,
        expected: String,
        actual: String,
    },

    #[error("Intent count mismatch for {template}: expected {expected}, got {actual}")]
    IntentCountMismatch {
        template: String,
        expected: usize,
        actual: usize,
    },

    #[error("Finding count mismatch for test '{test}': expected {expected}, got {actual}")]
    FindingCountMismatch {
        test: String,
        expected: usize,
        actual: usize,
    },

    #[error("Test result mismatch: expected success={expected}, got message '{message}'")]
    OutcomeMismatch { expected: bool, message: String },
}

pub type VerifyResult<T> = Result<T, VerificationError>;

/// Assertions over a reconciliation plan
pub struct PlanVerifier<'a> {
    plan: &'a ReconciliationPlan,
}

impl<'a> PlanVerifier<'a> {
    pub fn new(plan: &'a ReconciliationPlan) -> Self {
        Self { plan }
    }

    /// Finds the first intent of `template` on `device`.
    pub fn intent(&self, template: &str, device: &str) -> VerifyResult<&'a ConfigIntent> {
        self.plan
            .intents
            .iter()
            .find(|intent| intent.template == template && intent.device.as_deref() == Some(device))
            .ok_or_else(|| VerificationError::IntentNotFound {
                template: template.to_string(),
                device: device.to_string(),
            })
    }

    /// Assert that `device` has an intent of `template`
    pub fn assert_intent_exists(&self, template: &str, device: &str) -> VerifyResult<()> {
        self.intent(template, device).map(|_| ())
    }

    /// Assert that a template variable has the expected value
    pub fn assert_var(
        &self,
        template: &str,
        device: &str,
        var: &str,
        expected: &str,
    ) -> VerifyResult<()> {
        let intent = self.intent(template, device)?;
        let actual = intent
            .var(var)
            .ok_or_else(|| VerificationError::VarNotFound {
                template: template.to_string(),
                device: device.to_string(),
                var: var.to_string(),
            })?;

        if actual != expected {
            return Err(VerificationError::ValueMismatch {
                template: template.to_string(),
                device: device.to_string(),
                var: var.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    /// Assert the number of intents of a template across all devices
    pub fn assert_intent_count(&self, template: &str, expected: usize) -> VerifyResult<()> {
        let actual = self.plan.with_template(template).count();
        if actual != expected {
            return Err(VerificationError::IntentCountMismatch {
                template: template.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Assert that no intent of a template was emitted
    pub fn assert_no_intent(&self, template: &str) -> VerifyResult<()> {
        self.assert_intent_count(template, 0)
    }

    /// Templates in emission order, consecutive repeats collapsed.
    pub fn template_sequence(&self) -> Vec<&'a str> {
        let mut sequence: Vec<&'a str> = Vec::new();
        for intent in &self.plan.intents {
            if sequence.last() != Some(&intent.template.as_str()) {
                sequence.push(intent.template.as_str());
            }
        }
        debug!(?sequence, "plan template sequence");
        sequence
    }
}

/// Assertions over a test action result
pub struct OutputVerifier<'a> {
    output: &'a ActionOutput,
}

impl<'a> OutputVerifier<'a> {
    pub fn new(output: &'a ActionOutput) -> Self {
        Self { output }
    }

    /// Assert the overall outcome
    pub fn assert_success(&self, expected: bool) -> VerifyResult<()> {
        if self.output.success() != expected {
            return Err(VerificationError::OutcomeMismatch {
                expected,
                message: self.output.message().to_string(),
            });
        }
        Ok(())
    }

    /// Assert the number of findings of one test
    pub fn assert_finding_count(&self, test: &str, expected: usize) -> VerifyResult<()> {
        let actual = self.findings_for(test).len();
        if actual != expected {
            return Err(VerificationError::FindingCountMismatch {
                test: test.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Finding messages of one test, in report order
    pub fn findings_for(&self, test: &str) -> Vec<&'a str> {
        self.output
            .findings()
            .iter()
            .filter(|finding| finding.test == test)
            .map(|finding| finding.message.as_str())
            .collect()
    }

    /// Test names in report order, consecutive repeats collapsed.
    pub fn test_sequence(&self) -> Vec<&'a str> {
        let mut sequence: Vec<&'a str> = Vec::new();
        for finding in self.output.findings() {
            if sequence.last() != Some(&finding.test.as_str()) {
                sequence.push(finding.test.as_str());
            }
        }
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netfabric_common::template_vars;

    fn plan() -> ReconciliationPlan {
        let mut plan = ReconciliationPlan::new();
        plan.push(ConfigIntent::for_device(
            "mode",
            "sw1",
            template_vars! { "DEVICE_NAME" => "sw1" },
        ));
        plan.push(ConfigIntent::for_device(
            "mode",
            "sw2",
            template_vars! { "DEVICE_NAME" => "sw2" },
        ));
        plan.push(ConfigIntent::global("pool", template_vars! { "POOL_NAME" => "p" }));
        plan
    }

    #[test]
    fn test_plan_verifier() {
        let plan = plan();
        let verifier = PlanVerifier::new(&plan);

        assert!(verifier.assert_var("mode", "sw2", "DEVICE_NAME", "sw2").is_ok());
        assert!(verifier.assert_intent_count("mode", 2).is_ok());
        assert!(verifier.assert_no_intent("priority").is_ok());
        assert_eq!(verifier.template_sequence(), vec!["mode", "pool"]);

        assert!(matches!(
            verifier.assert_var("mode", "sw1", "DEVICE_NAME", "sw2"),
            Err(VerificationError::ValueMismatch { .. })
        ));
        assert!(matches!(
            verifier.assert_var("mode", "sw1", "MTU", "9216"),
            Err(VerificationError::VarNotFound { .. })
        ));
        assert!(matches!(
            verifier.assert_intent_exists("mode", "sw3"),
            Err(VerificationError::IntentNotFound { .. })
        ));
    }
}
