//! Verification engine for network fabrics.
//!
//! Cross-checks live device state against the intended fabric and produces
//! an itemized pass/fail report:
//!
//! - [`checks`]: individual comparison tests (spanning tree, trunks, VPC, layer 3)
//! - [`Verifier`]: the fixed fabric and tenant batteries
//! - [`DeviceStateSource`]: seam to the device-access layer, with
//!   [`collect_observed_state`] fanning out over devices within a time budget
//! - [`TestReport`] / [`ActionOutput`]: findings and the derived action result
//!
//! Content mismatches are findings. Only transport failures (unreachable
//! device, timeout) surface as errors, so callers can tell "the fabric is
//! broken" from "the fabric could not be checked".

pub mod checks;
pub mod device;
pub mod report;
mod verifier;

pub use device::{collect_observed_state, DeviceStateSource, StaticStateSource};
pub use report::{test_names, ActionOutput, TestFinding, TestReport, SUMMARY_FAILURE, SUMMARY_SUCCESS};
pub use verifier::{ObservedFabric, Verifier};
