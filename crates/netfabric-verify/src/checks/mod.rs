//! Individual comparison tests.
//!
//! Each check appends findings to a [`TestReport`](crate::TestReport) and
//! never fails: mismatches, including state that was not discovered, are
//! findings. Checks are independent of each other.

pub mod layer3;
pub mod spanning_tree;
pub mod trunks;
pub mod vpc;
