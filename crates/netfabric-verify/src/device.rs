//! Device state collection.
//!
//! The device-access layer owns connections and command parsing; it is
//! reached through [`DeviceStateSource`]. Collection fans out over the device
//! set (connect then observe, sequential per device) and is bounded by a
//! wall-clock budget. A device that cannot be reached fails the whole
//! collection: it could not be verified, which is not a verification finding.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use netfabric_common::{FabricError, FabricResult, ServiceContext};
use netfabric_types::ObservedDeviceState;

/// Source of observed device state.
#[async_trait]
pub trait DeviceStateSource: Send + Sync {
    /// Opens a session to the device.
    async fn connect(&self, device: &str) -> FabricResult<()>;

    /// Queries and parses the operational state of a connected device.
    async fn observe(&self, device: &str) -> FabricResult<ObservedDeviceState>;

    /// Closes the session without waiting for a graceful teardown.
    async fn disconnect(&self, device: &str) -> FabricResult<()>;
}

async fn observe_device(
    source: &dyn DeviceStateSource,
    device: &str,
) -> FabricResult<ObservedDeviceState> {
    source.connect(device).await?;
    let mut state = source.observe(device).await?;
    if state.device.is_empty() {
        state.device = device.to_string();
    }
    Ok(state)
}

/// Collects the observed state of every device within `budget`.
///
/// All sessions are closed afterwards, whatever the outcome. On timeout the
/// partial results are discarded and [`FabricError::Timeout`] is returned.
pub async fn collect_observed_state(
    ctx: &ServiceContext,
    source: &dyn DeviceStateSource,
    devices: &[String],
    budget: Duration,
) -> FabricResult<BTreeMap<String, ObservedDeviceState>> {
    info!(parent: ctx.span(), devices = devices.len(), budget_secs = budget.as_secs(), "collecting device state");

    let sweep = join_all(devices.iter().map(|device| observe_device(source, device)));
    let outcome = tokio::time::timeout(budget, sweep)
        .await
        .map_err(|_| FabricError::Timeout {
            budget_secs: budget.as_secs(),
        });

    for (device, result) in devices
        .iter()
        .zip(join_all(devices.iter().map(|device| source.disconnect(device))).await)
    {
        if let Err(e) = result {
            warn!(parent: ctx.span(), device = %device, error = %e, "disconnect failed");
        }
    }

    let mut states = BTreeMap::new();
    for (device, result) in devices.iter().zip(outcome?) {
        let state = result?;
        debug!(parent: ctx.span(), device = %device, os = %state.os, "device state collected");
        states.insert(device.clone(), state);
    }
    Ok(states)
}

/// Device state source backed by a parsed snapshot.
///
/// Devices without a snapshot entry, or marked unreachable, fail to connect
/// with a transport error.
#[derive(Debug, Default)]
pub struct StaticStateSource {
    states: HashMap<String, ObservedDeviceState>,
    unreachable: HashSet<String>,
    latency: Option<Duration>,
    connected: Mutex<BTreeSet<String>>,
    disconnected: Mutex<Vec<String>>,
}

impl StaticStateSource {
    pub fn new<I>(states: I) -> Self
    where
        I: IntoIterator<Item = ObservedDeviceState>,
    {
        Self {
            states: states
                .into_iter()
                .map(|state| (state.device.clone(), state))
                .collect(),
            ..Default::default()
        }
    }

    /// Marks a device as unreachable.
    pub fn with_unreachable(mut self, device: impl Into<String>) -> Self {
        self.unreachable.insert(device.into());
        self
    }

    /// Delays every query by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Devices with an open session.
    pub fn connected(&self) -> BTreeSet<String> {
        self.connected.lock().clone()
    }

    /// Devices disconnected so far, in call order.
    pub fn disconnected(&self) -> Vec<String> {
        self.disconnected.lock().clone()
    }
}

#[async_trait]
impl DeviceStateSource for StaticStateSource {
    async fn connect(&self, device: &str) -> FabricResult<()> {
        if self.unreachable.contains(device) || !self.states.contains_key(device) {
            return Err(FabricError::transport(device, "device unreachable"));
        }
        self.connected.lock().insert(device.to_string());
        Ok(())
    }

    async fn observe(&self, device: &str) -> FabricResult<ObservedDeviceState> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.states
            .get(device)
            .cloned()
            .ok_or_else(|| FabricError::transport(device, "no operational state available"))
    }

    async fn disconnect(&self, device: &str) -> FabricResult<()> {
        self.connected.lock().remove(device);
        self.disconnected.lock().push(device.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netfabric_common::ServiceKind;
    use pretty_assertions::assert_eq;

    fn ctx() -> ServiceContext {
        ServiceContext::new(ServiceKind::Fabric, "dc1", "admin")
    }

    fn devices(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn source() -> StaticStateSource {
        StaticStateSource::new([
            ObservedDeviceState::new("sw1", "nxos"),
            ObservedDeviceState::new("sw2", "nxos"),
        ])
    }

    #[tokio::test]
    async fn test_collect_all() {
        let source = source();
        let states = collect_observed_state(
            &ctx(),
            &source,
            &devices(&["sw1", "sw2"]),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(states.keys().cloned().collect::<Vec<_>>(), vec!["sw1", "sw2"]);
        assert!(source.connected().is_empty());
        assert_eq!(source.disconnected().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_device_is_transport_error() {
        let source = source().with_unreachable("sw2");
        let err = collect_observed_state(
            &ctx(),
            &source,
            &devices(&["sw1", "sw2"]),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(err.is_transport());
        assert!(matches!(err, FabricError::Transport { ref device, .. } if device == "sw2"));
        assert_eq!(source.disconnected().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_device_is_transport_error() {
        let err = collect_observed_state(&ctx(), &source(), &devices(&["sw9"]), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exceeded() {
        let source = source().with_latency(Duration::from_secs(600));
        let err = collect_observed_state(
            &ctx(),
            &source,
            &devices(&["sw1", "sw2"]),
            Duration::from_secs(360),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, FabricError::Timeout { budget_secs: 360 }));
        assert_eq!(source.disconnected().len(), 2);
    }
}
