//! Service manager trait and the explicit invocation context.
//!
//! Every plan and verification function receives a [`ServiceContext`] and
//! emits its events with `parent: ctx.span()`, so trace output is attached to
//! the invoking pass rather than to whatever span happens to be current.

use std::fmt;

use async_trait::async_trait;
use tracing::Span;

use crate::error::FabricResult;
use crate::intent::ReconciliationPlan;

/// Kind of service instance being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// A `network-fabric` instance.
    Fabric,
    /// A `tenant` instance.
    Tenant,
}

impl ServiceKind {
    /// Returns the service model name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Fabric => "network-fabric",
            ServiceKind::Tenant => "tenant",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context of one service invocation (create or action).
#[derive(Debug, Clone)]
pub struct ServiceContext {
    service: ServiceKind,
    instance: String,
    username: String,
    span: Span,
}

impl ServiceContext {
    pub fn new(service: ServiceKind, instance: impl Into<String>, username: impl Into<String>) -> Self {
        let instance = instance.into();
        let username = username.into();
        let span = tracing::info_span!(
            "service",
            service = service.as_str(),
            instance = %instance,
            user = %username,
        );
        Self {
            service,
            instance,
            username,
            span,
        }
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    /// Name of the service instance, e.g. the fabric name.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Span that events of this invocation are parented to.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Base trait for service managers.
///
/// A manager turns one service instance snapshot into a reconciliation plan
/// for the config-push engine. Test actions are specific to each manager
/// and live on the implementing type.
///
/// # Example
///
/// ```ignore
/// use netfabric_common::{FabricResult, ReconciliationPlan, ServiceContext, ServiceKind, ServiceMgr};
///
/// struct MyMgr;
///
/// #[async_trait]
/// impl ServiceMgr for MyMgr {
///     type Model = MyModel;
///
///     fn daemon_name(&self) -> &str { "mymgrd" }
///     fn service_kind(&self) -> ServiceKind { ServiceKind::Fabric }
///
///     async fn create(&self, ctx: &ServiceContext, model: &MyModel) -> FabricResult<ReconciliationPlan> {
///         Ok(ReconciliationPlan::new())
///     }
/// }
/// ```
#[async_trait]
pub trait ServiceMgr: Send + Sync {
    /// Intent model snapshot the manager consumes.
    type Model: Send + Sync;

    /// Returns the daemon name (e.g. "fabricmgrd").
    fn daemon_name(&self) -> &str;

    /// Returns the kind of service instances this manager handles.
    fn service_kind(&self) -> ServiceKind;

    /// Builds the context for one invocation on `instance`.
    fn context(&self, instance: &str, username: &str) -> ServiceContext {
        ServiceContext::new(self.service_kind(), instance, username)
    }

    /// Derives the configuration plan of a service instance.
    async fn create(
        &self,
        ctx: &ServiceContext,
        model: &Self::Model,
    ) -> FabricResult<ReconciliationPlan>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullMgr;

    #[async_trait]
    impl ServiceMgr for NullMgr {
        type Model = ();

        fn daemon_name(&self) -> &str {
            "nullmgrd"
        }

        fn service_kind(&self) -> ServiceKind {
            ServiceKind::Tenant
        }

        async fn create(&self, ctx: &ServiceContext, _model: &()) -> FabricResult<ReconciliationPlan> {
            tracing::debug!(parent: ctx.span(), "nothing to plan");
            Ok(ReconciliationPlan::new())
        }
    }

    #[test]
    fn test_service_kind() {
        assert_eq!(ServiceKind::Fabric.as_str(), "network-fabric");
        assert_eq!(ServiceKind::Tenant.to_string(), "tenant");
    }

    #[tokio::test]
    async fn test_context_from_manager() {
        let mgr = NullMgr;
        let ctx = mgr.context("acme", "admin");
        assert_eq!(ctx.service(), ServiceKind::Tenant);
        assert_eq!(ctx.instance(), "acme");
        assert_eq!(ctx.username(), "admin");

        let plan = mgr.create(&ctx, &()).await.unwrap();
        assert!(plan.intents.is_empty());
        assert_eq!(mgr.daemon_name(), "nullmgrd");
    }
}
