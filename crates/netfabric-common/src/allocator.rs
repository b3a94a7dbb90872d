//! Identifier allocator client.
//!
//! Scoped unique integers (VPC domain ids) come from an external pool keyed
//! by (pool name, allocation name). Requests are idempotent and reads of an
//! allocation that has not been committed yet return `None`, which callers
//! treat as "not ready, retry on the next pass".

use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::error::{FabricError, FabricResult};

/// Resource prefix of the VPC domain id pool.
pub const VPC_DOMAIN_RESOURCE: &str = "VPC-DOMAIN";

/// Name of a fabric-wide id pool: `<RESOURCE>-ID-POOL-<fabric>`.
pub fn id_pool_name(resource: &str, fabric: &str) -> String {
    format!("{}-ID-POOL-{}", resource, fabric)
}

/// Name of the VPC domain id pool of a fabric.
pub fn vpc_domain_pool_name(fabric: &str) -> String {
    id_pool_name(VPC_DOMAIN_RESOURCE, fabric)
}

/// Name of the allocation owned by a switch-pair: `SWITCH-PAIR-<pair>`.
pub fn switch_pair_allocation_name(pair: &str) -> String {
    format!("SWITCH-PAIR-{}", pair)
}

/// A request for one id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    /// Model path the allocation is scoped to (the owning switch-pair).
    pub scope_path: String,
    /// Requesting user, recorded for audit. Does not scope reads.
    pub owner: String,
    pub pool_name: String,
    pub alloc_name: String,
}

/// Allocate/read contract of the external id pool.
#[async_trait]
pub trait IdAllocator: Send + Sync {
    /// Creates the pool if it does not exist. Safe to re-run.
    async fn ensure_pool(&self, pool_name: &str, range: RangeInclusive<u32>) -> FabricResult<()>;

    /// Submits an allocation request. Requesting an allocation that already
    /// exists is not an error.
    async fn request(&self, request: &AllocationRequest) -> FabricResult<()>;

    /// Reads a granted id; `None` while the request is not committed.
    ///
    /// The result depends only on the pool and allocation name, so every
    /// requester of the same allocation observes the same id.
    async fn read(
        &self,
        owner: &str,
        pool_name: &str,
        alloc_name: &str,
    ) -> FabricResult<Option<u32>>;
}

#[derive(Debug)]
struct Allocation {
    owner: String,
    id: Option<u32>,
}

#[derive(Debug)]
struct Pool {
    range: RangeInclusive<u32>,
    allocations: HashMap<String, Allocation>,
}

impl Pool {
    fn next_free(&self) -> Option<u32> {
        let used: BTreeSet<u32> = self.allocations.values().filter_map(|a| a.id).collect();
        self.range.clone().find(|id| !used.contains(id))
    }
}

#[derive(Debug, Default)]
struct AllocatorState {
    pools: HashMap<String, Pool>,
    offline: bool,
}

/// In-process allocator store.
///
/// With auto-commit (the default) a request is granted immediately. With
/// auto-commit disabled requests stay pending until [`commit`](Self::commit)
/// is called, which models a store that grants ids in a later transaction.
#[derive(Debug)]
pub struct InMemoryIdAllocator {
    state: Mutex<AllocatorState>,
    auto_commit: bool,
}

impl InMemoryIdAllocator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AllocatorState::default()),
            auto_commit: true,
        }
    }

    /// Creates an allocator that leaves requests pending until committed.
    pub fn deferred() -> Self {
        Self {
            state: Mutex::new(AllocatorState::default()),
            auto_commit: false,
        }
    }

    /// Grants every pending request.
    pub fn commit(&self) -> FabricResult<()> {
        let mut state = self.state.lock();
        for (pool_name, pool) in state.pools.iter_mut() {
            let mut pending: Vec<String> = pool
                .allocations
                .iter()
                .filter(|(_, a)| a.id.is_none())
                .map(|(name, _)| name.clone())
                .collect();
            pending.sort();
            for alloc_name in pending {
                let id = pool.next_free().ok_or_else(|| {
                    FabricError::allocation(pool_name.as_str(), alloc_name.as_str(), "pool exhausted")
                })?;
                if let Some(allocation) = pool.allocations.get_mut(&alloc_name) {
                    allocation.id = Some(id);
                }
            }
        }
        Ok(())
    }

    /// Makes every call fail as if the store were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    fn check_online(state: &AllocatorState, pool: &str, alloc: &str) -> FabricResult<()> {
        if state.offline {
            return Err(FabricError::allocation(pool, alloc, "allocator store unreachable"));
        }
        Ok(())
    }
}

impl Default for InMemoryIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdAllocator for InMemoryIdAllocator {
    #[instrument(skip(self))]
    async fn ensure_pool(&self, pool_name: &str, range: RangeInclusive<u32>) -> FabricResult<()> {
        let mut state = self.state.lock();
        Self::check_online(&state, pool_name, "")?;
        state
            .pools
            .entry(pool_name.to_string())
            .or_insert_with(|| Pool {
                range,
                allocations: HashMap::new(),
            });
        Ok(())
    }

    #[instrument(skip(self), fields(pool = %request.pool_name, alloc = %request.alloc_name))]
    async fn request(&self, request: &AllocationRequest) -> FabricResult<()> {
        let mut state = self.state.lock();
        Self::check_online(&state, &request.pool_name, &request.alloc_name)?;

        let auto_commit = self.auto_commit;
        let pool = state.pools.get_mut(&request.pool_name).ok_or_else(|| {
            FabricError::allocation(
                request.pool_name.as_str(),
                request.alloc_name.as_str(),
                "pool does not exist",
            )
        })?;

        if pool.allocations.contains_key(&request.alloc_name) {
            debug!("allocation already requested");
            return Ok(());
        }

        let id = if auto_commit {
            Some(pool.next_free().ok_or_else(|| {
                FabricError::allocation(
                    request.pool_name.as_str(),
                    request.alloc_name.as_str(),
                    "pool exhausted",
                )
            })?)
        } else {
            None
        };
        pool.allocations.insert(
            request.alloc_name.clone(),
            Allocation {
                owner: request.owner.clone(),
                id,
            },
        );
        debug!(?id, "allocation requested");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn read(
        &self,
        owner: &str,
        pool_name: &str,
        alloc_name: &str,
    ) -> FabricResult<Option<u32>> {
        let state = self.state.lock();
        Self::check_online(&state, pool_name, alloc_name)?;
        let Some(allocation) = state
            .pools
            .get(pool_name)
            .and_then(|pool| pool.allocations.get(alloc_name))
        else {
            return Ok(None);
        };
        // Keyed on (pool, allocation) only; the owner is kept for audit
        if allocation.owner != owner {
            debug!(requested_by = %allocation.owner, "allocation read by another owner");
        }
        Ok(allocation.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn request(pair: &str) -> AllocationRequest {
        AllocationRequest {
            scope_path: format!("/network-fabric{{dc1}}/switch-pair{{{}}}", pair),
            owner: "dc1".to_string(),
            pool_name: vpc_domain_pool_name("dc1"),
            alloc_name: switch_pair_allocation_name(pair),
        }
    }

    #[test]
    fn test_naming() {
        assert_eq!(vpc_domain_pool_name("dc1"), "VPC-DOMAIN-ID-POOL-dc1");
        assert_eq!(switch_pair_allocation_name("core"), "SWITCH-PAIR-core");
    }

    #[tokio::test]
    async fn test_request_is_idempotent() {
        let alloc = InMemoryIdAllocator::new();
        let pool = vpc_domain_pool_name("dc1");
        alloc.ensure_pool(&pool, 1..=1000).await.unwrap();

        alloc.request(&request("core")).await.unwrap();
        let first = alloc.read("dc1", &pool, "SWITCH-PAIR-core").await.unwrap();
        alloc.request(&request("core")).await.unwrap();
        let second = alloc.read("dc1", &pool, "SWITCH-PAIR-core").await.unwrap();

        assert_eq!(first, Some(1));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_second_requester_reads_same_id() {
        let alloc = InMemoryIdAllocator::new();
        let pool = vpc_domain_pool_name("dc1");
        alloc.ensure_pool(&pool, 1..=1000).await.unwrap();

        alloc.request(&request("core")).await.unwrap();
        let first = alloc.read("dc1", &pool, "SWITCH-PAIR-core").await.unwrap();

        let mut other = request("core");
        other.owner = "oper".to_string();
        alloc.request(&other).await.unwrap();
        let second = alloc.read("oper", &pool, "SWITCH-PAIR-core").await.unwrap();

        assert_eq!(first, Some(1));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_deferred_grant_visible_to_every_requester() {
        let alloc = InMemoryIdAllocator::deferred();
        let pool = vpc_domain_pool_name("dc1");
        alloc.ensure_pool(&pool, 1..=1000).await.unwrap();
        alloc.request(&request("core")).await.unwrap();
        alloc.commit().unwrap();

        assert_eq!(
            alloc.read("oper", &pool, "SWITCH-PAIR-core").await.unwrap(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_distinct_pairs_get_distinct_ids() {
        let alloc = InMemoryIdAllocator::new();
        let pool = vpc_domain_pool_name("dc1");
        alloc.ensure_pool(&pool, 10..=20).await.unwrap();
        alloc.request(&request("a")).await.unwrap();
        alloc.request(&request("b")).await.unwrap();

        let a = alloc.read("dc1", &pool, "SWITCH-PAIR-a").await.unwrap();
        let b = alloc.read("dc1", &pool, "SWITCH-PAIR-b").await.unwrap();
        assert_eq!(a, Some(10));
        assert_eq!(b, Some(11));
    }

    #[tokio::test]
    async fn test_unsubmitted_reads_absent() {
        let alloc = InMemoryIdAllocator::new();
        let pool = vpc_domain_pool_name("dc1");
        assert_eq!(alloc.read("dc1", &pool, "SWITCH-PAIR-x").await.unwrap(), None);
        alloc.ensure_pool(&pool, 1..=1000).await.unwrap();
        assert_eq!(alloc.read("dc1", &pool, "SWITCH-PAIR-x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_deferred_commit() {
        let alloc = InMemoryIdAllocator::deferred();
        let pool = vpc_domain_pool_name("dc1");
        alloc.ensure_pool(&pool, 1..=1000).await.unwrap();
        alloc.request(&request("core")).await.unwrap();

        assert_eq!(alloc.read("dc1", &pool, "SWITCH-PAIR-core").await.unwrap(), None);
        alloc.commit().unwrap();
        assert_eq!(
            alloc.read("dc1", &pool, "SWITCH-PAIR-core").await.unwrap(),
            Some(1)
        );
    }

    #[test]
    fn test_request_without_pool_fails() {
        let alloc = InMemoryIdAllocator::new();
        let err = tokio_test::block_on(alloc.request(&request("core"))).unwrap_err();
        assert!(matches!(err, FabricError::Allocation { .. }));
    }

    #[tokio::test]
    async fn test_pool_exhausted() {
        let alloc = InMemoryIdAllocator::new();
        let pool = vpc_domain_pool_name("dc1");
        alloc.ensure_pool(&pool, 1..=1).await.unwrap();
        alloc.request(&request("a")).await.unwrap();
        assert!(alloc.request(&request("b")).await.is_err());
    }

    #[tokio::test]
    async fn test_offline_store() {
        let alloc = InMemoryIdAllocator::new();
        alloc.set_offline(true);
        let err = alloc.ensure_pool("p", 1..=10).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_concurrent_requesters_share_id() {
        let alloc = Arc::new(InMemoryIdAllocator::new());
        let pool = vpc_domain_pool_name("dc1");
        alloc.ensure_pool(&pool, 1..=1000).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let alloc = Arc::clone(&alloc);
                tokio::spawn(async move { alloc.request(&request("core")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            alloc.read("dc1", &pool, "SWITCH-PAIR-core").await.unwrap(),
            Some(1)
        );
        assert_eq!(alloc.read("dc1", &pool, "SWITCH-PAIR-other").await.unwrap(), None);
    }
}
