//! Process-wide port pool.
//!
//! Ports are only ever consumed, never released: a test run uses a bounded
//! number of them and reuse would let a restarted fixture collide with a
//! stale listener of another.
mod source;
pub use source::*;

use std::sync::Arc;

use dashmap::DashSet;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::Error;
use crate::PortConfig;
use crate::PortStrategy;
use crate::Result;

/// How often the registry may hand back an already issued port before the
/// pool is considered exhausted
const MAX_REGISTRY_COLLISIONS: usize = 64;

static GLOBAL_POOL: OnceCell<(PortStrategy, Arc<PortAllocator>)> = OnceCell::new();

pub struct PortAllocator {
    source: Box<dyn PortSource>,
    issued: DashSet<u16>,
    /// Serializes batches so a single `allocate(n)` stays contiguous for
    /// sequential sources
    batch: Mutex<()>,
}

impl std::fmt::Debug for PortAllocator {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("PortAllocator")
            .field("source", &self.source.name())
            .field("issued", &self.issued.len())
            .finish()
    }
}

impl PortAllocator {
    pub fn new(source: Box<dyn PortSource>) -> Self {
        Self {
            source,
            issued: DashSet::new(),
            batch: Mutex::new(()),
        }
    }

    /// Builds an allocator for `config`, resolving [`PortStrategy::Auto`]
    /// to the job range when the runner provided one.
    pub fn from_config(config: &PortConfig) -> Self {
        let source: Box<dyn PortSource> = match (resolve_strategy(config), config.job_range()) {
            (PortStrategy::Registry, Some((start, end))) => Box::new(JobPortRange::new(start, end)),
            (PortStrategy::Registry, None) => {
                warn!("registry strategy without a job port range, counting up from base_port");
                Box::new(SequentialPorts::new(config.base_port))
            }
            _ => Box::new(SequentialPorts::new(config.base_port)),
        };
        info!(source = source.name(), "port allocator initialised");
        Self::new(source)
    }

    /// Process-wide pool. The first caller fixes the strategy; later callers
    /// share that pool even if they pass a different config.
    pub fn global(config: &PortConfig) -> Arc<Self> {
        let (strategy, pool) = GLOBAL_POOL
            .get_or_init(|| (config.strategy, Arc::new(Self::from_config(config))));
        if *strategy != config.strategy {
            warn!(
                installed = ?strategy,
                requested = ?config.strategy,
                "port pool already installed, ignoring requested strategy"
            );
        }
        pool.clone()
    }

    /// Hands out `n` ports never returned before by this allocator, in
    /// allocation order.
    pub fn allocate(
        &self,
        n: usize,
    ) -> Result<Vec<u16>> {
        let _guard = self.batch.lock();
        let mut ports = Vec::with_capacity(n);
        for _ in 0..n {
            ports.push(self.next_unique()?);
        }
        debug!(?ports, "allocated ports");
        Ok(ports)
    }

    /// Single-port shorthand for [`Self::allocate`]
    pub fn allocate_one(&self) -> Result<u16> {
        self.allocate(1)?
            .pop()
            .ok_or_else(|| Error::Fatal("port allocator returned no port".into()))
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }

    fn next_unique(&self) -> Result<u16> {
        for _ in 0..MAX_REGISTRY_COLLISIONS {
            let port = self.source.next_port()?;
            if self.issued.insert(port) {
                return Ok(port);
            }
            debug!(port, "port already issued, asking again");
        }
        Err(Error::Fatal(format!(
            "port source {} keeps returning issued ports",
            self.source.name()
        )))
    }
}

/// `Auto` prefers the runner's job range whenever one is configured
pub(crate) fn resolve_strategy(config: &PortConfig) -> PortStrategy {
    match config.strategy {
        PortStrategy::Auto if config.job_range().is_some() => PortStrategy::Registry,
        PortStrategy::Auto => PortStrategy::Sequential,
        other => other,
    }
}
