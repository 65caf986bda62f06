//! Random proxy selection

use crate::error::SetupError;
use crate::proxy::models::ProxyDescriptor;
use crate::proxy::parser::ProxyParser;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A non-empty, read-only pool of proxies shared by every worker.
///
/// Cloning is cheap; all clones share the same descriptors.
#[derive(Debug, Clone)]
pub struct ProxyPool {
    proxies: Arc<[ProxyDescriptor]>,
}

impl ProxyPool {
    /// Returns `None` when `proxies` is empty
    pub fn new(proxies: Vec<ProxyDescriptor>) -> Option<Self> {
        if proxies.is_empty() {
            return None;
        }
        Some(Self {
            proxies: proxies.into(),
        })
    }

    /// Load a pool from a proxy list, skipping malformed lines
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let parsed = ProxyParser::parse_file(path)?;
        let skipped = parsed.skipped.len();

        let pool = Self::new(parsed.proxies).ok_or_else(|| SetupError::NoProxies {
            path: path.to_path_buf(),
            skipped,
        })?;

        info!(
            count = pool.len(),
            skipped,
            file = %path.display(),
            "proxies loaded"
        );
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn proxies(&self) -> &[ProxyDescriptor] {
        &self.proxies
    }

    /// Pick a proxy uniformly at random.
    ///
    /// Uses the calling thread's OS-seeded generator, so concurrent workers
    /// never share generator state.
    pub fn select(&self) -> &ProxyDescriptor {
        self.select_with(&mut rand::thread_rng())
    }

    /// Pick a proxy using the given generator
    pub fn select_with<R: Rng>(&self, rng: &mut R) -> &ProxyDescriptor {
        &self.proxies[rng.gen_range(0..self.proxies.len())]
    }
}
