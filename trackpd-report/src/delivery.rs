//! Delivery Gate
//!
//! Serves the artifact, regenerating it first only when it is absent or the
//! cache policy considers it stale. Regenerations are serialised so two
//! concurrent requests never race to overwrite the same files.

use crate::error::Result;
use crate::pipeline::fetch::{RecordLocators, RecordSource};
use crate::pipeline::{GeneratedReport, ReportPipeline};
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// When an artifact on disk may be served as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Any existing artifact is fresh
    PresenceOnly,
    /// An artifact older than this is regenerated
    MaxAge(Duration),
}

impl CachePolicy {
    /// `0` means presence-only
    pub fn from_max_age_secs(secs: u64) -> Self {
        if secs == 0 {
            CachePolicy::PresenceOnly
        } else {
            CachePolicy::MaxAge(Duration::from_secs(secs))
        }
    }

    pub fn is_fresh(&self, metadata: &Metadata, now: SystemTime) -> bool {
        self.is_fresh_at(metadata.modified().ok(), now)
    }

    fn is_fresh_at(&self, modified: Option<SystemTime>, now: SystemTime) -> bool {
        match self {
            CachePolicy::PresenceOnly => true,
            CachePolicy::MaxAge(max_age) => match modified {
                // A timestamp ahead of the clock counts as brand new
                Some(modified) => now.duration_since(modified).unwrap_or_default() <= *max_age,
                None => false,
            },
        }
    }
}

/// Artifact bytes and whether this request rebuilt them
#[derive(Debug, Clone)]
pub struct DeliveredArtifact {
    pub bytes: Vec<u8>,
    pub regenerated: bool,
}

/// Memoising front of the report pipeline
pub struct DeliveryGate {
    pipeline: ReportPipeline,
    source: Arc<dyn RecordSource>,
    locators: RecordLocators,
    policy: CachePolicy,
    lock: Mutex<()>,
}

impl DeliveryGate {
    pub fn new(
        pipeline: ReportPipeline,
        source: Arc<dyn RecordSource>,
        locators: RecordLocators,
        policy: CachePolicy,
    ) -> Self {
        Self {
            pipeline,
            source,
            locators,
            policy,
            lock: Mutex::new(()),
        }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.pipeline.artifact_path()
    }

    pub fn artifact_name(&self) -> &str {
        &self.pipeline.settings().artifact_name
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Unconditionally rebuild the artifact
    pub async fn regenerate(&self) -> Result<GeneratedReport> {
        let _guard = self.lock.lock().await;
        self.pipeline
            .regenerate(self.source.as_ref(), &self.locators)
            .await
    }

    /// Return the artifact, rebuilding it first if absent or stale
    pub async fn fetch_artifact(&self) -> Result<DeliveredArtifact> {
        let _guard = self.lock.lock().await;
        let path = self.artifact_path();

        let fresh = match tokio::fs::metadata(&path).await {
            Ok(metadata) => self.policy.is_fresh(&metadata, SystemTime::now()),
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        let regenerated = if fresh {
            debug!("Serving cached artifact {}", path.display());
            false
        } else {
            info!("Artifact {} absent or stale, regenerating", path.display());
            self.pipeline
                .regenerate(self.source.as_ref(), &self.locators)
                .await?;
            true
        };

        let bytes = tokio::fs::read(&path).await?;
        Ok(DeliveredArtifact { bytes, regenerated })
    }

    /// Delete the artifact so the next read rebuilds it.
    ///
    /// Returns whether an artifact existed.
    pub async fn invalidate(&self) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let path = self.artifact_path();

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Invalidated artifact {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_max_age_is_presence_only() {
        assert_eq!(CachePolicy::from_max_age_secs(0), CachePolicy::PresenceOnly);
        assert_eq!(
            CachePolicy::from_max_age_secs(60),
            CachePolicy::MaxAge(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_presence_only_ignores_age() {
        let now = SystemTime::now();
        let ancient = now - Duration::from_secs(365 * 24 * 3600);
        assert!(CachePolicy::PresenceOnly.is_fresh_at(Some(ancient), now));
        assert!(CachePolicy::PresenceOnly.is_fresh_at(None, now));
    }

    #[test]
    fn test_max_age_staleness() {
        let now = SystemTime::now();
        let policy = CachePolicy::MaxAge(Duration::from_secs(60));

        assert!(policy.is_fresh_at(Some(now - Duration::from_secs(30)), now));
        assert!(!policy.is_fresh_at(Some(now - Duration::from_secs(120)), now));
        assert!(policy.is_fresh_at(Some(now + Duration::from_secs(5)), now));
        assert!(!policy.is_fresh_at(None, now));
    }
}
