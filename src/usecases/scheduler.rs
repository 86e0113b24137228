//! Resolution Scheduler - Eligibility Sweep + Privileged Submission
//!
//! Periodically scans the cache for markets whose trading window plus
//! the resolution delay has elapsed and flags them for the operator.
//! Flagging never submits anything: the outcome is supplied
//! externally through `resolve` / `submit_vote`, which go through the
//! privileged oracle signer and surface typed failures.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::info;

use crate::domain::market::MarketSnapshot;
use crate::ports::resolution::{ResolutionError, ResolutionSubmitter};

use super::cache::MarketCache;

/// Scheduler over the cache and the optional oracle submitter.
pub struct ResolutionScheduler {
  cache: Arc<MarketCache>,
  /// `None` when the oracle address or signer key is not configured;
  /// submission then fails fast with `ResolutionError::Configuration`
  /// before any network call.
  submitter: Option<Arc<dyn ResolutionSubmitter>>,
  /// Seconds past `end_time` before a market becomes eligible.
  resolution_delay_secs: u64,
  check_interval: Duration,
}

impl ResolutionScheduler {
  pub fn new(
    cache: Arc<MarketCache>,
    submitter: Option<Arc<dyn ResolutionSubmitter>>,
    resolution_delay_secs: u64,
    check_interval: Duration,
  ) -> Self {
    Self {
      cache,
      submitter,
      resolution_delay_secs,
      check_interval,
    }
  }

  /// Whether a privileged submitter is configured.
  pub fn can_submit(&self) -> bool {
    self.submitter.is_some()
  }

  /// Snapshots currently eligible for resolution at `now_secs`.
  ///
  /// Eligible means open and past `end_time + resolution_delay`.
  /// This is a pure read of the cache.
  pub fn eligible_markets(&self, now_secs: u64) -> Vec<MarketSnapshot> {
    self
      .cache
      .get_all()
      .into_iter()
      .filter(|snap| snap.resolution_eligible(now_secs, self.resolution_delay_secs))
      .collect()
  }

  /// One eligibility sweep: flag (log) every eligible market.
  pub fn check_eligibility(&self) {
    let now_secs = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
    let eligible = self.eligible_markets(now_secs);

    for market in &eligible {
      info!(
        market = %market.address,
        end_time = market.end_time,
        delay_secs = self.resolution_delay_secs,
        "market ready for resolution"
      );
    }

    if !eligible.is_empty() {
      info!(count = eligible.len(), "resolution eligibility sweep complete");
    }
  }

  /// Submit a final resolution with the supplied outcome.
  ///
  /// Checked against configuration before any network call.
  pub async fn resolve(
    &self,
    market: Address,
    outcome: bool,
  ) -> Result<String, ResolutionError> {
    let submitter = self.submitter.as_ref().ok_or_else(|| {
      ResolutionError::Configuration(
        "oracle address or signer key not configured".to_string(),
      )
    })?;
    submitter.resolve(market, outcome).await
  }

  /// Submit one resolution vote (multi-party voting path).
  pub async fn submit_vote(
    &self,
    market: Address,
    outcome: bool,
  ) -> Result<String, ResolutionError> {
    let submitter = self.submitter.as_ref().ok_or_else(|| {
      ResolutionError::Configuration(
        "oracle address or signer key not configured".to_string(),
      )
    })?;
    submitter.submit_vote(market, outcome).await
  }

  /// Periodic eligibility sweep. Runs until shutdown.
  pub async fn run(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(self.check_interval);
    // Skip the immediate first tick; the cache is still backfilling.
    ticker.tick().await;

    info!(
      interval_secs = self.check_interval.as_secs(),
      submission_enabled = self.can_submit(),
      "resolution scheduler started"
    );

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("resolution scheduler received shutdown signal");
          break;
        }
        _ = ticker.tick() => {
          self.check_eligibility();
        }
      }
    }
  }
}
