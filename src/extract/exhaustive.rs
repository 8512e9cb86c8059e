use crate::catalog::ItemId;
use crate::config::BrowserConfig;
use crate::extract::ListView;
use crate::reader::ReaderError;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Tuning of the trigger-and-wait loop
///
/// `load_timeout` decides when a list counts as exhausted: too short and a
/// slow page is cut off early, too long and every list ends with a long idle
/// wait.
#[derive(Debug, Clone)]
pub struct ExtractSettings {
    /// How long to wait for growth after each trigger
    pub load_timeout: Duration,
    /// Interval between content extent checks while waiting
    pub poll_interval: Duration,
    /// Pause after growth before the next snapshot
    pub scroll_delay: Duration,
    /// Hard cap on trigger rounds
    pub max_rounds: u32,
}

impl From<&BrowserConfig> for ExtractSettings {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            load_timeout: Duration::from_millis(config.load_timeout_ms),
            poll_interval: Duration::from_millis(config.load_poll_interval_ms),
            scroll_delay: Duration::from_millis(config.scroll_delay_ms),
            max_rounds: config.max_scroll_rounds,
        }
    }
}

/// What happened after a load-more trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The content grew to `extent`
    Grew { extent: u64 },
    /// No growth within the load timeout
    TimedOut,
}

/// Waits until the content extent exceeds `previous` or the timeout passes
pub async fn wait_for_growth<V>(
    view: &mut V,
    previous: u64,
    settings: &ExtractSettings,
) -> Result<LoadOutcome, ReaderError>
where
    V: ListView + ?Sized,
{
    let deadline = Instant::now() + settings.load_timeout;
    loop {
        let extent = view.content_extent().await?;
        if extent > previous {
            return Ok(LoadOutcome::Grew { extent });
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(LoadOutcome::TimedOut);
        }
        sleep(settings.poll_interval.min(deadline - now)).await;
    }
}

/// Enumerates every item of a lazily loaded list
///
/// Each round snapshots the rendered ids, triggers more content and waits
/// for growth. The first wait that times out ends the loop. The result is
/// the union of all snapshots, sorted and deduplicated; an empty list gives
/// an empty result.
///
/// # Arguments
///
/// * `view` - A list view already positioned on the list
/// * `settings` - Wait timings and the round cap
///
/// # Returns
///
/// * `Ok(Vec<ItemId>)` - Every id seen in any round
/// * `Err(ReaderError)` - The view could not be read or scrolled
pub async fn extract_all<V>(view: &mut V, settings: &ExtractSettings) -> Result<Vec<ItemId>, ReaderError>
where
    V: ListView + ?Sized,
{
    let mut seen = BTreeSet::new();

    for round in 1..=settings.max_rounds {
        seen.extend(view.rendered_ids().await?);

        let before = view.content_extent().await?;
        view.trigger_load_more().await?;

        match wait_for_growth(view, before, settings).await? {
            LoadOutcome::Grew { extent } => {
                tracing::trace!(
                    "Round {}: content grew {} -> {}, {} ids so far",
                    round,
                    before,
                    extent,
                    seen.len()
                );
                sleep(settings.scroll_delay).await;
            }
            LoadOutcome::TimedOut => {
                tracing::debug!("List exhausted after {} rounds, {} ids", round, seen.len());
                return Ok(seen.into_iter().collect());
            }
        }
    }

    // Still growing at the cap: keep what the last load brought in
    seen.extend(view.rendered_ids().await?);
    tracing::warn!(
        "List still growing after {} rounds, stopping with {} ids",
        settings.max_rounds,
        seen.len()
    );
    Ok(seen.into_iter().collect())
}
