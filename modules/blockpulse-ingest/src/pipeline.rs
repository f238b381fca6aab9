//! Pipeline orchestrator: Guarding → Fetching → Writing → CursorUpdate.
//!
//! The guard can short-circuit the whole run. Once fetch has been reached
//! the cursor is updated unconditionally, even when zero rows came back or
//! the write failed. Only configuration errors escape to the caller; every
//! transient failure degrades to a visible count discrepancy.

use chrono::{Duration, Utc};
use tracing::{error, info};
use twitter_client::TwitterClient;

use blockpulse_common::{AppConfig, IngestError, Post};

use crate::guard;
use crate::normalize::normalize;
use crate::sink::PostSink;
use crate::source::{self, FetchMode, PostSearcher};

/// Counts from one ingest run.
#[derive(Debug, Default)]
pub struct IngestStats {
    pub skipped: bool,
    pub fetched: usize,
    pub inserted: u64,
    pub source_mode: Option<FetchMode>,
}

impl IngestStats {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

impl std::fmt::Display for IngestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.skipped {
            return write!(f, "Skipped (ran within the minimum interval)");
        }
        writeln!(f, "\n=== Ingest Run Complete ===")?;
        if let Some(mode) = self.source_mode {
            writeln!(f, "Source:   {mode}")?;
        }
        writeln!(f, "Fetched:  {}", self.fetched)?;
        write!(f, "Inserted: {}", self.inserted)
    }
}

/// Run the pipeline once against the given sink.
pub async fn run(config: &AppConfig, sink: &dyn PostSink) -> Result<IngestStats, IngestError> {
    // Guarding
    if !guard::should_run(
        &config.cursor_path,
        config.force_run,
        config.min_run_interval_secs,
    ) {
        return Ok(IngestStats::skipped());
    }

    // Fetching — upstream failures degrade inside the source adapter.
    let since = Utc::now() - Duration::hours(config.since_hours);
    let client = config
        .twitter_bearer_token
        .clone()
        .map(TwitterClient::new);
    let searcher = client.as_ref().map(|c| c as &dyn PostSearcher);
    let fetched = source::fetch(searcher, &config.keywords, since, config.limit).await;

    let posts: Vec<Post> = fetched.candidates.into_iter().map(normalize).collect();
    let mut stats = IngestStats {
        fetched: posts.len(),
        source_mode: Some(fetched.mode),
        ..IngestStats::default()
    };

    // Writing — sink failures are logged and reflected in the counts.
    if posts.is_empty() {
        info!("No posts fetched");
    } else {
        match sink.write(&posts).await {
            Ok(inserted) => stats.inserted = inserted,
            Err(e) => error!(error = %e, "Write failed, no rows persisted this run"),
        }
    }

    // CursorUpdate — unconditional once fetch was attempted.
    if let Err(e) = guard::write_cursor(&config.cursor_path) {
        error!(error = %e, "Failed to write run cursor");
    }

    Ok(stats)
}
