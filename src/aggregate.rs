//! Fan-out to source adapters and deterministic join.
//!
//! Each adapter runs on its own thread with its own timeout. Results are
//! buffered per adapter and concatenated in declared order once every
//! adapter has either reported or timed out, so completion order never
//! affects the ranking.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::product::{retain_usable, ComparisonResult, RawProduct, Source, WeightVector};
use crate::rank::compare;
use crate::sources::default_adapters;

/// Default per-adapter timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// A capability that searches one store
///
/// Implementations must only return records with a title and a link.
/// Failures are reported as `Err` and never abort the aggregation.
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    fn fetch(&self, query: &str) -> Result<Vec<RawProduct>>;

    /// Override the aggregator's timeout for this adapter
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// What happened to one adapter during a gather
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// Number of usable records returned
    Fetched(usize),
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: Source,
    pub outcome: Outcome,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Joined output of all adapters
#[derive(Debug, Clone, Default)]
pub struct Gathered {
    /// Records in declared adapter order
    pub products: Vec<RawProduct>,
    /// One report per adapter, in declared order
    pub reports: Vec<SourceReport>,
}

impl Gathered {
    pub fn failed_sources(&self) -> Vec<Source> {
        self.reports
            .iter()
            .filter(|r| !matches!(r.outcome, Outcome::Fetched(_)))
            .map(|r| r.source)
            .collect()
    }
}

type FetchResult = std::result::Result<Vec<RawProduct>, String>;
type FetchMessage = (usize, FetchResult, Duration);

/// Runs a fixed, ordered set of adapters concurrently
pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, timeout: Duration) -> Self {
        Self { adapters, timeout }
    }

    /// Adapters built from configuration, in configured order
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.fetch.timeout();
        Self::new(default_adapters(config, timeout), timeout)
    }

    pub fn sources(&self) -> Vec<Source> {
        self.adapters.iter().map(|a| a.source()).collect()
    }

    /// Fetch from every adapter and join the results in declared order
    pub fn gather(&self, query: &str) -> Gathered {
        let started = Instant::now();
        let (tx, rx) = mpsc::channel::<FetchMessage>();

        let mut deadlines = Vec::with_capacity(self.adapters.len());
        for (index, adapter) in self.adapters.iter().enumerate() {
            let timeout = adapter.timeout().unwrap_or(self.timeout);
            deadlines.push(started + timeout);

            let adapter = Arc::clone(adapter);
            let worker_tx = tx.clone();
            let query = query.to_string();
            let spawned = thread::Builder::new()
                .name(format!("fetch-{}", adapter.source().as_str()))
                .spawn(move || {
                    let begun = Instant::now();
                    let result = panic::catch_unwind(AssertUnwindSafe(|| adapter.fetch(&query)))
                        .unwrap_or_else(|_| {
                            Err(crate::ShopError::ExtractionError("adapter panicked".into()))
                        })
                        .map_err(|e| e.to_string());
                    // Receiver is gone once the adapter timed out
                    let _ = worker_tx.send((index, result, begun.elapsed()));
                });

            if let Err(e) = spawned {
                let message = format!("could not start fetch: {}", e);
                let _ = tx.send((index, Err(message), Duration::ZERO));
            }
        }
        drop(tx);

        let mut slots: Vec<Option<(FetchResult, Duration)>> =
            (0..self.adapters.len()).map(|_| None).collect();

        loop {
            let now = Instant::now();
            let next_deadline = slots
                .iter()
                .zip(&deadlines)
                .filter(|(slot, deadline)| slot.is_none() && **deadline > now)
                .map(|(_, deadline)| *deadline)
                .min();

            let Some(deadline) = next_deadline else {
                break;
            };

            match rx.recv_timeout(deadline.saturating_duration_since(now)) {
                Ok((index, result, elapsed)) => {
                    // Reports arriving after the adapter's own deadline count as timeouts
                    if Instant::now() <= deadlines[index] {
                        slots[index] = Some((result, elapsed));
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.join(slots, started.elapsed())
    }

    fn join(
        &self,
        slots: Vec<Option<(FetchResult, Duration)>>,
        total: Duration,
    ) -> Gathered {
        let mut gathered = Gathered::default();

        for (adapter, slot) in self.adapters.iter().zip(slots) {
            let source = adapter.source();
            let report = match slot {
                Some((Ok(mut usable), elapsed)) => {
                    let dropped = retain_usable(&mut usable);
                    if dropped > 0 {
                        tracing::warn!(%source, dropped, "dropped malformed records");
                    }
                    tracing::info!(%source, count = usable.len(), ?elapsed, "source fetched");
                    let count = usable.len();
                    gathered.products.extend(usable);
                    SourceReport {
                        source,
                        outcome: Outcome::Fetched(count),
                        elapsed,
                    }
                }
                Some((Err(message), elapsed)) => {
                    tracing::warn!(%source, error = %message, "source failed");
                    SourceReport {
                        source,
                        outcome: Outcome::Failed(message),
                        elapsed,
                    }
                }
                None => {
                    let timeout = adapter.timeout().unwrap_or(self.timeout);
                    tracing::warn!(%source, ?timeout, "source timed out");
                    SourceReport {
                        source,
                        outcome: Outcome::TimedOut,
                        elapsed: timeout.min(total),
                    }
                }
            };
            gathered.reports.push(report);
        }

        gathered
    }

    /// Gather from all adapters, then rank the joined batch
    pub fn search_and_compare(
        &self,
        query: &str,
        weights: &WeightVector,
    ) -> Result<(ComparisonResult, Gathered)> {
        weights.validate()?;
        let gathered = self.gather(query);
        let result = compare(query, &gathered.products, weights)?;
        Ok((result, gathered))
    }
}

/// Search every configured store and rank the combined results
pub fn search_and_compare(query: &str, config: &Config) -> Result<ComparisonResult> {
    let aggregator = Aggregator::from_config(config);
    let (result, _) = aggregator.search_and_compare(query, &config.weights)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShopError;

    struct Fixed(Source, usize);

    impl SourceAdapter for Fixed {
        fn source(&self) -> Source {
            self.0
        }

        fn fetch(&self, query: &str) -> Result<Vec<RawProduct>> {
            Ok((0..self.1)
                .map(|i| {
                    RawProduct::new(self.0, format!("{} {}", query, i), format!("https://x.test/{}", i))
                        .with_price(10.0 * (i + 1) as f64)
                })
                .collect())
        }
    }

    struct Broken(Source);

    impl SourceAdapter for Broken {
        fn source(&self) -> Source {
            self.0
        }

        fn fetch(&self, _query: &str) -> Result<Vec<RawProduct>> {
            Err(ShopError::ExtractionError("layout changed".into()))
        }
    }

    struct Panicky;

    impl SourceAdapter for Panicky {
        fn source(&self) -> Source {
            Source::Myntra
        }

        fn fetch(&self, _query: &str) -> Result<Vec<RawProduct>> {
            panic!("selector blew up")
        }
    }

    struct Sloppy;

    impl SourceAdapter for Sloppy {
        fn source(&self) -> Source {
            Source::Snapdeal
        }

        fn fetch(&self, _query: &str) -> Result<Vec<RawProduct>> {
            Ok(vec![
                RawProduct::new(Source::Snapdeal, "", "https://s.test/1"),
                RawProduct::new(Source::Snapdeal, "kept", "https://s.test/2"),
                RawProduct::new(Source::Snapdeal, "bogus", "https://s.test/3")
                    .with_price(-100.0)
                    .with_rating(50.0),
            ])
        }
    }

    #[test]
    fn test_failed_adapter_contributes_nothing() {
        let aggregator = Aggregator::new(
            vec![Arc::new(Fixed(Source::Amazon, 2)), Arc::new(Broken(Source::Flipkart))],
            Duration::from_secs(5),
        );
        let gathered = aggregator.gather("lamp");
        assert_eq!(gathered.products.len(), 2);
        assert_eq!(gathered.reports[0].outcome, Outcome::Fetched(2));
        assert!(matches!(gathered.reports[1].outcome, Outcome::Failed(ref m) if m.contains("layout changed")));
        assert_eq!(gathered.failed_sources(), vec![Source::Flipkart]);
    }

    #[test]
    fn test_panicking_adapter_is_contained() {
        let aggregator = Aggregator::new(
            vec![Arc::new(Panicky), Arc::new(Fixed(Source::Amazon, 1))],
            Duration::from_secs(5),
        );
        let gathered = aggregator.gather("lamp");
        assert_eq!(gathered.products.len(), 1);
        assert!(matches!(gathered.reports[0].outcome, Outcome::Failed(_)));
    }

    #[test]
    fn test_unusable_records_dropped() {
        let aggregator = Aggregator::new(vec![Arc::new(Sloppy)], Duration::from_secs(5));
        let gathered = aggregator.gather("lamp");
        assert_eq!(gathered.products.len(), 1);
        assert_eq!(gathered.products[0].title, "kept");
        assert_eq!(gathered.reports[0].outcome, Outcome::Fetched(1));
    }

    #[test]
    fn test_no_adapters() {
        let aggregator = Aggregator::new(Vec::new(), Duration::from_secs(1));
        let (result, gathered) = aggregator
            .search_and_compare("lamp", &WeightVector::default())
            .unwrap();
        assert!(gathered.reports.is_empty());
        assert!(result.is_empty());
    }
}
