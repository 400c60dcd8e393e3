//! Crawl frontier: discovery, deduplication, and scheduling of crawl units
//!
//! The frontier owns every unit's lifecycle state. Admission happens at most
//! once per canonical URL key, which is what makes the cycle-prone discovery
//! graph safe to walk without depth limits. Workers pull pending units with
//! [`Frontier::next`]; each unit is handed to exactly one worker.

mod scope;
mod unit;

pub use scope::ScopeFilter;
pub use unit::{CrawlUnit, ResourceClass, UnitState};

use crate::archive::ArchiveTimestamp;
use crate::manifest::Outcome;
use crate::url::{canonicalize, UrlKey};
use crate::{MirrorError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;
use url::Url;

/// A pending unit handed to a worker. Snapshot of the fields the worker
/// needs; state stays with the frontier.
#[derive(Debug, Clone)]
pub struct PendingUnit {
    /// Deduplication key.
    pub key: UrlKey,
    /// Canonical URL to mirror.
    pub url: Url,
    /// Link distance from the seed.
    pub depth: u32,
    /// Resource class known at discovery.
    pub class: ResourceClass,
}

/// A successfully written unit, as seen by the consolidation post-pass.
#[derive(Debug, Clone)]
pub struct WrittenUnit {
    /// Canonical URL.
    pub url: Url,
    /// Resource class.
    pub class: ResourceClass,
    /// Output-root-relative path of the written file.
    pub local_path: String,
    /// Admission sequence number (discovery order).
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct FrontierInner {
    units: HashMap<UrlKey, CrawlUnit>,
    queue: VecDeque<UrlKey>,
    in_flight: usize,
    admitted: u64,
    next_sequence: u64,
}

/// The shared work set.
///
/// All mutation happens under one mutex, which serializes admission per key:
/// concurrent discovery of the same reference from two pages can never
/// create two units.
pub struct Frontier {
    scope: ScopeFilter,
    max_pages: u64,
    ignore_query: bool,
    stopped: AtomicBool,
    notify: Notify,
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    /// Creates an empty frontier.
    ///
    /// `max_pages` of 0 means unlimited.
    pub fn new(scope: ScopeFilter, max_pages: u64, ignore_query: bool) -> Self {
        Self {
            scope,
            max_pages,
            ignore_query,
            stopped: AtomicBool::new(false),
            notify: Notify::new(),
            inner: Mutex::new(FrontierInner::default()),
        }
    }

    /// Seeds the frontier with a starting URL at depth 0.
    ///
    /// Seeds bypass the scope filter (they define the scope) but share the
    /// canonical key space with discovered units.
    pub fn seed(&self, url: &Url) -> Result<()> {
        let (canonical, key) = canonicalize(url, self.ignore_query)?;

        let mut inner = self.inner.lock().unwrap();
        self.admit(&mut inner, canonical, key, ResourceClass::Html, None, 0);
        drop(inner);

        self.notify.notify_waiters();
        Ok(())
    }

    /// Offers a discovered reference for admission.
    ///
    /// Returns `true` when a new unit was created. Re-discovery of a known
    /// key is a no-op; out-of-scope references, excluded classes, the page
    /// cap, and the stop signal all reject admission silently.
    pub fn discover(
        &self,
        url: &Url,
        class: ResourceClass,
        referrer: &UrlKey,
        depth: u32,
    ) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        if !self.scope.admits(url, class) {
            return false;
        }

        let (canonical, key) = match canonicalize(url, self.ignore_query) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::debug!("Skipping uncanonicalizable reference {}: {}", url, e);
                return false;
            }
        };

        let mut inner = self.inner.lock().unwrap();

        if inner.units.contains_key(&key) {
            return false;
        }
        if self.max_pages > 0 && inner.admitted >= self.max_pages {
            tracing::debug!("Page cap reached, not admitting {}", canonical);
            return false;
        }

        self.admit(
            &mut inner,
            canonical,
            key,
            class,
            Some(referrer.clone()),
            depth,
        );
        drop(inner);

        self.notify.notify_waiters();
        true
    }

    fn admit(
        &self,
        inner: &mut FrontierInner,
        url: Url,
        key: UrlKey,
        class: ResourceClass,
        referrer: Option<UrlKey>,
        depth: u32,
    ) {
        if inner.units.contains_key(&key) {
            return;
        }

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.admitted += 1;

        tracing::debug!("Admitted {} (class {}, depth {})", url, class, depth);

        inner.units.insert(
            key.clone(),
            CrawlUnit {
                url,
                key: key.clone(),
                depth,
                referrer,
                sequence,
                class,
                state: UnitState::Queued,
                timestamp: None,
                local_path: None,
                size: 0,
            },
        );
        inner.queue.push_back(key);
    }

    /// Hands out the next pending unit, suspending while the queue is empty
    /// but work is still in flight (in-flight units may discover more).
    ///
    /// Returns `None` once the frontier has drained (queue empty and
    /// nothing in flight), or immediately after [`Frontier::halt`].
    pub async fn next(&self) -> Option<PendingUnit> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut inner = self.inner.lock().unwrap();

                if !self.stopped.load(Ordering::SeqCst) {
                    if let Some(key) = inner.queue.pop_front() {
                        inner.in_flight += 1;
                        let unit = inner
                            .units
                            .get_mut(&key)
                            .expect("queued key missing from unit map");
                        unit.state = UnitState::Resolving;
                        return Some(PendingUnit {
                            key: unit.key.clone(),
                            url: unit.url.clone(),
                            depth: unit.depth,
                            class: unit.class,
                        });
                    }
                }

                if inner.in_flight == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Records forward progress for an in-flight unit.
    pub fn mark(&self, key: &UrlKey, state: UnitState) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let unit = inner
            .units
            .get_mut(key)
            .ok_or_else(|| MirrorError::UnknownUnit(key.to_string()))?;

        if !unit.state.can_transition_to(state) {
            return Err(MirrorError::InvalidTransition {
                from: unit.state,
                to: state,
            });
        }
        unit.state = state;
        Ok(())
    }

    /// Moves an in-flight unit to its terminal state and releases its
    /// in-flight slot, waking any worker blocked in [`Frontier::next`].
    pub fn complete(
        &self,
        key: &UrlKey,
        outcome: &Outcome,
        local_path: Option<String>,
        timestamp: Option<ArchiveTimestamp>,
        size: u64,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let unit = inner
            .units
            .get_mut(key)
            .ok_or_else(|| MirrorError::UnknownUnit(key.to_string()))?;

        let terminal = if outcome.is_success() {
            UnitState::Written
        } else {
            UnitState::Failed
        };
        if !unit.state.can_transition_to(terminal) {
            return Err(MirrorError::InvalidTransition {
                from: unit.state,
                to: terminal,
            });
        }

        unit.state = terminal;
        unit.local_path = local_path;
        unit.timestamp = timestamp;
        unit.size = size;

        inner.in_flight -= 1;
        drop(inner);

        self.notify.notify_waiters();
        Ok(())
    }

    /// Stops admission and dequeuing. In-flight units finish normally.
    pub fn halt(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Whether the stop signal fired.
    pub fn is_halted(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Successfully written units in discovery order.
    pub fn written_units(&self) -> Vec<WrittenUnit> {
        let inner = self.inner.lock().unwrap();
        let mut written: Vec<WrittenUnit> = inner
            .units
            .values()
            .filter(|u| u.state == UnitState::Written)
            .filter_map(|u| {
                u.local_path.as_ref().map(|path| WrittenUnit {
                    url: u.url.clone(),
                    class: u.class,
                    local_path: path.clone(),
                    sequence: u.sequence,
                })
            })
            .collect();
        written.sort_by_key(|u| u.sequence);
        written
    }

    /// Units admitted so far.
    pub fn admitted(&self) -> u64 {
        self.inner.lock().unwrap().admitted
    }

    /// Units waiting in the queue.
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FailureKind;

    fn frontier() -> Frontier {
        Frontier::new(
            ScopeFilter::new("example.org", true, None, true, false),
            0,
            false,
        )
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    async fn take(f: &Frontier) -> PendingUnit {
        f.next().await.expect("expected a pending unit")
    }

    #[tokio::test]
    async fn test_seed_and_drain() {
        let f = frontier();
        f.seed(&url("https://example.org/")).unwrap();

        let unit = take(&f).await;
        assert_eq!(unit.url.as_str(), "https://example.org/");
        assert_eq!(unit.depth, 0);

        f.complete(&unit.key, &Outcome::Written, Some("index.html".into()), None, 10)
            .unwrap();
        assert!(f.next().await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_discovery_is_single_unit() {
        let f = frontier();
        f.seed(&url("https://example.org/")).unwrap();
        let seed = take(&f).await;

        let target = url("https://example.org/about");
        assert!(f.discover(&target, ResourceClass::Html, &seed.key, 1));
        assert!(!f.discover(&target, ResourceClass::Html, &seed.key, 1));
        // Same key from a different referrer and fragment: still a no-op.
        let with_fragment = url("https://example.org/about#team");
        assert!(!f.discover(&with_fragment, ResourceClass::Html, &seed.key, 2));

        assert_eq!(f.admitted(), 2);
    }

    #[tokio::test]
    async fn test_out_of_scope_rejected() {
        let f = frontier();
        f.seed(&url("https://example.org/")).unwrap();
        let seed = take(&f).await;

        assert!(!f.discover(&url("https://other.com/x"), ResourceClass::Html, &seed.key, 1));
        assert_eq!(f.admitted(), 1);
    }

    #[tokio::test]
    async fn test_page_cap_halts_admission() {
        let f = Frontier::new(
            ScopeFilter::new("example.org", true, None, true, false),
            2,
            false,
        );
        f.seed(&url("https://example.org/")).unwrap();
        let seed = take(&f).await;

        assert!(f.discover(&url("https://example.org/a"), ResourceClass::Html, &seed.key, 1));
        assert!(!f.discover(&url("https://example.org/b"), ResourceClass::Html, &seed.key, 1));
        assert_eq!(f.admitted(), 2);
    }

    #[tokio::test]
    async fn test_next_blocks_until_inflight_discovers() {
        let f = std::sync::Arc::new(frontier());
        f.seed(&url("https://example.org/")).unwrap();
        let seed = take(&f).await;

        // A second consumer is blocked: queue empty, one unit in flight.
        let f2 = f.clone();
        let waiter = tokio::spawn(async move { f2.next().await });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        // The in-flight unit discovers a link, which unblocks the waiter.
        f.discover(&url("https://example.org/a"), ResourceClass::Html, &seed.key, 1);
        let got = waiter.await.unwrap().unwrap();
        assert_eq!(got.url.as_str(), "https://example.org/a");

        f.complete(&seed.key, &Outcome::Written, None, None, 0).unwrap();
        f.complete(&got.key, &Outcome::Written, None, None, 0).unwrap();
        assert!(f.next().await.is_none());
    }

    #[tokio::test]
    async fn test_halt_stops_dequeue_but_not_inflight() {
        let f = frontier();
        f.seed(&url("https://example.org/")).unwrap();
        let seed = take(&f).await;

        f.seed(&url("https://example.org/queued")).unwrap();
        f.halt();

        // Queued work is no longer handed out even though it exists...
        assert!(!f.discover(&url("https://example.org/x"), ResourceClass::Html, &seed.key, 1));

        // ...but the in-flight unit completes normally.
        f.complete(&seed.key, &Outcome::Written, None, None, 0).unwrap();
        assert!(f.next().await.is_none());
    }

    #[tokio::test]
    async fn test_no_backward_transition() {
        let f = frontier();
        f.seed(&url("https://example.org/")).unwrap();
        let unit = take(&f).await;

        f.mark(&unit.key, UnitState::Fetching).unwrap();
        let result = f.mark(&unit.key, UnitState::Resolving);
        assert!(matches!(
            result,
            Err(MirrorError::InvalidTransition { .. })
        ));

        f.complete(&unit.key, &Outcome::Failed(FailureKind::Timeout), None, None, 0)
            .unwrap();
        let result = f.mark(&unit.key, UnitState::Fetching);
        assert!(matches!(
            result,
            Err(MirrorError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_written_units_in_discovery_order() {
        let f = frontier();
        f.seed(&url("https://example.org/")).unwrap();
        let seed = take(&f).await;
        f.discover(&url("https://example.org/a.css"), ResourceClass::Stylesheet, &seed.key, 1);
        f.discover(&url("https://example.org/b.css"), ResourceClass::Stylesheet, &seed.key, 1);

        let a = take(&f).await;
        let b = take(&f).await;

        // Complete out of discovery order.
        f.complete(&b.key, &Outcome::Written, Some("b.css".into()), None, 1).unwrap();
        f.complete(&a.key, &Outcome::Written, Some("a.css".into()), None, 1).unwrap();
        f.complete(&seed.key, &Outcome::Written, Some("index.html".into()), None, 1)
            .unwrap();

        let written = f.written_units();
        let paths: Vec<_> = written.iter().map(|w| w.local_path.as_str()).collect();
        assert_eq!(paths, vec!["index.html", "a.css", "b.css"]);
    }

    #[tokio::test]
    async fn test_failed_units_not_in_written_set() {
        let f = frontier();
        f.seed(&url("https://example.org/")).unwrap();
        let unit = take(&f).await;
        f.complete(&unit.key, &Outcome::Failed(FailureKind::NotArchived), None, None, 0)
            .unwrap();
        assert!(f.written_units().is_empty());
    }
}
