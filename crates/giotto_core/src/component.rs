//! Component registry: persistent bindings and one-shot waits keyed by
//! custom id.
//!
//! Both live behind one mutex so a component event observes a consistent
//! snapshot of waiters. Waiter removal is owned by a guard held across the
//! receive so timeouts and caller cancellation both clean up the slot.

use crate::check::{CheckList, CheckPredicate};
use crate::context::ComponentContext;
use crate::handler::ComponentHandler;
use giotto_error::{GiottoError, GiottoResult, WaitError, WaitErrorKind};
use giotto_model::ComponentKind;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, instrument, trace};

/// One persistent component binding.
pub struct ComponentBinding {
    custom_id: String,
    kind: Option<ComponentKind>,
    handler: Arc<dyn ComponentHandler>,
    checks: CheckList,
}

impl fmt::Debug for ComponentBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBinding")
            .field("custom_id", &self.custom_id)
            .field("kind", &self.kind)
            .finish()
    }
}

impl ComponentBinding {
    /// Bind a handler to a custom id for every component kind.
    pub fn new(custom_id: impl Into<String>, handler: Arc<dyn ComponentHandler>) -> Self {
        Self {
            custom_id: custom_id.into(),
            kind: None,
            handler,
            checks: CheckList::new(),
        }
    }

    /// Restrict the binding to one component kind.
    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Append a check gating this binding.
    pub fn with_check(mut self, check: CheckPredicate) -> Self {
        self.checks.add(check);
        self
    }

    /// Custom id routing key.
    pub fn custom_id(&self) -> &str {
        &self.custom_id
    }

    /// Kind filter; `None` accepts every kind.
    pub fn kind(&self) -> Option<ComponentKind> {
        self.kind
    }

    /// The handler invoked when the binding matches.
    pub fn handler(&self) -> &Arc<dyn ComponentHandler> {
        &self.handler
    }

    /// Checks gating this binding.
    pub fn checks(&self) -> &CheckList {
        &self.checks
    }

    /// Whether this binding accepts an event of the given kind.
    pub fn accepts(&self, kind: ComponentKind) -> bool {
        self.kind.is_none() || self.kind == Some(kind)
    }
}

/// Predicate deciding whether a component event fulfills a parked wait.
pub type WaitFilter = Arc<dyn Fn(&ComponentContext) -> GiottoResult<bool> + Send + Sync>;

struct PendingWait {
    id: u64,
    sender: oneshot::Sender<GiottoResult<ComponentContext>>,
    filter: WaitFilter,
}

impl fmt::Debug for PendingWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWait").field("id", &self.id).finish()
    }
}

#[derive(Debug, Default)]
struct Buckets {
    bindings: HashMap<String, Vec<Arc<ComponentBinding>>>,
    waits: HashMap<String, Vec<PendingWait>>,
    global_waits: Vec<PendingWait>,
}

/// Registry for component bindings and one-shot waiters.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    buckets: Mutex<Buckets>,
    next_wait_id: AtomicU64,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Buckets> {
        match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add a persistent binding. Multiple bindings may share a custom id;
    /// all matching bindings run on each event.
    #[instrument(skip(self, binding), fields(custom_id = binding.custom_id()))]
    pub fn bind(&self, binding: ComponentBinding) {
        let mut buckets = self.lock();
        buckets
            .bindings
            .entry(binding.custom_id.clone())
            .or_default()
            .push(Arc::new(binding));
        debug!("component binding registered");
    }

    /// Remove every binding under a custom id, returning how many were
    /// removed.
    pub fn unbind(&self, custom_id: &str) -> usize {
        let mut buckets = self.lock();
        buckets
            .bindings
            .remove(custom_id)
            .map(|bindings| bindings.len())
            .unwrap_or(0)
    }

    /// Bindings registered under a custom id.
    pub fn bindings_for(&self, custom_id: &str) -> Vec<Arc<ComponentBinding>> {
        let buckets = self.lock();
        buckets
            .bindings
            .get(custom_id)
            .map(|bindings| bindings.to_vec())
            .unwrap_or_default()
    }

    /// Number of waiters currently parked, scoped and global combined.
    pub fn pending_waits(&self) -> usize {
        let buckets = self.lock();
        buckets.waits.values().map(Vec::len).sum::<usize>() + buckets.global_waits.len()
    }

    /// Park until a component event matches.
    ///
    /// `custom_id` of `None` observes every component event. The filter runs
    /// under the registry lock and must not block; returning `Ok(true)`
    /// fulfills the wait, `Ok(false)` leaves it parked, and an error is
    /// delivered to the waiter in place of a context. With no timeout the
    /// wait parks indefinitely.
    #[instrument(skip(self, filter))]
    pub async fn wait_for(
        self: &Arc<Self>,
        custom_id: Option<String>,
        filter: WaitFilter,
        timeout: Option<Duration>,
    ) -> GiottoResult<ComponentContext> {
        let (sender, receiver) = oneshot::channel();
        let id = self.next_wait_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut buckets = self.lock();
            let wait = PendingWait { id, sender, filter };
            match &custom_id {
                Some(key) => buckets.waits.entry(key.clone()).or_default().push(wait),
                None => buckets.global_waits.push(wait),
            }
        }
        let _guard = WaitGuard {
            registry: Arc::downgrade(self),
            scope: custom_id,
            id,
        };

        let outcome = async {
            match receiver.await {
                Ok(result) => result,
                Err(_) => Err(GiottoError::from(WaitError::new(WaitErrorKind::Cancelled))),
            }
        };
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, outcome).await {
                Ok(result) => result,
                Err(_) => Err(WaitError::new(WaitErrorKind::Timeout).into()),
            },
            None => outcome.await,
        }
    }

    /// Offer a component event to every parked waiter, returning how many
    /// were fulfilled.
    ///
    /// Scoped waiters under the event's custom id are scanned first, then
    /// global waiters. Waiters whose receiving side has gone away are
    /// discarded during the scan.
    #[instrument(skip(self, ctx), fields(custom_id = ctx.custom_id()))]
    pub fn scan_waiters(&self, ctx: &ComponentContext) -> usize {
        let mut buckets = self.lock();
        let mut fulfilled = 0;
        if let Some(waits) = buckets.waits.get_mut(ctx.custom_id()) {
            fulfilled += drain_matching(waits, ctx);
            if waits.is_empty() {
                buckets.waits.remove(ctx.custom_id());
            }
        }
        fulfilled += drain_matching(&mut buckets.global_waits, ctx);
        trace!(fulfilled, "waiter scan complete");
        fulfilled
    }

    fn remove_wait(&self, scope: Option<&str>, id: u64) {
        let mut buckets = self.lock();
        match scope {
            Some(key) => {
                if let Some(waits) = buckets.waits.get_mut(key) {
                    waits.retain(|wait| wait.id != id);
                    if waits.is_empty() {
                        buckets.waits.remove(key);
                    }
                }
            }
            None => buckets.global_waits.retain(|wait| wait.id != id),
        }
    }
}

enum Verdict {
    Keep,
    Prune,
    Fulfill,
    Fail(GiottoError),
}

// Decide every waiter's fate first, then remove; a filter must never observe
// a bucket mid-mutation.
fn drain_matching(waits: &mut Vec<PendingWait>, ctx: &ComponentContext) -> usize {
    let verdicts: Vec<Verdict> = waits
        .iter()
        .map(|wait| {
            if wait.sender.is_closed() {
                return Verdict::Prune;
            }
            match (wait.filter)(ctx) {
                Ok(true) => Verdict::Fulfill,
                Ok(false) => Verdict::Keep,
                Err(error) => Verdict::Fail(error),
            }
        })
        .collect();

    let mut fulfilled = 0;
    let mut index = 0;
    for verdict in verdicts {
        match verdict {
            Verdict::Keep => index += 1,
            Verdict::Prune => {
                waits.remove(index);
            }
            Verdict::Fulfill => {
                let wait = waits.remove(index);
                if wait.sender.send(Ok(ctx.clone())).is_ok() {
                    fulfilled += 1;
                }
            }
            Verdict::Fail(error) => {
                let wait = waits.remove(index);
                let _ = wait.sender.send(Err(error));
            }
        }
    }
    fulfilled
}

/// Removes the parked waiter when the waiting future is dropped, whether by
/// timeout, caller cancellation, or normal completion.
struct WaitGuard {
    registry: Weak<ComponentRegistry>,
    scope: Option<String>,
    id: u64,
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_wait(self.scope.as_deref(), self.id);
        }
    }
}

/// Accept every component event.
pub fn any_component() -> WaitFilter {
    Arc::new(|_| Ok(true))
}

/// Accept events of one component kind.
pub fn kind_filter(kind: ComponentKind) -> WaitFilter {
    Arc::new(move |ctx| Ok(ctx.component_kind() == kind))
}
