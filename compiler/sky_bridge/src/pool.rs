//! Fixed-size pool of reusable execution contexts.
//!
//! One context per parse worker. A context is checked out for the duration
//! of one build file and returned when its [`Checkout`] guard drops. The
//! pool never blocks: when every context is busy, `acquire` fails, since a
//! worker without a context means the worker count and pool size disagree.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use sky_eval::{exec_file, Bindings, EvalError, Globals, Loader, SharedLogSink, Thread};
use sky_graph::{BuildState, Package};
use thiserror::Error;

use crate::context;

static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(1);

const SLOT: &str = "sky.pool_slot";

/// Which pool a context was created by, and its index there.
struct PoolSlot {
    pool: usize,
    index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("the execution context pool has no contexts")]
    Empty,
    #[error("all {size} execution contexts are in use")]
    Exhausted { size: usize },
}

pub struct ContextPool {
    id: usize,
    size: usize,
    globals: Globals,
    idle_tx: Sender<Thread>,
    idle_rx: Receiver<Thread>,
    busy: Mutex<Vec<bool>>,
}

impl ContextPool {
    /// Create `size` contexts sharing `loader` and `log`.
    pub fn new(size: usize, globals: Globals, loader: Arc<dyn Loader>, log: SharedLogSink) -> Self {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let (idle_tx, idle_rx) = channel::bounded(size.max(1));
        for index in 0..size {
            let mut thread = Thread::new(format!("sky-{id}-{index}"));
            thread.set_loader(Arc::clone(&loader));
            thread.set_log_sink(log.clone());
            thread.set_local(SLOT, Arc::new(PoolSlot { pool: id, index }));
            if idle_tx.try_send(thread).is_err() {
                tracing::error!(pool = id, index, "context pool channel rejected a new context");
            }
        }
        tracing::debug!(pool = id, size, "created execution context pool");
        ContextPool {
            id,
            size,
            globals,
            idle_tx,
            idle_rx,
            busy: Mutex::new(vec![false; size]),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Contexts currently available.
    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Take an idle context without waiting.
    pub fn acquire(&self) -> Result<Checkout<'_>, PoolError> {
        if self.size == 0 {
            return Err(PoolError::Empty);
        }
        let thread = self
            .idle_rx
            .try_recv()
            .map_err(|_| PoolError::Exhausted { size: self.size })?;
        if let Some(index) = self.own_index(&thread) {
            if let Some(busy) = self.busy.lock().get_mut(index) {
                *busy = true;
            }
        }
        tracing::trace!(context = thread.name(), "acquired context");
        Ok(Checkout {
            pool: self,
            thread: Some(thread),
        })
    }

    /// Return a context taken with [`Checkout::detach`].
    ///
    /// The context's package and build state are unbound before it goes
    /// back to the idle set.
    ///
    /// Contexts from another pool, and contexts not currently checked out,
    /// are handed back to the caller.
    pub fn release(&self, mut thread: Thread) -> Option<Thread> {
        let Some(index) = self.own_index(&thread) else {
            tracing::warn!(context = thread.name(), "released context belongs to another pool");
            return Some(thread);
        };
        {
            let mut busy = self.busy.lock();
            match busy.get_mut(index) {
                Some(slot) if *slot => *slot = false,
                _ => {
                    tracing::warn!(context = thread.name(), "released context was not checked out");
                    return Some(thread);
                }
            }
        }
        context::unbind(&mut thread);
        tracing::trace!(context = thread.name(), "released context");
        match self.idle_tx.try_send(thread) {
            Ok(()) => None,
            Err(err) => Some(err.into_inner()),
        }
    }

    fn own_index(&self, thread: &Thread) -> Option<usize> {
        let slot = thread.local::<PoolSlot>(SLOT)?;
        (slot.pool == self.id).then_some(slot.index)
    }
}

impl fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextPool")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("idle", &self.idle())
            .finish_non_exhaustive()
    }
}

/// A checked-out context; returns itself to the pool on drop.
pub struct Checkout<'p> {
    pool: &'p ContextPool,
    thread: Option<Thread>,
}

impl<'p> Checkout<'p> {
    /// Bind the context to `package` for the build file about to run.
    pub fn bind(mut self, package: Arc<Package>, state: Arc<BuildState>) -> BoundContext<'p> {
        context::bind(&mut self, package, state);
        BoundContext { checkout: self }
    }

    /// Take the context out of the guard. It stays checked out until
    /// handed to [`ContextPool::release`].
    pub fn detach(mut self) -> Thread {
        self.thread
            .take()
            .unwrap_or_else(|| unreachable!("checkout holds its context until dropped"))
    }
}

impl Deref for Checkout<'_> {
    type Target = Thread;

    fn deref(&self) -> &Thread {
        self.thread
            .as_ref()
            .unwrap_or_else(|| unreachable!("checkout holds its context until dropped"))
    }
}

impl DerefMut for Checkout<'_> {
    fn deref_mut(&mut self) -> &mut Thread {
        self.thread
            .as_mut()
            .unwrap_or_else(|| unreachable!("checkout holds its context until dropped"))
    }
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            if let Some(thread) = self.pool.release(thread) {
                tracing::error!(context = thread.name(), "context could not be returned to its pool");
            }
        }
    }
}

/// A context bound to one package, ready to execute its build file.
pub struct BoundContext<'p> {
    checkout: Checkout<'p>,
}

impl BoundContext<'_> {
    pub fn package(&self) -> Result<Arc<Package>, EvalError> {
        context::current_package(&self.checkout)
    }

    /// Execute `source` against the pool's globals.
    pub fn exec_file(&mut self, file: &str, source: &str) -> Result<Bindings, EvalError> {
        let globals = self.checkout.pool.globals.clone();
        exec_file(&mut self.checkout, file, source, &globals)
    }

    pub fn thread(&self) -> &Thread {
        &self.checkout
    }
}

#[cfg(test)]
mod tests;
