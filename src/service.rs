//! Background generation with request coalescing.
//!
//! [`RenderService`] owns one worker thread. Requests go through a
//! single-slot [`CoalescingInbox`]: posting while a request is still waiting
//! replaces it, so the worker only ever compiles the most recent parameters.
//! Superseded requests produce no events.
//!
//! View updates never touch the worker. They read the last successful
//! [`Generation`] from an explicit shared slot and return immediately, even
//! while a compilation is in flight.

use crate::compiler::CompilerConfig;
use crate::error::GenerationError;
use crate::fit::{Frame, Surface, ViewState};
use crate::request::{Generation, GenerationRequest, generate};
use crate::turtle::BoundingBox;
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

/// A single-slot mailbox where the newest value wins.
pub struct CoalescingInbox<T> {
    slot: Mutex<InboxSlot<T>>,
    ready: Condvar,
}

struct InboxSlot<T> {
    pending: Option<T>,
    closed: bool,
}

impl<T> Default for CoalescingInbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CoalescingInbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(InboxSlot {
                pending: None,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Stores `value`, returning the value it superseded, if any.
    ///
    /// Once closed, nothing is stored and `value` is handed straight back.
    pub fn post(&self, value: T) -> Option<T> {
        let mut slot = self.slot.lock();
        if slot.closed {
            return Some(value);
        }
        let superseded = slot.pending.replace(value);
        drop(slot);
        self.ready.notify_one();
        superseded
    }

    /// Blocks until a value is available. Returns `None` once closed.
    pub fn take(&self) -> Option<T> {
        let mut slot = self.slot.lock();
        loop {
            if slot.closed {
                return None;
            }
            if let Some(value) = slot.pending.take() {
                return Some(value);
            }
            self.ready.wait(&mut slot);
        }
    }

    /// Takes the pending value without waiting.
    pub fn try_take(&self) -> Option<T> {
        self.slot.lock().pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().pending.is_some()
    }

    /// Wakes every waiter and discards the pending value. Later posts are
    /// refused.
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        slot.closed = true;
        slot.pending = None;
        self.ready.notify_all();
    }
}

/// Progress reported by the worker, tagged with the ticket returned by
/// [`RenderService::submit`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RenderEvent {
    Generating {
        ticket: u64,
    },
    Complete {
        ticket: u64,
        draw_segments: u64,
        bounds: BoundingBox,
        elapsed_ms: f64,
    },
    Refused {
        ticket: u64,
        error: GenerationError,
    },
}

impl RenderEvent {
    pub fn ticket(&self) -> u64 {
        match self {
            RenderEvent::Generating { ticket }
            | RenderEvent::Complete { ticket, .. }
            | RenderEvent::Refused { ticket, .. } => *ticket,
        }
    }
}

struct Job {
    ticket: u64,
    request: GenerationRequest,
}

type LastResult = Arc<RwLock<Option<Arc<Generation>>>>;

/// Compiles requests on a background thread and serves view updates from
/// the last successful result.
pub struct RenderService {
    inbox: Arc<CoalescingInbox<Job>>,
    last: LastResult,
    surface: RwLock<Surface>,
    events: Receiver<RenderEvent>,
    next_ticket: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

impl RenderService {
    /// Starts the worker thread.
    pub fn spawn(config: CompilerConfig, surface: Surface) -> std::io::Result<Self> {
        let inbox = Arc::new(CoalescingInbox::new());
        let last: LastResult = Arc::new(RwLock::new(None));
        let (sender, events) = unbounded();

        let worker = {
            let inbox = Arc::clone(&inbox);
            let last = Arc::clone(&last);
            thread::Builder::new()
                .name("lsys-render".into())
                .spawn(move || run_worker(&inbox, &last, &sender, &config))?
        };

        Ok(Self {
            inbox,
            last,
            surface: RwLock::new(surface),
            events,
            next_ticket: AtomicU64::new(1),
            worker: Some(worker),
        })
    }

    /// Queues `request`, replacing any request still waiting. Returns the
    /// ticket that events for this request will carry.
    pub fn submit(&self, request: GenerationRequest) -> u64 {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        if let Some(dropped) = self.inbox.post(Job { ticket, request }) {
            tracing::debug!(
                dropped = dropped.ticket,
                by = ticket,
                "superseded pending request"
            );
        }
        ticket
    }

    pub fn events(&self) -> &Receiver<RenderEvent> {
        &self.events
    }

    /// The most recent successful generation.
    pub fn last_generation(&self) -> Option<Arc<Generation>> {
        self.last.read().clone()
    }

    pub fn resize(&self, surface: Surface) {
        *self.surface.write() = surface;
    }

    pub fn surface(&self) -> Surface {
        *self.surface.read()
    }

    /// Fits the last successful path for `view`, or `None` if nothing has
    /// been generated yet. Never waits on the worker.
    pub fn frame(&self, view: &ViewState) -> Option<Frame> {
        let last = self.last.read();
        let generation = last.as_ref()?;
        Some(Frame::new(generation.bounds(), &self.surface.read(), view))
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.inbox.close();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("render worker panicked");
        }
    }
}

fn run_worker(
    inbox: &CoalescingInbox<Job>,
    last: &RwLock<Option<Arc<Generation>>>,
    events: &Sender<RenderEvent>,
    config: &CompilerConfig,
) {
    while let Some(Job { ticket, request }) = inbox.take() {
        let _ = events.send(RenderEvent::Generating { ticket });
        let event = match generate(&request, config) {
            Ok(generation) => {
                let event = RenderEvent::Complete {
                    ticket,
                    draw_segments: generation.draw_segment_count(),
                    bounds: *generation.bounds(),
                    elapsed_ms: generation.elapsed_ms,
                };
                *last.write() = Some(Arc::new(generation));
                event
            }
            Err(error) => {
                tracing::warn!(ticket, %error, "generation refused");
                RenderEvent::Refused { ticket, error }
            }
        };
        let _ = events.send(event);
    }
    tracing::debug!("render worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_post_wins() {
        let inbox = CoalescingInbox::new();
        assert_eq!(inbox.post(1), None);
        assert_eq!(inbox.post(2), Some(1));
        assert!(inbox.is_pending());
        assert_eq!(inbox.take(), Some(2));
        assert_eq!(inbox.try_take(), None);
    }

    #[test]
    fn close_wakes_a_blocked_taker() {
        let inbox = Arc::new(CoalescingInbox::<u32>::new());
        let taker = {
            let inbox = Arc::clone(&inbox);
            thread::spawn(move || inbox.take())
        };
        inbox.close();
        assert_eq!(taker.join().unwrap(), None);
        assert_eq!(inbox.post(5), Some(5));
        assert!(!inbox.is_pending());
        assert_eq!(inbox.take(), None);
    }

    #[test]
    fn take_blocks_until_post() {
        let inbox = Arc::new(CoalescingInbox::new());
        let taker = {
            let inbox = Arc::clone(&inbox);
            thread::spawn(move || inbox.take())
        };
        inbox.post("hilbert");
        assert_eq!(taker.join().unwrap(), Some("hilbert"));
    }

    #[test]
    fn superseded_ticket_produces_no_events() {
        let service =
            RenderService::spawn(CompilerConfig::default(), Surface::new(800.0, 600.0)).unwrap();
        let request = |key: &str| crate::preset(key).unwrap().request();
        let timeout = std::time::Duration::from_secs(30);

        // Holding the result slot parks the worker right after it compiles.
        let held = service.last.read();
        let first = service.submit(request("koch"));
        assert_eq!(
            service.events().recv_timeout(timeout),
            Ok(RenderEvent::Generating { ticket: first })
        );
        let superseded = service.submit(request("dragon"));
        let last = service.submit(request("hilbert"));
        assert!(service.inbox.is_pending());
        drop(held);

        let mut seen = Vec::new();
        loop {
            let event = service.events().recv_timeout(timeout).unwrap();
            let done = matches!(event, RenderEvent::Complete { ticket, .. } if ticket == last);
            seen.push(event.ticket());
            if done {
                break;
            }
        }
        assert_eq!(seen, [first, last, last]);
        assert!(!seen.contains(&superseded));
    }
}
