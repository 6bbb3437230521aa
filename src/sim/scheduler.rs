/// Cooperative timer facility.
///
/// Time only moves when the owner calls `advance(dt)`; due timers are then
/// handed out one by one through `poll()`, earliest deadline first. Because
/// each payload is delivered before the next one is looked up, a handler
/// that cancels another timer (e.g. intro completion cancelling the freeze
/// interval) takes effect within the same tick.
///
/// Handles are never reused, so cancelling a stale handle is a harmless no-op.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Timer<T> {
    handle: TimerHandle,
    due: u64,
    interval: Option<u64>,
    payload: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: u64,
    horizon: u64,
    next_id: u64,
    timers: Vec<Timer<T>>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Scheduler { now: 0, horizon: 0, next_id: 1, timers: Vec::new() }
    }

    /// Current scheduler time in ms.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Fire `payload` once, `delay_ms` from now.
    pub fn once(&mut self, delay_ms: u32, payload: T) -> TimerHandle {
        self.insert(delay_ms as u64, None, payload)
    }

    /// Fire `payload` every `interval_ms` (minimum 1) until cancelled.
    pub fn every(&mut self, interval_ms: u32, payload: T) -> TimerHandle {
        let interval = (interval_ms as u64).max(1);
        self.insert(interval, Some(interval), payload)
    }

    fn insert(&mut self, delay: u64, interval: Option<u64>, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { handle, due: self.now + delay, interval, payload });
        handle
    }

    /// Returns true if the handle was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    #[allow(dead_code)]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Move the horizon forward; due timers become available to `poll()`.
    pub fn advance(&mut self, dt_ms: u32) {
        self.horizon = self.horizon.max(self.now) + dt_ms as u64;
        if self.next_due().is_none() {
            self.now = self.horizon;
        }
    }

    /// Next timer due at or before the horizon. Repeating timers are
    /// re-armed, so one that spans several intervals fires once per interval.
    pub fn poll(&mut self) -> Option<T> {
        let idx = match self.next_due() {
            Some(idx) => idx,
            None => {
                self.now = self.horizon;
                return None;
            }
        };
        let timer = &mut self.timers[idx];
        self.now = timer.due;
        let payload = timer.payload.clone();
        match timer.interval {
            Some(interval) => timer.due += interval,
            None => {
                self.timers.remove(idx);
            }
        }
        Some(payload)
    }

    fn next_due(&self) -> Option<usize> {
        self.timers.iter()
            .enumerate()
            .filter(|(_, t)| t.due <= self.horizon)
            .min_by_key(|(_, t)| (t.due, t.handle.0))
            .map(|(idx, _)| idx)
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
