//! Replay of a prepared log: a cursor state machine stepped by a timer, and a
//! session that ties it to a table, a renderer and a cancellable tick.

use std::ops::Range;
use std::time::{Duration, Instant};

use crate::config::ViewerConfig;
use crate::data::model::{FlightLogTable, RowView, WindowView};

// ---------------------------------------------------------------------------
// Cursor and driver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Paused,
    Playing,
    /// Only while a seek is being applied; the previous state is restored.
    Seeking,
}

/// Playback position. Only the driver mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayCursor {
    frame: usize,
    state: PlaybackState,
    speed: usize,
    total_frames: usize,
}

impl ReplayCursor {
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn speed(&self) -> usize {
        self.speed
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }
}

/// What to render: the current row and the rows of the visible window
/// (the last `display_window` rows ending at `index`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub index: usize,
    pub window: Range<usize>,
}

/// Cursor state machine. With zero frames every operation does nothing.
#[derive(Debug, Clone)]
pub struct ReplayDriver {
    cursor: ReplayCursor,
    display_window: usize,
    /// State to return to when a seek finishes.
    before_seek: Option<PlaybackState>,
}

impl ReplayDriver {
    pub fn new(total_frames: usize, display_window: usize) -> Self {
        Self {
            cursor: ReplayCursor {
                frame: 0,
                state: PlaybackState::Paused,
                speed: 1,
                total_frames,
            },
            display_window: display_window.max(1),
            before_seek: None,
        }
    }

    pub fn cursor(&self) -> &ReplayCursor {
        &self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.cursor.state == PlaybackState::Playing
    }

    fn is_empty(&self) -> bool {
        self.cursor.total_frames == 0
    }

    pub fn current(&self) -> Option<Frame> {
        if self.is_empty() {
            return None;
        }
        let index = self.cursor.frame;
        let start = (index + 1).saturating_sub(self.display_window);
        Some(Frame {
            index,
            window: start..index + 1,
        })
    }

    /// Move forward by `speed` frames, wrapping to 0 at the end. Only while
    /// playing.
    pub fn advance(&mut self) -> Option<Frame> {
        if self.is_empty() || self.cursor.state != PlaybackState::Playing {
            return None;
        }
        self.cursor.frame = self.cursor.frame.saturating_add(self.cursor.speed);
        if self.cursor.frame >= self.cursor.total_frames {
            self.cursor.frame = 0;
        }
        self.current()
    }

    /// One timer tick.
    pub fn tick(&mut self) -> Option<Frame> {
        self.advance()
    }

    /// Enter `Seeking`, clamp and set the cursor. Must be followed by
    /// [`finish_seek`](Self::finish_seek).
    pub fn begin_seek(&mut self, frame: usize) -> Option<Frame> {
        if self.is_empty() {
            return None;
        }
        if self.cursor.state != PlaybackState::Seeking {
            self.before_seek = Some(self.cursor.state);
        }
        self.cursor.state = PlaybackState::Seeking;
        self.cursor.frame = frame.min(self.cursor.total_frames - 1);
        self.current()
    }

    /// Return to the state held before the seek.
    pub fn finish_seek(&mut self) {
        if let Some(prev) = self.before_seek.take() {
            self.cursor.state = prev;
        }
    }

    /// Jump to `frame` (clamped) in any state. Always yields a frame to render.
    pub fn seek(&mut self, frame: usize) -> Option<Frame> {
        let out = self.begin_seek(frame);
        self.finish_seek();
        out
    }

    pub fn toggle_play(&mut self) -> PlaybackState {
        if !self.is_empty() {
            self.cursor.state = match self.cursor.state {
                PlaybackState::Playing => PlaybackState::Paused,
                PlaybackState::Paused | PlaybackState::Seeking => PlaybackState::Playing,
            };
        }
        self.cursor.state
    }

    /// Frames advanced per tick. 0 is raised to 1.
    pub fn set_speed(&mut self, multiplier: usize) {
        if self.is_empty() {
            return;
        }
        if multiplier == 0 {
            log::warn!("replay speed 0 is not allowed, using 1");
        }
        self.cursor.speed = multiplier.max(1);
    }
}

// ---------------------------------------------------------------------------
// Collaborators: renderer and timer
// ---------------------------------------------------------------------------

/// Receives the current row and the visible window once per tick or seek.
pub trait FrameRenderer {
    fn on_frame(&mut self, current: RowView<'_>, window: WindowView<'_>);
}

impl<F> FrameRenderer for F
where
    F: FnMut(RowView<'_>, WindowView<'_>),
{
    fn on_frame(&mut self, current: RowView<'_>, window: WindowView<'_>) {
        self(current, window)
    }
}

/// A one-shot timer that calls back after a delay and can be cancelled.
pub trait TickScheduler {
    fn schedule(&mut self, delay: Duration);
    fn cancel(&mut self);
    fn is_pending(&self) -> bool;
}

/// Timer for a polled frame loop: stores a deadline, fires when polled after it.
#[derive(Debug, Default, Clone)]
pub struct DeadlineScheduler {
    deadline: Option<Instant>,
}

impl DeadlineScheduler {
    /// Consume the deadline if it has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the pending tick.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

impl TickScheduler for DeadlineScheduler {
    fn schedule(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }

    fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

// ---------------------------------------------------------------------------
// ReplaySession
// ---------------------------------------------------------------------------

/// Owns the prepared table, the driver and the pending tick. Ticks and user
/// events are both `&mut self` calls on one thread, so a seek is fully applied
/// before the next tick reads the cursor.
pub struct ReplaySession<S: TickScheduler> {
    table: FlightLogTable,
    driver: ReplayDriver,
    scheduler: S,
    interval: Duration,
    closed: bool,
}

impl<S: TickScheduler> ReplaySession<S> {
    pub fn new(table: FlightLogTable, config: &ViewerConfig, scheduler: S) -> Self {
        let driver = ReplayDriver::new(table.len(), config.display_window);
        Self {
            table,
            driver,
            scheduler,
            interval: config.tick_interval(),
            closed: false,
        }
    }

    pub fn table(&self) -> &FlightLogTable {
        &self.table
    }

    pub fn driver(&self) -> &ReplayDriver {
        &self.driver
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Draw the first frame; arm the timer only if already playing.
    pub fn start(&mut self, renderer: &mut dyn FrameRenderer) {
        if self.closed {
            return;
        }
        if let Some(frame) = self.driver.current() {
            self.render(&frame, renderer);
        }
        if self.driver.is_playing() {
            self.scheduler.schedule(self.interval);
        }
    }

    /// Timer callback: advance, render, re-arm. Does nothing once closed or
    /// while paused.
    pub fn on_tick(&mut self, renderer: &mut dyn FrameRenderer) {
        if self.closed {
            return;
        }
        if let Some(frame) = self.driver.tick() {
            log::debug!("tick -> frame {}", frame.index);
            self.render(&frame, renderer);
            self.scheduler.schedule(self.interval);
        }
    }

    /// Play arms the timer, pause cancels it.
    pub fn toggle_play(&mut self) -> PlaybackState {
        if self.closed {
            return self.driver.cursor().state();
        }
        let state = self.driver.toggle_play();
        match state {
            PlaybackState::Playing => self.scheduler.schedule(self.interval),
            _ => self.scheduler.cancel(),
        }
        state
    }

    /// Jump and render immediately, whether playing or paused.
    pub fn seek(&mut self, frame: usize, renderer: &mut dyn FrameRenderer) {
        if self.closed {
            return;
        }
        if let Some(f) = self.driver.begin_seek(frame) {
            self.render(&f, renderer);
        }
        self.driver.finish_seek();
    }

    pub fn set_speed(&mut self, multiplier: usize) {
        if !self.closed {
            self.driver.set_speed(multiplier);
        }
    }

    /// Cancel the pending tick; no tick fires afterwards.
    pub fn close(&mut self) {
        if !self.closed {
            self.scheduler.cancel();
            self.closed = true;
            log::info!("replay session closed at frame {}", self.driver.cursor().frame());
        }
    }

    fn render(&self, frame: &Frame, renderer: &mut dyn FrameRenderer) {
        if let Some(row) = self.table.row(frame.index) {
            renderer.on_frame(row, self.table.window(frame.window.clone()));
        }
    }
}

impl ReplaySession<DeadlineScheduler> {
    /// Fire the tick if its deadline has passed. Returns how long until the
    /// next one, `None` when nothing is pending.
    pub fn poll(&mut self, now: Instant, renderer: &mut dyn FrameRenderer) -> Option<Duration> {
        if self.scheduler.take_due(now) {
            self.on_tick(renderer);
        }
        self.scheduler.remaining(now)
    }
}

impl<S: TickScheduler> Drop for ReplaySession<S> {
    fn drop(&mut self) {
        self.scheduler.cancel();
    }
}
