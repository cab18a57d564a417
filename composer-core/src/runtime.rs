//! # Event Loop
//!
//! Drives a [`Composer`] against a host [`Boundary`].
//!
//! ```text
//! push(event) -> queue -> Composer::handle -> requests -> Boundary::dispatch
//!                  ^                                            |
//!                  +------------- response events --------------+
//! ```
//!
//! Events are processed strictly in arrival order, one at a time. The loop
//! holds the only mutable access to the composer, so hosts with several
//! event sources must funnel them through [`EventLoop::push`].

use std::collections::VecDeque;

use crate::error::ComposerResult;
use crate::protocol::{Event, Request};
use crate::state::Composer;

/// Default number of events processed by one [`EventLoop::run_until_idle`].
pub const DEFAULT_STEP_LIMIT: usize = 10_000;

/// The host side of the protocol: file pickers, file I/O and durable storage.
pub trait Boundary {
    /// Carry out one request.
    ///
    /// Returns the events the request produced, if any. They are queued
    /// behind everything already waiting.
    fn dispatch(&mut self, request: Request) -> Vec<Event>;
}

/// Single-threaded event queue feeding a composer.
#[derive(Debug)]
pub struct EventLoop<B> {
    composer: Composer,
    boundary: B,
    queue: VecDeque<Event>,
    step_limit: usize,
}

impl<B: Boundary> EventLoop<B> {
    /// Create a loop with an empty queue.
    #[must_use]
    pub fn new(composer: Composer, boundary: B) -> Self {
        Self {
            composer,
            boundary,
            queue: VecDeque::new(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Limit how many events one run may process.
    #[must_use]
    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// Queue an event.
    pub fn push(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Decode and queue an event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ComposerError::Decode`] if the payload has the wrong
    /// shape; nothing is queued.
    pub fn push_json(&mut self, json: &str) -> ComposerResult<()> {
        let event = Event::from_json(json)?;
        self.push(event);
        Ok(())
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Process one queued event.
    ///
    /// Returns `false` if the queue was empty.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.queue.pop_front() else {
            return false;
        };
        for request in self.composer.handle(event) {
            let responses = self.boundary.dispatch(request);
            self.queue.extend(responses);
        }
        true
    }

    /// Process events until the queue is empty or the step limit is hit.
    ///
    /// Returns the number of events processed.
    pub fn run_until_idle(&mut self) -> usize {
        let mut processed = 0;
        while processed < self.step_limit && self.step() {
            processed += 1;
        }
        if !self.queue.is_empty() {
            tracing::warn!(
                "Stopped after {processed} events with {} still queued",
                self.queue.len()
            );
        }
        processed
    }

    /// The composer.
    #[must_use]
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// The host boundary.
    #[must_use]
    pub fn boundary(&self) -> &B {
        &self.boundary
    }

    /// Mutable access to the host boundary, e.g. to script user answers.
    pub fn boundary_mut(&mut self) -> &mut B {
        &mut self.boundary
    }

    /// Tear the loop apart.
    #[must_use]
    pub fn into_parts(self) -> (Composer, B) {
        (self.composer, self.boundary)
    }
}
