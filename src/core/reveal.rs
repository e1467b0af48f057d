//! # Progressive Reveal
//!
//! Animates a finished text result one character at a time.
//!
//! - [`Reveal`] is the pure, non-resumable generator of prefixes.
//! - [`reveal_stream`] paces it with a fixed interval.
//! - [`RevealRenderer`] runs at most one paced reveal as a tokio task, bound
//!   to a message id, and owns the only [`RevealState`].
//!
//! Starting a new reveal or calling [`RevealRenderer::leave`] aborts the running
//! task. Frames already queued by an aborted task carry an old generation
//! number and are dropped by [`RevealRenderer::apply`].

use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use log::debug;
use tokio::task::AbortHandle;

use crate::core::format::{FormattedLine, IncrementalFormatter};
use crate::core::message::MessageId;

pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(15);

/// Yields `"h"`, `"he"`, ... up to the full text, one character per step.
/// Once exhausted it stays exhausted; start a new one to replay.
pub struct Reveal {
    text: String,
    pos: usize,
}

impl Reveal {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pos: 0,
        }
    }
}

impl Iterator for Reveal {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let ch = self.text[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        Some(self.text[..self.pos].to_string())
    }
}

/// [`Reveal`] with `interval` between prefixes.
pub fn reveal_stream(text: String, interval: Duration) -> impl Stream<Item = String> {
    stream::unfold(Reveal::new(text), move |mut reveal| async move {
        let prefix = reveal.next()?;
        tokio::time::sleep(interval).await;
        Some((prefix, reveal))
    })
}

/// Progress of the message currently being revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealState {
    pub full_text: String,
    /// Bytes of `full_text` shown so far (always on a char boundary).
    pub revealed_length: usize,
    pub active: bool,
}

impl RevealState {
    pub fn visible(&self) -> &str {
        &self.full_text[..self.revealed_length]
    }
}

/// One tick of a running reveal, delivered back to the owner of the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealFrame {
    pub message_id: MessageId,
    pub generation: u64,
    pub revealed_length: usize,
}

struct ActiveReveal {
    message_id: MessageId,
    generation: u64,
    state: RevealState,
    formatter: IncrementalFormatter,
    abort: Option<AbortHandle>,
}

pub struct RevealRenderer {
    interval: Duration,
    generation: u64,
    current: Option<ActiveReveal>,
}

impl Default for RevealRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_INTERVAL)
    }
}

impl RevealRenderer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            current: None,
        }
    }

    /// Starts revealing `text` for `message_id`, cancelling any reveal in progress.
    ///
    /// Frames are handed to `sink`; returning `false` from it stops the task.
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, message_id: &str, text: &str, sink: F)
    where
        F: Fn(RevealFrame) -> bool + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;

        let abort = if text.is_empty() {
            None
        } else {
            let id = message_id.to_string();
            let frames = reveal_stream(text.to_string(), self.interval);
            let handle = tokio::spawn(async move {
                let mut frames = std::pin::pin!(frames);
                while let Some(prefix) = frames.next().await {
                    let frame = RevealFrame {
                        message_id: id.clone(),
                        generation,
                        revealed_length: prefix.len(),
                    };
                    if !sink(frame) {
                        debug!("Reveal sink closed for {}", id);
                        return;
                    }
                }
            });
            Some(handle.abort_handle())
        };

        debug!("Reveal {} started for {} ({} bytes)", generation, message_id, text.len());
        self.current = Some(ActiveReveal {
            message_id: message_id.to_string(),
            generation,
            state: RevealState {
                full_text: text.to_string(),
                revealed_length: 0,
                active: !text.is_empty(),
            },
            formatter: IncrementalFormatter::new(),
            abort,
        });
    }

    /// Applies a frame. Frames from cancelled reveals are ignored.
    pub fn apply(&mut self, frame: RevealFrame) -> bool {
        let Some(active) = self.current.as_mut() else {
            return false;
        };
        if active.generation != frame.generation || active.message_id != frame.message_id {
            return false;
        }
        let state = &mut active.state;
        if frame.revealed_length <= state.revealed_length
            || frame.revealed_length > state.full_text.len()
            || !state.full_text.is_char_boundary(frame.revealed_length)
        {
            return false;
        }
        state.revealed_length = frame.revealed_length;
        if state.revealed_length == state.full_text.len() {
            state.active = false;
        }
        true
    }

    /// Stops any running reveal and discards its state.
    pub fn cancel(&mut self) {
        if let Some(active) = self.current.take()
            && let Some(abort) = active.abort
        {
            abort.abort();
        }
    }

    /// The message left view: stop its reveal if it has one.
    pub fn leave(&mut self, message_id: &str) {
        if self.current_message() == Some(message_id) {
            self.cancel();
        }
    }

    pub fn current_message(&self) -> Option<&str> {
        self.current.as_ref().map(|a| a.message_id.as_str())
    }

    pub fn is_animating(&self) -> bool {
        self.current.as_ref().is_some_and(|a| a.state.active)
    }

    /// Formatted lines of the visible part of `message_id`'s reveal.
    pub fn formatted_for(&mut self, message_id: &str) -> Option<&[FormattedLine]> {
        let active = self.current.as_mut()?;
        if active.message_id != message_id {
            return None;
        }
        Some(active.formatter.update(active.state.visible()))
    }
}

impl Drop for RevealRenderer {
    fn drop(&mut self) {
        self.cancel();
    }
}
