//! Suspension points of the trial loop.
//!
//! A wait consumes events from an [`EventSource`] until one is accepted by
//! its matcher. Events the matcher rejects, malformed ones included, are
//! skipped. A timed wait races the matcher against a deadline and resolves
//! exactly once.

use std::time::Duration;

use apparatus::ApparatusEvent;
use tokio::time::Instant;
use tracing::trace;

use crate::error::TrialError;
use crate::traits::EventSource;

/// How a timed wait resolved.
#[derive(Debug, PartialEq)]
pub enum Waited<T> {
    Matched { value: T, elapsed: Duration },
    TimedOut { elapsed: Duration },
}

/// Wait without a deadline for the first event accepted by `matcher`.
pub async fn wait_until<S, T, F>(source: &mut S, matcher: F) -> Result<T, TrialError>
where
    S: EventSource + ?Sized,
    F: FnMut(&ApparatusEvent) -> Option<T> + Send,
    T: Send,
{
    first_match(source, matcher).await
}

/// Wait for the first event accepted by `matcher`, giving up after `timeout`.
pub async fn wait_for<S, T, F>(
    source: &mut S,
    timeout: Duration,
    matcher: F,
) -> Result<Waited<T>, TrialError>
where
    S: EventSource + ?Sized,
    F: FnMut(&ApparatusEvent) -> Option<T> + Send,
    T: Send,
{
    let start = Instant::now();
    match tokio::time::timeout(timeout, first_match(source, matcher)).await {
        Ok(matched) => matched.map(|value| Waited::Matched {
            value,
            elapsed: start.elapsed(),
        }),
        Err(_) => Ok(Waited::TimedOut {
            elapsed: start.elapsed(),
        }),
    }
}

async fn first_match<S, T, F>(source: &mut S, mut matcher: F) -> Result<T, TrialError>
where
    S: EventSource + ?Sized,
    F: FnMut(&ApparatusEvent) -> Option<T> + Send,
    T: Send,
{
    loop {
        let event = source.next_event().await.ok_or(TrialError::EventSourceClosed)?;
        match matcher(&event) {
            Some(value) => return Ok(value),
            None => trace!(device = %event.device, "ignoring event"),
        }
    }
}
