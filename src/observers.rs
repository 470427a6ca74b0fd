//! Event delivery to external collaborators
//!
//! Sinks are called synchronously in registration order; subscribers get a
//! copy of every event over an unbounded channel and drain it whenever they
//! like. A sink that errors or panics is reported and skipped for that
//! event, never allowed to take the scheduler down with it.

use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::{Receiver, Sender, unbounded};
use thiserror::Error;

use crate::sim::{AudioCue, GameEvent};

/// Failure reported by a collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Consumer of core events (audio, log presentation, decorative spawners)
pub trait EventSink {
    /// Name used when reporting faults
    fn name(&self) -> &str;

    fn on_event(&mut self, event: &GameEvent) -> Result<(), SinkError>;
}

/// A collaborator failure caught at the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub sink: String,
    pub message: String,
}

impl Fault {
    pub fn to_event(&self) -> GameEvent {
        GameEvent::SinkFault {
            sink: self.sink.clone(),
            message: self.message.clone(),
        }
    }
}

/// Run a collaborator call, turning both errors and panics into a message
pub fn isolate<T>(f: impl FnOnce() -> Result<T, SinkError>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Sinks plus channel subscribers
#[derive(Default)]
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
    subscribers: Vec<Sender<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        log::debug!("Event sink registered: {}", sink.name());
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// New receiver that sees every event published from now on
    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `events` in order. Faults are logged, then announced as
    /// `SinkFault` events to subscribers and to every other sink; failures
    /// while announcing are only logged. Returns the number of faults.
    pub fn publish(&mut self, events: &[GameEvent]) -> usize {
        let mut faults: Vec<(usize, Fault)> = Vec::new();
        for event in events {
            self.broadcast(event);
            for (index, sink) in self.sinks.iter_mut().enumerate() {
                if let Err(message) = isolate(|| sink.on_event(event)) {
                    log::error!("Sink '{}' failed on {}: {}", sink.name(), event.tag(), message);
                    faults.push((
                        index,
                        Fault {
                            sink: sink.name().to_string(),
                            message,
                        },
                    ));
                }
            }
        }

        for (failed, fault) in &faults {
            let event = fault.to_event();
            self.broadcast(&event);
            for (index, sink) in self.sinks.iter_mut().enumerate() {
                if index == *failed {
                    continue;
                }
                if let Err(message) = isolate(|| sink.on_event(&event)) {
                    log::warn!("Sink '{}' failed on fault report: {}", sink.name(), message);
                }
            }
        }
        faults.len()
    }

    fn broadcast(&mut self, event: &GameEvent) {
        // Dropped receivers unsubscribe themselves
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Sink backed by a closure
pub struct FnSink<F> {
    name: String,
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(&GameEvent) -> Result<(), SinkError>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(&GameEvent) -> Result<(), SinkError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&mut self, event: &GameEvent) -> Result<(), SinkError> {
        (self.f)(event)
    }
}

/// Forwards the audio cues of each event to a playback callback
pub struct AudioCueSink<F> {
    play: F,
}

impl<F> AudioCueSink<F>
where
    F: FnMut(AudioCue) -> Result<(), SinkError>,
{
    pub fn new(play: F) -> Self {
        Self { play }
    }
}

impl<F> EventSink for AudioCueSink<F>
where
    F: FnMut(AudioCue) -> Result<(), SinkError>,
{
    fn name(&self) -> &str {
        "audio"
    }

    fn on_event(&mut self, event: &GameEvent) -> Result<(), SinkError> {
        for &cue in event.audio_cues() {
            (self.play)(cue)?;
        }
        Ok(())
    }
}

/// Writes gameplay events to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn on_event(&mut self, event: &GameEvent) -> Result<(), SinkError> {
        match event {
            GameEvent::ItemSpawned { .. } => log::trace!("[{}] {:?}", event.tag(), event),
            GameEvent::SinkFault { sink, message } => {
                log::warn!("[{}] {}: {}", event.tag(), sink, message)
            }
            _ => log::debug!("[{}] {:?}", event.tag(), event),
        }
        Ok(())
    }
}
