//! Diagnostics sinks.
//!
//! | Sink | Output |
//! |------|--------|
//! | [`TracingDiagnostics`] | `tracing` events: safety at WARN, lifecycle at INFO, telemetry at DEBUG |
//! | [`JsonLinesDiagnostics`] | one JSON object per line on any `Write` |
//! | [`ChannelDiagnostics`] | JSON lines written by a worker thread behind a bounded queue |
//! | [`TeeDiagnostics`] | both of the above, or any other pair |
//!
//! `report` runs inside the control step, so a sink that may stall (a pipe
//! nobody reads, a slow terminal) belongs behind [`ChannelDiagnostics`].

use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender, TrySendError, bounded};
use standoff_common::control_unit::event::DiagnosticEvent;
use standoff_common::hal::driver::{Diagnostics, HalError};
use tracing::{debug, info, warn};

/// Sink forwarding events to the installed `tracing` subscriber.
#[derive(Debug, Clone, Default)]
pub struct TracingDiagnostics {
    service_name: String,
}

impl TracingDiagnostics {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl Diagnostics for TracingDiagnostics {
    fn report(&mut self, event: &DiagnosticEvent) -> Result<(), HalError> {
        let service = self.service_name.as_str();
        match event {
            DiagnosticEvent::Started => info!(service, "Control session started"),
            DiagnosticEvent::Stopped => info!(service, "Control session stopped by operator"),
            DiagnosticEvent::Rearmed => info!(service, "Re-armed after safety stop"),
            DiagnosticEvent::SafetyStop { trip } => {
                warn!(service, "SAFETY STOP: {trip}")
            }
            DiagnosticEvent::Telemetry {
                measurement,
                reference,
                error,
                output,
                command,
            } => debug!(
                service,
                measurement, reference, error, output, command, "telemetry"
            ),
        }
        Ok(())
    }
}

/// Sink writing newline-delimited JSON.
#[derive(Debug)]
pub struct JsonLinesDiagnostics<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesDiagnostics<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Diagnostics for JsonLinesDiagnostics<W> {
    fn report(&mut self, event: &DiagnosticEvent) -> Result<(), HalError> {
        serde_json::to_writer(&mut self.writer, event)
            .map_err(|e| HalError::Diagnostics(format!("encode: {e}")))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| HalError::Diagnostics(format!("write: {e}")))?;
        Ok(())
    }
}

/// Non-blocking JSON-lines sink.
///
/// Events are queued on a bounded channel and written by a dedicated
/// thread. A full queue drops the event and reports the drop as an error,
/// which the control loop counts. Dropping the sink closes the queue; the
/// worker drains what is left, flushes and returns the writer through its
/// join handle.
#[derive(Debug)]
pub struct ChannelDiagnostics {
    tx: Sender<DiagnosticEvent>,
}

impl ChannelDiagnostics {
    pub fn spawn<W>(writer: W, capacity: usize) -> io::Result<(Self, JoinHandle<W>)>
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = bounded(capacity);
        let worker = thread::Builder::new()
            .name("standoff-events".to_string())
            .spawn(move || write_events(rx, writer))?;
        Ok((Self { tx }, worker))
    }
}

fn write_events<W: Write>(rx: Receiver<DiagnosticEvent>, writer: W) -> W {
    let mut sink = JsonLinesDiagnostics::new(writer);
    for event in rx.iter() {
        if let Err(e) = sink.report(&event) {
            warn!("Event writer: {e}");
        }
        if rx.is_empty() {
            let _ = sink.writer.flush();
        }
    }
    let _ = sink.writer.flush();
    sink.into_inner()
}

impl Diagnostics for ChannelDiagnostics {
    fn report(&mut self, event: &DiagnosticEvent) -> Result<(), HalError> {
        self.tx.try_send(*event).map_err(|e| match e {
            TrySendError::Full(_) => HalError::Diagnostics("event queue full".to_string()),
            TrySendError::Disconnected(_) => {
                HalError::Diagnostics("event writer stopped".to_string())
            }
        })
    }
}

/// Sink reporting to two sinks; fails if either fails, after trying both.
#[derive(Debug)]
pub struct TeeDiagnostics<A, B> {
    first: A,
    second: B,
}

impl<A: Diagnostics, B: Diagnostics> TeeDiagnostics<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Diagnostics, B: Diagnostics> Diagnostics for TeeDiagnostics<A, B> {
    fn report(&mut self, event: &DiagnosticEvent) -> Result<(), HalError> {
        let first = self.first.report(event);
        let second = self.second.report(event);
        first.and(second)
    }
}
