//! Feeds inbound events into the engine, one processing turn per event, and
//! hands the resulting device commands to the transport.

use crate::client::DeviceTransport;
use crate::error::EngineError;
use crate::models::events::{decode_line, InboundEvent, OutboundEvent};
use crate::models::luminaire::Luminaire;
use crate::services::engine::{Engine, LuminaireSink};
use log::{debug, error, info, warn};
use std::io::Write;
use std::sync::mpsc::Receiver;

/// Writes every `luminaireUpdate` as one JSON line.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LuminaireSink for JsonLinesSink<W> {
    fn luminaire_update(&mut self, luminaire: &Luminaire) {
        let event = OutboundEvent::LuminaireUpdate { luminaire };
        let res = serde_json::to_writer(&mut self.out, &event)
            .map_err(|e| e.to_string())
            .and_then(|_| writeln!(self.out).map_err(|e| e.to_string()))
            .and_then(|_| self.out.flush().map_err(|e| e.to_string()));
        if let Err(e) = res {
            error!("Writing luminaireUpdate for {} failed: {}", luminaire.id, e);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub turns: usize,
    pub commands_sent: usize,
    pub send_failures: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Applied,
    Sent,
    SendFailed,
}

fn handle_event(engine: &mut Engine, transport: &dyn DeviceTransport, event: InboundEvent) -> Result<Outcome, EngineError> {
    match event {
        InboundEvent::RegisterDevice { device_id, state } => {
            info!("Registering device {} with state {}", device_id, state);
            engine.register_device(device_id, state)?;
        }
        InboundEvent::SetLight { device_id, payload } => {
            let Some(command) = engine.set_light(&device_id, &payload)? else {
                return Ok(Outcome::Applied);
            };
            // The cache already holds the optimistic state; a failed delivery is not rolled back.
            return match transport.send(&command.device_id, &command.fields) {
                Ok(()) => Ok(Outcome::Sent),
                Err(e) => {
                    error!("setLight for {} failed: {}", command.device_id, e);
                    Ok(Outcome::SendFailed)
                }
            };
        }
        InboundEvent::LightChanged { device_id, payload } => {
            engine.light_changed(&device_id, &payload)?;
        }
        InboundEvent::RegisterLuminaire(registration) => {
            engine.register_luminaire(registration)?;
        }
        InboundEvent::SetLuminaireLight {
            luminaire_id,
            light_id,
            state,
            transition_time,
        } => {
            engine.set_luminaire_light(&luminaire_id, light_id, state, transition_time)?;
        }
    }
    Ok(Outcome::Applied)
}

/// Process one raw line as a full turn.
pub fn process_line<S: LuminaireSink + ?Sized>(
    engine: &mut Engine,
    transport: &dyn DeviceTransport,
    sink: &mut S,
    line: &str,
    summary: &mut RunSummary,
) {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return;
    }

    let event = match decode_line(line) {
        Ok(ev) => ev,
        Err(e) => {
            warn!("Skipping line: {}", e);
            summary.rejected += 1;
            return;
        }
    };
    let name = event.name();
    debug!("Turn {}: {}", summary.turns + 1, name);

    summary.turns += 1;
    match engine.turn(sink, |engine| handle_event(engine, transport, event)) {
        Ok(Outcome::Sent) => summary.commands_sent += 1,
        Ok(Outcome::SendFailed) => summary.send_failures += 1,
        Ok(Outcome::Applied) => {}
        Err(e) => {
            warn!("{} ignored: {}", name, e);
            summary.rejected += 1;
        }
    }
}

/// Single consumer: drains the channel until every producer has hung up.
pub fn run_loop<S: LuminaireSink + ?Sized>(
    engine: &mut Engine,
    transport: &dyn DeviceTransport,
    sink: &mut S,
    lines: Receiver<String>,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for line in lines {
        process_line(engine, transport, sink, &line, &mut summary);
    }
    summary
}
