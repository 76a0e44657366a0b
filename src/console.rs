//! Hercules DJ Console driver
//!
//! Handles MIDI communication with the physical console: inbound events are
//! queued on a channel for the router task, outbound LED messages go through
//! [`MidirTransport`].

pub mod debounce;

use anyhow::{Context, Result};
use colored::*;
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::AppConfig;
use crate::error::Error;
use crate::midi::{format_hex, MidiTransport};

/// MIDI event from the console
#[derive(Debug, Clone)]
pub struct ConsoleEvent {
    pub timestamp: Instant,
    pub raw_data: Vec<u8>,
}

/// Outbound MIDI connection shared with the LED feedback binder
#[derive(Clone)]
pub struct MidirTransport {
    output: Arc<Mutex<MidiOutputConnection>>,
}

impl MidiTransport for MidirTransport {
    fn send(&self, status: u8, data1: u8, data2: u8) -> crate::error::Result<()> {
        let data = [status, data1, data2];
        self.output
            .lock()
            .send(&data)
            .map_err(|e| Error::Transport(e.to_string()))?;
        trace!("Sent: {}", format_hex(&data));
        Ok(())
    }
}

/// Console driver for hardware communication
pub struct ConsoleDriver {
    /// MIDI input connection
    input_conn: Option<MidiInputConnection<()>>,

    /// MIDI output connection
    output_conn: Option<MidirTransport>,

    /// Event sender for incoming MIDI
    event_tx: mpsc::Sender<ConsoleEvent>,

    /// Event receiver
    event_rx: Option<mpsc::Receiver<ConsoleEvent>>,

    /// Input port name pattern
    input_port_name: String,

    /// Output port name pattern
    output_port_name: String,
}

impl ConsoleDriver {
    /// Create a new console driver
    pub fn new(config: &AppConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);

        Self {
            input_conn: None,
            output_conn: None,
            event_tx,
            event_rx: Some(event_rx),
            input_port_name: config.midi.input_port.clone(),
            output_port_name: config.midi.output_port.clone(),
        }
    }

    /// List available MIDI input ports
    pub fn list_input_ports() -> Result<Vec<String>> {
        let midi_in = MidiInput::new("DJConsole-Map-Scanner")?;
        Ok(midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect())
    }

    /// List available MIDI output ports
    pub fn list_output_ports() -> Result<Vec<String>> {
        let midi_out = MidiOutput::new("DJConsole-Map-Scanner")?;
        Ok(midi_out
            .ports()
            .iter()
            .filter_map(|port| midi_out.port_name(port).ok())
            .collect())
    }

    /// Case-insensitive substring match on port names
    fn matches(name: &str, pattern: &str) -> bool {
        name.to_lowercase().contains(&pattern.to_lowercase())
    }

    /// Connect to the console's MIDI ports
    pub fn connect(&mut self) -> Result<()> {
        self.disconnect();

        info!(
            "Connecting to console - Input: '{}', Output: '{}'",
            self.input_port_name, self.output_port_name
        );

        let midi_in = MidiInput::new("DJConsole-Map-Input").context("Failed to create MIDI input")?;
        debug!("Found {} MIDI input ports", midi_in.port_count());

        let (in_port, in_name) = midi_in
            .ports()
            .into_iter()
            .find_map(|port| {
                let name = midi_in.port_name(&port).ok()?;
                Self::matches(&name, &self.input_port_name).then_some((port, name))
            })
            .ok_or_else(|| anyhow::anyhow!("Input port '{}' not found", self.input_port_name))?;

        info!("Connecting to input port: {}", in_name);

        let event_tx = self.event_tx.clone();
        let input_conn = midi_in
            .connect(
                &in_port,
                "DJConsole-Map",
                move |_timestamp, data, _| {
                    let event = ConsoleEvent {
                        timestamp: Instant::now(),
                        raw_data: data.to_vec(),
                    };

                    // Never block the MIDI callback thread
                    if event_tx.try_send(event).is_err() {
                        warn!("Console event queue full, dropping {}", format_hex(data));
                    }
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;

        self.input_conn = Some(input_conn);

        let midi_out =
            MidiOutput::new("DJConsole-Map-Output").context("Failed to create MIDI output")?;
        debug!("Found {} MIDI output ports", midi_out.port_count());

        let (out_port, out_name) = midi_out
            .ports()
            .into_iter()
            .find_map(|port| {
                let name = midi_out.port_name(&port).ok()?;
                Self::matches(&name, &self.output_port_name).then_some((port, name))
            })
            .ok_or_else(|| anyhow::anyhow!("Output port '{}' not found", self.output_port_name))?;

        info!("Connecting to output port: {}", out_name);

        let output_conn = midi_out
            .connect(&out_port, "DJConsole-Map")
            .map_err(|e| anyhow::anyhow!("Failed to connect to output port: {}", e))?;

        self.output_conn = Some(MidirTransport {
            output: Arc::new(Mutex::new(output_conn)),
        });

        info!("Console connected");
        Ok(())
    }

    /// Disconnect from MIDI ports
    pub fn disconnect(&mut self) {
        if self.is_connected() {
            info!("Console disconnected");
        }
        self.input_conn = None;
        self.output_conn = None;
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.input_conn.is_some() && self.output_conn.is_some()
    }

    /// Outbound transport, available once connected
    pub fn transport(&self) -> Option<MidirTransport> {
        self.output_conn.clone()
    }

    /// Take the event receiver (for the router task to consume)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<ConsoleEvent>> {
        self.event_rx.take()
    }
}

/// Print available MIDI ports
pub fn list_ports_formatted() {
    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    match ConsoleDriver::list_input_ports() {
        Ok(inputs) => print_ports("Input Ports:", &inputs),
        Err(e) => println!("  {} {}", "Failed to list input ports:".red(), e),
    }

    match ConsoleDriver::list_output_ports() {
        Ok(outputs) => print_ports("Output Ports:", &outputs),
        Err(e) => println!("  {} {}", "Failed to list output ports:".red(), e),
    }

    println!();
}

fn print_ports(title: &str, ports: &[String]) {
    println!("\n{}", title.bold());
    if ports.is_empty() {
        println!("  {}", "No ports found".dimmed());
    } else {
        for port in ports {
            println!("  {}", port.green());
        }
    }
}
