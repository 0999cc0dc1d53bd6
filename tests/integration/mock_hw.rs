//! Mock hardware for integration tests.
//!
//! Records every channel write and bus transaction so tests can assert on
//! the full command history without touching a real I²C bus.

use std::collections::{BTreeSet, VecDeque};

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};
use jetcar::app::events::{AppEvent, StatusSnapshot};
use jetcar::app::ports::{ActuatorChannel, BatteryPort, EventSink, InputSource, StatusRenderer};
use jetcar::error::{ActuatorError, InputError, SensorError};
use jetcar::input::InputEvent;

// ── MockChannel ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelWrite {
    pub channel: u8,
    pub on: u16,
    pub off: u16,
}

/// PWM bank that records writes and fails the channels it is told to.
#[derive(Debug, Default)]
pub struct MockChannel {
    pub writes: Vec<ChannelWrite>,
    /// Every write to these channels fails with `BusWrite`.
    pub failing: BTreeSet<u8>,
    /// Fail everything.
    pub offline: bool,
}

#[allow(dead_code)]
impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value successfully written to `channel`.
    pub fn last_off(&self, channel: u8) -> Option<u16> {
        self.writes.iter().rev().find(|w| w.channel == channel).map(|w| w.off)
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl ActuatorChannel for MockChannel {
    fn set(&mut self, channel: u8, on_time: u16, off_time: u16) -> Result<(), ActuatorError> {
        if self.offline || self.failing.contains(&channel) {
            return Err(ActuatorError::BusWrite);
        }
        self.writes.push(ChannelWrite { channel, on: on_time, off: off_time });
        Ok(())
    }
}

// ── MockI2c ───────────────────────────────────────────────────

/// 256-byte register file per device with an auto-incrementing pointer,
/// close enough to the PCA9685 and the battery ADC.
pub struct MockI2c {
    pub address: u8,
    pub registers: [u8; 256],
    pub writes: Vec<Vec<u8>>,
    /// Registers that ignore writes (stuck bits on the chip).
    pub stuck: BTreeSet<u8>,
    pub fail_writes: bool,
    pub fail_reads: bool,
    pointer: u8,
}

#[allow(dead_code)]
impl MockI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; 256],
            writes: Vec::new(),
            stuck: BTreeSet::new(),
            fail_writes: false,
            fail_reads: false,
            pointer: 0,
        }
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if self.fail_writes {
                        return Err(ErrorKind::Bus);
                    }
                    self.writes.push(bytes.to_vec());
                    let Some((&register, data)) = bytes.split_first() else {
                        continue;
                    };
                    self.pointer = register;
                    for (offset, &b) in data.iter().enumerate() {
                        let reg = register.wrapping_add(offset as u8);
                        if !self.stuck.contains(&reg) {
                            self.registers[reg as usize] = b;
                        }
                    }
                }
                Operation::Read(buf) => {
                    if self.fail_reads {
                        return Err(ErrorKind::Bus);
                    }
                    for (offset, slot) in buf.iter_mut().enumerate() {
                        *slot = self.registers[self.pointer.wrapping_add(offset as u8) as usize];
                    }
                }
            }
        }
        Ok(())
    }
}

// ── Sinks and sources ─────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

/// Renderer that forwards every snapshot to the test thread.
pub struct ChannelRenderer(pub std::sync::mpsc::Sender<StatusSnapshot>);

impl StatusRenderer for ChannelRenderer {
    fn render(&mut self, snapshot: &StatusSnapshot) {
        let _ = self.0.send(*snapshot);
    }
}

/// Input source that replays a script, then reports `end` forever.
pub struct ScriptedInput {
    pub script: VecDeque<Result<InputEvent, InputError>>,
    pub end: Result<Option<InputEvent>, InputError>,
}

#[allow(dead_code)]
impl ScriptedInput {
    pub fn idle() -> Self {
        Self { script: VecDeque::new(), end: Ok(None) }
    }

    pub fn new(script: impl IntoIterator<Item = Result<InputEvent, InputError>>) -> Self {
        Self { script: script.into_iter().collect(), end: Ok(None) }
    }

    pub fn then_disconnect(mut self) -> Self {
        self.end = Err(InputError::Disconnected);
        self
    }
}

impl InputSource for ScriptedInput {
    fn poll_event(&mut self) -> Result<Option<InputEvent>, InputError> {
        match self.script.pop_front() {
            Some(item) => item.map(Some),
            None => self.end,
        }
    }
}

pub struct FixedBattery(pub Result<f32, SensorError>);

impl BatteryPort for FixedBattery {
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        self.0
    }
}
