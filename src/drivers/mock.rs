//! Mock drivers for hardware-free runs and tests

use crate::drivers::{ActuatorDriver, DistanceSensor};
use crate::error::{Error, Result};
use std::sync::{Arc, Mutex};

/// How a mock hub responds to a connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    /// `is_connected` reports true right after `scan_and_connect`
    Immediate,
    /// `is_connected` never reports true (forces the poll loop to time out)
    Never,
    /// `scan_and_connect` itself fails
    Error,
}

/// Mock motor hub
///
/// State is shared across clones so tests can keep a probe handle while the
/// dispatcher owns the driver.
#[derive(Clone)]
pub struct MockHub {
    state: Arc<Mutex<MockHubState>>,
}

#[derive(Debug)]
struct MockHubState {
    behavior: ConnectBehavior,
    connected: bool,
    scans: u32,
    turns: Vec<(u8, i32)>,
    brakes: Vec<u8>,
}

impl MockHub {
    /// Create a new mock hub with the given connect behavior
    pub fn new(behavior: ConnectBehavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockHubState {
                behavior,
                connected: false,
                scans: 0,
                turns: Vec::new(),
                brakes: Vec::new(),
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockHubState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of scan attempts so far
    pub fn scan_count(&self) -> u32 {
        self.state().scans
    }

    /// Recorded `(channel, power)` motor turns
    pub fn motor_turns(&self) -> Vec<(u8, i32)> {
        self.state().turns.clone()
    }

    /// Recorded brake channels
    pub fn motor_brakes(&self) -> Vec<u8> {
        self.state().brakes.clone()
    }
}

impl ActuatorDriver for MockHub {
    fn scan_and_connect(&mut self) -> Result<()> {
        let mut state = self.state();
        state.scans += 1;
        match state.behavior {
            ConnectBehavior::Immediate => {
                state.connected = true;
                Ok(())
            }
            ConnectBehavior::Never => Ok(()),
            ConnectBehavior::Error => Err(Error::Other("hub scan failed".to_string())),
        }
    }

    fn is_connected(&mut self) -> bool {
        self.state().connected
    }

    fn disconnect(&mut self) -> Result<()> {
        self.state().connected = false;
        Ok(())
    }

    fn motor_turn(&mut self, channel: u8, power: i32) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.turns.push((channel, power));
        Ok(())
    }

    fn motor_brake(&mut self, channel: u8) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.brakes.push(channel);
        Ok(())
    }
}

/// Mock distance sensor returning a fixed reading
pub struct MockSensor {
    distance_cm: f32,
    failing: bool,
}

impl MockSensor {
    /// Create a sensor that always reports `distance_cm`
    pub fn new(distance_cm: f32) -> Self {
        Self {
            distance_cm,
            failing: false,
        }
    }

    /// Create a sensor whose reads always fail
    pub fn failing() -> Self {
        Self {
            distance_cm: 0.0,
            failing: true,
        }
    }
}

impl DistanceSensor for MockSensor {
    fn get_distance(&mut self) -> Result<f32> {
        if self.failing {
            return Err(Error::Other("echo pulse timed out".to_string()));
        }
        Ok(self.distance_cm)
    }
}
