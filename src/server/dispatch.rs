//! Command dispatch state machine
//!
//! One dispatcher instance owns the actuator link and the optional distance
//! sensor; it is the only place actuator access happens, so commands are
//! serialized by construction. Every decoded request produces exactly one
//! response. Each handler returns `Result<String, String>` (success message
//! or failure description) and a single response builder consumes it, so
//! driver failures are converted to code-1 responses at this boundary and
//! never propagate into the session loop.
//!
//! # Actuator link lifecycle
//!
//! ```text
//! absent --connect--> connecting --poll ok--> connected
//!   ^                     |                       |
//!   |              connect error            disconnect
//!   +---------------------+-----------------------+
//! ```
//!
//! A connect that times out keeps the freshly created driver so a later
//! `is_connected` reports the live link state. Only a connect error and
//! `disconnect` reset the link to absent.

use crate::drivers::{ActuatorDriver, DistanceSensor, HubFactory};
use crate::protocol::{CommandKind, Request, Response};
use std::thread;
use std::time::{Duration, Instant};

/// Motor channel driven by `up`/`down`
const DRIVE_CHANNEL: u8 = 0;
/// Motor channel driven by `left`/`right`
const STEER_CHANNEL: u8 = 1;
/// Power magnitude for the drive channel
const DRIVE_POWER: i32 = 100;
/// Power magnitude for the steer channel
const STEER_POWER: i32 = 10;

/// Timing policy for connect polling and motor holds
#[derive(Debug, Clone)]
pub struct Timings {
    /// Overall budget for a hub connect attempt
    pub connect_timeout: Duration,
    /// Interval between `is_connected` polls while connecting
    pub connect_poll: Duration,
    /// Motor hold before braking on `up`/`down`
    pub drive_hold: Duration,
    /// Motor hold before braking on `left`/`right`
    pub steer_hold: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(7000),
            connect_poll: Duration::from_millis(100),
            drive_hold: Duration::from_secs(1),
            steer_hold: Duration::from_secs(2),
        }
    }
}

/// What the session loop should do after the response is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading requests from the current peer
    Continue,
    /// End the session and stop serving (`quit`)
    Shutdown,
}

/// Per-command outcome: success message or failure description
type Outcome = std::result::Result<String, String>;

/// Link state as the capitalized literal controllers compare against
fn link_state_text(connected: bool) -> &'static str {
    if connected {
        "True"
    } else {
        "False"
    }
}

/// Command dispatcher owning the actuator link and sensor handle
pub struct Dispatcher {
    hub_factory: HubFactory,
    hub: Option<Box<dyn ActuatorDriver>>,
    sensor: Option<Box<dyn DistanceSensor>>,
    timings: Timings,
}

impl Dispatcher {
    /// Create a dispatcher with no actuator link established
    pub fn new(
        hub_factory: HubFactory,
        sensor: Option<Box<dyn DistanceSensor>>,
        timings: Timings,
    ) -> Self {
        Self {
            hub_factory,
            hub: None,
            sensor,
            timings,
        }
    }

    /// Decode a raw frame payload and dispatch it
    ///
    /// Undecodable JSON and a missing `cmd` field yield a code-1 response;
    /// the session continues.
    pub fn dispatch_raw(&mut self, payload: &[u8]) -> (Response, Flow) {
        let request: Request = match serde_json::from_slice(payload) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Rejecting undecodable request: {}", e);
                return (Response::fail(format!("invalid request: {}", e)), Flow::Continue);
            }
        };
        self.dispatch(&request)
    }

    /// Execute one request and build its response
    pub fn dispatch(&mut self, request: &Request) -> (Response, Flow) {
        let Some(kind) = CommandKind::parse(&request.cmd) else {
            log::warn!("Unknown command {:?}", request.cmd);
            return (
                Response::fail(format!("unknown command: {}", request.cmd)),
                Flow::Continue,
            );
        };

        log::info!("Dispatching command: {:?}", kind);
        let mut flow = Flow::Continue;
        let outcome = match kind {
            CommandKind::Quit => {
                flow = Flow::Shutdown;
                Ok("bye!".to_string())
            }
            CommandKind::Echo => Ok("echo response".to_string()),
            CommandKind::Connect => self.connect(),
            CommandKind::Disconnect => self.disconnect(),
            CommandKind::IsConnected => Ok(link_state_text(self.is_connected()).to_string()),
            CommandKind::Up => self.motor_hold("up", DRIVE_CHANNEL, DRIVE_POWER),
            CommandKind::Down => self.motor_hold("down", DRIVE_CHANNEL, -DRIVE_POWER),
            CommandKind::Left => self.motor_hold("left", STEER_CHANNEL, -STEER_POWER),
            CommandKind::Right => self.motor_hold("right", STEER_CHANNEL, STEER_POWER),
            CommandKind::Distance => self.distance(),
        };

        let response = match outcome {
            Ok(msg) => Response::ok(msg),
            Err(msg) => {
                log::warn!("Command {:?} failed: {}", kind, msg);
                Response::fail(msg)
            }
        };
        (response, flow)
    }

    /// Whether the actuator link currently reports connected
    fn is_connected(&mut self) -> bool {
        self.hub.as_mut().map(|h| h.is_connected()).unwrap_or(false)
    }

    /// Create a fresh hub driver and poll for the connection to come up
    fn connect(&mut self) -> Outcome {
        let mut hub = match (self.hub_factory)() {
            Ok(h) => h,
            Err(e) => {
                self.hub = None;
                return Err(format!("Failed to connect hub, error: {}", e));
            }
        };
        if let Err(e) = hub.scan_and_connect() {
            self.hub = None;
            return Err(format!("Failed to connect hub, error: {}", e));
        }

        let deadline = Instant::now() + self.timings.connect_timeout;
        while !hub.is_connected() {
            if Instant::now() >= deadline {
                // Keep the link; is_connected keeps reporting the live state
                self.hub = Some(hub);
                return Err("Failed to connect hub, got timeout".to_string());
            }
            thread::sleep(self.timings.connect_poll);
        }

        self.hub = Some(hub);
        Ok("hub connected!".to_string())
    }

    /// Tear down the link; it resets to absent regardless of outcome
    fn disconnect(&mut self) -> Outcome {
        match self.hub.take() {
            Some(mut hub) => match hub.disconnect() {
                Ok(()) => Ok("hub disconnected!".to_string()),
                Err(e) => Err(format!("Failed to disconnect hub, error: {}", e)),
            },
            // No link established: no-op success
            None => Ok("hub disconnected!".to_string()),
        }
    }

    /// Turn a motor channel, hold for the fixed duration, then brake
    fn motor_hold(&mut self, name: &str, channel: u8, power: i32) -> Outcome {
        let hold = if channel == DRIVE_CHANNEL {
            self.timings.drive_hold
        } else {
            self.timings.steer_hold
        };
        let Some(hub) = self.hub.as_mut() else {
            return Err("hub is not connected!".to_string());
        };

        if let Err(e) = hub.motor_turn(channel, power) {
            return Err(format!("{} failed: {}", name, e));
        }
        // Fixed hold: precision traded for simplicity, not cancellable mid-hold
        thread::sleep(hold);
        if let Err(e) = hub.motor_brake(channel) {
            return Err(format!("{} failed: {}", name, e));
        }
        Ok(format!("{} succeeded", name))
    }

    /// Take one distance reading from the configured sensor
    fn distance(&mut self) -> Outcome {
        let Some(sensor) = self.sensor.as_mut() else {
            return Err("sensor not configured".to_string());
        };
        match sensor.get_distance() {
            Ok(cm) => Ok(cm.to_string()),
            Err(e) => Err(format!("distance failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::mock::{ConnectBehavior, MockHub, MockSensor};

    fn fast_timings() -> Timings {
        Timings {
            connect_timeout: Duration::from_millis(50),
            connect_poll: Duration::from_millis(5),
            drive_hold: Duration::from_millis(5),
            steer_hold: Duration::from_millis(5),
        }
    }

    fn dispatcher_with(behavior: ConnectBehavior) -> (Dispatcher, MockHub) {
        let hub = MockHub::new(behavior);
        let probe = hub.clone();
        let factory: HubFactory = Box::new(move || Ok(Box::new(hub.clone()) as Box<dyn ActuatorDriver>));
        (Dispatcher::new(factory, None, fast_timings()), probe)
    }

    fn cmd(dispatcher: &mut Dispatcher, name: &str) -> (Response, Flow) {
        dispatcher.dispatch(&Request::new(name))
    }

    #[test]
    fn test_echo_is_idempotent() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Immediate);
        for _ in 0..3 {
            let (resp, flow) = cmd(&mut d, "echo");
            assert_eq!(resp, Response::ok("echo response"));
            assert_eq!(flow, Flow::Continue);
        }
    }

    #[test]
    fn test_quit_shuts_down() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Immediate);
        let (resp, flow) = cmd(&mut d, "quit");
        assert_eq!(resp, Response::ok("bye!"));
        assert_eq!(flow, Flow::Shutdown);
    }

    #[test]
    fn test_is_connected_false_before_connect() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Immediate);
        let (resp, _) = cmd(&mut d, "is_connected");
        assert_eq!(resp, Response::ok("False"));
    }

    #[test]
    fn test_connect_lifecycle() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Immediate);

        let (resp, _) = cmd(&mut d, "connect");
        assert_eq!(resp, Response::ok("hub connected!"));

        let (resp, _) = cmd(&mut d, "is_connected");
        assert_eq!(resp, Response::ok("True"));

        let (resp, _) = cmd(&mut d, "disconnect");
        assert_eq!(resp, Response::ok("hub disconnected!"));

        let (resp, _) = cmd(&mut d, "is_connected");
        assert_eq!(resp, Response::ok("False"));
    }

    #[test]
    fn test_connect_poll_timeout() {
        let (mut d, probe) = dispatcher_with(ConnectBehavior::Never);
        let start = Instant::now();
        let (resp, flow) = cmd(&mut d, "connect");
        assert_eq!(resp, Response::fail("Failed to connect hub, got timeout"));
        assert_eq!(flow, Flow::Continue);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(probe.scan_count(), 1);

        // Link retained after timeout; still reports the live (false) state
        let (resp, _) = cmd(&mut d, "is_connected");
        assert_eq!(resp, Response::ok("False"));
    }

    #[test]
    fn test_connect_error_resets_link() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Error);
        let (resp, _) = cmd(&mut d, "connect");
        assert!(!resp.is_ok());
        assert_eq!(resp.msg, "Failed to connect hub, error: hub scan failed");

        let (resp, _) = cmd(&mut d, "is_connected");
        assert_eq!(resp, Response::ok("False"));
    }

    #[test]
    fn test_factory_error_resets_link() {
        let hub = MockHub::new(ConnectBehavior::Immediate);
        let mut calls = 0u32;
        let factory: HubFactory = Box::new(move || {
            calls += 1;
            if calls == 1 {
                Ok(Box::new(hub.clone()) as Box<dyn ActuatorDriver>)
            } else {
                Err(crate::error::Error::Other("no adapter present".to_string()))
            }
        });
        let mut d = Dispatcher::new(factory, None, fast_timings());

        let (resp, _) = cmd(&mut d, "connect");
        assert_eq!(resp, Response::ok("hub connected!"));
        let (resp, _) = cmd(&mut d, "is_connected");
        assert_eq!(resp, Response::ok("True"));

        // A failed reconnect drops the previously held link too
        let (resp, _) = cmd(&mut d, "connect");
        assert_eq!(
            resp,
            Response::fail("Failed to connect hub, error: no adapter present")
        );
        let (resp, _) = cmd(&mut d, "is_connected");
        assert_eq!(resp, Response::ok("False"));
    }

    #[test]
    fn test_disconnect_without_connect_is_noop() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Immediate);
        let (resp, flow) = cmd(&mut d, "disconnect");
        assert_eq!(resp, Response::ok("hub disconnected!"));
        assert_eq!(flow, Flow::Continue);
    }

    #[test]
    fn test_motion_requires_link() {
        let (mut d, probe) = dispatcher_with(ConnectBehavior::Immediate);
        for name in ["up", "down", "left", "right"] {
            let (resp, _) = cmd(&mut d, name);
            assert_eq!(resp, Response::fail("hub is not connected!"));
        }
        // No motor call was attempted
        assert!(probe.motor_turns().is_empty());
        assert!(probe.motor_brakes().is_empty());
    }

    #[test]
    fn test_motion_channel_and_power_mapping() {
        let (mut d, probe) = dispatcher_with(ConnectBehavior::Immediate);
        cmd(&mut d, "connect");

        for (name, expected) in [
            ("up", (0, 100)),
            ("down", (0, -100)),
            ("left", (1, -10)),
            ("right", (1, 10)),
        ] {
            let (resp, _) = cmd(&mut d, name);
            assert_eq!(resp, Response::ok(format!("{} succeeded", name)));
            assert_eq!(probe.motor_turns().last(), Some(&expected));
            assert_eq!(probe.motor_brakes().last(), Some(&expected.0));
        }
        assert_eq!(probe.motor_turns().len(), 4);
        assert_eq!(probe.motor_brakes().len(), 4);
    }

    #[test]
    fn test_motor_failure_becomes_code1_and_keeps_link() {
        let (mut d, probe) = dispatcher_with(ConnectBehavior::Immediate);
        cmd(&mut d, "connect");
        // Force the next motor call to fail
        probe.clone().disconnect().unwrap();

        let (resp, flow) = cmd(&mut d, "up");
        assert!(!resp.is_ok());
        assert!(resp.msg.starts_with("up failed:"));
        assert_eq!(flow, Flow::Continue);

        // Link is kept; subsequent commands still reach the driver
        let (resp, _) = cmd(&mut d, "is_connected");
        assert_eq!(resp, Response::ok("False"));
    }

    #[test]
    fn test_distance_without_sensor() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Immediate);
        let (resp, _) = cmd(&mut d, "distance");
        assert_eq!(resp, Response::fail("sensor not configured"));
    }

    #[test]
    fn test_distance_with_sensor() {
        let hub = MockHub::new(ConnectBehavior::Immediate);
        let factory: HubFactory = Box::new(move || Ok(Box::new(hub.clone()) as Box<dyn ActuatorDriver>));
        let mut d = Dispatcher::new(
            factory,
            Some(Box::new(MockSensor::new(25.5))),
            fast_timings(),
        );
        let (resp, _) = cmd(&mut d, "distance");
        assert_eq!(resp, Response::ok("25.5"));
    }

    #[test]
    fn test_distance_read_failure() {
        let hub = MockHub::new(ConnectBehavior::Immediate);
        let factory: HubFactory = Box::new(move || Ok(Box::new(hub.clone()) as Box<dyn ActuatorDriver>));
        let mut d = Dispatcher::new(factory, Some(Box::new(MockSensor::failing())), fast_timings());
        let (resp, _) = cmd(&mut d, "distance");
        assert!(!resp.is_ok());
        assert!(resp.msg.starts_with("distance failed:"));
    }

    #[test]
    fn test_unknown_command() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Immediate);
        let (resp, flow) = cmd(&mut d, "warp");
        assert_eq!(resp, Response::fail("unknown command: warp"));
        assert_eq!(flow, Flow::Continue);
    }

    #[test]
    fn test_dispatch_raw_rejects_bad_payloads() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Immediate);

        let (resp, flow) = d.dispatch_raw(b"not json");
        assert!(!resp.is_ok());
        assert!(resp.msg.starts_with("invalid request:"));
        assert_eq!(flow, Flow::Continue);

        // Valid JSON but no cmd field
        let (resp, _) = d.dispatch_raw(b"{\"power\":50}");
        assert!(!resp.is_ok());
        assert!(resp.msg.starts_with("invalid request:"));
    }

    #[test]
    fn test_dispatch_raw_valid_request() {
        let (mut d, _) = dispatcher_with(ConnectBehavior::Immediate);
        let (resp, flow) = d.dispatch_raw(b"{\"cmd\":\"echo\"}");
        assert_eq!(resp, Response::ok("echo response"));
        assert_eq!(flow, Flow::Continue);
    }
}
