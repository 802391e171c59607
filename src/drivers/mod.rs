//! Driver traits for the external motor hub and distance sensor
//!
//! The dispatcher only consumes these contracts; real hardware drivers live
//! outside this crate. The `mock` module provides in-process implementations
//! for hardware-free runs and tests.

pub mod mock;

use crate::config::{HubConfig, SensorConfig};
use crate::error::{Error, Result};

/// Motor hub driver trait
///
/// Connection is asynchronous: `scan_and_connect` starts the attempt and the
/// outcome is observed by polling `is_connected`.
pub trait ActuatorDriver: Send {
    /// Begin scanning for and connecting to the hub
    fn scan_and_connect(&mut self) -> Result<()>;

    /// Whether the hub link is currently established
    fn is_connected(&mut self) -> bool;

    /// Tear down the hub link
    fn disconnect(&mut self) -> Result<()>;

    /// Turn a motor channel
    ///
    /// # Arguments
    /// * `channel` - Motor channel index
    /// * `power` - Signed power: sign is direction, magnitude is speed
    fn motor_turn(&mut self, channel: u8, power: i32) -> Result<()>;

    /// Brake a motor channel
    fn motor_brake(&mut self, channel: u8) -> Result<()>;
}

/// Distance sensor driver trait
pub trait DistanceSensor: Send {
    /// Take one blocking distance reading in centimeters
    fn get_distance(&mut self) -> Result<f32>;
}

/// Factory that creates a fresh hub driver for each connect attempt
pub type HubFactory = Box<dyn FnMut() -> Result<Box<dyn ActuatorDriver>> + Send>;

/// Create a hub driver factory based on configuration
pub fn create_hub_factory(config: &HubConfig) -> Result<HubFactory> {
    match config.hub_type.as_str() {
        "mock" => Ok(Box::new(|| {
            Ok(Box::new(mock::MockHub::new(mock::ConnectBehavior::Immediate))
                as Box<dyn ActuatorDriver>)
        })),
        other => Err(Error::UnknownDriver(other.to_string())),
    }
}

/// Create the optional distance sensor based on configuration
pub fn create_sensor(config: &SensorConfig) -> Result<Option<Box<dyn DistanceSensor>>> {
    if !config.enabled {
        return Ok(None);
    }
    match config.sensor_type.as_str() {
        "mock" => Ok(Some(Box::new(mock::MockSensor::new(25.0)))),
        other => Err(Error::UnknownDriver(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_create_mock_drivers_from_defaults() {
        let config = AppConfig::mock_defaults();
        let mut factory = create_hub_factory(&config.hub).unwrap();
        let mut hub = factory().unwrap();
        assert!(!hub.is_connected());
        assert!(create_sensor(&config.sensor).unwrap().is_some());
    }

    #[test]
    fn test_unknown_driver_types_rejected() {
        let mut config = AppConfig::mock_defaults();
        config.hub.hub_type = "bluetooth".to_string();
        assert!(matches!(
            create_hub_factory(&config.hub),
            Err(Error::UnknownDriver(_))
        ));
        config.sensor.sensor_type = "gpio".to_string();
        assert!(matches!(
            create_sensor(&config.sensor),
            Err(Error::UnknownDriver(_))
        ));
    }

    #[test]
    fn test_disabled_sensor_is_absent() {
        let mut config = AppConfig::mock_defaults();
        config.sensor.enabled = false;
        assert!(create_sensor(&config.sensor).unwrap().is_none());
    }
}
