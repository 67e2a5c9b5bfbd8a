use serde_json::Value;

use crate::types::{DeviceInfo, DeviceValues, Features, OperationMode};
use crate::{Error, Result};

const MIN_TEMPERATURE: f64 = 16.0;
const MAX_TEMPERATURE: f64 = 30.0;
const MIN_WIND: i64 = 0;
const MAX_WIND: i64 = 5;
const HUMIDITY_UNAVAILABLE: f64 = 999.0;

/// One air conditioner: identity, current values, and the product's
/// capability flags.
///
/// Setters only stage changes locally. Nothing reaches the service until
/// [`EoliaClient::apply`](crate::EoliaClient::apply).
#[derive(Debug, Clone)]
pub struct AirConditioner {
    info: DeviceInfo,
    values: DeviceValues,
    features: Features,
}

impl AirConditioner {
    pub fn new(info: DeviceInfo, values: DeviceValues, features: Features) -> Self {
        Self { info, values, features }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn values(&self) -> &DeviceValues {
        &self.values
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Swaps in a new set of values. Identity and capabilities are untouched.
    pub(crate) fn replace_values(&mut self, values: DeviceValues) -> DeviceValues {
        std::mem::replace(&mut self.values, values)
    }

    // -- Identity --

    pub fn appliance_id(&self) -> &str {
        &self.info.appliance_id
    }

    pub fn nickname(&self) -> Option<&str> {
        self.info.nickname.as_deref()
    }

    pub fn appliance_type(&self) -> Option<&str> {
        self.info.appliance_type.as_deref()
    }

    pub fn product_code(&self) -> &str {
        &self.info.product_code
    }

    pub fn product_name(&self) -> Option<&str> {
        self.info.product_name.as_deref()
    }

    pub fn point_code(&self) -> Option<&str> {
        self.info.point_code.as_deref()
    }

    // -- Writable values --

    pub fn operation_status(&self) -> Option<bool> {
        self.values.operation_status
    }

    pub fn set_operation_status(&mut self, on: bool) {
        self.values.operation_status = Some(on);
    }

    /// Raw mode string as reported; the service may use modes this crate
    /// does not model.
    pub fn operation_mode(&self) -> Option<&str> {
        self.values.operation_mode.as_deref()
    }

    /// Blast needs the product's `blast` capability.
    pub fn set_operation_mode(&mut self, mode: impl AsRef<str>) -> Result<()> {
        let mode: OperationMode = mode.as_ref().parse()?;
        if mode == OperationMode::Blast && !self.supports("blast") {
            return Err(Error::UnsupportedOperation(format!(
                "Blast mode is not supported on \"{}\"",
                self.product_code()
            )));
        }
        self.values.operation_mode = Some(mode.as_eolia_str().to_string());
        Ok(())
    }

    pub fn temperature(&self) -> Option<f64> {
        self.values.temperature
    }

    /// Clamped to 16..=30 °C.
    pub fn set_temperature(&mut self, celsius: f64) {
        let t = if celsius.is_nan() {
            MIN_TEMPERATURE
        } else {
            celsius.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
        };
        self.values.temperature = Some(t);
    }

    pub fn wind_speed(&self) -> Option<i64> {
        self.values.wind_speed
    }

    /// Clamped to 0..=5.
    pub fn set_wind_speed(&mut self, speed: i64) {
        self.values.wind_speed = Some(speed.clamp(MIN_WIND, MAX_WIND));
    }

    pub fn wind_direction(&self) -> Option<i64> {
        self.values.wind_direction
    }

    /// Clamped to 0..=5.
    pub fn set_wind_direction(&mut self, direction: i64) {
        self.values.wind_direction = Some(direction.clamp(MIN_WIND, MAX_WIND));
    }

    pub fn timer_value(&self) -> Option<i64> {
        self.values.timer_value
    }

    pub fn set_timer_value(&mut self, value: i64) {
        self.values.timer_value = Some(value);
    }

    // -- Telemetry --

    /// `NaN` when the unit has no humidity sensor (reported as 999).
    pub fn inside_humidity(&self) -> Option<f64> {
        self.values.inside_humidity.map(|h| {
            if h == HUMIDITY_UNAVAILABLE {
                f64::NAN
            } else {
                h
            }
        })
    }

    pub fn inside_temperature(&self) -> Option<f64> {
        self.values.inside_temp
    }

    pub fn outside_temperature(&self) -> Option<f64> {
        self.values.outside_temp
    }

    pub fn operation_priority(&self) -> Option<bool> {
        self.values.operation_priority
    }

    pub fn device_error_state(&self) -> Option<bool> {
        self.values.device_errstatus
    }

    pub fn air_quality(&self) -> Option<bool> {
        self.values.airquality
    }

    pub fn nanoex(&self) -> Option<bool> {
        self.values.nanoex
    }

    pub fn aq_value(&self) -> Option<i64> {
        self.values.aq_value
    }

    pub fn aq_name(&self) -> Option<&str> {
        self.values.aq_name.as_deref()
    }

    // -- Capabilities --

    /// Capability value, or `false` if the product does not list it.
    /// A missing flag and an explicit `false` look the same.
    pub fn feature(&self, name: &str) -> &Value {
        self.features.get(name)
    }

    pub fn supports(&self, name: &str) -> bool {
        self.features.is_enabled(name)
    }
}
