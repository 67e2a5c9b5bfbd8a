use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::diff::ValueChange;
use crate::protocol::OPERATION_TOKEN;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationMode {
    Auto,
    Cooling,
    Heating,
    CoolDehumidifying,
    Blast,
}

impl OperationMode {
    pub const ALL: [OperationMode; 5] = [
        OperationMode::Auto,
        OperationMode::Cooling,
        OperationMode::Heating,
        OperationMode::CoolDehumidifying,
        OperationMode::Blast,
    ];

    pub fn as_eolia_str(&self) -> &'static str {
        match self {
            OperationMode::Auto => "Auto",
            OperationMode::Cooling => "Cooling",
            OperationMode::Heating => "Heating",
            OperationMode::CoolDehumidifying => "CoolDehumidifying",
            OperationMode::Blast => "Blast",
        }
    }

    pub fn from_eolia_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_eolia_str() == s)
    }
}

impl FromStr for OperationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_eolia_str(s).ok_or_else(|| Error::InvalidArgument("Invalid Operation Mode".into()))
    }
}

impl AsRef<str> for OperationMode {
    fn as_ref(&self) -> &str {
        self.as_eolia_str()
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_eolia_str())
    }
}

/// Identity of one appliance as listed by `GET /devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub appliance_id: String,
    pub product_code: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub appliance_type: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub point_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub ac_list: Vec<DeviceInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFunction {
    pub function_id: String,
    pub function_value: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFunctions {
    #[serde(default)]
    pub ac_function_list: Vec<ProductFunction>,
}

/// Operational values of one appliance as returned by `GET .../status`.
///
/// Fields without a typed slot are kept in `extra` so a submitted payload
/// carries everything the service sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) operation_status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) operation_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) wind_speed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) wind_direction: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) timer_value: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) inside_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) outside_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) inside_humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) operation_priority: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) device_errstatus: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) airquality: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) nanoex: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) aq_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) aq_name: Option<String>,

    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl DeviceValues {
    pub(crate) fn strip_operation_token(&mut self) {
        self.extra.remove(OPERATION_TOKEN);
    }

    pub fn contains_operation_token(&self) -> bool {
        self.extra.contains_key(OPERATION_TOKEN)
    }

    /// A field the typed accessors do not cover.
    pub fn other(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    pub(crate) fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

static ABSENT: Value = Value::Bool(false);

/// Capability flags of a product model, keyed by `function_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features(BTreeMap<String, Value>);

impl Features {
    /// The flag's value, or `false` when the model does not list it.
    pub fn get(&self, name: &str) -> &Value {
        self.0.get(name).unwrap_or(&ABSENT)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name) == &Value::Bool(true)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<ProductFunctions> for Features {
    fn from(functions: ProductFunctions) -> Self {
        functions.ac_function_list.into_iter().collect()
    }
}

impl FromIterator<ProductFunction> for Features {
    fn from_iter<I: IntoIterator<Item = ProductFunction>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|f| (f.function_id, f.function_value))
                .collect(),
        )
    }
}

/// Notifications fired by [`EoliaClient`](crate::EoliaClient) as the registry changes.
#[derive(Debug, Clone)]
pub enum Event {
    DevicesLoaded { count: usize },
    ValuesChanged { appliance_id: String, changes: Vec<ValueChange> },
    /// The confirmed values differ from what `apply` submitted.
    ApplyAdjusted { appliance_id: String, changes: Vec<ValueChange> },
}
