use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::Value;
use tracing::debug;

use crate::api::EoliaApi;
use crate::device::AirConditioner;
use crate::diff::value_changes;
use crate::logger::TrafficLogMode;
use crate::protocol::{operation_token, update_body};
use crate::transport::{Transport, TransportConfig};
use crate::types::{Event, Features};
use crate::{Error, Result};

type EventCallback = Box<dyn Fn(&Event) + Send + Sync>;

pub struct EoliaClientBuilder {
    config: TransportConfig,
    event_callbacks: Vec<EventCallback>,
}

impl EoliaClientBuilder {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            config: TransportConfig {
                user_id: Some(user_id.into()),
                password: Some(SecretString::from(password.into())),
                ..TransportConfig::default()
            },
            event_callbacks: Vec::new(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn accept_language(mut self, lang: impl Into<String>) -> Self {
        self.config.accept_language = lang.into();
        self
    }

    /// Reuse a session cookie (`atkn=...`) from an earlier run.
    pub fn session(mut self, cookie: impl Into<String>) -> Self {
        self.config.session = Some(cookie.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn traffic_log(mut self, mode: TrafficLogMode, path: impl Into<PathBuf>) -> Self {
        self.config.traffic_log = Some((mode, path.into()));
        self
    }

    pub fn on_event(mut self, f: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        self.event_callbacks.push(Box::new(f));
        self
    }

    pub fn build(self) -> Result<EoliaClient> {
        let transport = Transport::new(self.config)?;
        Ok(EoliaClient {
            api: EoliaApi::new(transport),
            devices: None,
            event_callbacks: self.event_callbacks,
        })
    }
}

/// Device registry on top of [`EoliaApi`].
///
/// Keeps the account's air conditioners in memory, refreshes their values,
/// and pushes locally staged changes back to the service.
pub struct EoliaClient {
    api: EoliaApi,
    devices: Option<Vec<AirConditioner>>,
    event_callbacks: Vec<EventCallback>,
}

impl EoliaClient {
    pub fn builder(user_id: impl Into<String>, password: impl Into<String>) -> EoliaClientBuilder {
        EoliaClientBuilder::new(user_id, password)
    }

    pub fn api(&self) -> &EoliaApi {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut EoliaApi {
        &mut self.api
    }

    /// Validates the stored session, logging in if there is none.
    pub async fn begin(&mut self) -> Result<()> {
        self.api.auth_check().await?;
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<Value> {
        self.api.logout().await
    }

    /// The account's devices. Served from memory unless `fresh` is set or
    /// nothing has been loaded yet.
    ///
    /// A rebuild fetches status and capabilities for each device in turn.
    /// If any call fails the previous list stays in place.
    pub async fn devices(&mut self, fresh: bool) -> Result<&[AirConditioner]> {
        if fresh || self.devices.is_none() {
            let rebuilt = self.load_devices().await?;
            let count = rebuilt.len();
            self.devices = Some(rebuilt);
            self.emit(&Event::DevicesLoaded { count });
        }
        Ok(self.devices.as_deref().unwrap_or_default())
    }

    /// Devices already loaded, without touching the network.
    pub fn cached_devices(&self) -> Option<&[AirConditioner]> {
        self.devices.as_deref()
    }

    pub fn device(&self, appliance_id: &str) -> Option<&AirConditioner> {
        self.devices
            .as_ref()?
            .iter()
            .find(|d| d.appliance_id() == appliance_id)
    }

    /// Mutable access for staging changes before [`apply`](Self::apply).
    pub fn device_mut(&mut self, appliance_id: &str) -> Option<&mut AirConditioner> {
        self.devices
            .as_mut()?
            .iter_mut()
            .find(|d| d.appliance_id() == appliance_id)
    }

    /// Re-reads one device's values. Identity and capabilities are kept.
    pub async fn refresh(&mut self, appliance_id: &str) -> Result<&AirConditioner> {
        let idx = self.find_managed(appliance_id)?;
        let values = self.api.device_status(appliance_id).await?;

        let device = self.managed_mut(idx)?;
        let previous = device.replace_values(values);
        let changes = value_changes(&previous.to_json(), &device.values().to_json());
        if !changes.is_empty() {
            debug!(appliance_id, changed = changes.len(), "device values refreshed");
            self.emit(&Event::ValuesChanged {
                appliance_id: appliance_id.to_string(),
                changes,
            });
        }
        self.managed(idx)
    }

    /// Submits the device's staged values with a fresh operation token and
    /// installs the values the service confirms.
    pub async fn apply(&mut self, appliance_id: &str) -> Result<&AirConditioner> {
        let idx = self.find_managed(appliance_id)?;
        let submitted = self.managed(idx)?.values().clone();
        let token = operation_token();
        let body = update_body(&submitted, &token)?;

        debug!(appliance_id, "applying device values");
        let mut confirmed = self.api.device_update(appliance_id, &body).await?;
        confirmed.strip_operation_token();

        let mut sent = submitted;
        sent.strip_operation_token();
        let adjusted = value_changes(&sent.to_json(), &confirmed.to_json());

        let device = self.managed_mut(idx)?;
        let previous = device.replace_values(confirmed);
        let changes = value_changes(&previous.to_json(), &device.values().to_json());

        if !adjusted.is_empty() {
            debug!(appliance_id, adjusted = adjusted.len(), "service adjusted applied values");
            self.emit(&Event::ApplyAdjusted {
                appliance_id: appliance_id.to_string(),
                changes: adjusted,
            });
        }
        if !changes.is_empty() {
            self.emit(&Event::ValuesChanged {
                appliance_id: appliance_id.to_string(),
                changes,
            });
        }
        self.managed(idx)
    }

    // -- Helpers --

    async fn load_devices(&mut self) -> Result<Vec<AirConditioner>> {
        let list = self.api.devices().await?;
        debug!(count = list.ac_list.len(), "loading devices");

        let mut devices = Vec::with_capacity(list.ac_list.len());
        for info in list.ac_list {
            let values = self.api.device_status(&info.appliance_id).await?;
            let features = Features::from(self.api.product_functions(&info.product_code).await?);
            devices.push(AirConditioner::new(info, values, features));
        }
        Ok(devices)
    }

    fn find_managed(&self, appliance_id: &str) -> Result<usize> {
        self.devices
            .as_ref()
            .and_then(|list| list.iter().position(|d| d.appliance_id() == appliance_id))
            .ok_or_else(|| {
                Error::InvalidArgument(format!("{appliance_id:?} is not a managed device"))
            })
    }

    fn managed(&self, idx: usize) -> Result<&AirConditioner> {
        self.devices
            .as_ref()
            .and_then(|list| list.get(idx))
            .ok_or_else(|| Error::InvalidArgument("device list changed during call".into()))
    }

    fn managed_mut(&mut self, idx: usize) -> Result<&mut AirConditioner> {
        self.devices
            .as_mut()
            .and_then(|list| list.get_mut(idx))
            .ok_or_else(|| Error::InvalidArgument("device list changed during call".into()))
    }

    fn emit(&self, event: &Event) {
        for cb in &self.event_callbacks {
            cb(event);
        }
    }
}
