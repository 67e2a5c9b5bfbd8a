use serde_json::Value;
use tracing::debug;

use crate::protocol::{
    auth_check_body, device_status_path, login_body, product_functions_path, DEFAULT_TERMINAL_TYPE,
    DEVICES_PATH, LOGIN_PATH, LOGOUT_PATH,
};
use crate::transport::Transport;
use crate::types::{DeviceList, DeviceValues, ProductFunctions};
use crate::Result;

/// One method per Eolia endpoint, with no caching or state of its own
/// beyond the transport's session.
#[derive(Debug)]
pub struct EoliaApi {
    transport: Transport,
}

impl EoliaApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Credential-less login probe. With no session the transport falls
    /// back to a full login and retries.
    pub async fn auth_check(&mut self) -> Result<Value> {
        self.transport
            .post(LOGIN_PATH, Some(&auth_check_body()))
            .await?
            .json()
    }

    pub async fn login(
        &mut self,
        id: &str,
        pass: &str,
        terminal_type: u8,
        next_easy: bool,
    ) -> Result<Value> {
        debug!(id, "logging in");
        let body = login_body(id, pass, terminal_type, next_easy);
        self.transport.post(LOGIN_PATH, Some(&body)).await?.json()
    }

    /// [`login`](Self::login) with the app's usual terminal type and easy-login flag.
    pub async fn login_default(&mut self, id: &str, pass: &str) -> Result<Value> {
        self.login(id, pass, DEFAULT_TERMINAL_TYPE, true).await
    }

    pub async fn logout(&mut self) -> Result<Value> {
        self.transport.post(LOGOUT_PATH, None).await?.json()
    }

    pub async fn product_functions(&mut self, product_code: &str) -> Result<ProductFunctions> {
        self.transport
            .get(&product_functions_path(product_code))
            .await?
            .json()
    }

    pub async fn devices(&mut self) -> Result<DeviceList> {
        self.transport.get(DEVICES_PATH).await?.json()
    }

    pub async fn device_status(&mut self, appliance_id: &str) -> Result<DeviceValues> {
        self.transport
            .get(&device_status_path(appliance_id))
            .await?
            .json()
    }

    /// Submits a full values payload and returns what the service stored.
    pub async fn device_update(&mut self, appliance_id: &str, body: &Value) -> Result<DeviceValues> {
        self.transport
            .put(&device_status_path(appliance_id), body)
            .await?
            .json()
    }
}
