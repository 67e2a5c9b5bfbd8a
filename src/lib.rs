mod api;
mod client;
mod device;
mod diff;
mod error;
mod logger;
mod protocol;
mod transport;
mod types;

pub use api::EoliaApi;
pub use client::{EoliaClient, EoliaClientBuilder};
pub use device::AirConditioner;
pub use diff::ValueChange;
pub use error::{Error, Result};
pub use logger::TrafficLogMode;
pub use protocol::{DEFAULT_BASE_URL, DEFAULT_TERMINAL_TYPE, DEFAULT_USER_AGENT};
pub use transport::{Response, Session, SessionCookie, Transport, TransportConfig};
pub use types::*;
