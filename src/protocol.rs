use chrono::{DateTime, TimeZone};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

use crate::types::DeviceValues;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://app.rac.apws.panasonic.com";
pub const DEFAULT_USER_AGENT: &str = concat!("eolia-rs/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-us";

pub const CONTENT_TYPE: &str = "application/json; charset=UTF-8";
pub const DATE_HEADER: &str = "X-Eolia-Date";
pub const OPERATION_TOKEN: &str = "operation_token";

pub const DEFAULT_TERMINAL_TYPE: u8 = 3;

pub(crate) const LOGIN_PATH: &[&str] = &["eolia", "v2", "auth", "login"];
pub(crate) const LOGOUT_PATH: &[&str] = &["eolia", "v2", "auth", "logout"];
pub(crate) const DEVICES_PATH: &[&str] = &["eolia", "v2", "devices"];

pub(crate) fn product_functions_path(product_code: &str) -> [&str; 5] {
    ["eolia", "v2", "products", product_code, "functions"]
}

pub(crate) fn device_status_path(appliance_id: &str) -> [&str; 5] {
    ["eolia", "v2", "devices", appliance_id, "status"]
}

/// Appends `segments` to the base URL's own path, percent-encoding each one.
///
/// Empty and dot segments are refused: `Url` would drop or collapse them
/// and the request would land on another endpoint.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url> {
    if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
        return Err(Error::InvalidArgument(format!("invalid path segment {bad:?}")));
    }
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidArgument(format!("base URL {base} cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn auth_check_body() -> Value {
    json!({ "easy": {} })
}

pub(crate) fn login_body(id: &str, pass: &str, terminal_type: u8, next_easy: bool) -> Value {
    json!({
        "idpw": {
            "id": id,
            "pass": pass,
            "terminal_type": terminal_type,
            "next_easy": next_easy,
        }
    })
}

/// Random token the service uses to tell repeated submissions apart.
pub(crate) fn operation_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Full values payload for `PUT .../status`, with the token set last so it
/// replaces any stale token carried in the values.
pub(crate) fn update_body(values: &DeviceValues, token: &str) -> Result<Value> {
    let mut body = serde_json::to_value(values)
        .map_err(|e| crate::Error::Protocol(format!("cannot encode device values: {e}")))?;
    if let Value::Object(map) = &mut body {
        map.insert(OPERATION_TOKEN.to_string(), Value::String(token.to_string()));
    }
    Ok(body)
}

/// Local wall-clock time to the minute, e.g. `2024-05-01T13:07`.
pub(crate) fn eolia_date<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y-%m-%dT%H:%M").to_string()
}

/// Pre-semicolon part of a `Set-Cookie` value, if there is one.
pub(crate) fn session_from_set_cookie(header: &str) -> Option<String> {
    let token = header.split(';').next()?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn login_body_structure() {
        let body = login_body("user@example.com", "secret", DEFAULT_TERMINAL_TYPE, true);
        assert_eq!(body["idpw"]["id"], "user@example.com");
        assert_eq!(body["idpw"]["pass"], "secret");
        assert_eq!(body["idpw"]["terminal_type"], 3);
        assert_eq!(body["idpw"]["next_easy"], true);
    }

    #[test]
    fn auth_check_body_is_empty_easy() {
        assert_eq!(auth_check_body(), json!({"easy": {}}));
    }

    fn url(base: &str, segments: &[&str]) -> Result<Url> {
        endpoint_url(&Url::parse(base).unwrap(), segments)
    }

    #[test]
    fn paths() {
        let base = DEFAULT_BASE_URL;
        assert_eq!(
            url(base, &device_status_path("A1B2")).unwrap().path(),
            "/eolia/v2/devices/A1B2/status"
        );
        assert_eq!(
            url(base, &product_functions_path("CS-X28")).unwrap().path(),
            "/eolia/v2/products/CS-X28/functions"
        );
        assert_eq!(url(base, LOGIN_PATH).unwrap().path(), "/eolia/v2/auth/login");
    }

    #[test]
    fn path_segments_are_escaped() {
        let escaped = url(DEFAULT_BASE_URL, &device_status_path("a/b?c#d%e")).unwrap();
        assert_eq!(escaped.path(), "/eolia/v2/devices/a%2Fb%3Fc%23d%25e/status");
        assert_eq!(escaped.query(), None);
        assert_eq!(escaped.fragment(), None);
    }

    #[test]
    fn dot_and_empty_segments_are_refused() {
        for id in ["..", ".", ""] {
            let err = url(DEFAULT_BASE_URL, &device_status_path(id)).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{id:?} gave {err:?}");
        }
        assert!(url(DEFAULT_BASE_URL, &device_status_path("a..b")).is_ok());
    }

    #[test]
    fn base_path_is_kept() {
        let proxied = url("https://proxy.example/panasonic", DEVICES_PATH).unwrap();
        assert_eq!(proxied.path(), "/panasonic/eolia/v2/devices");
        let trailing = url("https://proxy.example/panasonic/", DEVICES_PATH).unwrap();
        assert_eq!(trailing.path(), "/panasonic/eolia/v2/devices");
    }

    #[test]
    fn date_is_truncated_to_minute() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 5, 1, 13, 7, 59).unwrap();
        assert_eq!(eolia_date(&now), "2024-05-01T13:07");
    }

    #[test]
    fn date_uses_the_given_zone() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap();
        let tokyo = now.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());
        assert_eq!(eolia_date(&tokyo), "2025-01-01T08:59");
    }

    #[test]
    fn set_cookie_segment() {
        assert_eq!(
            session_from_set_cookie("atkn=abc123; Path=/; HttpOnly").as_deref(),
            Some("atkn=abc123")
        );
        assert_eq!(session_from_set_cookie("atkn=xyz").as_deref(), Some("atkn=xyz"));
        assert_eq!(session_from_set_cookie("; Path=/"), None);
    }

    #[test]
    fn operation_tokens_are_unique() {
        let a = operation_token();
        let b = operation_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn update_body_sets_token() {
        let values: DeviceValues = serde_json::from_value(json!({
            "operation_mode": "Cooling",
            "temperature": 25.5,
            "operation_token": "stale"
        }))
        .unwrap();
        let body = update_body(&values, "fresh").unwrap();
        assert_eq!(body["operation_token"], "fresh");
        assert_eq!(body["operation_mode"], "Cooling");
        assert_eq!(body["temperature"], 25.5);
    }
}
