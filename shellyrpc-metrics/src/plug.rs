//! Smart plug telemetry monitor

use std::time::{Duration, Instant};

use serde_json::Value;
use shellyrpc_client::RpcChannel;

/// Default minimum interval between two polls of the same device.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Polling facade settings
///
/// Each telemetry field carries its own ignore flag so a device that does
/// not report a given quantity can be excluded from updates.
#[derive(Debug, Clone)]
pub struct PlugSettings {
    pub min_poll_interval: Duration,
    pub ignore_power: bool,
    pub ignore_voltage: bool,
    pub ignore_current: bool,
    pub ignore_output: bool,
    pub ignore_energy: bool,
    pub ignore_temperature: bool,
}

impl Default for PlugSettings {
    fn default() -> Self {
        Self {
            min_poll_interval: DEFAULT_POLL_INTERVAL,
            ignore_power: false,
            ignore_voltage: false,
            ignore_current: false,
            ignore_output: false,
            ignore_energy: false,
            ignore_temperature: false,
        }
    }
}

/// Polling facade over one device's RPC channel.
///
/// Caches the last successfully extracted telemetry values as formatted
/// strings. Numbers are rendered with two decimal places; Rust's formatter
/// is locale-invariant, so the output is stable across environments.
pub struct PlugMonitor<C: RpcChannel> {
    channel: C,
    settings: PlugSettings,
    last_poll: Option<Instant>,
    power: String,
    voltage: String,
    current: String,
    output: String,
    energy: String,
    temperature: String,
}

impl<C: RpcChannel> PlugMonitor<C> {
    /// Create a monitor over the given RPC channel.
    pub fn new(channel: C, settings: PlugSettings) -> Self {
        Self {
            channel,
            settings,
            last_poll: None,
            power: "0.00".to_string(),
            voltage: "0.00".to_string(),
            current: "0.00".to_string(),
            output: "false".to_string(),
            energy: "0.00".to_string(),
            temperature: "0.00".to_string(),
        }
    }

    /// Configure the device password on the underlying channel.
    ///
    /// Required once, before the first poll, when the target needs
    /// authentication.
    pub async fn configure_auth(&self, password: &str) {
        self.channel.set_auth(password).await;
    }

    /// Poll the device, honoring the minimum poll interval.
    ///
    /// A `None` or empty response leaves all cached values untouched and
    /// logs a warning.
    pub async fn poll(&mut self) {
        if let Some(last) = self.last_poll {
            if last.elapsed() < self.settings.min_poll_interval {
                return;
            }
        }
        self.last_poll = Some(Instant::now());

        match self.channel.request().await {
            None => log::warn!("No telemetry update from device, keeping cached values"),
            Some(text) if text.is_empty() => {
                log::warn!("Empty telemetry response, keeping cached values")
            }
            Some(text) => self.apply(&text),
        }
    }

    /// Active power in watts, formatted.
    pub fn power(&self) -> &str {
        &self.power
    }

    /// Voltage in volts, formatted.
    pub fn voltage(&self) -> &str {
        &self.voltage
    }

    /// Current in amperes, formatted.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Relay output state, `"true"` or `"false"`.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Accumulated energy in watt-hours, formatted.
    pub fn energy(&self) -> &str {
        &self.energy
    }

    /// Device temperature in degrees Celsius, formatted.
    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    /// Extract the telemetry fields from a raw response.
    ///
    /// Each field is updated independently; a missing or mistyped field is
    /// logged and does not abort the remaining updates.
    fn apply(&mut self, text: &str) {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Unreadable telemetry payload: {}", e);
                return;
            }
        };
        let Some(result) = value.get("result") else {
            log::warn!("Telemetry response carries no result object");
            return;
        };

        if !self.settings.ignore_power {
            update_number(&mut self.power, result, &["apower"]);
        }
        if !self.settings.ignore_voltage {
            update_number(&mut self.voltage, result, &["voltage"]);
        }
        if !self.settings.ignore_current {
            update_number(&mut self.current, result, &["current"]);
        }
        if !self.settings.ignore_output {
            update_bool(&mut self.output, result, &["output"]);
        }
        if !self.settings.ignore_energy {
            update_number(&mut self.energy, result, &["aenergy", "total"]);
        }
        if !self.settings.ignore_temperature {
            update_number(&mut self.temperature, result, &["temperature", "tC"]);
        }
    }
}

fn lookup<'a>(result: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut value = result;
    for key in path {
        value = value.get(key)?;
    }
    Some(value)
}

fn update_number(slot: &mut String, result: &Value, path: &[&str]) {
    match lookup(result, path).and_then(Value::as_f64) {
        Some(v) => *slot = format!("{:.2}", v),
        None => log::debug!("Telemetry field {} missing or not numeric", path.join(".")),
    }
}

fn update_bool(slot: &mut String, result: &Value, path: &[&str]) {
    match lookup(result, path).and_then(Value::as_bool) {
        Some(v) => *slot = v.to_string(),
        None => log::debug!("Telemetry field {} missing or not boolean", path.join(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedChannel {
        replies: Mutex<VecDeque<Option<String>>>,
        calls: AtomicUsize,
        password: Mutex<Option<String>>,
    }

    impl ScriptedChannel {
        fn new(replies: Vec<Option<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                password: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl RpcChannel for ScriptedChannel {
        async fn request(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies.lock().unwrap().pop_front().flatten()
        }

        async fn set_auth(&self, password: &str) {
            *self.password.lock().unwrap() = Some(password.to_string());
        }
    }

    fn immediate_settings() -> PlugSettings {
        PlugSettings {
            min_poll_interval: Duration::ZERO,
            ..PlugSettings::default()
        }
    }

    #[tokio::test]
    async fn test_power_formatted_with_two_decimals() {
        let channel =
            ScriptedChannel::new(vec![Some(r#"{"result":{"apower":12.34}}"#.to_string())]);
        let mut monitor = PlugMonitor::new(channel, immediate_settings());

        monitor.poll().await;
        assert_eq!(monitor.power(), "12.34");
    }

    #[tokio::test]
    async fn test_integer_value_gets_decimal_places() {
        let channel = ScriptedChannel::new(vec![Some(r#"{"result":{"apower":12}}"#.to_string())]);
        let mut monitor = PlugMonitor::new(channel, immediate_settings());

        monitor.poll().await;
        assert_eq!(monitor.power(), "12.00");
    }

    #[tokio::test]
    async fn test_full_status_updates_all_fields() {
        let status = r#"{"result":{
            "apower": 12.34,
            "voltage": 229.9,
            "current": 0.054,
            "output": true,
            "aenergy": {"total": 1447.12},
            "temperature": {"tC": 41.5}
        }}"#;
        let channel = ScriptedChannel::new(vec![Some(status.to_string())]);
        let mut monitor = PlugMonitor::new(channel, immediate_settings());

        monitor.poll().await;
        assert_eq!(monitor.power(), "12.34");
        assert_eq!(monitor.voltage(), "229.90");
        assert_eq!(monitor.current(), "0.05");
        assert_eq!(monitor.output(), "true");
        assert_eq!(monitor.energy(), "1447.12");
        assert_eq!(monitor.temperature(), "41.50");
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_cached_values() {
        let channel = ScriptedChannel::new(vec![
            Some(r#"{"result":{"apower":12.34}}"#.to_string()),
            None,
            Some(String::new()),
        ]);
        let mut monitor = PlugMonitor::new(channel, immediate_settings());

        monitor.poll().await;
        assert_eq!(monitor.power(), "12.34");

        monitor.poll().await;
        assert_eq!(monitor.power(), "12.34");

        monitor.poll().await;
        assert_eq!(monitor.power(), "12.34");
    }

    #[tokio::test]
    async fn test_non_json_response_is_tolerated() {
        let channel = ScriptedChannel::new(vec![Some("garbage".to_string())]);
        let mut monitor = PlugMonitor::new(channel, immediate_settings());

        monitor.poll().await;
        assert_eq!(monitor.power(), "0.00");
    }

    #[tokio::test]
    async fn test_missing_field_does_not_abort_others() {
        let channel = ScriptedChannel::new(vec![Some(
            r#"{"result":{"apower":1.0,"voltage":"broken","current":0.5}}"#.to_string(),
        )]);
        let mut monitor = PlugMonitor::new(channel, immediate_settings());

        monitor.poll().await;
        assert_eq!(monitor.power(), "1.00");
        assert_eq!(monitor.voltage(), "0.00");
        assert_eq!(monitor.current(), "0.50");
    }

    #[tokio::test]
    async fn test_ignore_flags_are_independent() {
        let status = r#"{"result":{"apower":1.0,"voltage":230.0,"current":0.5}}"#;
        let channel = ScriptedChannel::new(vec![Some(status.to_string())]);
        let settings = PlugSettings {
            min_poll_interval: Duration::ZERO,
            ignore_voltage: true,
            ..PlugSettings::default()
        };
        let mut monitor = PlugMonitor::new(channel, settings);

        monitor.poll().await;
        assert_eq!(monitor.power(), "1.00");
        assert_eq!(monitor.voltage(), "0.00");
        // Ignoring voltage must not suppress the current update.
        assert_eq!(monitor.current(), "0.50");
    }

    #[tokio::test]
    async fn test_poll_interval_gates_requests() {
        let channel = ScriptedChannel::new(vec![
            Some(r#"{"result":{"apower":1.0}}"#.to_string()),
            Some(r#"{"result":{"apower":2.0}}"#.to_string()),
        ]);
        let settings = PlugSettings {
            min_poll_interval: Duration::from_secs(60),
            ..PlugSettings::default()
        };
        let mut monitor = PlugMonitor::new(channel, settings);

        monitor.poll().await;
        monitor.poll().await;

        assert_eq!(monitor.channel.calls.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.power(), "1.00");
    }

    #[tokio::test]
    async fn test_configure_auth_reaches_channel() {
        let channel = ScriptedChannel::new(vec![]);
        let monitor = PlugMonitor::new(channel, PlugSettings::default());

        monitor.configure_auth("secret").await;
        assert_eq!(
            monitor.channel.password.lock().unwrap().as_deref(),
            Some("secret")
        );
    }
}
