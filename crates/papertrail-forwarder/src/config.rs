// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwarder configuration.
//!
//! A [`Config`] starts from environment defaults (`PAPERTRAIL_HOST`,
//! `PAPERTRAIL_PORT`), is adjusted by an ordered list of [`ConfigOption`]s and
//! is validated once before any handler is wired up. It is never mutated
//! afterwards, so one instance can be shared by concurrent invocations.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;

use crate::decoder::LogEvent;
use crate::error::ConfigurationError;

/// Environment variable holding the default Papertrail host.
pub const ENV_PAPERTRAIL_HOST: &str = "PAPERTRAIL_HOST";
/// Environment variable holding the default Papertrail port.
pub const ENV_PAPERTRAIL_PORT: &str = "PAPERTRAIL_PORT";

/// Conditional rewrite of a log message.
///
/// Receives the raw message and the whole event. Returns the message to
/// forward and whether the event should be forwarded at all.
pub type MessageTransform = Arc<dyn Fn(&str, &LogEvent) -> (String, bool) + Send + Sync>;

/// A single override applied on top of the defaults.
pub type ConfigOption = Box<dyn FnOnce(Config) -> Config + Send>;

#[derive(Clone)]
pub struct Config {
    pub papertrail_host: String,
    /// Zero means unset.
    pub papertrail_port: u16,
    pub message_transform: MessageTransform,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("papertrail_host", &self.papertrail_host)
            .field("papertrail_port", &self.papertrail_port)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            papertrail_host: String::new(),
            papertrail_port: 0,
            message_transform: identity_transform(),
        }
    }
}

/// Forwards every message unchanged.
pub fn identity_transform() -> MessageTransform {
    Arc::new(|message: &str, _event: &LogEvent| (message.to_string(), true))
}

impl Config {
    /// Defaults read from the process environment.
    ///
    /// Only `PAPERTRAIL_HOST` and `PAPERTRAIL_PORT` are looked at; a missing
    /// or non UTF-8 value is treated as unset.
    pub fn from_env() -> Self {
        let papertrail_host = env::var(ENV_PAPERTRAIL_HOST).unwrap_or_default();
        let papertrail_port = env::var(ENV_PAPERTRAIL_PORT)
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(0);

        Self {
            papertrail_host,
            papertrail_port,
            ..Default::default()
        }
    }

    /// Defaults read from an iterator of key/value pairs (typically for tests).
    ///
    /// A missing or unparsable port becomes 0 and is only reported by
    /// [`Config::validate`].
    pub fn from_env_iter<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let papertrail_host = map.get(ENV_PAPERTRAIL_HOST).cloned().unwrap_or_default();
        let papertrail_port = map
            .get(ENV_PAPERTRAIL_PORT)
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(0);

        Self {
            papertrail_host,
            papertrail_port,
            ..Default::default()
        }
    }

    /// Builds a validated configuration from the environment and `options`.
    pub fn build<I>(options: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        Self::build_from(Self::from_env(), options)
    }

    /// Same as [`Config::build`] with an explicit base instead of the environment.
    pub fn build_from<I>(base: Self, options: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        let config = base.apply(options);
        config.validate()?;
        Ok(config)
    }

    /// Applies `options` in order. Later options win.
    #[must_use]
    pub fn apply<I>(self, options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        options.into_iter().fold(self, |config, option| option(config))
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.papertrail_host.is_empty() {
            return Err(ConfigurationError::MissingHost);
        }
        if self.papertrail_port == 0 {
            return Err(ConfigurationError::MissingPort);
        }
        Ok(())
    }

    /// `host:port` of the Papertrail log target.
    pub fn address(&self) -> String {
        format!("{}:{}", self.papertrail_host, self.papertrail_port)
    }
}

/// Sets the host of the Papertrail log target.
pub fn with_papertrail_host(host: impl Into<String>) -> ConfigOption {
    let host = host.into();
    Box::new(move |config| Config {
        papertrail_host: host,
        ..config
    })
}

/// Sets the port of the Papertrail log target.
pub fn with_papertrail_port(port: u16) -> ConfigOption {
    Box::new(move |config| Config {
        papertrail_port: port,
        ..config
    })
}

/// Sets the transform applied to every log message before it is forwarded.
pub fn with_message_transform<F>(transform: F) -> ConfigOption
where
    F: Fn(&str, &LogEvent) -> (String, bool) + Send + Sync + 'static,
{
    let transform: MessageTransform = Arc::new(transform);
    Box::new(move |config| Config {
        message_transform: transform,
        ..config
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use duplicate::duplicate_item;
    use serial_test::serial;

    fn event(message: &str) -> LogEvent {
        LogEvent {
            id: "1".to_string(),
            timestamp: 0,
            message: message.to_string(),
        }
    }

    fn config(host: &str, port: u16) -> Config {
        Config {
            papertrail_host: host.to_string(),
            papertrail_port: port,
            ..Default::default()
        }
    }

    #[duplicate_item(
        test_name                   host                        port    expected;
        [test_validate_ok]          ["logs1.papertrail.com"]    [1234]  [Ok(())];
        [test_validate_empty]       [""]                        [0]     [Err(ConfigurationError::MissingHost)];
        [test_validate_no_host]     [""]                        [1234]  [Err(ConfigurationError::MissingHost)];
        [test_validate_no_port]     ["logs1.papertrail.com"]    [0]     [Err(ConfigurationError::MissingPort)];
    )]
    #[test]
    fn test_name() {
        assert_eq!(config(host, port).validate(), expected);
    }

    #[test]
    fn test_options_override_fields() {
        let base = Config {
            papertrail_host: "logs1.papertrail.com".to_string(),
            papertrail_port: 9999,
            message_transform: Arc::new(|_: &str, _: &LogEvent| ("before".to_string(), true)),
        };

        let config = base.apply([
            with_papertrail_port(1111),
            with_papertrail_host("logs9.papertrail.com"),
            with_message_transform(|_: &str, _: &LogEvent| ("after".to_string(), true)),
        ]);

        assert_eq!(config.papertrail_host, "logs9.papertrail.com");
        assert_eq!(config.papertrail_port, 1111);
        assert_eq!(
            (config.message_transform)("x", &event("x")),
            ("after".to_string(), true)
        );
    }

    #[test]
    fn test_later_option_wins() {
        let config = Config::default().apply([
            with_papertrail_port(1111),
            with_papertrail_host("logs1.papertrail.com"),
            with_papertrail_port(2222),
        ]);
        assert_eq!(config.papertrail_port, 2222);
        assert_eq!(config.papertrail_host, "logs1.papertrail.com");
    }

    #[test]
    fn test_build_from_with_default_transform() {
        let config = Config::build_from(
            Config::default(),
            [with_papertrail_port(1111), with_papertrail_host("logsX.example.com")],
        )
        .expect("config should be valid");

        assert_eq!(config.papertrail_host, "logsX.example.com");
        assert_eq!(config.papertrail_port, 1111);
        assert_eq!(config.address(), "logsX.example.com:1111");
        assert_eq!(
            (config.message_transform)("unchanged", &event("unchanged")),
            ("unchanged".to_string(), true)
        );
    }

    #[test]
    fn test_build_from_rejects_missing_host() {
        let result = Config::build_from(Config::default(), [with_papertrail_port(1111)]);
        assert_eq!(result.unwrap_err(), ConfigurationError::MissingHost);
    }

    #[test]
    fn test_option_can_reset_port_to_unset() {
        let result = Config::build_from(
            config("logs1.papertrail.com", 1234),
            [with_papertrail_port(0)],
        );
        assert_eq!(result.unwrap_err(), ConfigurationError::MissingPort);
    }

    #[test]
    fn test_from_env_iter_defaults() {
        let config = Config::from_env_iter::<Vec<(String, String)>, _, _>(vec![]);
        assert_eq!(config.papertrail_host, "");
        assert_eq!(config.papertrail_port, 0);
        assert_eq!(
            (config.message_transform)("m", &event("m")),
            ("m".to_string(), true)
        );
    }

    #[test]
    fn test_from_env_iter_reads_values() {
        let config = Config::from_env_iter([
            (ENV_PAPERTRAIL_HOST, "logs5.papertrail.com"),
            (ENV_PAPERTRAIL_PORT, "51234"),
        ]);
        assert_eq!(config.papertrail_host, "logs5.papertrail.com");
        assert_eq!(config.papertrail_port, 51234);
        assert!(config.validate().is_ok());
    }

    #[duplicate_item(
        test_name                           port_value;
        [test_from_env_iter_port_not_a_number]  ["abc"];
        [test_from_env_iter_port_out_of_range]  ["70000"];
        [test_from_env_iter_port_negative]      ["-1"];
        [test_from_env_iter_port_empty]         [""];
    )]
    #[test]
    fn test_name() {
        let config = Config::from_env_iter([
            (ENV_PAPERTRAIL_HOST, "logs5.papertrail.com"),
            (ENV_PAPERTRAIL_PORT, port_value),
        ]);
        assert_eq!(config.papertrail_port, 0);
        assert_eq!(config.validate(), Err(ConfigurationError::MissingPort));
    }

    #[test]
    #[serial]
    fn test_build_without_env_fails() {
        env::remove_var(ENV_PAPERTRAIL_HOST);
        env::remove_var(ENV_PAPERTRAIL_PORT);

        let result = Config::build(Vec::new());
        assert_eq!(result.unwrap_err(), ConfigurationError::MissingHost);
    }

    #[test]
    #[serial]
    fn test_build_reads_env_and_applies_options() {
        env::set_var(ENV_PAPERTRAIL_HOST, "logs2.papertrail.com");
        env::set_var(ENV_PAPERTRAIL_PORT, "4321");

        let from_env = Config::build(Vec::new()).expect("env config should be valid");
        assert_eq!(from_env.papertrail_host, "logs2.papertrail.com");
        assert_eq!(from_env.papertrail_port, 4321);

        let overridden =
            Config::build([with_papertrail_host("logs3.papertrail.com")]).expect("valid config");
        assert_eq!(overridden.papertrail_host, "logs3.papertrail.com");
        assert_eq!(overridden.papertrail_port, 4321);

        env::remove_var(ENV_PAPERTRAIL_HOST);
        env::remove_var(ENV_PAPERTRAIL_PORT);
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_build_ignores_unrelated_non_utf8_env() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        env::set_var("PAPERTRAIL_TEST_NON_UTF8", OsStr::from_bytes(b"\xff\xfe"));
        env::set_var(ENV_PAPERTRAIL_HOST, "logs6.papertrail.com");
        env::set_var(ENV_PAPERTRAIL_PORT, "6514");

        let config = Config::build(Vec::new()).expect("env config should be valid");
        assert_eq!(config.papertrail_host, "logs6.papertrail.com");
        assert_eq!(config.papertrail_port, 6514);

        env::set_var(ENV_PAPERTRAIL_PORT, OsStr::from_bytes(b"\xff"));
        let result = Config::build(Vec::new());
        assert_eq!(result.unwrap_err(), ConfigurationError::MissingPort);

        env::remove_var("PAPERTRAIL_TEST_NON_UTF8");
        env::remove_var(ENV_PAPERTRAIL_HOST);
        env::remove_var(ENV_PAPERTRAIL_PORT);
    }
}
