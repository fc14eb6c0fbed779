//! Environment configuration
//!
//! All settings come from the environment (a `.env` file is loaded by the
//! binary before this runs). The NLU and flight-API integrations are
//! optional: leave their variables unset and the bot runs self-contained on
//! the fixture data, which is how local development works.

use crate::error::{BotError, Result};
use crate::recognizer::CluConfig;
use std::env;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3978;

/// Remote flight-offers API settings
#[derive(Debug, Clone)]
pub struct FlightApiConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Runtime configuration for the server binary
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// NLU service settings; None runs without intent recognition
    pub clu: Option<CluConfig>,
    /// Flight API settings; None serves fixture offers
    pub flight_api: Option<FlightApiConfig>,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Optional integrations must be configured completely or not at all; a
    /// partial set of variables is a configuration error rather than a
    /// silent fallback.
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| BotError::Configuration(format!("invalid PORT value: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let clu = match group(&[
            "CLU_API_ENDPOINT",
            "CLU_API_KEY",
            "CLU_PROJECT_NAME",
            "CLU_DEPLOYMENT_NAME",
        ])? {
            Some(values) => {
                let [endpoint, api_key, project_name, deployment_name] = values;
                Some(CluConfig {
                    endpoint,
                    api_key,
                    project_name,
                    deployment_name,
                })
            }
            None => None,
        };

        let flight_api = match group(&["FLIGHT_API_ENDPOINT", "FLIGHT_API_KEY"])? {
            Some(values) => {
                let [endpoint, api_key] = values;
                Some(FlightApiConfig { endpoint, api_key })
            }
            None => None,
        };

        Ok(Self {
            host,
            port,
            clu,
            flight_api,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read a group of variables that must be set together.
fn group<const N: usize>(names: &[&str; N]) -> Result<Option<[String; N]>> {
    let values: Vec<Option<String>> = names
        .iter()
        .map(|name| env::var(name).ok().filter(|v| !v.is_empty()))
        .collect();

    if values.iter().all(Option::is_none) {
        return Ok(None);
    }
    if let Some(position) = values.iter().position(Option::is_none) {
        return Err(BotError::Configuration(format!(
            "{} is required when its sibling variables are set",
            names[position]
        )));
    }

    let values: Vec<String> = values.into_iter().flatten().collect();
    match values.try_into() {
        Ok(array) => Ok(Some(array)),
        Err(_) => Err(BotError::Configuration(
            "inconsistent variable group".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var manipulation is process-global, so these tests use distinct
    // variable names per case instead of the real ones.

    #[test]
    fn test_group_all_absent() {
        let result = group(&["FD_TEST_ABSENT_A", "FD_TEST_ABSENT_B"]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_group_partial_is_an_error() {
        env::set_var("FD_TEST_PARTIAL_A", "value");
        let err = group(&["FD_TEST_PARTIAL_A", "FD_TEST_PARTIAL_B"]).unwrap_err();
        assert!(matches!(err, BotError::Configuration(_)));
        env::remove_var("FD_TEST_PARTIAL_A");
    }

    #[test]
    fn test_group_complete() {
        env::set_var("FD_TEST_FULL_A", "one");
        env::set_var("FD_TEST_FULL_B", "two");
        let [a, b] = group(&["FD_TEST_FULL_A", "FD_TEST_FULL_B"])
            .unwrap()
            .unwrap();
        assert_eq!(a, "one");
        assert_eq!(b, "two");
        env::remove_var("FD_TEST_FULL_A");
        env::remove_var("FD_TEST_FULL_B");
    }

    #[test]
    fn test_bind_addr() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 3978,
            clu: None,
            flight_api: None,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:3978");
    }
}
