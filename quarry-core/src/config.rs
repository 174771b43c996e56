use crate::{ErrorKind, IdentifierQuoting, Result};
use anyhow::Context;
use std::env;
use urlencoding::decode;

/// Default number of prepared statements kept by a connection.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Settings threaded through compilation and execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// How identifiers are printed.
    pub quoting: IdentifierQuoting,
    /// Prepared statements kept per connection, least recently used ones are finalized first.
    /// Zero keeps every statement.
    pub cache_capacity: usize,
    /// Whether `fetch` and `execute` go through the prepared statement cache.
    pub cache_statements: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quoting: IdentifierQuoting::Quoted,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_statements: true,
        }
    }
}

impl Config {
    /// Takes the `quarry_*` parameters out of a connection URL.
    ///
    /// Recognized parameters, each with an environment variable fallback:
    /// * `quarry_cache_capacity` (`QUARRY_CACHE_CAPACITY`): number, `0` for unbounded.
    /// * `quarry_cache` (`QUARRY_CACHE`): `true` or `false`.
    /// * `quarry_quote_identifiers` (`QUARRY_QUOTE_IDENTIFIERS`): `true` or `false`.
    ///
    /// Returns the configuration and the URL without those parameters.
    pub fn extract_from_url(url: &str) -> Result<(Config, String)> {
        let context = || format!("While reading the configuration from `{}`", url);
        let (base, query) = match url.split_once('?') {
            Some((base, query)) => (base, query),
            None => (url, ""),
        };
        let mut pairs: Vec<(&str, &str)> = query
            .split('&')
            .filter(|v| !v.is_empty())
            .map(|v| v.split_once('=').unwrap_or((v, "")))
            .collect();
        let mut take_url_param = |key: &str, env_var: &str| -> Result<Option<String>> {
            if let Some(position) = pairs.iter().position(|(k, _)| *k == key) {
                let (_, value) = pairs.remove(position);
                return Ok(Some(decode(value).with_context(context)?.into_owned()));
            }
            Ok(env::var(env_var).ok())
        };
        let mut config = Config::default();
        if let Some(value) = take_url_param("quarry_cache_capacity", "QUARRY_CACHE_CAPACITY")? {
            config.cache_capacity = value.trim().parse().map_err(|_| {
                ErrorKind::Build
                    .error(format!("Expected a number for quarry_cache_capacity, got `{}`", value))
            })?;
        }
        if let Some(value) = take_url_param("quarry_cache", "QUARRY_CACHE")? {
            config.cache_statements = parse_flag("quarry_cache", &value)?;
        }
        if let Some(value) =
            take_url_param("quarry_quote_identifiers", "QUARRY_QUOTE_IDENTIFIERS")?
        {
            config.quoting = if parse_flag("quarry_quote_identifiers", &value)? {
                IdentifierQuoting::Quoted
            } else {
                IdentifierQuoting::Bare
            };
        }
        let mut url = base.to_string();
        for (i, (key, value)) in pairs.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            if !value.is_empty() {
                url.push('=');
                url.push_str(value);
            }
        }
        Ok((config, url))
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ErrorKind::Build.error(format!(
            "Expected true or false for {}, got `{}`",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, DEFAULT_CACHE_CAPACITY};
    use crate::{ErrorKind, IdentifierQuoting};

    #[test]
    fn extract_parameters() {
        let (config, url) = Config::extract_from_url(
            "sqlite://data.db?mode=rwc&quarry_cache_capacity=16&quarry_quote_identifiers=false",
        )
        .unwrap();
        assert_eq!(url, "sqlite://data.db?mode=rwc");
        assert_eq!(config.cache_capacity, 16);
        assert_eq!(config.quoting, IdentifierQuoting::Bare);
        assert!(config.cache_statements);
    }

    #[test]
    fn url_without_parameters() {
        let (config, url) = Config::extract_from_url("sqlite://:memory:?quarry_cache=no").unwrap();
        assert_eq!(url, "sqlite://:memory:");
        assert!(!config.cache_statements);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn invalid_values() {
        let error = Config::extract_from_url("sqlite://x.db?quarry_cache_capacity=many").unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Build));
        assert!(Config::extract_from_url("sqlite://x.db?quarry_cache=maybe").is_err());
    }
}
