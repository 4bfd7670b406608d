use std::{env, str::FromStr, time::Duration};

use crate::{PlaygroundErr, Result};

/// The settings of the websocket server, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The period of the update broadcaster.
    pub tick: Duration,
    /// The edge of the classification map grid.
    pub map_size: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            tick: Duration::from_millis(33),
            map_size: 100,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the `HOST`, `PORT`, `TICK_MS` and `MAP_SIZE` environment
    /// variables, falling back to the defaults for the unset ones.
    ///
    /// # Returns
    /// An error if any of the set variables holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, but reading the variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse(&lookup, "PORT")?.unwrap_or(defaults.port);
        let tick = parse(&lookup, "TICK_MS")?.map_or(defaults.tick, Duration::from_millis);
        let map_size = parse(&lookup, "MAP_SIZE")?.unwrap_or(defaults.map_size);

        if tick.is_zero() {
            return Err(invalid("TICK_MS", "0"));
        }

        if map_size == 0 {
            return Err(invalid("MAP_SIZE", "0"));
        }

        Ok(Self {
            host,
            port,
            tick,
            map_size,
        })
    }

    /// Returns the `host:port` pair to bind to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|value| value.trim().parse().map_err(|_| invalid(key, &value)))
        .transpose()
}

fn invalid(key: &'static str, value: &str) -> PlaygroundErr {
    PlaygroundErr::InvalidConfig {
        key,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr(), "127.0.0.1:8888");
    }

    #[test]
    fn overrides() {
        let vars = [("HOST", "0.0.0.0"), ("PORT", "9000"), ("TICK_MS", "50"), ("MAP_SIZE", "64")];
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.addr(), "0.0.0.0:9000");
        assert_eq!(config.tick, Duration::from_millis(50));
        assert_eq!(config.map_size, 64);
    }

    #[test]
    fn invalid_values() {
        for vars in [[("PORT", "eighty")], [("PORT", "70000")], [("TICK_MS", "0")], [("MAP_SIZE", "0")]] {
            let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, PlaygroundErr::InvalidConfig { .. }), "{vars:?}");
        }
    }
}
