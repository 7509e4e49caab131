//! Command-line arguments.

use std::{net::SocketAddr, time::Duration};

use clap::Parser;

use crate::config::{ClientConfig, DEFAULT_SERVER_ADDR};

/// Authorize against a BNAC server and keep the session alive.
#[derive(Debug, Parser)]
#[command(name = "bnac-client", version)]
pub struct Args {
    /// User name
    pub username: String,

    /// Password; prompted for on the terminal when omitted
    pub password: Option<String>,

    /// Server endpoint
    #[arg(long, default_value_t = DEFAULT_SERVER_ADDR)]
    pub server: SocketAddr,

    /// Seconds between keepalives
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub heartbeat_interval_secs: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Configuration selected by these arguments.
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            server_addr: self.server,
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
            ..ClientConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn username_only() {
        let args = Args::try_parse_from(["bnac-client", "alice"]).unwrap();
        assert_eq!(args.username, "alice");
        assert_eq!(args.password, None);
        assert_eq!(args.config(), ClientConfig::default());
    }

    #[test]
    fn username_and_password() {
        let args = Args::try_parse_from(["bnac-client", "alice", "hunter2"]).unwrap();
        assert_eq!(args.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn wrong_argument_count_is_usage_error() {
        assert!(Args::try_parse_from(["bnac-client"]).is_err());
        assert!(Args::try_parse_from(["bnac-client", "a", "b", "c"]).is_err());
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "bnac-client",
            "alice",
            "--server",
            "127.0.0.1:9000",
            "--heartbeat-interval-secs",
            "5",
        ])
        .unwrap();
        let config = args.config();
        assert_eq!(config.server_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
    }

    #[test]
    fn zero_interval_rejected() {
        let result =
            Args::try_parse_from(["bnac-client", "alice", "--heartbeat-interval-secs", "0"]);
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn interval_flag_sets_heartbeat_interval(secs in 1u64..=86_400) {
            let args = Args::try_parse_from([
                "bnac-client".to_string(),
                "alice".to_string(),
                "--heartbeat-interval-secs".to_string(),
                secs.to_string(),
            ])
            .unwrap();
            prop_assert_eq!(args.config().heartbeat_interval, Duration::from_secs(secs));
        }
    }
}
