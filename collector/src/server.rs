//! Parsing of `HostName:AppName@Host:Port[@User[:Password]]` connection strings.

use crate::error::ConfigError;
use std::{
    fmt,
    net::IpAddr,
    str::FromStr,
};

/// A Jolokia agent the gatherer polls, identified by host name, app name and address.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerDescriptor {
    host_name: String,
    app_name: String,
    address: String,
    user_name: String,
    password: String,
}

impl ServerDescriptor {
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// `ip:port`, with IPv6 literals kept in brackets.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn has_credentials(&self) -> bool {
        !self.user_name.is_empty() || !self.password.is_empty()
    }

    /// Two descriptors naming the same agent.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.host_name == other.host_name && self.app_name == other.app_name && self.address == other.address
    }
}

// The password never shows up in logs.
impl fmt::Debug for ServerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerDescriptor")
            .field("host_name", &self.host_name)
            .field("app_name", &self.app_name)
            .field("address", &self.address)
            .field("user_name", &self.user_name)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .finish()
    }
}

impl fmt::Display for ServerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.host_name, self.app_name, self.address)
    }
}

impl FromStr for ServerDescriptor {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let server = redact(raw);
        let mut segments = raw.split('@');
        let (identity, address) = match (segments.next(), segments.next()) {
            (Some(identity), Some(address)) => (identity, address),
            _ => {
                return Err(ConfigError::MissingAddress {
                    server: server.clone(),
                })
            }
        };
        let credentials = segments.collect::<Vec<_>>().join("@");

        let (host_name, app_name) = match identity.split(':').collect::<Vec<_>>().as_slice() {
            [host, app] if !host.is_empty() && !app.is_empty() => (host.to_string(), app.to_string()),
            _ => {
                return Err(ConfigError::Identity {
                    server: server.clone(),
                    identity: identity.to_string(),
                })
            }
        };

        if !valid_address(address) {
            return Err(ConfigError::Address {
                server: server.clone(),
                address: address.to_string(),
            });
        }

        let (user_name, password) = match credentials.split_once(':') {
            Some((user, password)) => (user.to_string(), password.to_string()),
            None => (credentials, String::new()),
        };

        Ok(Self {
            host_name,
            app_name,
            address: address.to_string(),
            user_name,
            password,
        })
    }
}

/// The connection string with its credentials masked, for error messages.
pub(crate) fn redact(server: &str) -> String {
    match server.splitn(3, '@').collect::<Vec<_>>().as_slice() {
        [identity, address, _] => format!("{identity}@{address}@***"),
        _ => server.to_string(),
    }
}

/// `ip:port` with an IPv4 literal, or `[ipv6]:port`.
fn valid_address(address: &str) -> bool {
    let (host, port) = match address.strip_prefix('[') {
        Some(rest) => match rest.split_once("]:") {
            Some((host, port)) => match host.parse::<IpAddr>() {
                Ok(IpAddr::V6(_)) => (host, port),
                _ => return false,
            },
            None => return false,
        },
        None => match address.split(':').collect::<Vec<_>>().as_slice() {
            [host, port] => (*host, *port),
            _ => return false,
        },
    };
    host.parse::<IpAddr>().is_ok() && port.parse::<u16>().is_ok()
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(server: &str) -> Result<ServerDescriptor, ConfigError> {
        server.parse()
    }

    #[test]
    fn parses_identity_and_address() {
        let server = parse("ECS7:ydh@127.0.0.1:7016").unwrap();
        assert_eq!(server.host_name(), "ECS7");
        assert_eq!(server.app_name(), "ydh");
        assert_eq!(server.address(), "127.0.0.1:7016");
        assert!(!server.has_credentials());
        assert_eq!(server.to_string(), "ECS7:ydh@127.0.0.1:7016");
    }

    #[test]
    fn parses_port_bounds() {
        assert!(parse("h:a@10.0.0.1:0").is_ok());
        assert!(parse("h:a@10.0.0.1:65535").is_ok());
        assert!(matches!(parse("h:a@10.0.0.1:65536"), Err(ConfigError::Address { .. })));
        assert!(matches!(parse("h:a@10.0.0.1:-1"), Err(ConfigError::Address { .. })));
        assert!(matches!(parse("h:a@10.0.0.1:http"), Err(ConfigError::Address { .. })));
        assert!(matches!(parse("h:a@10.0.0.1"), Err(ConfigError::Address { .. })));
    }

    #[test]
    fn rejects_host_names_and_bad_ips() {
        assert!(matches!(parse("h:a@localhost:8080"), Err(ConfigError::Address { .. })));
        assert!(matches!(parse("h:a@256.0.0.1:8080"), Err(ConfigError::Address { .. })));
        assert!(matches!(parse("h:a@::1:8080"), Err(ConfigError::Address { .. })));
    }

    #[test]
    fn accepts_bracketed_ipv6() {
        let server = parse("h:a@[::1]:8778").unwrap();
        assert_eq!(server.address(), "[::1]:8778");
        assert!(matches!(parse("h:a@[127.0.0.1]:8778"), Err(ConfigError::Address { .. })));
        assert!(matches!(parse("h:a@[::1]"), Err(ConfigError::Address { .. })));
    }

    #[test]
    fn rejects_malformed_identity() {
        assert!(matches!(parse("ECS7@127.0.0.1:7016"), Err(ConfigError::Identity { .. })));
        assert!(matches!(parse("a:b:c@127.0.0.1:7016"), Err(ConfigError::Identity { .. })));
        assert!(matches!(parse(":ydh@127.0.0.1:7016"), Err(ConfigError::Identity { .. })));
        assert!(matches!(parse("ECS7:@127.0.0.1:7016"), Err(ConfigError::Identity { .. })));
        assert!(matches!(parse("ECS7:ydh"), Err(ConfigError::MissingAddress { .. })));
    }

    #[test]
    fn parses_credentials() {
        let server = parse("h:a@127.0.0.1:8778@monitor").unwrap();
        assert_eq!(server.user_name(), "monitor");
        assert_eq!(server.password(), "");
        assert!(server.has_credentials());

        let server = parse("h:a@127.0.0.1:8778@monitor:s3cr:et").unwrap();
        assert_eq!(server.user_name(), "monitor");
        assert_eq!(server.password(), "s3cr:et");

        let server = parse("h:a@127.0.0.1:8778@monitor:p@ss").unwrap();
        assert_eq!(server.user_name(), "monitor");
        assert_eq!(server.password(), "p@ss");

        let server = parse("h:a@127.0.0.1:8778@:only-password").unwrap();
        assert_eq!(server.user_name(), "");
        assert!(server.has_credentials());
    }

    #[test]
    fn errors_hide_credentials() {
        let err = parse("h:a@localhost:8080@monitor:secret").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("h:a@localhost:8080@***"));
        assert!(!message.contains("secret"));
    }

    #[test]
    fn debug_hides_password() {
        let server = parse("h:a@127.0.0.1:8778@monitor:secret").unwrap();
        let debug = format!("{server:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("monitor"));
    }
}
