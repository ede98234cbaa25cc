/*
 *
 * Copyright 2025 gRPC authors.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

//! Name Resolution for gRPC.
//!
//! Name Resolution is the process by which a channel's target is converted into
//! network addresses (typically IP addresses) used by the channel to connect to
//! a service.
use core::fmt;

use crate::{attributes::Attributes, rt};
use std::{
    fmt::{Display, Formatter},
    hash::Hash,
    str::FromStr,
    sync::Arc,
};

mod backoff;
mod config;
mod dns;
mod passthrough;
mod registry;
mod sockaddr;
#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{ConfigError, ResolverRegistryConfig};
pub use registry::{ResolverRegistry, ResolverRegistryBuilder, DEFAULT_PREFIX};

/// Registers every resolver shipped with this crate: `dns`, `passthrough`,
/// `unix`, `unix-abstract`, `ipv4` and `ipv6`.
///
/// Panics if any of those schemes is already registered with `builder`.
pub fn register_builtin_resolvers(builder: &mut ResolverRegistryBuilder) {
    dns::reg(builder);
    passthrough::reg(builder);
    sockaddr::reg(builder);
}

/// A parsed channel target.
///
/// Targets are URIs of the form `scheme:[//authority]path`; the scheme selects
/// the [`ResolverBuilder`] and the rest is interpreted by that builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    // As written in the target; url folds it to lowercase.
    scheme: String,
    url: url::Url,
}

/// The reason a string could not be parsed into a [`Target`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid character {ch:?} at offset {offset}")]
    InvalidCharacter { ch: char, offset: usize },
    #[error("{0}")]
    Url(#[from] url::ParseError),
}

impl FromStr for Target {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The url parser silently strips or escapes characters that can never
        // appear in a URI; a target containing them is rejected instead.
        if let Some((offset, ch)) = s.char_indices().find(|(_, c)| !is_uri_char(*c)) {
            return Err(ParseError::InvalidCharacter { ch, offset });
        }
        let url = s.parse::<url::Url>()?;
        let scheme = match s.split_once(':') {
            Some((scheme, _)) => scheme.to_string(),
            None => url.scheme().to_string(),
        };
        Ok(Target { scheme, url })
    }
}

// RFC 3986 unreserved, reserved and percent characters.
fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._~:/?#[]@!$&'()*+,;=%".contains(c)
}

impl From<url::Url> for Target {
    fn from(url: url::Url) -> Self {
        Target {
            scheme: url.scheme().to_string(),
            url,
        }
    }
}

impl Target {
    /// The URI scheme, exactly as it was written.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The host and port of the authority, e.g. `"8.8.8.8:53"` for
    /// `dns://8.8.8.8:53/grpc.io`.  Empty if the target has no authority.
    pub fn authority_host_port(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// Whether the target carries a non-empty authority component.
    pub fn has_authority(&self) -> bool {
        !self.url.host_str().unwrap_or_default().is_empty() || self.url.port().is_some()
    }

    pub fn host_str(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rest = &self.url.as_str()[self.url.scheme().len()..];
        write!(f, "{}{}", self.scheme, rest)
    }
}

/// A name resolver factory
pub trait ResolverBuilder: Send + Sync {
    /// Builds a name resolver instance for the target.
    ///
    /// Returns None if the target is not one this builder can resolve.
    /// Failures discovered later, such as a failed lookup, must instead be
    /// reported through the resolver's ResultHandler.
    fn build(&self, target: Target, options: ResolverOptions) -> Option<Box<dyn Resolver>>;

    /// Reports the URI scheme handled by this name resolver.
    fn scheme(&self) -> &str;

    /// Returns the default authority for a channel using this name resolver
    /// and target.  This is typically the same as the service's name.  By
    /// default, the default_authority method automatically returns the path
    /// portion of the target URI, with the leading prefix removed.
    fn default_authority(&self, target: &Target) -> String {
        let path = target.path();
        path.strip_prefix('/').unwrap_or(path).to_string()
    }

    /// Returns a bool indicating whether the input uri is valid to create a
    /// resolver.
    fn is_valid_uri(&self, target: &Target) -> bool;
}

/// A collection of data configured on the channel that is constructing this
/// name resolver.  None of it is examined by the registry.
#[non_exhaustive]
pub struct ResolverOptions {
    /// Arguments the channel was configured with.
    pub channel_args: Arc<Attributes>,

    /// The runtime which provides utilities to do async work.
    pub runtime: Arc<dyn rt::Runtime>,

    /// A hook into the channel's work scheduler that allows the Resolver to
    /// request a serialized call into its work method.
    pub work_scheduler: Arc<dyn WorkScheduler>,

    /// Receives the resolver's results.
    pub result_handler: Box<dyn ResultHandler>,
}

/// Used to asynchronously request a call into the Resolver's work method.
pub trait WorkScheduler: Send + Sync {
    // Schedules a call into the Resolver's work method.  If there is already a
    // pending work call that has not yet started, this may not schedule another
    // call.
    fn schedule_work(&self);
}

/// Delivers resolver results to the channel.
pub trait ResultHandler: Send {
    /// Notifies the channel about the current state of the name resolver.  If
    /// an error value is returned, the name resolver should attempt to
    /// re-resolve, if possible.  The resolver is responsible for applying an
    /// appropriate backoff mechanism to avoid overloading the system or the
    /// remote resolver.
    fn report_result(&mut self, update: ResolverUpdate) -> Result<(), String>;
}

/// Resolver watches for the updates on the specified target.
///
/// Dropping a resolver shuts it down.
pub trait Resolver: Send {
    /// Asks the resolver to obtain an updated resolver result, if
    /// applicable.
    ///
    /// This is useful for pull-based implementations to decide when to
    /// re-resolve.  However, the implementation is not required to
    /// re-resolve immediately upon receiving this call; it may instead
    /// elect to delay based on some configured minimum time between
    /// queries, to avoid hammering the name service with queries.
    ///
    /// For push-based implementations, this may be a no-op.
    fn resolve_now(&mut self);

    /// Called serially by the work scheduler to do work after the
    /// scheduler's schedule_work method is called.
    fn work(&mut self);
}

#[derive(Debug, Clone)]
#[non_exhaustive]
/// ResolverUpdate contains the current Resolver state relevant to the
/// channel.
pub struct ResolverUpdate {
    /// Attributes contains arbitrary data about the resolver intended for
    /// consumption by the load balancing policy.
    pub attributes: Arc<Attributes>,

    /// Endpoints is the latest set of resolved endpoints for the target.
    pub endpoints: Result<Vec<Endpoint>, String>,

    /// An optional human-readable note describing context about the
    /// resolution, to be passed along to the LB policy for inclusion in
    /// RPC failure status messages.  For example, a resolver that returns
    /// an empty endpoint list may set this to something like "no DNS
    /// entries found for <name>".
    pub resolution_note: Option<String>,
}

impl Default for ResolverUpdate {
    fn default() -> Self {
        ResolverUpdate {
            attributes: Arc::default(),
            endpoints: Ok(Vec::default()),
            resolution_note: None,
        }
    }
}

/// An Endpoint is an address or a collection of addresses which reference one
/// logical server.  Multiple addresses may be used if there are multiple ways
/// which the server can be reached, e.g. via IPv4 and IPv6 addresses.
#[derive(Debug, Default, Clone)]
#[non_exhaustive]
pub struct Endpoint {
    /// Addresses contains a list of addresses used to access this endpoint.
    pub addresses: Vec<Address>,

    /// Attributes contains arbitrary data about this endpoint intended for
    /// consumption by the LB policy.
    pub attributes: Attributes,
}

#[non_exhaustive]
#[derive(Debug, Clone, Default)]
/// An Address is an identifier that indicates how to connect to a server.
pub struct Address {
    /// The network type is used to identify what kind of transport to create
    /// when connecting to this address.  Typically TCP_IP_NETWORK_TYPE.
    pub network_type: &'static str,

    /// The address itself is passed to the transport in order to create a
    /// connection to it.
    pub address: String,

    /// Attributes contains arbitrary data about this address intended for
    /// consumption by the subchannel.
    pub attributes: Attributes,
}

impl Eq for Address {}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.network_type == other.network_type && self.address == other.address
    }
}

impl Eq for Endpoint {}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.addresses == other.addresses
    }
}

impl Hash for Endpoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addresses.hash(state);
    }
}

impl Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.network_type.hash(state);
        self.address.hash(state);
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.network_type, self.address)
    }
}

/// Indicates the address is an IPv4 or IPv6 address that should be connected to
/// via TCP/IP.
pub static TCP_IP_NETWORK_TYPE: &str = "tcp";

/// Indicates the address is a filesystem path, or an abstract socket name
/// prefixed by a NUL byte, of a Unix domain socket.
pub static UNIX_NETWORK_TYPE: &str = "unix";

#[cfg(test)]
mod test {
    use super::{ParseError, Target};

    #[test]
    fn target_parsing() {
        struct TestCase {
            input: &'static str,
            want_scheme: &'static str,
            want_authority: &'static str,
            want_path: &'static str,
        }
        let test_cases = vec![
            TestCase {
                input: "dns:///grpc.io:443",
                want_scheme: "dns",
                want_authority: "",
                want_path: "/grpc.io:443",
            },
            TestCase {
                input: "dns://8.8.8.8:53/grpc.io",
                want_scheme: "dns",
                want_authority: "8.8.8.8:53",
                want_path: "/grpc.io",
            },
            TestCase {
                input: "unix:/tmp/s.sock",
                want_scheme: "unix",
                want_authority: "",
                want_path: "/tmp/s.sock",
            },
            TestCase {
                input: "unix:relative/s.sock",
                want_scheme: "unix",
                want_authority: "",
                want_path: "relative/s.sock",
            },
            TestCase {
                input: "ipv6:[::1]:50051",
                want_scheme: "ipv6",
                want_authority: "",
                want_path: "[::1]:50051",
            },
        ];
        for tc in test_cases {
            let target: Target = tc.input.parse().unwrap();
            assert_eq!(target.scheme(), tc.want_scheme, "input {}", tc.input);
            assert_eq!(
                target.authority_host_port(),
                tc.want_authority,
                "input {}",
                tc.input
            );
            assert_eq!(target.has_authority(), !tc.want_authority.is_empty());
            assert_eq!(target.path(), tc.want_path, "input {}", tc.input);
            assert_eq!(target.to_string(), tc.input);
        }
    }

    #[test]
    fn scheme_case_is_preserved() {
        for input in ["Custom://authority", "DNS:///grpc.io", "unix:/tmp/s.sock"] {
            let target: Target = input.parse().unwrap();
            let want_scheme = input.split_once(':').unwrap().0;
            assert_eq!(target.scheme(), want_scheme);
            assert_eq!(target.to_string(), input);
        }
    }

    #[test]
    fn target_parsing_failures() {
        assert_eq!(
            "\x00\x01".parse::<Target>(),
            Err(ParseError::InvalidCharacter {
                ch: '\x00',
                offset: 0
            })
        );
        assert_eq!(
            "dns:///grpc io".parse::<Target>(),
            Err(ParseError::InvalidCharacter {
                ch: ' ',
                offset: 11
            })
        );
        assert_eq!(
            "127.0.0.1:50051".parse::<Target>(),
            Err(ParseError::Url(url::ParseError::RelativeUrlWithoutBase))
        );
        assert!("".parse::<Target>().is_err());
    }
}
