//! Resolvers for targets that spell out their addresses directly: Unix domain
//! sockets (`unix:`, `unix-abstract:`) and lists of IP socket addresses
//! (`ipv4:`, `ipv6:`).  No lookups are performed.

use std::net::{SocketAddrV4, SocketAddrV6};

use super::{
    passthrough::nop_resolver, Address, Endpoint, Resolver, ResolverBuilder, ResolverOptions,
    ResolverRegistryBuilder, ResolverUpdate, Target, TCP_IP_NETWORK_TYPE, UNIX_NETWORK_TYPE,
};

pub(super) fn reg(registry: &mut ResolverRegistryBuilder) {
    registry.register_resolver_builder(Box::new(Builder {
        kind: Kind::Unix,
    }));
    registry.register_resolver_builder(Box::new(Builder {
        kind: Kind::UnixAbstract,
    }));
    registry.register_resolver_builder(Box::new(Builder { kind: Kind::Ipv4 }));
    registry.register_resolver_builder(Box::new(Builder { kind: Kind::Ipv6 }));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Unix,
    UnixAbstract,
    Ipv4,
    Ipv6,
}

struct Builder {
    kind: Kind,
}

impl Builder {
    fn parse_addresses(&self, target: &Target) -> Result<Vec<Address>, String> {
        if target.has_authority() {
            return Err(format!(
                "authority is not supported for {} targets: {}",
                self.scheme(),
                target
            ));
        }
        let path = target.path();
        match self.kind {
            Kind::Unix => {
                if path.is_empty() {
                    return Err(format!("empty socket path: {target}"));
                }
                Ok(vec![unix_address(path.to_string())])
            }
            Kind::UnixAbstract => Ok(vec![unix_address(format!("\0{path}"))]),
            Kind::Ipv4 => parse_ip_list(path, |s| {
                s.parse::<SocketAddrV4>().map(|a| a.to_string())
            }),
            Kind::Ipv6 => parse_ip_list(path, |s| {
                s.parse::<SocketAddrV6>().map(|a| a.to_string())
            }),
        }
    }
}

fn unix_address(path: String) -> Address {
    Address {
        network_type: UNIX_NETWORK_TYPE,
        address: path,
        ..Default::default()
    }
}

fn parse_ip_list<E: std::fmt::Display>(
    path: &str,
    parse: impl Fn(&str) -> Result<String, E>,
) -> Result<Vec<Address>, String> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        return Err("empty address list".to_string());
    }
    path.split(',')
        .map(|addr| {
            parse(addr)
                .map(|address| Address {
                    network_type: TCP_IP_NETWORK_TYPE,
                    address,
                    ..Default::default()
                })
                .map_err(|err| format!("invalid address {addr:?}: {err}"))
        })
        .collect()
}

impl ResolverBuilder for Builder {
    fn scheme(&self) -> &str {
        match self.kind {
            Kind::Unix => "unix",
            Kind::UnixAbstract => "unix-abstract",
            Kind::Ipv4 => "ipv4",
            Kind::Ipv6 => "ipv6",
        }
    }

    fn build(&self, target: Target, options: ResolverOptions) -> Option<Box<dyn Resolver>> {
        let addresses = match self.parse_addresses(&target) {
            Ok(addresses) => addresses,
            Err(err) => {
                tracing::warn!(uri = %target, "{}", err);
                return None;
            }
        };
        let endpoints = addresses
            .into_iter()
            .map(|address| Endpoint {
                addresses: vec![address],
                ..Default::default()
            })
            .collect();
        let update = ResolverUpdate {
            endpoints: Ok(endpoints),
            ..Default::default()
        };
        Some(nop_resolver(update, options))
    }

    fn default_authority(&self, _target: &Target) -> String {
        "localhost".to_string()
    }

    fn is_valid_uri(&self, target: &Target) -> bool {
        self.parse_addresses(target).is_ok()
    }
}
