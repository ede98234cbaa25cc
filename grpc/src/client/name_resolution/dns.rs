//! This module implements a DNS resolver to be installed as the default resolver
//! in grpc.

use std::{
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tokio::sync::mpsc::UnboundedSender;
use url::Host;

use crate::rt;

use super::{
    backoff::{ExponentialBackoff, DEFAULT_EXPONENTIAL_CONFIG},
    passthrough::nop_resolver,
    Address, Endpoint, Resolver, ResolverBuilder, ResolverOptions, ResolverRegistryBuilder,
    ResolverUpdate, ResultHandler, Target, TCP_IP_NETWORK_TYPE,
};

const DEFAULT_PORT: u16 = 443;
const DEFAULT_DNS_PORT: u16 = 53;

/// This specifies the maximum duration for a DNS resolution request.
/// If the timeout expires before a response is received, the request will be
/// canceled.
const RESOLVING_TIMEOUT: Duration = Duration::from_secs(30);

/// This is the minimum interval at which re-resolutions are allowed. This helps
/// to prevent excessive re-resolution.
const MIN_RESOLUTION_INTERVAL: Duration = Duration::from_secs(30);

pub(super) fn reg(registry: &mut ResolverRegistryBuilder) {
    registry.register_resolver_builder(Box::new(Builder));
}

struct Builder;

impl ResolverBuilder for Builder {
    fn build(&self, target: Target, options: ResolverOptions) -> Option<Box<dyn Resolver>> {
        let parsed = match parse_endpoint_and_authority(&target) {
            Ok(res) => res,
            Err(err) => return Some(nop_resolver_for_err(err, options)),
        };
        let port = parsed.endpoint.port;
        let host = match parsed.endpoint.host {
            Host::Domain(d) => d,
            Host::Ipv4(ipv4) => return Some(nop_resolver_for_ip(IpAddr::V4(ipv4), port, options)),
            Host::Ipv6(ipv6) => return Some(nop_resolver_for_ip(IpAddr::V6(ipv6), port, options)),
        };
        let dns = match options.runtime.get_dns_resolver(rt::DnsResolverOptions {
            server_addr: parsed.authority,
        }) {
            Ok(dns) => dns,
            Err(err) => return Some(nop_resolver_for_err(err, options)),
        };
        let ResolverOptions {
            runtime,
            work_scheduler,
            result_handler,
            ..
        } = options;
        let state = Arc::new(Mutex::new(InternalState {
            addrs: Ok(Vec::new()),
        }));
        let state_copy = state.clone();
        let (resolve_now_tx, mut resolve_now_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
        let (update_result_tx, mut update_result_rx) =
            tokio::sync::mpsc::unbounded_channel::<Result<(), String>>();
        let task_runtime = runtime.clone();

        let handle = runtime.spawn(Box::pin(async move {
            let runtime = task_runtime;
            let mut backoff = ExponentialBackoff::new(DEFAULT_EXPONENTIAL_CONFIG);
            loop {
                let resolution_start = Instant::now();
                let mut lookup_fut = dns.lookup_host_name(&host);
                let mut timeout_fut = runtime.sleep(RESOLVING_TIMEOUT);
                let addrs: Result<Vec<SocketAddr>, String> = tokio::select! {
                    result = &mut lookup_fut => {
                        result.map(|ips| {
                            ips.into_iter()
                                .map(|ip| SocketAddr::new(ip, port))
                                .collect()
                        })
                    }
                    _ = &mut timeout_fut => {
                        Err("Timed out waiting for DNS resolution".to_string())
                    }
                };
                if let Err(err) = &addrs {
                    tracing::debug!(host = %host, "DNS resolution failed: {}", err);
                }
                match state.lock() {
                    Ok(mut internal_state) => internal_state.addrs = addrs,
                    Err(_) => return,
                }
                work_scheduler.schedule_work();
                let Some(update_result) = update_result_rx.recv().await else {
                    return;
                };
                if update_result.is_err() {
                    runtime.sleep(backoff.backoff_duration()).await;
                    continue;
                }
                // Success resolving, wait for the next resolve_now. However,
                // also wait MIN_RESOLUTION_INTERVAL at the very least to prevent
                // constantly re-resolving.
                backoff.reset();
                if resolve_now_rx.recv().await.is_none() {
                    return;
                }
                let elapsed = resolution_start.elapsed();
                if elapsed < MIN_RESOLUTION_INTERVAL {
                    runtime.sleep(MIN_RESOLUTION_INTERVAL - elapsed).await;
                }
            }
        }));

        Some(Box::new(DnsResolver {
            state: state_copy,
            task_handle: handle,
            resolve_now_requester: resolve_now_tx,
            update_result_sender: update_result_tx,
            result_handler,
        }))
    }

    fn scheme(&self) -> &str {
        "dns"
    }

    fn is_valid_uri(&self, target: &Target) -> bool {
        if let Err(err) = parse_endpoint_and_authority(target) {
            tracing::warn!(uri = %target, "{}", err);
            false
        } else {
            true
        }
    }
}

struct DnsResolver {
    state: Arc<Mutex<InternalState>>,
    task_handle: Box<dyn rt::TaskHandle>,
    resolve_now_requester: UnboundedSender<()>,
    update_result_sender: UnboundedSender<Result<(), String>>,
    result_handler: Box<dyn ResultHandler>,
}

struct InternalState {
    addrs: Result<Vec<SocketAddr>, String>,
}

impl Resolver for DnsResolver {
    fn resolve_now(&mut self) {
        _ = self.resolve_now_requester.send(());
    }

    fn work(&mut self) {
        let endpoints = match self.state.lock() {
            Ok(state) => match &state.addrs {
                Ok(addrs) => Ok(addrs
                    .iter()
                    .map(|a| Endpoint {
                        addresses: vec![Address {
                            network_type: TCP_IP_NETWORK_TYPE,
                            address: a.to_string(),
                            ..Default::default()
                        }],
                        ..Default::default()
                    })
                    .collect::<Vec<_>>()),
                Err(err) => Err(err.clone()),
            },
            Err(_) => {
                tracing::error!("DNS resolver mutex poisoned, can't update channel");
                return;
            }
        };
        let resolution_note = match &endpoints {
            Ok(endpoints) if endpoints.is_empty() => Some("no DNS entries found".to_string()),
            _ => None,
        };
        let update = ResolverUpdate {
            endpoints,
            resolution_note,
            ..Default::default()
        };
        let status = self.result_handler.report_result(update);
        _ = self.update_result_sender.send(status);
    }
}

impl Drop for DnsResolver {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}

#[derive(Eq, PartialEq, Debug)]
struct HostPort {
    host: Host<String>,
    port: u16,
}

#[derive(Eq, PartialEq, Debug)]
struct ParseResult {
    endpoint: HostPort,
    authority: Option<SocketAddr>,
}

fn parse_endpoint_and_authority(target: &Target) -> Result<ParseResult, String> {
    // Parse the endpoint.
    let endpoint = target.path();
    let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
    let parse_result = parse_host_port(endpoint, DEFAULT_PORT)
        .map_err(|err| format!("Failed to parse target {}: {}", target, err))?;
    let endpoint = parse_result.ok_or("Received empty endpoint host.".to_string())?;

    // Parse the authority.
    let authority = target.authority_host_port();
    if authority.is_empty() {
        return Ok(ParseResult {
            endpoint,
            authority: None,
        });
    }
    let parse_result = parse_host_port(&authority, DEFAULT_DNS_PORT)
        .map_err(|err| format!("Failed to parse DNS authority {}: {}", target, err))?;
    let Some(authority) = parse_result else {
        return Ok(ParseResult {
            endpoint,
            authority: None,
        });
    };
    let authority = match authority.host {
        Host::Ipv4(ipv4) => SocketAddr::new(IpAddr::V4(ipv4), authority.port),
        Host::Ipv6(ipv6) => SocketAddr::new(IpAddr::V6(ipv6), authority.port),
        _ => {
            return Err(format!("Received non-IP DNS authority {}", authority.host));
        }
    };
    Ok(ParseResult {
        endpoint,
        authority: Some(authority),
    })
}

/// Takes the user input string of the format "host:port" and default port,
/// returns the parsed host and port. If string doesn't specify a port, the
/// default_port is returned. If the string doesn't specify the host,
/// Result<None> is returned.
fn parse_host_port(host_and_port: &str, default_port: u16) -> Result<Option<HostPort>, String> {
    // We need to use the https scheme otherwise url::Url::parse doesn't convert
    // IP addresses to Host::Ipv4 or Host::Ipv6 if they could represent valid
    // domains.
    let url = format!("https://{}", host_and_port);
    let url = url.parse::<url::Url>().map_err(|err| err.to_string())?;
    let port = url.port().unwrap_or(default_port);
    let host = match url.host() {
        Some(host) => host,
        None => return Ok(None),
    };
    // Convert the domain to an owned string.
    let host = match host {
        Host::Domain(s) => Host::Domain(s.to_owned()),
        Host::Ipv4(ip) => Host::Ipv4(ip),
        Host::Ipv6(ip) => Host::Ipv6(ip),
    };
    Ok(Some(HostPort { host, port }))
}

fn nop_resolver_for_ip(ip: IpAddr, port: u16, options: ResolverOptions) -> Box<dyn Resolver> {
    nop_resolver(
        ResolverUpdate {
            endpoints: Ok(vec![Endpoint {
                addresses: vec![Address {
                    network_type: TCP_IP_NETWORK_TYPE,
                    address: SocketAddr::new(ip, port).to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }]),
            ..Default::default()
        },
        options,
    )
}

fn nop_resolver_for_err(err: String, options: ResolverOptions) -> Box<dyn Resolver> {
    nop_resolver(
        ResolverUpdate {
            endpoints: Err(err),
            ..Default::default()
        },
        options,
    )
}
