//! A [`DnsResolver`](super::DnsResolver) backed by hickory, supporting custom
//! name servers and TXT lookups.

use std::net::IpAddr;

use hickory_resolver::config::{
    LookupIpStrategy, NameServerConfigGroup, ResolverConfig, ResolverOpts,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;

pub struct DnsResolver {
    resolver: TokioResolver,
}

#[async_trait::async_trait]
impl super::DnsResolver for DnsResolver {
    async fn lookup_host_name(&self, name: &str) -> Result<Vec<IpAddr>, String> {
        let response = self
            .resolver
            .lookup_ip(name)
            .await
            .map_err(|err| err.to_string())?;
        Ok(response.iter().collect())
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, String> {
        let response = self
            .resolver
            .txt_lookup(name)
            .await
            .map_err(|err| err.to_string())?
            .iter()
            .map(|txt_record| {
                txt_record
                    .iter()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .collect::<Vec<String>>()
                    .join("")
            })
            .collect();
        Ok(response)
    }
}

impl DnsResolver {
    pub fn new(opts: super::DnsResolverOptions) -> Result<Box<dyn super::DnsResolver>, String> {
        let builder = match opts.server_addr {
            Some(server_addr) => {
                let name_servers = NameServerConfigGroup::from_ips_clear(
                    &[server_addr.ip()],
                    server_addr.port(),
                    true,
                );
                let config = ResolverConfig::from_parts(None, vec![], name_servers);
                TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
            }
            None => TokioResolver::builder_tokio().map_err(|err| err.to_string())?,
        };
        let mut resolver_opts = ResolverOpts::default();
        resolver_opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        Ok(Box::new(DnsResolver {
            resolver: builder.with_options(resolver_opts).build(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::rt::{tokio::build_system_resolver, DnsResolverOptions};

    #[tokio::test]
    async fn compare_hickory_and_system_resolver() {
        let hickory_dns = super::DnsResolver::new(DnsResolverOptions::default()).unwrap();
        let mut hickory_ips = hickory_dns.lookup_host_name("localhost").await.unwrap();

        let system_dns = build_system_resolver(DnsResolverOptions::default()).unwrap();
        let mut system_ips = system_dns.lookup_host_name("localhost").await.unwrap();

        // Hickory requests A and AAAA records in parallel, so the order of IPv4
        // and IPv6 addresses isn't deterministic.
        hickory_ips.sort();
        hickory_ips.dedup();
        system_ips.sort();
        system_ips.dedup();
        assert_eq!(
            hickory_ips, system_ips,
            "both resolvers should produce same IPs for localhost"
        )
    }

    #[tokio::test]
    #[ignore] // Requires internet access.
    async fn custom_name_server() {
        let opts = DnsResolverOptions {
            server_addr: Some("8.8.8.8:53".parse().unwrap()),
        };
        let hickory_dns = super::DnsResolver::new(opts).unwrap();
        let ips = hickory_dns.lookup_host_name("grpc.io").await.unwrap();
        assert!(!ips.is_empty());
    }
}
