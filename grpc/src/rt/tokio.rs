//! A [`Runtime`] backed by the tokio executor.

use std::{future::Future, net::IpAddr, pin::Pin, time::Duration};

use super::{DnsResolver, DnsResolverOptions, Runtime, Sleep, TaskHandle};

/// Spawns onto the ambient tokio runtime.  Must be used from within a tokio
/// runtime context.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioRuntime;

impl Runtime for TokioRuntime {
    fn spawn(
        &self,
        task: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
    ) -> Box<dyn TaskHandle> {
        Box::new(::tokio::spawn(task).abort_handle())
    }

    fn get_dns_resolver(&self, opts: DnsResolverOptions) -> Result<Box<dyn DnsResolver>, String> {
        #[cfg(feature = "dns")]
        {
            super::hickory_resolver::DnsResolver::new(opts)
        }
        #[cfg(not(feature = "dns"))]
        {
            build_system_resolver(opts)
        }
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Sleep>> {
        Box::pin(::tokio::time::sleep(duration))
    }
}

impl Sleep for ::tokio::time::Sleep {}

impl TaskHandle for ::tokio::task::AbortHandle {
    fn abort(&self) {
        ::tokio::task::AbortHandle::abort(self);
    }
}

/// Resolves names with the operating system's resolver (getaddrinfo).  Custom
/// DNS servers and TXT lookups are not supported.
pub fn build_system_resolver(opts: DnsResolverOptions) -> Result<Box<dyn DnsResolver>, String> {
    if let Some(server_addr) = opts.server_addr {
        return Err(format!(
            "custom DNS server {server_addr} is not supported by the system resolver"
        ));
    }
    Ok(Box::new(SystemDnsResolver))
}

struct SystemDnsResolver;

#[async_trait::async_trait]
impl DnsResolver for SystemDnsResolver {
    async fn lookup_host_name(&self, name: &str) -> Result<Vec<IpAddr>, String> {
        let addrs = ::tokio::net::lookup_host((name, 0))
            .await
            .map_err(|err| err.to_string())?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }

    async fn lookup_txt(&self, _name: &str) -> Result<Vec<String>, String> {
        Err("TXT lookups are not supported by the system resolver".to_string())
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::Duration,
    };

    use crate::rt::{DnsResolverOptions, Runtime};

    use super::{build_system_resolver, TokioRuntime};

    #[tokio::test]
    async fn system_resolver_resolves_localhost() {
        let dns = build_system_resolver(DnsResolverOptions::default()).unwrap();
        let ips = dns.lookup_host_name("localhost").await.unwrap();
        assert!(ips.iter().all(|ip| ip.is_loopback()), "got {ips:?}");
        assert!(!ips.is_empty());
    }

    #[test]
    fn system_resolver_rejects_custom_server() {
        let opts = DnsResolverOptions {
            server_addr: Some("8.8.8.8:53".parse().unwrap()),
        };
        assert!(build_system_resolver(opts).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_task_does_not_run() {
        let rt = TokioRuntime;
        let ran = Arc::new(AtomicBool::new(false));
        let ran_copy = ran.clone();
        let sleep = rt.sleep(Duration::from_secs(5));
        let handle = rt.spawn(Box::pin(async move {
            sleep.await;
            ran_copy.store(true, Ordering::SeqCst);
        }));
        handle.abort();
        rt.sleep(Duration::from_secs(10)).await;
        assert!(!ran.load(Ordering::SeqCst));
    }
}
