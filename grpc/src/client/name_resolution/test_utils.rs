use std::{
    future::Future,
    net::{IpAddr, SocketAddr},
    pin::Pin,
    sync::Arc,
    time::Duration,
};

use tokio::sync::mpsc;

use crate::{
    attributes::Attributes,
    rt::{self, tokio::TokioRuntime, DnsResolverOptions, Runtime, Sleep, TaskHandle},
};

use super::{
    Resolver, ResolverBuilder, ResolverOptions, ResolverUpdate, ResultHandler, Target,
    WorkScheduler,
};

pub(crate) enum TestEvent {
    ScheduleWork,
    Update(ResolverUpdate),
    Build { scheme: String, target: String },
    DnsResolverCreated(Option<SocketAddr>),
    Lookup(String),
}

pub(crate) struct TestWorkScheduler {
    pub tx_events: mpsc::UnboundedSender<TestEvent>,
}

impl WorkScheduler for TestWorkScheduler {
    fn schedule_work(&self) {
        self.tx_events.send(TestEvent::ScheduleWork).unwrap();
    }
}

/// Forwards every update to the test and rejects updates carrying an error,
/// which makes resolvers back off and retry.
pub(crate) struct TestResultHandler {
    pub tx_events: mpsc::UnboundedSender<TestEvent>,
}

impl ResultHandler for TestResultHandler {
    fn report_result(&mut self, update: ResolverUpdate) -> Result<(), String> {
        let status = update.endpoints.as_ref().map(|_| ()).map_err(Clone::clone);
        self.tx_events.send(TestEvent::Update(update)).unwrap();
        status
    }
}

/// A runtime that runs tasks on tokio but answers every DNS lookup with a
/// canned result.
pub(crate) struct FakeDnsRuntime {
    pub lookup_result: Result<Vec<IpAddr>, String>,
    pub tx_events: mpsc::UnboundedSender<TestEvent>,
}

impl Runtime for FakeDnsRuntime {
    fn spawn(
        &self,
        task: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
    ) -> Box<dyn TaskHandle> {
        TokioRuntime.spawn(task)
    }

    fn get_dns_resolver(
        &self,
        opts: DnsResolverOptions,
    ) -> Result<Box<dyn rt::DnsResolver>, String> {
        self.tx_events
            .send(TestEvent::DnsResolverCreated(opts.server_addr))
            .unwrap();
        Ok(Box::new(FakeDnsResolver {
            lookup_result: self.lookup_result.clone(),
            tx_events: self.tx_events.clone(),
        }))
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Sleep>> {
        TokioRuntime.sleep(duration)
    }
}

struct FakeDnsResolver {
    lookup_result: Result<Vec<IpAddr>, String>,
    tx_events: mpsc::UnboundedSender<TestEvent>,
}

#[async_trait::async_trait]
impl rt::DnsResolver for FakeDnsResolver {
    async fn lookup_host_name(&self, name: &str) -> Result<Vec<IpAddr>, String> {
        self.tx_events
            .send(TestEvent::Lookup(name.to_string()))
            .unwrap();
        self.lookup_result.clone()
    }

    async fn lookup_txt(&self, _name: &str) -> Result<Vec<String>, String> {
        Ok(Vec::new())
    }
}

/// The channel-provided arguments of ResolverRegistry::create_resolver.
pub(crate) struct TestResolverArgs {
    pub channel_args: Arc<Attributes>,
    pub runtime: Arc<dyn Runtime>,
    pub work_scheduler: Arc<dyn WorkScheduler>,
    pub result_handler: Box<dyn ResultHandler>,
}

pub(crate) fn resolver_args() -> (mpsc::UnboundedReceiver<TestEvent>, TestResolverArgs) {
    resolver_args_with_runtime(|_| Arc::new(TokioRuntime))
}

pub(crate) fn resolver_args_with_dns(
    lookup_result: Result<Vec<IpAddr>, String>,
) -> (mpsc::UnboundedReceiver<TestEvent>, TestResolverArgs) {
    resolver_args_with_runtime(|tx_events| {
        Arc::new(FakeDnsRuntime {
            lookup_result,
            tx_events,
        })
    })
}

fn resolver_args_with_runtime(
    runtime: impl FnOnce(mpsc::UnboundedSender<TestEvent>) -> Arc<dyn Runtime>,
) -> (mpsc::UnboundedReceiver<TestEvent>, TestResolverArgs) {
    let (tx_events, rx_events) = mpsc::unbounded_channel();
    let args = TestResolverArgs {
        channel_args: Arc::default(),
        runtime: runtime(tx_events.clone()),
        work_scheduler: Arc::new(TestWorkScheduler {
            tx_events: tx_events.clone(),
        }),
        result_handler: Box::new(TestResultHandler { tx_events }),
    };
    (rx_events, args)
}

/// A resolver builder whose behavior is configured by the test.  Every
/// successful build is reported as a TestEvent::Build.
pub(crate) struct FakeResolverBuilder {
    pub scheme: &'static str,
    pub valid: bool,
    pub tx_events: mpsc::UnboundedSender<TestEvent>,
}

impl ResolverBuilder for FakeResolverBuilder {
    fn build(&self, target: Target, _options: ResolverOptions) -> Option<Box<dyn Resolver>> {
        if !self.valid {
            return None;
        }
        self.tx_events
            .send(TestEvent::Build {
                scheme: target.scheme().to_string(),
                target: target.to_string(),
            })
            .unwrap();
        Some(Box::new(FakeResolver))
    }

    fn scheme(&self) -> &str {
        self.scheme
    }

    fn default_authority(&self, target: &Target) -> String {
        format!("{}-authority:{}", self.scheme, target.path())
    }

    fn is_valid_uri(&self, _target: &Target) -> bool {
        self.valid
    }
}

struct FakeResolver;

impl Resolver for FakeResolver {
    fn resolve_now(&mut self) {}

    fn work(&mut self) {}
}
