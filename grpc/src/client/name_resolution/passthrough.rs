//! The passthrough resolver hands the target's path to the transport as the
//! address to dial, without resolving it.

use super::{
    Address, Endpoint, Resolver, ResolverBuilder, ResolverOptions, ResolverRegistryBuilder,
    ResolverUpdate, ResultHandler, Target, TCP_IP_NETWORK_TYPE,
};

pub(super) fn reg(registry: &mut ResolverRegistryBuilder) {
    registry.register_resolver_builder(Box::new(Builder));
}

struct Builder;

impl ResolverBuilder for Builder {
    fn scheme(&self) -> &str {
        "passthrough"
    }

    fn build(&self, target: Target, options: ResolverOptions) -> Option<Box<dyn Resolver>> {
        if !self.is_valid_uri(&target) {
            return None;
        }
        let update = ResolverUpdate {
            endpoints: Ok(vec![Endpoint {
                addresses: vec![Address {
                    network_type: TCP_IP_NETWORK_TYPE,
                    address: self.default_authority(&target),
                    ..Default::default()
                }],
                ..Default::default()
            }]),
            ..Default::default()
        };
        Some(nop_resolver(update, options))
    }

    fn is_valid_uri(&self, target: &Target) -> bool {
        !self.default_authority(target).is_empty()
    }
}

/// Returns a resolver that reports `update` every time it is asked to work,
/// and schedules the first report immediately.
pub(super) fn nop_resolver(update: ResolverUpdate, options: ResolverOptions) -> Box<dyn Resolver> {
    options.work_scheduler.schedule_work();
    Box::new(NopResolver {
        update,
        result_handler: options.result_handler,
    })
}

pub(super) struct NopResolver {
    update: ResolverUpdate,
    result_handler: Box<dyn ResultHandler>,
}

impl Resolver for NopResolver {
    fn resolve_now(&mut self) {}

    fn work(&mut self) {
        // The result never changes, so a rejected update is not retried.
        _ = self.result_handler.report_result(self.update.clone());
    }
}
