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

use std::{collections::HashMap, fmt, sync::Arc};

use tracing::{debug, error};

use crate::{attributes::Attributes, rt};

use super::{
    ParseError, Resolver, ResolverBuilder, ResolverOptions, ResolverRegistryConfig, ResultHandler,
    Target, WorkScheduler,
};


/// The prefix applied to targets whose scheme has no registered resolver.
pub const DEFAULT_PREFIX: &str = "dns:///";

#[derive(Default)]
struct RegistryState {
    default_prefix: String,
    builders: HashMap<String, Box<dyn ResolverBuilder>>,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            default_prefix: DEFAULT_PREFIX.to_string(),
            builders: HashMap::new(),
        }
    }
}

/// Accumulates resolver builders before they are frozen into a
/// [`ResolverRegistry`].
///
/// The builder is meant to be used by a single thread while the process or
/// library is being initialized.
pub struct ResolverRegistryBuilder {
    state: RegistryState,
}

impl ResolverRegistryBuilder {
    /// Creates a builder with no resolvers and the default prefix `"dns:///"`.
    pub fn new() -> Self {
        Self {
            state: RegistryState::new(),
        }
    }

    /// Replaces the prefix prepended to targets that do not name a registered
    /// scheme.  The prefix is not validated.
    pub fn set_default_prefix(&mut self, default_prefix: impl Into<String>) {
        self.state.default_prefix = default_prefix.into();
    }

    /// Applies the settings present in `config`.
    pub fn apply_config(&mut self, config: &ResolverRegistryConfig) {
        if let Some(prefix) = &config.default_prefix {
            self.set_default_prefix(prefix.clone());
        }
    }

    /// Adds a resolver builder, keyed by `builder.scheme()`.
    ///
    /// Panics if a builder is already registered for that scheme; two
    /// resolvers claiming one scheme is a configuration error.
    pub fn register_resolver_builder(&mut self, builder: Box<dyn ResolverBuilder>) {
        let scheme = builder.scheme().to_string();
        if self.state.builders.contains_key(&scheme) {
            panic!("resolver builder already registered for scheme {scheme:?}");
        }
        debug!(scheme = %scheme, "registered resolver builder");
        self.state.builders.insert(scheme, builder);
    }

    /// Returns whether a builder is registered for exactly `scheme`.
    pub fn has_resolver_builder(&self, scheme: &str) -> bool {
        self.state.builders.contains_key(scheme)
    }

    /// Removes every registered builder and restores the default prefix.
    pub fn reset(&mut self) {
        self.state.builders.clear();
        self.state.default_prefix = DEFAULT_PREFIX.to_string();
    }

    /// Moves the accumulated state into a new registry.
    ///
    /// The builder is left empty: it holds no resolvers and an empty default
    /// prefix until [`reset`](Self::reset) is called.
    pub fn build(&mut self) -> ResolverRegistry {
        ResolverRegistry {
            state: std::mem::take(&mut self.state),
        }
    }
}

impl Default for ResolverRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A registry to store and retrieve name resolvers.  Resolvers are indexed by
/// the URI scheme they are intended to handle.
///
/// A registry never changes after it is built, so it can be shared between
/// threads (typically in an `Arc`) and queried without locking.
pub struct ResolverRegistry {
    state: RegistryState,
}

// The outcome of matching a target against the registered schemes.
struct Resolution<'a> {
    found: Option<(&'a dyn ResolverBuilder, Target)>,
    // Set whenever the default prefix had to be applied, even if the prefixed
    // target matched nothing either.
    canonical_target: Option<String>,
}

impl ResolverRegistry {
    /// Builds a registry containing the resolvers shipped with this crate and
    /// the default prefix.
    pub fn with_builtin_resolvers() -> Self {
        let mut builder = ResolverRegistryBuilder::new();
        super::register_builtin_resolvers(&mut builder);
        builder.build()
    }

    /// The prefix prepended to targets that do not name a registered scheme.
    pub fn default_prefix(&self) -> &str {
        &self.state.default_prefix
    }

    /// Returns the resolver builder registered for exactly `scheme`, if any.
    pub fn lookup_resolver_builder(&self, scheme: &str) -> Option<&dyn ResolverBuilder> {
        self.state.builders.get(scheme).map(|b| b.as_ref())
    }

    /// Returns whether `target` names a registered scheme (possibly after
    /// applying the default prefix) and that scheme's builder accepts it.
    pub fn is_valid_target(&self, target: &str) -> bool {
        match self.find_resolver_builder(target).found {
            Some((builder, uri)) => builder.is_valid_uri(&uri),
            None => false,
        }
    }

    /// Returns the default authority for a channel to `target`, or an empty
    /// string if no resolver matches.
    pub fn default_authority(&self, target: &str) -> String {
        match self.find_resolver_builder(target).found {
            Some((builder, uri)) => builder.default_authority(&uri),
            None => String::new(),
        }
    }

    /// Returns `target` with the default prefix applied, unless `target`
    /// already names a registered scheme.
    pub fn add_default_prefix_if_needed(&self, target: &str) -> String {
        self.find_resolver_builder(target)
            .canonical_target
            .unwrap_or_else(|| target.to_string())
    }

    /// Creates a resolver for `target` using the builder registered for its
    /// scheme.
    ///
    /// Returns None if no builder matches or if the matching builder rejects
    /// the target.  The remaining arguments are handed to the builder as they
    /// are.
    pub fn create_resolver(
        &self,
        target: &str,
        channel_args: Arc<Attributes>,
        runtime: Arc<dyn rt::Runtime>,
        work_scheduler: Arc<dyn WorkScheduler>,
        result_handler: Box<dyn ResultHandler>,
    ) -> Option<Box<dyn Resolver>> {
        let (builder, uri) = self.find_resolver_builder(target).found?;
        builder.build(
            uri,
            ResolverOptions {
                channel_args,
                runtime,
                work_scheduler,
                result_handler,
            },
        )
    }

    // Finds the builder for the scheme of `target`.  If `target` does not
    // name a registered scheme, prepends the default prefix and tries again.
    fn find_resolver_builder(&self, target: &str) -> Resolution<'_> {
        let raw = match target.parse::<Target>() {
            Ok(uri) => match self.lookup_resolver_builder(uri.scheme()) {
                Some(builder) => {
                    return Resolution {
                        found: Some((builder, uri)),
                        canonical_target: None,
                    }
                }
                None => Ok(uri),
            },
            Err(err) => Err(err),
        };

        let canonical_target = format!("{}{}", self.state.default_prefix, target);
        let canonical = match canonical_target.parse::<Target>() {
            Ok(uri) => match self.lookup_resolver_builder(uri.scheme()) {
                Some(builder) => {
                    return Resolution {
                        found: Some((builder, uri)),
                        canonical_target: Some(canonical_target),
                    }
                }
                None => Ok(uri),
            },
            Err(err) => Err(err),
        };

        if raw.is_err() || canonical.is_err() {
            error!(
                raw_target = %target,
                canonical_target = %canonical_target,
                "Error parsing URI(s). '{}':{}; '{}':{}",
                target,
                parse_status(&raw),
                canonical_target,
                parse_status(&canonical),
            );
        } else {
            error!(
                raw_target = %target,
                canonical_target = %canonical_target,
                "Don't know how to resolve '{}' or '{}'.",
                target,
                canonical_target,
            );
        }
        Resolution {
            found: None,
            canonical_target: Some(canonical_target),
        }
    }
}

fn parse_status(result: &Result<Target, ParseError>) -> String {
    match result {
        Ok(_) => "OK".to_string(),
        Err(err) => err.to_string(),
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<_> = self.state.builders.keys().collect();
        schemes.sort();
        f.debug_struct("ResolverRegistry")
            .field("default_prefix", &self.state.default_prefix)
            .field("schemes", &schemes)
            .finish()
    }
}
