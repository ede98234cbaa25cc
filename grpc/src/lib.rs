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

//! Name resolution for gRPC channels.
//!
//! A [`ResolverRegistry`](client::name_resolution::ResolverRegistry) maps the
//! scheme of a channel target to the [`ResolverBuilder`] that understands it,
//! promoting bare targets such as `"example.com:443"` to the default scheme.
//!
//! [`ResolverBuilder`]: client::name_resolution::ResolverBuilder

pub mod attributes;
pub mod client;
pub mod rt;
