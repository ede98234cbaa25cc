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

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

/// An immutable collection of arbitrary values, keyed by their type.
///
/// Attributes are cheap to clone; adding a value produces a new collection
/// and leaves the original untouched, so they may be freely shared between a
/// channel, its resolver and its LB policy.
#[derive(Clone, Default)]
pub struct Attributes {
    m: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Attributes {
    /// Returns a new set of attributes containing everything in `self` plus
    /// `value`.  An existing value of the same type is replaced.
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut m = (*self.m).clone();
        m.insert(TypeId::of::<T>(), Arc::new(value));
        Attributes { m: Arc::new(m) }
    }

    /// Returns the value of type `T`, if present.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.m
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn len(&self) -> usize {
        self.m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.m.is_empty()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes")
            .field("len", &self.m.len())
            .finish()
    }
}
