// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Non-mutating deep merge of payload objects.
//!
//! Objects are merged left to right into a freshly allocated result:
//!
//! - arrays are appended to a prior array under the same key (duplicates kept)
//! - objects are merged recursively
//! - cloneable [`Instance`](crate::value::Instance)s are copied, others shared
//! - anything else replaces the prior value
//!
//! Merging a single object yields an independent deep copy of it.

use std::sync::Arc;

use crate::value::{Object, Value};

/// Deep-merge `objects` into a new object without touching any of them.
pub fn merge_deep<'a, I>(objects: I) -> Object
where
    I: IntoIterator<Item = &'a Object>,
{
    objects.into_iter().fold(Object::new(), merge_into)
}

/// Merge `next` into an already owned accumulator.
fn merge_into(mut acc: Object, next: &Object) -> Object {
    for (key, value) in next {
        let merged = merge_values(acc.remove(key), value);
        acc.insert(key.clone(), merged);
    }
    acc
}

fn merge_values(prev: Option<Value>, next: &Value) -> Value {
    match next {
        Value::Array(items) => {
            let mut merged = match prev {
                Some(Value::Array(prior)) => prior,
                _ => Vec::with_capacity(items.len()),
            };
            merged.extend(items.iter().map(copy_value));
            Value::Array(merged)
        }
        Value::Object(map) => {
            let base = match prev {
                Some(Value::Object(prior)) => prior,
                _ => Object::new(),
            };
            Value::Object(merge_into(base, map))
        }
        Value::Instance(instance) => {
            Value::Instance(instance.try_clone().unwrap_or_else(|| Arc::clone(instance)))
        }
        scalar => scalar.clone(),
    }
}

/// Independent copy of a single value, following the same instance rules.
fn copy_value(value: &Value) -> Value {
    merge_values(None, value)
}
