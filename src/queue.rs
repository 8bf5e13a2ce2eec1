// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Pending events grouped by collection.

use std::collections::BTreeMap;
use std::mem;

use crate::value::{object_to_json, Object};

/// Events keyed by collection name, as sent to the multi-collection endpoint.
pub type EventBatch = BTreeMap<String, Vec<Object>>;

/// Queue of events waiting for the next flush.
///
/// Order within a collection is submission order. Collections are independent.
#[derive(Debug, Default)]
pub struct EventQueue {
    collections: EventBatch,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload to `collection`.
    pub fn push(&mut self, collection: &str, payload: Object) {
        match self.collections.get_mut(collection) {
            Some(events) => events.push(payload),
            None => {
                self.collections.insert(collection.to_string(), vec![payload]);
            }
        }
    }

    /// Swap the queue for an empty one, returning everything that was pending.
    pub fn take(&mut self) -> EventBatch {
        mem::take(&mut self.collections)
    }

    /// Total number of pending events across all collections.
    pub fn len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Pending events for one collection.
    pub fn collection(&self, collection: &str) -> Option<&[Object]> {
        self.collections.get(collection).map(Vec::as_slice)
    }
}

/// Render a batch as the JSON body of a multi-collection write.
pub fn batch_to_json(batch: &EventBatch) -> serde_json::Value {
    serde_json::Value::Object(
        batch
            .iter()
            .map(|(collection, events)| {
                let events = events.iter().map(object_to_json).collect();
                (collection.clone(), serde_json::Value::Array(events))
            })
            .collect(),
    )
}
