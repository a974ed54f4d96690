// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent properties: `key=value` capability strings.
//!
//! Agents advertise properties as flat strings. Keys compare
//! case-insensitively and may repeat (`Pool=a`, `Pool=b`). A property with no
//! `=` is shorthand for `key=true`.

use crate::id::PoolId;
use std::collections::BTreeMap;

/// Property listing the pools an agent asks to join, separated by `,` or `;`.
pub const REQUESTED_POOLS_PROPERTY: &str = "RequestedPools";

/// Sort and deduplicate a property list into its stored form.
pub fn normalize(properties: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = properties
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Indexed view over a property list for condition evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    values: BTreeMap<String, Vec<String>>,
}

impl PropertySet {
    pub fn new<'a>(properties: impl IntoIterator<Item = &'a String>) -> Self {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for property in properties {
            let (key, value) = split(property);
            values.entry(key.to_ascii_lowercase()).or_default().push(value.to_string());
        }
        Self { values }
    }

    /// All values recorded for `key`; empty when the key is absent.
    pub fn values(&self, key: &str) -> &[String] {
        self.values.get(&key.to_ascii_lowercase()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        !self.values(key).is_empty()
    }

    /// Pools named by every `RequestedPools` property, in first-seen order.
    pub fn requested_pools(&self) -> Vec<PoolId> {
        let mut pools: Vec<PoolId> = Vec::new();
        for value in self.values(REQUESTED_POOLS_PROPERTY) {
            for name in value.split([',', ';']).map(str::trim).filter(|n| !n.is_empty()) {
                if !pools.iter().any(|p| p == name) {
                    pools.push(PoolId::new(name));
                }
            }
        }
        pools
    }
}

fn split(property: &str) -> (&str, &str) {
    match property.split_once('=') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (property.trim(), "true"),
    }
}

#[cfg(test)]
#[path = "properties_tests.rs"]
mod tests;
