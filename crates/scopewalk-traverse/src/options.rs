// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Traversal configuration.

use serde::{Deserialize, Serialize};

/// Default number of queued paths one traversal context accepts before the
/// cycle guard trips.
pub const DEFAULT_CYCLE_LIMIT: usize = 10_000;

/// What happens when the cycle guard trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// The next re-queue fails with [`TraverseError::InfiniteCycle`](crate::TraverseError::InfiniteCycle).
    #[default]
    Error,
    /// Log a warning once and drop further re-queues in that context.
    Warn,
}

/// Options shared by every traversal in a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverseOptions {
    /// Queue length at which a traversal context trips the cycle guard.
    pub cycle_limit: usize,
    /// Behavior once the guard has tripped.
    pub cycle_policy: CyclePolicy,
    /// Keep bindings, references and constant violations in sync with every
    /// mutation made through the path API.
    pub track_bindings: bool,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        TraverseOptions {
            cycle_limit: DEFAULT_CYCLE_LIMIT,
            cycle_policy: CyclePolicy::Error,
            track_bindings: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let options: TraverseOptions =
            serde_json::from_str(r#"{ "cycle_policy": "warn" }"#).unwrap();
        assert_eq!(options.cycle_limit, DEFAULT_CYCLE_LIMIT);
        assert_eq!(options.cycle_policy, CyclePolicy::Warn);
        assert!(options.track_bindings);
    }
}
