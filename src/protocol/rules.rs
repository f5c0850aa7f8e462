//! Access-rule evaluation for non-tenant requesters
//!
//! The tenant of a node may do anything; everyone else is checked against
//! the `$actions` of the record's protocol path.

use super::{Action, ProtocolDefinition, Who};
use crate::identity::Did;

/// A record in the parent chain of the record being accessed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestor {
    pub protocol_path: String,
    pub author: Did,
}

impl ProtocolDefinition {
    /// Whether `requester` may perform `action` at `path`.
    ///
    /// `ancestors` is the parent chain of the target record (nearest last),
    /// which `author of <path>` rules are resolved against.
    pub fn allows(&self, path: &str, action: Action, requester: &Did, ancestors: &[Ancestor]) -> bool {
        let Some(rules) = self.rule_set(path) else {
            return false;
        };
        rules.actions.iter().filter(|rule| rule.can == action).any(|rule| match rule.who {
            Who::Anyone => true,
            Who::Author => rule.of.as_deref().is_some_and(|of| {
                ancestors
                    .iter()
                    .any(|a| a.protocol_path == of && &a.author == requester)
            }),
        })
    }
}
