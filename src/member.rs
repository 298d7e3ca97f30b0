//! Member records and permission lookups.
//!
//! Members are owned by the bot runtime and may change while messages are
//! being dispatched (grants, revocations, new senders). The dispatch core only
//! asks one question of them, through [`PermissionSource`].

use crate::config::MemberBlock;
use crate::error::DispatchError;
use crate::registry::OrderedRegistry;
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::debug;

/// Per-sender identity and permission record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub permissions: HashSet<String>,
}

impl Member {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            permissions: HashSet::new(),
        }
    }

    /// Builder-style permission grant.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// True if the member holds every permission in `required`.
    pub fn has_permissions(&self, required: &[String]) -> bool {
        required.iter().all(|p| self.permissions.contains(p))
    }
}

/// Source of permission decisions for the dispatcher.
pub trait PermissionSource: Send + Sync {
    /// True if `sender_id` is known and holds every permission in `required`.
    fn member_has_permissions(&self, sender_id: &str, required: &[String]) -> bool;
}

/// Thread-safe member registry.
#[derive(Debug, Default)]
pub struct MemberRegistry {
    members: RwLock<OrderedRegistry<String, Member>>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `[[member]]` configuration blocks.
    pub fn from_config(blocks: &[MemberBlock]) -> Result<Self, DispatchError> {
        let registry = Self::new();
        for block in blocks {
            let member = Member {
                id: block.id.clone(),
                permissions: block.permissions.iter().cloned().collect(),
            };
            registry.insert(member)?;
        }
        debug!(count = registry.len(), "Loaded members from config");
        Ok(registry)
    }

    /// Register a new member. Fails if the id is already taken.
    pub fn insert(&self, member: Member) -> Result<(), DispatchError> {
        let id = member.id.clone();
        self.members
            .write()
            .insert(id.clone(), member)
            .map_err(|_| DispatchError::DuplicateMember(id))
    }

    /// Insert or replace a member record.
    pub fn upsert(&self, member: Member) {
        self.members.write().upsert(member.id.clone(), member);
    }

    /// Snapshot of a member record.
    pub fn get(&self, id: &str) -> Option<Member> {
        self.members.read().get(id).cloned()
    }

    /// Grant a permission. Returns false if the member is unknown.
    pub fn grant(&self, id: &str, permission: impl Into<String>) -> bool {
        match self.members.write().get_mut(id) {
            Some(member) => {
                member.permissions.insert(permission.into());
                true
            }
            None => false,
        }
    }

    /// Revoke a permission. Returns true if the member held it.
    pub fn revoke(&self, id: &str, permission: &str) -> bool {
        self.members
            .write()
            .get_mut(id)
            .is_some_and(|member| member.permissions.remove(permission))
    }

    pub fn remove(&self, id: &str) -> Option<Member> {
        self.members.write().remove(id)
    }

    /// Snapshot of all members in registration order.
    pub fn all(&self) -> Vec<Member> {
        self.members.read().all().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

impl PermissionSource for MemberRegistry {
    fn member_has_permissions(&self, sender_id: &str, required: &[String]) -> bool {
        self.members
            .read()
            .get(sender_id)
            .is_some_and(|member| member.has_permissions(required))
    }
}
