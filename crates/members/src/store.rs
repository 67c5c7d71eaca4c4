//! Member storage abstraction + in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use fablecast_core::MemberId;

use crate::member::Member;

#[derive(Debug, Clone, thiserror::Error)]
pub enum MemberStoreError {
    #[error("member not found")]
    NotFound,
    #[error("member already exists: {0}")]
    AlreadyExists(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Member store abstraction. Reads never return soft-deleted members.
pub trait MemberStore: Send + Sync {
    fn insert(&self, member: Member) -> Result<(), MemberStoreError>;
    fn get(&self, id: MemberId) -> Result<Option<Member>, MemberStoreError>;
    fn update(&self, member: &Member) -> Result<(), MemberStoreError>;
    fn list(&self) -> Result<Vec<Member>, MemberStoreError>;
}

/// In-memory member store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMemberStore {
    members: RwLock<HashMap<MemberId, Member>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl core::fmt::Debug) -> MemberStoreError {
    MemberStoreError::Storage("member store lock poisoned".into())
}

impl MemberStore for InMemoryMemberStore {
    fn insert(&self, member: Member) -> Result<(), MemberStoreError> {
        let mut members = self.members.write().map_err(poisoned)?;
        if members.values().any(|m| m.email == member.email) {
            return Err(MemberStoreError::AlreadyExists(member.email));
        }
        members.insert(member.id, member);
        Ok(())
    }

    fn get(&self, id: MemberId) -> Result<Option<Member>, MemberStoreError> {
        let members = self.members.read().map_err(poisoned)?;
        Ok(members.get(&id).filter(|m| !m.is_deleted()).cloned())
    }

    fn update(&self, member: &Member) -> Result<(), MemberStoreError> {
        let mut members = self.members.write().map_err(poisoned)?;
        if !members.contains_key(&member.id) {
            return Err(MemberStoreError::NotFound);
        }
        members.insert(member.id, member.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Member>, MemberStoreError> {
        let members = self.members.read().map_err(poisoned)?;
        let mut all: Vec<Member> = members.values().filter(|m| !m.is_deleted()).cloned().collect();
        all.sort_by_key(|m| m.created_at);
        Ok(all)
    }
}
