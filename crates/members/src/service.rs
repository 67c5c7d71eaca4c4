//! Member administration rules.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use fablecast_core::{DomainError, MemberId, Page};

use crate::member::{Member, Role};
use crate::store::{MemberStore, MemberStoreError};

#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] MemberStoreError),
}

/// Member administration service.
#[derive(Clone)]
pub struct MemberService {
    store: Arc<dyn MemberStore>,
}

impl MemberService {
    pub fn new(store: Arc<dyn MemberStore>) -> Self {
        Self { store }
    }

    pub fn register(
        &self,
        email: String,
        nickname: String,
        role: Role,
    ) -> Result<Member, MemberError> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email").into());
        }
        let now = Utc::now();
        let member = Member {
            id: MemberId::new(),
            email,
            nickname,
            profile_image_url: None,
            role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.store.insert(member.clone())?;
        info!(member_id = %member.id, "member registered");
        Ok(member)
    }

    pub fn list(
        &self,
        page: usize,
        size: usize,
        role: Option<Role>,
    ) -> Result<Page<Member>, MemberError> {
        let members = self
            .store
            .list()?
            .into_iter()
            .filter(|m| role.is_none_or(|r| m.role == r))
            .collect();
        Ok(Page::slice(members, page, size)?)
    }

    pub fn get(&self, id: MemberId) -> Result<Member, MemberError> {
        self.require(id)
    }

    /// Change a member's role; the role string comes from the API and must
    /// parse into a known role.
    pub fn update_role(&self, id: MemberId, role: &str) -> Result<Member, MemberError> {
        let role: Role = role.parse().map_err(MemberError::Domain)?;
        let mut member = self.require(id)?;
        member.role = role;
        member.updated_at = Utc::now();
        self.store.update(&member)?;
        info!(member_id = %member.id, role = role.as_str(), "member role updated");
        Ok(member)
    }

    pub fn delete(&self, id: MemberId) -> Result<(), MemberError> {
        let mut member = self.require(id)?;
        member.deleted_at = Some(Utc::now());
        self.store.update(&member)?;
        Ok(())
    }

    fn require(&self, id: MemberId) -> Result<Member, MemberError> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryMemberStore;

    fn service() -> MemberService {
        MemberService::new(Arc::new(InMemoryMemberStore::new()))
    }

    #[test]
    fn register_then_list_with_role_filter() {
        let svc = service();
        svc.register("a@example.com".into(), "a".into(), Role::User)
            .unwrap();
        svc.register("b@example.com".into(), "b".into(), Role::Admin)
            .unwrap();

        let admins = svc.list(1, 10, Some(Role::Admin)).unwrap();
        assert_eq!(admins.total_elements, 1);
        assert_eq!(admins.items[0].nickname, "b");

        let all = svc.list(1, 10, None).unwrap();
        assert_eq!(all.total_elements, 2);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let svc = service();
        svc.register("a@example.com".into(), "a".into(), Role::User)
            .unwrap();
        let err = svc
            .register("a@example.com".into(), "other".into(), Role::User)
            .unwrap_err();
        assert!(matches!(
            err,
            MemberError::Store(MemberStoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn role_update_validates_the_role_string() {
        let svc = service();
        let member = svc
            .register("a@example.com".into(), "a".into(), Role::User)
            .unwrap();

        let updated = svc.update_role(member.id, "ADMIN").unwrap();
        assert_eq!(updated.role, Role::Admin);

        let err = svc.update_role(member.id, "SUPERUSER").unwrap_err();
        assert!(matches!(
            err,
            MemberError::Domain(DomainError::Validation(_))
        ));
    }

    #[test]
    fn soft_deleted_member_is_gone_from_reads() {
        let svc = service();
        let member = svc
            .register("a@example.com".into(), "a".into(), Role::User)
            .unwrap();
        svc.delete(member.id).unwrap();

        assert!(matches!(
            svc.get(member.id),
            Err(MemberError::Domain(DomainError::NotFound))
        ));
    }

    #[test]
    fn out_of_bounds_page_is_rejected() {
        let svc = service();
        svc.register("a@example.com".into(), "a".into(), Role::User)
            .unwrap();
        let err = svc.list(3, 10, None).unwrap_err();
        assert!(matches!(
            err,
            MemberError::Domain(DomainError::PageOutOfBounds { .. })
        ));
    }
}
