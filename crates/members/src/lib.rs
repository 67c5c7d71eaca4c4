//! Member directory: platform accounts seen from the backoffice.
//!
//! Authentication/session mechanics are out of scope; this crate only covers
//! the administrative views (listing, role changes, soft delete).

pub mod member;
pub mod service;
pub mod store;

pub use member::{Member, Role};
pub use service::{MemberError, MemberService};
pub use store::{InMemoryMemberStore, MemberStore, MemberStoreError};
