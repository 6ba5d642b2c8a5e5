//! Identity and context types passed explicitly to every gated operation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Institution identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstitutionId(pub u64);

impl fmt::Display for InstitutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "institution-{}", self.0)
    }
}

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

/// The user performing an operation, and the institution they act for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    pub institution: InstitutionId,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role, institution: InstitutionId) -> Self {
        Self {
            user_id,
            role,
            institution,
        }
    }

    pub fn admin(user_id: u64, institution: u64) -> Self {
        Self::new(UserId(user_id), Role::Admin, InstitutionId(institution))
    }

    pub fn teacher(user_id: u64, institution: u64) -> Self {
        Self::new(UserId(user_id), Role::Teacher, InstitutionId(institution))
    }

    pub fn student(user_id: u64, institution: u64) -> Self {
        Self::new(UserId(user_id), Role::Student, InstitutionId(institution))
    }
}
