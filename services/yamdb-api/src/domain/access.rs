//! 访问控制策略
//!
//! 纯函数：(actor, action, resource kind, owner) → Decision，
//! 规则按优先级依次匹配，先命中者生效

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use yamdb_common::UserId;
use yamdb_errors::{AppError, AppResult};

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[display("user")]
    User,
    #[display("moderator")]
    Moderator,
    #[display("admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::validation(format!("Unknown role: {}", other))),
        }
    }
}

/// 已认证的调用方
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub is_superuser: bool,
}

impl Principal {
    /// admin 角色或超级用户
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || self.is_superuser
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

/// 调用方（匿名或已认证）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Actor {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl Actor {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(principal) => Some(principal),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// 要求已认证，否则返回 Unauthorized
    pub fn require_principal(&self) -> AppResult<&Principal> {
        self.principal()
            .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided"))
    }
}

/// 操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Action {
    #[display("read")]
    Read,
    #[display("create")]
    Create,
    /// 局部更新（PATCH）
    #[display("update")]
    Update,
    /// 整体替换（PUT）
    #[display("replace")]
    Replace,
    #[display("delete")]
    Delete,
}

impl Action {
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read)
    }
}

/// 资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ResourceKind {
    #[display("title")]
    Title,
    #[display("category")]
    Category,
    #[display("genre")]
    Genre,
    #[display("review")]
    Review,
    #[display("comment")]
    Comment,
    /// 其他用户的账号
    #[display("user")]
    UserAccount,
    /// 当前用户自己的资料（/users/me）
    #[display("profile")]
    OwnProfile,
}

impl ResourceKind {
    fn is_catalog(&self) -> bool {
        matches!(self, Self::Title | Self::Category | Self::Genre)
    }

    fn is_authored(&self) -> bool {
        matches!(self, Self::Review | Self::Comment)
    }

    fn forbids_replace(&self) -> bool {
        matches!(
            self,
            Self::Title | Self::Review | Self::Comment | Self::UserAccount | Self::OwnProfile
        )
    }
}

/// 拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DenyReason {
    #[display("unauthenticated")]
    Unauthenticated,
    #[display("insufficient_role")]
    InsufficientRole,
    #[display("not_owner")]
    NotOwner,
    #[display("method_not_allowed")]
    MethodNotAllowed,
}

/// 策略决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// 映射到错误分类：匿名 → 401，身份不足 → 403，禁止的动词 → 405
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(DenyReason::Unauthenticated) => Err(AppError::unauthorized(
                "Authentication credentials were not provided",
            )),
            Self::Deny(DenyReason::InsufficientRole) | Self::Deny(DenyReason::NotOwner) => Err(
                AppError::forbidden("You do not have permission to perform this action"),
            ),
            Self::Deny(DenyReason::MethodNotAllowed) => {
                Err(AppError::method_not_allowed("Method \"PUT\" not allowed"))
            }
        }
    }
}

/// 访问控制策略
pub struct AccessPolicy;

impl AccessPolicy {
    /// 评估一次访问
    ///
    /// `owner` 为具体 Review/Comment 的作者。修改或删除 Review/Comment 时
    /// 不带作者只有版主和管理员能通过，取对象前的预检用 [`Self::check_collection`]
    pub fn check(
        actor: &Actor,
        action: Action,
        kind: ResourceKind,
        owner: Option<UserId>,
    ) -> Decision {
        // PUT 整体替换对这些资源一律不可用，与身份无关
        if action == Action::Replace && kind.forbids_replace() {
            return Decision::Deny(DenyReason::MethodNotAllowed);
        }

        if action.is_read() && (kind.is_catalog() || kind.is_authored()) {
            return Decision::Allow;
        }

        let principal = match actor.principal() {
            Some(principal) => principal,
            None => return Decision::Deny(DenyReason::Unauthenticated),
        };

        match kind {
            ResourceKind::Title | ResourceKind::Category | ResourceKind::Genre => {
                Self::admin_only(principal)
            }
            ResourceKind::Review | ResourceKind::Comment => {
                let is_owner = owner.is_some_and(|owner| owner == principal.id);
                if action == Action::Create
                    || is_owner
                    || principal.is_moderator()
                    || principal.is_admin()
                {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NotOwner)
                }
            }
            ResourceKind::UserAccount => Self::admin_only(principal),
            ResourceKind::OwnProfile => match action {
                Action::Read | Action::Update => Decision::Allow,
                _ => Decision::Deny(DenyReason::MethodNotAllowed),
            },
        }
    }

    /// 集合级预检，此时对象尚未取出
    ///
    /// 修改或删除 Review/Comment 只要求已认证；结果不代表有权操作具体对象，
    /// 取到对象后必须带上作者再调用 [`Self::check`]
    pub fn check_collection(actor: &Actor, action: Action, kind: ResourceKind) -> Decision {
        if kind.is_authored() && matches!(action, Action::Update | Action::Delete) {
            return match actor.principal() {
                Some(_) => Decision::Allow,
                None => Decision::Deny(DenyReason::Unauthenticated),
            };
        }
        Self::check(actor, action, kind, None)
    }

    fn admin_only(principal: &Principal) -> Decision {
        if principal.is_admin() {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::InsufficientRole)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ResourceKind; 7] = [
        ResourceKind::Title,
        ResourceKind::Category,
        ResourceKind::Genre,
        ResourceKind::Review,
        ResourceKind::Comment,
        ResourceKind::UserAccount,
        ResourceKind::OwnProfile,
    ];

    fn actor(id: i64, role: Role, is_superuser: bool) -> Actor {
        Actor::Authenticated(Principal {
            id: UserId(id),
            username: format!("user{}", id),
            role,
            is_superuser,
        })
    }

    #[test]
    fn test_user_cannot_delete_foreign_review() {
        let reader = actor(1, Role::User, false);
        for kind in [ResourceKind::Review, ResourceKind::Comment] {
            for action in [Action::Update, Action::Delete] {
                assert_eq!(
                    AccessPolicy::check(&reader, action, kind, Some(UserId(2))),
                    Decision::Deny(DenyReason::NotOwner)
                );
            }
        }
    }

    #[test]
    fn test_author_can_edit_own_review() {
        let author = actor(1, Role::User, false);
        assert!(
            AccessPolicy::check(&author, Action::Delete, ResourceKind::Review, Some(UserId(1)))
                .is_allowed()
        );
        assert!(
            AccessPolicy::check(&author, Action::Update, ResourceKind::Comment, Some(UserId(1)))
                .is_allowed()
        );
    }

    #[test]
    fn test_moderator_and_admin_can_moderate() {
        let moderators = [
            actor(5, Role::Moderator, false),
            actor(6, Role::Admin, false),
            actor(7, Role::User, true),
        ];
        for moderator in &moderators {
            for kind in [ResourceKind::Review, ResourceKind::Comment] {
                for action in [Action::Update, Action::Delete] {
                    assert!(
                        AccessPolicy::check(moderator, action, kind, Some(UserId(1))).is_allowed()
                    );
                }
            }
        }
    }

    #[test]
    fn test_anonymous_reads_public_resources() {
        for kind in [
            ResourceKind::Title,
            ResourceKind::Category,
            ResourceKind::Genre,
            ResourceKind::Review,
            ResourceKind::Comment,
        ] {
            assert!(AccessPolicy::check(&Actor::Anonymous, Action::Read, kind, None).is_allowed());
        }
    }

    #[test]
    fn test_anonymous_cannot_write() {
        assert_eq!(
            AccessPolicy::check(&Actor::Anonymous, Action::Create, ResourceKind::Review, None),
            Decision::Deny(DenyReason::Unauthenticated)
        );
        assert_eq!(
            AccessPolicy::check(&Actor::Anonymous, Action::Delete, ResourceKind::Title, None),
            Decision::Deny(DenyReason::Unauthenticated)
        );
        assert_eq!(
            AccessPolicy::check(&Actor::Anonymous, Action::Read, ResourceKind::UserAccount, None),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn test_catalog_writes_need_admin() {
        let moderator = actor(2, Role::Moderator, false);
        let admin = actor(3, Role::Admin, false);
        for kind in [ResourceKind::Title, ResourceKind::Category, ResourceKind::Genre] {
            for action in [Action::Create, Action::Update, Action::Delete] {
                assert_eq!(
                    AccessPolicy::check(&moderator, action, kind, None),
                    Decision::Deny(DenyReason::InsufficientRole)
                );
                assert!(AccessPolicy::check(&admin, action, kind, None).is_allowed());
            }
        }
    }

    #[test]
    fn test_superuser_flag_grants_admin() {
        let superuser = actor(9, Role::User, true);
        assert!(
            AccessPolicy::check(&superuser, Action::Create, ResourceKind::Title, None).is_allowed()
        );
        assert!(
            AccessPolicy::check(&superuser, Action::Read, ResourceKind::UserAccount, None)
                .is_allowed()
        );
    }

    #[test]
    fn test_replace_is_never_allowed() {
        let actors = [
            Actor::Anonymous,
            actor(1, Role::User, false),
            actor(2, Role::Moderator, false),
            actor(3, Role::Admin, true),
        ];
        for actor in &actors {
            for kind in [
                ResourceKind::Title,
                ResourceKind::Review,
                ResourceKind::Comment,
                ResourceKind::UserAccount,
                ResourceKind::OwnProfile,
            ] {
                assert_eq!(
                    AccessPolicy::check(actor, Action::Replace, kind, Some(UserId(1))),
                    Decision::Deny(DenyReason::MethodNotAllowed)
                );
            }
        }
    }

    #[test]
    fn test_own_profile_needs_authentication_only() {
        let reader = actor(1, Role::User, false);
        assert!(
            AccessPolicy::check(&reader, Action::Update, ResourceKind::OwnProfile, None)
                .is_allowed()
        );
        assert_eq!(
            AccessPolicy::check(&Actor::Anonymous, Action::Read, ResourceKind::OwnProfile, None),
            Decision::Deny(DenyReason::Unauthenticated)
        );
        assert_eq!(
            AccessPolicy::check(&reader, Action::Delete, ResourceKind::OwnProfile, None),
            Decision::Deny(DenyReason::MethodNotAllowed)
        );
    }

    #[test]
    fn test_user_accounts_are_admin_only() {
        let moderator = actor(2, Role::Moderator, false);
        assert_eq!(
            AccessPolicy::check(&moderator, Action::Read, ResourceKind::UserAccount, None),
            Decision::Deny(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn test_decision_error_mapping() {
        assert!(Decision::Allow.into_result().is_ok());
        assert!(matches!(
            Decision::Deny(DenyReason::Unauthenticated).into_result(),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            Decision::Deny(DenyReason::NotOwner).into_result(),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            Decision::Deny(DenyReason::MethodNotAllowed).into_result(),
            Err(AppError::MethodNotAllowed(_))
        ));
    }

    #[test]
    fn test_every_kind_answers_read() {
        let admin = actor(3, Role::Admin, false);
        for kind in ALL_KINDS {
            assert!(AccessPolicy::check(&admin, Action::Read, kind, None).is_allowed());
        }
    }

    #[test]
    fn test_missing_owner_is_not_ownership() {
        let reader = actor(1, Role::User, false);
        let moderator = actor(2, Role::Moderator, false);
        for kind in [ResourceKind::Review, ResourceKind::Comment] {
            for action in [Action::Update, Action::Delete] {
                assert_eq!(
                    AccessPolicy::check(&reader, action, kind, None),
                    Decision::Deny(DenyReason::NotOwner)
                );
                assert!(AccessPolicy::check(&moderator, action, kind, None).is_allowed());
            }
        }
    }

    #[test]
    fn test_collection_check_only_needs_identity() {
        let reader = actor(1, Role::User, false);
        for kind in [ResourceKind::Review, ResourceKind::Comment] {
            for action in [Action::Update, Action::Delete] {
                assert!(AccessPolicy::check_collection(&reader, action, kind).is_allowed());
                assert_eq!(
                    AccessPolicy::check_collection(&Actor::Anonymous, action, kind),
                    Decision::Deny(DenyReason::Unauthenticated)
                );
            }
        }
        assert_eq!(
            AccessPolicy::check_collection(&reader, Action::Delete, ResourceKind::Title),
            Decision::Deny(DenyReason::InsufficientRole)
        );
        assert_eq!(
            AccessPolicy::check_collection(&reader, Action::Replace, ResourceKind::Comment),
            Decision::Deny(DenyReason::MethodNotAllowed)
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("root".parse::<Role>().is_err());
    }
}
