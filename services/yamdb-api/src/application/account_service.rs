//! 账号用例：注册、令牌、用户管理与个人资料

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};
use yamdb_adapter_email::{ConfirmationEmail, EmailTemplate};
use yamdb_auth_core::{Claims, TokenService, confirmation_code_matches, generate_confirmation_code};
use yamdb_common::{Page, PageRequest, UserId};
use yamdb_errors::{AppError, AppResult};
use yamdb_ports::EmailSender;
use yamdb_telemetry::names;

use super::authorize;
use super::dto::{
    SignupRequest, SignupResponse, TokenRequest, TokenResponse, UserCreate, UserPatch, UserView,
};
use super::validation::{
    SIGNUP_RULES, TOKEN_RULES, USER_CREATE_RULES, USER_PATCH_RULES, validate,
};
use crate::domain::{Action, Actor, NewUser, ResourceKind, Role, User, UserRepository};

/// 账号服务
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    mailer: Arc<dyn EmailSender>,
    templates: Arc<EmailTemplate>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        mailer: Arc<dyn EmailSender>,
        templates: Arc<EmailTemplate>,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            templates,
        }
    }

    // ------------------------------------------------------------------------
    // 注册与令牌
    // ------------------------------------------------------------------------

    /// 注册或重新发送确认码
    ///
    /// 用户名与邮箱都匹配同一账号时复用该账号，只发新的确认码
    pub async fn signup(&self, input: SignupRequest) -> AppResult<SignupResponse> {
        validate(&input, SIGNUP_RULES)?;

        // 1. 用户名 / 邮箱不能分属不同账号
        let by_username = self.users.find_by_username(&input.username).await?;
        let by_email = self.users.find_by_email(&input.email).await?;

        let mut conflicts = Vec::new();
        if let Some(user) = &by_username {
            if user.email != input.email {
                conflicts.push("username: A user with that username already exists");
            }
        }
        if let Some(user) = &by_email {
            if user.username != input.username {
                conflicts.push("email: A user with that email already exists");
            }
        }
        if !conflicts.is_empty() {
            return Err(AppError::validation(conflicts.join("; ")));
        }

        // 2. 新用户或已有账号
        let user = match by_username {
            Some(user) => user,
            None => {
                let user = self
                    .users
                    .create(&NewUser::signup(&input.username, &input.email))
                    .await?;
                info!(user_id = %user.id, username = %user.username, "User signed up");
                user
            }
        };

        // 3. 生成确认码并发送邮件
        let code = generate_confirmation_code();
        self.users.set_confirmation_code(user.id, &code).await?;

        let email = self.templates.render_confirmation(&ConfirmationEmail {
            username: &user.username,
            email: &user.email,
            confirmation_code: &code,
        })?;
        self.mailer.send(email).await?;

        counter!(names::SIGNUPS_TOTAL).increment(1);
        debug!(user_id = %user.id, "Confirmation code sent");

        Ok(SignupResponse {
            email: user.email,
            username: user.username,
        })
    }

    /// 用确认码换取访问令牌
    pub async fn issue_token(&self, input: TokenRequest) -> AppResult<TokenResponse> {
        validate(&input, TOKEN_RULES)?;

        let user = self
            .users
            .find_by_username(&input.username)
            .await?
            .ok_or_else(user_not_found)?;

        let matches = user
            .confirmation_code
            .as_deref()
            .is_some_and(|expected| confirmation_code_matches(expected, &input.confirmation_code));
        if !matches {
            warn!(username = %user.username, "Invalid confirmation code");
            return Err(AppError::validation(
                "confirmation_code: Invalid confirmation code",
            ));
        }

        let token = self
            .tokens
            .generate_access_token(user.id, &user.username, user.role.as_str())?;

        counter!(names::TOKENS_ISSUED_TOTAL).increment(1);
        info!(user_id = %user.id, "Access token issued");
        Ok(TokenResponse { token })
    }

    /// 由令牌声明解析当前调用者；角色以存储中的最新值为准
    pub async fn resolve_actor(&self, claims: &Claims) -> AppResult<Actor> {
        let user_id = claims.user_id()?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;
        Ok(user.actor())
    }

    // ------------------------------------------------------------------------
    // 用户管理（管理员）
    // ------------------------------------------------------------------------

    pub async fn list_users(
        &self,
        actor: &Actor,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<Page<UserView>> {
        authorize(actor, Action::Read, ResourceKind::UserAccount, None)?;
        let users = self.users.list(search, page).await?;
        Ok(users.map(|user| UserView::from(&user)))
    }

    pub async fn create_user(&self, actor: &Actor, input: UserCreate) -> AppResult<UserView> {
        authorize(actor, Action::Create, ResourceKind::UserAccount, None)?;
        validate(&input, USER_CREATE_RULES)?;
        self.ensure_unique(Some(&input.username), Some(&input.email), None)
            .await?;

        let user = self
            .users
            .create(&NewUser {
                username: input.username,
                email: input.email,
                role: input.role.unwrap_or_default(),
                bio: input.bio.unwrap_or_default(),
                first_name: input.first_name.unwrap_or_default(),
                last_name: input.last_name.unwrap_or_default(),
                is_superuser: false,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
        Ok(UserView::from(&user))
    }

    pub async fn get_user(&self, actor: &Actor, username: &str) -> AppResult<UserView> {
        authorize(actor, Action::Read, ResourceKind::UserAccount, None)?;
        let user = self.load_by_username(username).await?;
        Ok(UserView::from(&user))
    }

    pub async fn update_user(
        &self,
        actor: &Actor,
        username: &str,
        input: UserPatch,
    ) -> AppResult<UserView> {
        authorize(actor, Action::Update, ResourceKind::UserAccount, None)?;
        let user = self.load_by_username(username).await?;
        self.apply_patch(user, input).await
    }

    pub async fn delete_user(&self, actor: &Actor, username: &str) -> AppResult<()> {
        authorize(actor, Action::Delete, ResourceKind::UserAccount, None)?;
        let user = self.load_by_username(username).await?;

        if !self.users.delete(user.id).await? {
            return Err(user_not_found());
        }

        info!(user_id = %user.id, username = %user.username, "User deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // 个人资料
    // ------------------------------------------------------------------------

    pub async fn get_self(&self, actor: &Actor) -> AppResult<UserView> {
        authorize(actor, Action::Read, ResourceKind::OwnProfile, None)?;
        let user = self.load_self(actor).await?;
        Ok(UserView::from(&user))
    }

    /// 修改自己的资料，`username` 与 `role` 被忽略
    pub async fn update_self(&self, actor: &Actor, input: UserPatch) -> AppResult<UserView> {
        authorize(actor, Action::Update, ResourceKind::OwnProfile, None)?;
        let user = self.load_self(actor).await?;

        if input.role.is_some() || input.username.is_some() {
            debug!(user_id = %user.id, "Ignoring read-only profile fields");
        }
        self.apply_patch(user, input.without_read_only()).await
    }

    // ------------------------------------------------------------------------
    // 启动
    // ------------------------------------------------------------------------

    /// 确保配置的超级管理员存在；已有同名账号时提升为管理员
    pub async fn ensure_superuser(&self, username: &str, email: &str) -> AppResult<UserView> {
        validate(
            &SignupRequest {
                username: username.to_string(),
                email: email.to_string(),
            },
            SIGNUP_RULES,
        )?;

        let user = match self.users.find_by_username(username).await? {
            Some(mut user) => {
                if user.role == Role::Admin && user.is_superuser {
                    debug!(username = %username, "Superuser already present");
                    return Ok(UserView::from(&user));
                }
                user.role = Role::Admin;
                user.is_superuser = true;
                let user = self.users.update(&user).await?;
                info!(user_id = %user.id, username = %username, "User promoted to superuser");
                user
            }
            None => {
                let mut new_user = NewUser::signup(username, email).with_role(Role::Admin);
                new_user.is_superuser = true;
                let user = self.users.create(&new_user).await?;
                info!(user_id = %user.id, username = %username, "Superuser created");
                user
            }
        };

        Ok(UserView::from(&user))
    }

    async fn apply_patch(&self, mut user: User, input: UserPatch) -> AppResult<UserView> {
        validate(&input, USER_PATCH_RULES)?;
        self.ensure_unique(input.username.as_deref(), input.email.as_deref(), Some(user.id))
            .await?;

        input.apply_to(&mut user);
        let user = self.users.update(&user).await?;

        debug!(user_id = %user.id, "User updated");
        Ok(UserView::from(&user))
    }

    /// 用户名与邮箱不能被其他账号占用
    async fn ensure_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        current: Option<UserId>,
    ) -> AppResult<()> {
        let taken_by_other = |user: Option<User>| user.is_some_and(|u| Some(u.id) != current);

        let mut conflicts = Vec::new();
        if let Some(username) = username {
            if taken_by_other(self.users.find_by_username(username).await?) {
                conflicts.push("username: A user with that username already exists");
            }
        }
        if let Some(email) = email {
            if taken_by_other(self.users.find_by_email(email).await?) {
                conflicts.push("email: A user with that email already exists");
            }
        }

        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(conflicts.join("; ")))
        }
    }

    async fn load_by_username(&self, username: &str) -> AppResult<User> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(user_not_found)
    }

    async fn load_self(&self, actor: &Actor) -> AppResult<User> {
        let principal = actor.require_principal()?;
        self.users
            .find_by_id(principal.id)
            .await?
            .ok_or_else(user_not_found)
    }
}

fn user_not_found() -> AppError {
    AppError::not_found("User not found")
}
