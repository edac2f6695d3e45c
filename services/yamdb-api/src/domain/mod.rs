//! 领域层
//!
//! - `access`: 角色与访问控制策略
//! - `rating`: 评分聚合
//! - `review`: 评论、回复与唯一性规则
//! - `catalog`: 分类、体裁、作品
//! - `user`: 用户账号
//! - `repository`: 仓储接口

pub mod access;
pub mod catalog;
pub mod rating;
pub mod repository;
pub mod review;
pub mod user;

pub use access::{AccessPolicy, Action, Actor, Decision, DenyReason, Principal, ResourceKind, Role};
pub use catalog::{Category, Genre, NewTitle, SlugEntity, Title, TitleChanges, TitleFilter};
pub use rating::RatingAggregator;
pub use repository::{
    CommentRepository, ReviewRepository, SlugRepository, TitleRepository, UserRepository,
};
pub use review::{
    Comment, NewComment, NewReview, Review, ReviewChanges, ReviewUniquenessRule, Score,
    ScoreError, duplicate_review,
};
pub use user::{NewUser, User};
