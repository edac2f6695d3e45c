//! 评论与回复

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use yamdb_common::{CommentId, ReviewId, TitleId, UserId};
use yamdb_errors::{AppError, AppResult};

use super::repository::ReviewRepository;

/// 分数错误
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Score must be between {min} and {max}, got {value}")]
pub struct ScoreError {
    pub value: i64,
    pub min: u8,
    pub max: u8,
}

/// 评分（1..=10）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, ScoreError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ScoreError {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ScoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

/// 评论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub title_id: TitleId,
    pub author_id: UserId,
    /// 作者用户名
    pub author: String,
    pub text: String,
    pub score: Score,
    pub pub_date: DateTime<Utc>,
}

/// 新评论
#[derive(Debug, Clone)]
pub struct NewReview {
    pub title_id: TitleId,
    pub author_id: UserId,
    pub text: String,
    pub score: Score,
}

/// 评论的局部修改
#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub text: Option<String>,
    pub score: Option<Score>,
}

/// 回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub review_id: ReviewId,
    pub author_id: UserId,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

/// 新回复
#[derive(Debug, Clone)]
pub struct NewComment {
    pub review_id: ReviewId,
    pub author_id: UserId,
    pub text: String,
}

/// 同一作者对同一作品只能有一条评论
///
/// 这里的检查只用于提前给出冲突；真正的保证在存储层
/// （唯一索引 / 内存存储的写锁内检查并插入）
#[derive(Clone)]
pub struct ReviewUniquenessRule {
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewUniquenessRule {
    pub fn new(reviews: Arc<dyn ReviewRepository>) -> Self {
        Self { reviews }
    }

    pub async fn enforce(&self, title_id: TitleId, author_id: UserId) -> AppResult<()> {
        if self.reviews.exists_for(title_id, author_id).await? {
            return Err(duplicate_review());
        }
        Ok(())
    }
}

/// 重复评论错误
pub fn duplicate_review() -> AppError {
    AppError::conflict("You have already reviewed this title")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        assert!(Score::new(1).is_ok());
        assert!(Score::new(10).is_ok());
        assert_eq!(Score::new(0).unwrap_err().value, 0);
        assert!(Score::new(11).is_err());
        assert!(Score::new(-3).is_err());
    }

    #[test]
    fn test_score_serde() {
        let score: Score = serde_json::from_str("7").unwrap();
        assert_eq!(score.value(), 7);
        assert_eq!(serde_json::to_string(&score).unwrap(), "7");
        assert!(serde_json::from_str::<Score>("12").is_err());
    }
}
