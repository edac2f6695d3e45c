//! 评论与回复用例

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};
use yamdb_common::{CommentId, Page, PageRequest, ReviewId, TitleId};
use yamdb_errors::{AppError, AppResult};
use yamdb_telemetry::names;

use super::{authorize, authorize_collection};
use super::dto::{
    CommentCreate, CommentPatch, CommentView, ReviewCreate, ReviewPatch, ReviewView,
};
use super::validation::{
    COMMENT_CREATE_RULES, COMMENT_PATCH_RULES, REVIEW_CREATE_RULES, REVIEW_PATCH_RULES, validate,
};
use crate::domain::{
    Action, Actor, Comment, CommentRepository, NewComment, NewReview, ResourceKind, Review,
    ReviewChanges, ReviewRepository, ReviewUniquenessRule, Score, TitleRepository,
};

/// 评论与回复服务
pub struct ReviewService {
    titles: Arc<dyn TitleRepository>,
    reviews: Arc<dyn ReviewRepository>,
    comments: Arc<dyn CommentRepository>,
    uniqueness: ReviewUniquenessRule,
}

impl ReviewService {
    pub fn new(
        titles: Arc<dyn TitleRepository>,
        reviews: Arc<dyn ReviewRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        let uniqueness = ReviewUniquenessRule::new(reviews.clone());
        Self {
            titles,
            reviews,
            comments,
            uniqueness,
        }
    }

    // ------------------------------------------------------------------------
    // 评论
    // ------------------------------------------------------------------------

    pub async fn list_reviews(
        &self,
        title_id: TitleId,
        page: PageRequest,
    ) -> AppResult<Page<ReviewView>> {
        self.ensure_title(title_id).await?;
        let reviews = self.reviews.list_for_title(title_id, page).await?;
        Ok(reviews.map(|review| ReviewView::from(&review)))
    }

    pub async fn get_review(&self, title_id: TitleId, id: ReviewId) -> AppResult<ReviewView> {
        let review = self.load_review(title_id, id).await?;
        Ok(ReviewView::from(&review))
    }

    /// 发表评论，同一作者对同一作品只能有一条
    pub async fn create_review(
        &self,
        actor: &Actor,
        title_id: TitleId,
        input: ReviewCreate,
    ) -> AppResult<ReviewView> {
        authorize(actor, Action::Create, ResourceKind::Review, None)?;
        let principal = actor.require_principal()?;

        self.ensure_title(title_id).await?;
        validate(&input, REVIEW_CREATE_RULES)?;
        let score = Score::new(input.score).map_err(|e| AppError::validation(e.to_string()))?;

        // 1. 提前检查，给出明确的冲突
        if let Err(e) = self.uniqueness.enforce(title_id, principal.id).await {
            counter!(names::REVIEW_CONFLICTS_TOTAL).increment(1);
            return Err(e);
        }

        // 2. 存储层原子地检查并插入，并发请求最多一个成功
        let review = self
            .reviews
            .create(&NewReview {
                title_id,
                author_id: principal.id,
                text: input.text,
                score,
            })
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::Conflict(_)) {
                    counter!(names::REVIEW_CONFLICTS_TOTAL).increment(1);
                    warn!(title_id = %title_id, author_id = %principal.id, "Concurrent duplicate review rejected");
                }
            })?;

        counter!(names::REVIEWS_CREATED_TOTAL).increment(1);
        info!(title_id = %title_id, review_id = %review.id, author = %review.author, "Review created");
        Ok(ReviewView::from(&review))
    }

    pub async fn update_review(
        &self,
        actor: &Actor,
        title_id: TitleId,
        id: ReviewId,
        input: ReviewPatch,
    ) -> AppResult<ReviewView> {
        authorize_collection(actor, Action::Update, ResourceKind::Review)?;
        let review = self.load_review(title_id, id).await?;
        authorize(actor, Action::Update, ResourceKind::Review, Some(review.author_id))?;

        validate(&input, REVIEW_PATCH_RULES)?;
        let score = input
            .score
            .map(Score::new)
            .transpose()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let updated = self
            .reviews
            .update(
                id,
                &ReviewChanges {
                    text: input.text,
                    score,
                },
            )
            .await?;

        debug!(review_id = %id, "Review updated");
        Ok(ReviewView::from(&updated))
    }

    /// 删除评论及其回复
    pub async fn delete_review(
        &self,
        actor: &Actor,
        title_id: TitleId,
        id: ReviewId,
    ) -> AppResult<()> {
        authorize_collection(actor, Action::Delete, ResourceKind::Review)?;
        let review = self.load_review(title_id, id).await?;
        authorize(actor, Action::Delete, ResourceKind::Review, Some(review.author_id))?;

        if !self.reviews.delete(id).await? {
            return Err(review_not_found());
        }

        info!(review_id = %id, "Review deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // 回复
    // ------------------------------------------------------------------------

    pub async fn list_comments(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
        page: PageRequest,
    ) -> AppResult<Page<CommentView>> {
        self.load_review(title_id, review_id).await?;
        let comments = self.comments.list_for_review(review_id, page).await?;
        Ok(comments.map(|comment| CommentView::from(&comment)))
    }

    pub async fn get_comment(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
        id: CommentId,
    ) -> AppResult<CommentView> {
        let comment = self.load_comment(title_id, review_id, id).await?;
        Ok(CommentView::from(&comment))
    }

    pub async fn create_comment(
        &self,
        actor: &Actor,
        title_id: TitleId,
        review_id: ReviewId,
        input: CommentCreate,
    ) -> AppResult<CommentView> {
        authorize(actor, Action::Create, ResourceKind::Comment, None)?;
        let principal = actor.require_principal()?;

        self.load_review(title_id, review_id).await?;
        validate(&input, COMMENT_CREATE_RULES)?;

        let comment = self
            .comments
            .create(&NewComment {
                review_id,
                author_id: principal.id,
                text: input.text,
            })
            .await?;

        counter!(names::COMMENTS_CREATED_TOTAL).increment(1);
        info!(review_id = %review_id, comment_id = %comment.id, "Comment created");
        Ok(CommentView::from(&comment))
    }

    pub async fn update_comment(
        &self,
        actor: &Actor,
        title_id: TitleId,
        review_id: ReviewId,
        id: CommentId,
        input: CommentPatch,
    ) -> AppResult<CommentView> {
        authorize_collection(actor, Action::Update, ResourceKind::Comment)?;
        let comment = self.load_comment(title_id, review_id, id).await?;
        authorize(actor, Action::Update, ResourceKind::Comment, Some(comment.author_id))?;

        validate(&input, COMMENT_PATCH_RULES)?;

        let updated = match input.text {
            Some(text) => self.comments.update(id, &text).await?,
            None => comment,
        };

        debug!(comment_id = %id, "Comment updated");
        Ok(CommentView::from(&updated))
    }

    pub async fn delete_comment(
        &self,
        actor: &Actor,
        title_id: TitleId,
        review_id: ReviewId,
        id: CommentId,
    ) -> AppResult<()> {
        authorize_collection(actor, Action::Delete, ResourceKind::Comment)?;
        let comment = self.load_comment(title_id, review_id, id).await?;
        authorize(actor, Action::Delete, ResourceKind::Comment, Some(comment.author_id))?;

        if !self.comments.delete(id).await? {
            return Err(comment_not_found());
        }

        info!(comment_id = %id, "Comment deleted");
        Ok(())
    }

    async fn ensure_title(&self, title_id: TitleId) -> AppResult<()> {
        if self.titles.exists(title_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Title not found"))
        }
    }

    /// 评论必须属于路径中的作品
    async fn load_review(&self, title_id: TitleId, id: ReviewId) -> AppResult<Review> {
        self.reviews
            .find(title_id, id)
            .await?
            .ok_or_else(review_not_found)
    }

    /// 回复必须属于路径中的评论，评论必须属于路径中的作品
    async fn load_comment(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
        id: CommentId,
    ) -> AppResult<Comment> {
        self.load_review(title_id, review_id).await?;
        self.comments
            .find(review_id, id)
            .await?
            .ok_or_else(comment_not_found)
    }
}

fn review_not_found() -> AppError {
    AppError::not_found("Review not found")
}

fn comment_not_found() -> AppError {
    AppError::not_found("Comment not found")
}
