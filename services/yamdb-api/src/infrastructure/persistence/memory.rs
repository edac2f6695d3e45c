//! 进程内存储
//!
//! 所有仓储共享一把读写锁；检查与写入在同一次加锁内完成，
//! 级联删除与唯一约束的行为与 PostgreSQL 实现一致

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use yamdb_common::{
    CategoryId, CommentId, GenreId, Page, PageRequest, ReviewId, TitleId, UserId,
};
use yamdb_errors::{AppError, AppResult};

use crate::domain::{
    Category, Comment, CommentRepository, Genre, NewComment, NewReview, NewTitle, NewUser,
    RatingAggregator, Review, ReviewChanges, ReviewRepository, Score, SlugRepository, Title,
    TitleChanges, TitleFilter, TitleRepository, User, UserRepository, duplicate_review,
};

#[derive(Debug, Clone)]
struct TitleRecord {
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Option<i64>,
    genre_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
struct ReviewRecord {
    title_id: i64,
    author_id: i64,
    text: String,
    score: Score,
    pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    review_id: i64,
    author_id: i64,
    text: String,
    pub_date: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    genres: BTreeMap<i64, Genre>,
    titles: BTreeMap<i64, TitleRecord>,
    reviews: BTreeMap<i64, ReviewRecord>,
    comments: BTreeMap<i64, CommentRecord>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn username_of(&self, user_id: i64) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn check_user_unique(&self, username: &str, email: &str, current: Option<i64>) -> AppResult<()> {
        let others = || {
            self.users
                .values()
                .filter(move |u| Some(u.id.0) != current)
        };
        if others().any(|u| u.username == username) {
            return Err(AppError::validation(
                "username: A user with that username already exists",
            ));
        }
        if others().any(|u| u.email == email) {
            return Err(AppError::validation(
                "email: A user with that email already exists",
            ));
        }
        Ok(())
    }

    fn title_view(&self, id: i64, record: &TitleRecord) -> Title {
        let rating = RatingAggregator::compute(
            self.reviews
                .values()
                .filter(|r| r.title_id == id)
                .map(|r| r.score),
        );

        Title {
            id: TitleId(id),
            name: record.name.clone(),
            year: record.year,
            description: record.description.clone(),
            category: record
                .category_id
                .and_then(|c| self.categories.get(&c).cloned()),
            genres: record
                .genre_ids
                .iter()
                .filter_map(|g| self.genres.get(g).cloned())
                .collect(),
            rating,
        }
    }

    fn title_matches(&self, record: &TitleRecord, filter: &TitleFilter) -> bool {
        if let Some(slug) = &filter.category {
            let matches = record
                .category_id
                .and_then(|c| self.categories.get(&c))
                .is_some_and(|c| &c.slug == slug);
            if !matches {
                return false;
            }
        }

        if let Some(slug) = &filter.genre {
            let matches = record
                .genre_ids
                .iter()
                .filter_map(|g| self.genres.get(g))
                .any(|g| &g.slug == slug);
            if !matches {
                return false;
            }
        }

        if filter.year.is_some_and(|year| record.year != year) {
            return false;
        }

        if let Some(name) = &filter.name {
            if !contains_ignore_case(&record.name, name) {
                return false;
            }
        }

        true
    }

    fn review_view(&self, id: i64, record: &ReviewRecord) -> Review {
        Review {
            id: ReviewId(id),
            title_id: TitleId(record.title_id),
            author_id: UserId(record.author_id),
            author: self.username_of(record.author_id),
            text: record.text.clone(),
            score: record.score,
            pub_date: record.pub_date,
        }
    }

    fn comment_view(&self, id: i64, record: &CommentRecord) -> Comment {
        Comment {
            id: CommentId(id),
            review_id: ReviewId(record.review_id),
            author_id: UserId(record.author_id),
            author: self.username_of(record.author_id),
            text: record.text.clone(),
            pub_date: record.pub_date,
        }
    }

    fn check_title_refs(&self, category_id: Option<i64>, genre_ids: &[i64]) -> AppResult<()> {
        if category_id.is_some_and(|c| !self.categories.contains_key(&c)) {
            return Err(AppError::validation("Foreign key constraint violation"));
        }
        if genre_ids.iter().any(|g| !self.genres.contains_key(g)) {
            return Err(AppError::validation("Foreign key constraint violation"));
        }
        Ok(())
    }

    /// 删除评论及其回复
    fn remove_reviews(&mut self, matches: impl Fn(&ReviewRecord) -> bool) {
        let removed: Vec<i64> = self
            .reviews
            .iter()
            .filter(|(_, r)| matches(r))
            .map(|(id, _)| *id)
            .collect();

        for id in &removed {
            self.reviews.remove(id);
        }
        self.comments.retain(|_, c| !removed.contains(&c.review_id));
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn paginate<T: Clone>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    Page::new(page.slice(&items), total, page)
}

/// 内存存储，克隆后共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// 用户
// ============================================================================

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut state = self.state.write().await;
        state.check_user_unique(&user.username, &user.email, None)?;

        let id = state.next_id();
        let created = User {
            id: UserId(id),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            bio: user.bio.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_superuser: user.is_superuser,
            confirmation_code: None,
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let mut state = self.state.write().await;
        state.check_user_unique(&user.username, &user.email, Some(user.id.0))?;

        let stored = state
            .users
            .get_mut(&user.id.0)
            .ok_or_else(|| AppError::not_found("User not found"))?;

        // 确认码只由 set_confirmation_code 修改
        let confirmation_code = stored.confirmation_code.take();
        *stored = User {
            confirmation_code,
            ..user.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: UserId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.users.remove(&id.0).is_none() {
            return Ok(false);
        }

        state.remove_reviews(|r| r.author_id == id.0);
        state.comments.retain(|_, c| c.author_id != id.0);
        Ok(true)
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id.0).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn set_confirmation_code(&self, id: UserId, code: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id.0)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.confirmation_code = Some(code.to_string());
        Ok(())
    }

    async fn list(&self, search: Option<&str>, page: PageRequest) -> AppResult<Page<User>> {
        let state = self.state.read().await;
        let users: Vec<User> = state
            .users
            .values()
            .filter(|u| search.is_none_or(|s| contains_ignore_case(&u.username, s)))
            .cloned()
            .collect();
        Ok(paginate(users, page))
    }
}

// ============================================================================
// 分类 / 体裁
// ============================================================================

macro_rules! memory_slug_repository {
    ($entity:ident, $id:ident, $table:ident, $detach:expr) => {
        #[async_trait]
        impl SlugRepository<$entity> for MemoryStore {
            async fn create(&self, name: &str, slug: &str) -> AppResult<$entity> {
                let mut state = self.state.write().await;
                if state
                    .$table
                    .values()
                    .any(|e| e.name == name || e.slug == slug)
                {
                    return Err(AppError::validation(format!(
                        "{} with this name or slug already exists",
                        <$entity as crate::domain::SlugEntity>::LABEL
                    )));
                }

                let id = state.next_id();
                let created = $entity {
                    id: $id(id),
                    name: name.to_string(),
                    slug: slug.to_string(),
                };
                state.$table.insert(id, created.clone());
                Ok(created)
            }

            async fn find_by_slug(&self, slug: &str) -> AppResult<Option<$entity>> {
                let state = self.state.read().await;
                Ok(state.$table.values().find(|e| e.slug == slug).cloned())
            }

            async fn exists_by_name(&self, name: &str) -> AppResult<bool> {
                let state = self.state.read().await;
                Ok(state.$table.values().any(|e| e.name == name))
            }

            async fn delete_by_slug(&self, slug: &str) -> AppResult<bool> {
                let mut state = self.state.write().await;
                let id = match state.$table.values().find(|e| e.slug == slug) {
                    Some(entity) => entity.id.0,
                    None => return Ok(false),
                };

                state.$table.remove(&id);
                let detach: fn(&mut TitleRecord, i64) = $detach;
                for title in state.titles.values_mut() {
                    detach(title, id);
                }
                Ok(true)
            }

            async fn list(
                &self,
                search: Option<&str>,
                page: PageRequest,
            ) -> AppResult<Page<$entity>> {
                let state = self.state.read().await;
                let items: Vec<$entity> = state
                    .$table
                    .values()
                    .filter(|e| search.is_none_or(|s| contains_ignore_case(&e.name, s)))
                    .cloned()
                    .collect();
                Ok(paginate(items, page))
            }
        }
    };
}

memory_slug_repository!(Category, CategoryId, categories, |title, id| {
    if title.category_id == Some(id) {
        title.category_id = None;
    }
});

memory_slug_repository!(Genre, GenreId, genres, |title, id| {
    title.genre_ids.retain(|g| *g != id);
});

// ============================================================================
// 作品
// ============================================================================

#[async_trait]
impl TitleRepository for MemoryStore {
    async fn create(&self, title: &NewTitle) -> AppResult<TitleId> {
        let mut state = self.state.write().await;

        let category_id = title.category_id.map(|c| c.0);
        let mut genre_ids: Vec<i64> = Vec::with_capacity(title.genre_ids.len());
        for genre in &title.genre_ids {
            if !genre_ids.contains(&genre.0) {
                genre_ids.push(genre.0);
            }
        }
        state.check_title_refs(category_id, &genre_ids)?;

        let id = state.next_id();
        state.titles.insert(
            id,
            TitleRecord {
                name: title.name.clone(),
                year: title.year,
                description: title.description.clone(),
                category_id,
                genre_ids,
            },
        );
        Ok(TitleId(id))
    }

    async fn update(&self, id: TitleId, changes: &TitleChanges) -> AppResult<bool> {
        let mut state = self.state.write().await;

        let genre_ids: Option<Vec<i64>> = changes
            .genre_ids
            .as_ref()
            .map(|ids| ids.iter().map(|g| g.0).collect());
        state.check_title_refs(
            changes.category_id.map(|c| c.0),
            genre_ids.as_deref().unwrap_or(&[]),
        )?;

        let Some(record) = state.titles.get_mut(&id.0) else {
            return Ok(false);
        };

        if let Some(name) = &changes.name {
            record.name = name.clone();
        }
        if let Some(year) = changes.year {
            record.year = year;
        }
        if let Some(description) = &changes.description {
            record.description = Some(description.clone());
        }
        if let Some(category_id) = changes.category_id {
            record.category_id = Some(category_id.0);
        }
        if let Some(genre_ids) = genre_ids {
            record.genre_ids.clear();
            for genre in genre_ids {
                if !record.genre_ids.contains(&genre) {
                    record.genre_ids.push(genre);
                }
            }
        }
        Ok(true)
    }

    async fn delete(&self, id: TitleId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.titles.remove(&id.0).is_none() {
            return Ok(false);
        }
        state.remove_reviews(|r| r.title_id == id.0);
        Ok(true)
    }

    async fn find_by_id(&self, id: TitleId) -> AppResult<Option<Title>> {
        let state = self.state.read().await;
        Ok(state
            .titles
            .get(&id.0)
            .map(|record| state.title_view(id.0, record)))
    }

    async fn exists(&self, id: TitleId) -> AppResult<bool> {
        Ok(self.state.read().await.titles.contains_key(&id.0))
    }

    async fn list(&self, filter: &TitleFilter, page: PageRequest) -> AppResult<Page<Title>> {
        let state = self.state.read().await;
        let titles: Vec<Title> = state
            .titles
            .iter()
            .filter(|(_, record)| state.title_matches(record, filter))
            .map(|(id, record)| state.title_view(*id, record))
            .collect();
        Ok(paginate(titles, page))
    }
}

// ============================================================================
// 评论
// ============================================================================

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create(&self, review: &NewReview) -> AppResult<Review> {
        // 检查与插入在同一把写锁内
        let mut state = self.state.write().await;

        if !state.titles.contains_key(&review.title_id.0) {
            return Err(AppError::not_found("Title not found"));
        }
        let duplicate = state.reviews.values().any(|r| {
            r.title_id == review.title_id.0 && r.author_id == review.author_id.0
        });
        if duplicate {
            return Err(duplicate_review());
        }

        let id = state.next_id();
        let record = ReviewRecord {
            title_id: review.title_id.0,
            author_id: review.author_id.0,
            text: review.text.clone(),
            score: review.score,
            pub_date: Utc::now(),
        };
        let created = state.review_view(id, &record);
        state.reviews.insert(id, record);
        Ok(created)
    }

    async fn exists_for(&self, title_id: TitleId, author_id: UserId) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .values()
            .any(|r| r.title_id == title_id.0 && r.author_id == author_id.0))
    }

    async fn find(&self, title_id: TitleId, id: ReviewId) -> AppResult<Option<Review>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .get(&id.0)
            .filter(|r| r.title_id == title_id.0)
            .map(|r| state.review_view(id.0, r)))
    }

    async fn update(&self, id: ReviewId, changes: &ReviewChanges) -> AppResult<Review> {
        let mut state = self.state.write().await;
        let record = state
            .reviews
            .get_mut(&id.0)
            .ok_or_else(|| AppError::not_found("Review not found"))?;

        if let Some(text) = &changes.text {
            record.text = text.clone();
        }
        if let Some(score) = changes.score {
            record.score = score;
        }

        let record = record.clone();
        Ok(state.review_view(id.0, &record))
    }

    async fn delete(&self, id: ReviewId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.reviews.remove(&id.0).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, c| c.review_id != id.0);
        Ok(true)
    }

    async fn list_for_title(
        &self,
        title_id: TitleId,
        page: PageRequest,
    ) -> AppResult<Page<Review>> {
        let state = self.state.read().await;
        let reviews: Vec<Review> = state
            .reviews
            .iter()
            .filter(|(_, r)| r.title_id == title_id.0)
            .map(|(id, r)| state.review_view(*id, r))
            .collect();
        Ok(paginate(reviews, page))
    }
}

// ============================================================================
// 回复
// ============================================================================

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: &NewComment) -> AppResult<Comment> {
        let mut state = self.state.write().await;

        if !state.reviews.contains_key(&comment.review_id.0) {
            return Err(AppError::not_found("Review not found"));
        }

        let id = state.next_id();
        let record = CommentRecord {
            review_id: comment.review_id.0,
            author_id: comment.author_id.0,
            text: comment.text.clone(),
            pub_date: Utc::now(),
        };
        let created = state.comment_view(id, &record);
        state.comments.insert(id, record);
        Ok(created)
    }

    async fn find(&self, review_id: ReviewId, id: CommentId) -> AppResult<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .get(&id.0)
            .filter(|c| c.review_id == review_id.0)
            .map(|c| state.comment_view(id.0, c)))
    }

    async fn update(&self, id: CommentId, text: &str) -> AppResult<Comment> {
        let mut state = self.state.write().await;
        let record = state
            .comments
            .get_mut(&id.0)
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        record.text = text.to_string();

        let record = record.clone();
        Ok(state.comment_view(id.0, &record))
    }

    async fn delete(&self, id: CommentId) -> AppResult<bool> {
        Ok(self.state.write().await.comments.remove(&id.0).is_some())
    }

    async fn list_for_review(
        &self,
        review_id: ReviewId,
        page: PageRequest,
    ) -> AppResult<Page<Comment>> {
        let state = self.state.read().await;
        let comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|(_, c)| c.review_id == review_id.0)
            .map(|(id, c)| state.comment_view(*id, c))
            .collect();
        Ok(paginate(comments, page))
    }
}
