//! 分类、体裁与作品用例

use std::sync::Arc;

use tracing::{debug, info};
use yamdb_common::{CategoryId, GenreId, Page, PageRequest, TitleId};
use yamdb_errors::{AppError, AppResult};

use super::authorize;
use super::dto::{SlugCreate, SlugView, TitleCreate, TitlePatch, TitleQuery, TitleView};
use super::validation::{
    SLUG_CREATE_RULES, TITLE_CREATE_RULES, TITLE_PATCH_RULES, validate,
};
use crate::domain::{
    Action, Actor, Category, Genre, NewTitle, ResourceKind, SlugEntity, SlugRepository,
    TitleChanges, TitleFilter, TitleRepository,
};

/// 分类、体裁与作品服务
pub struct CatalogService {
    categories: Arc<dyn SlugRepository<Category>>,
    genres: Arc<dyn SlugRepository<Genre>>,
    titles: Arc<dyn TitleRepository>,
}

impl CatalogService {
    pub fn new(
        categories: Arc<dyn SlugRepository<Category>>,
        genres: Arc<dyn SlugRepository<Genre>>,
        titles: Arc<dyn TitleRepository>,
    ) -> Self {
        Self {
            categories,
            genres,
            titles,
        }
    }

    // ------------------------------------------------------------------------
    // 分类
    // ------------------------------------------------------------------------

    pub async fn list_categories(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<Page<SlugView>> {
        list_slugs(self.categories.as_ref(), search, page).await
    }

    pub async fn get_category(&self, slug: &str) -> AppResult<SlugView> {
        get_slug(self.categories.as_ref(), slug).await
    }

    pub async fn create_category(&self, actor: &Actor, input: SlugCreate) -> AppResult<SlugView> {
        create_slug(self.categories.as_ref(), ResourceKind::Category, actor, input).await
    }

    pub async fn delete_category(&self, actor: &Actor, slug: &str) -> AppResult<()> {
        delete_slug(self.categories.as_ref(), ResourceKind::Category, actor, slug).await
    }

    // ------------------------------------------------------------------------
    // 体裁
    // ------------------------------------------------------------------------

    pub async fn list_genres(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<Page<SlugView>> {
        list_slugs(self.genres.as_ref(), search, page).await
    }

    pub async fn get_genre(&self, slug: &str) -> AppResult<SlugView> {
        get_slug(self.genres.as_ref(), slug).await
    }

    pub async fn create_genre(&self, actor: &Actor, input: SlugCreate) -> AppResult<SlugView> {
        create_slug(self.genres.as_ref(), ResourceKind::Genre, actor, input).await
    }

    pub async fn delete_genre(&self, actor: &Actor, slug: &str) -> AppResult<()> {
        delete_slug(self.genres.as_ref(), ResourceKind::Genre, actor, slug).await
    }

    // ------------------------------------------------------------------------
    // 作品
    // ------------------------------------------------------------------------

    pub async fn list_titles(
        &self,
        query: TitleQuery,
        page: PageRequest,
    ) -> AppResult<Page<TitleView>> {
        let filter = TitleFilter {
            category: query.category,
            genre: query.genre,
            year: query.year,
            name: query.name,
        };

        let titles = self.titles.list(&filter, page).await?;
        Ok(titles.map(|title| TitleView::from(&title)))
    }

    pub async fn get_title(&self, id: TitleId) -> AppResult<TitleView> {
        let title = self
            .titles
            .find_by_id(id)
            .await?
            .ok_or_else(title_not_found)?;
        Ok(TitleView::from(&title))
    }

    pub async fn create_title(&self, actor: &Actor, input: TitleCreate) -> AppResult<TitleView> {
        authorize(actor, Action::Create, ResourceKind::Title, None)?;
        validate(&input, TITLE_CREATE_RULES)?;

        let category_id = match input.category.as_deref() {
            Some(slug) => Some(self.resolve_category(slug).await?),
            None => None,
        };
        let genre_ids = self.resolve_genres(&input.genre).await?;

        let id = self
            .titles
            .create(&NewTitle {
                name: input.name,
                year: input.year,
                description: input.description,
                category_id,
                genre_ids,
            })
            .await?;

        info!(title_id = %id, "Title created");
        self.get_title(id).await
    }

    /// 局部更新，未给出的字段保持不变
    pub async fn update_title(
        &self,
        actor: &Actor,
        id: TitleId,
        input: TitlePatch,
    ) -> AppResult<TitleView> {
        authorize(actor, Action::Update, ResourceKind::Title, None)?;

        if !self.titles.exists(id).await? {
            return Err(title_not_found());
        }
        validate(&input, TITLE_PATCH_RULES)?;

        let category_id = match input.category.as_deref() {
            Some(slug) => Some(self.resolve_category(slug).await?),
            None => None,
        };
        let genre_ids = match input.genre.as_deref() {
            Some(slugs) => Some(self.resolve_genres(slugs).await?),
            None => None,
        };

        let changes = TitleChanges {
            name: input.name,
            year: input.year,
            description: input.description,
            category_id,
            genre_ids,
        };

        if !self.titles.update(id, &changes).await? {
            return Err(title_not_found());
        }

        debug!(title_id = %id, "Title updated");
        self.get_title(id).await
    }

    /// 删除作品及其评论、回复
    pub async fn delete_title(&self, actor: &Actor, id: TitleId) -> AppResult<()> {
        authorize(actor, Action::Delete, ResourceKind::Title, None)?;

        if !self.titles.delete(id).await? {
            return Err(title_not_found());
        }

        info!(title_id = %id, "Title deleted");
        Ok(())
    }

    async fn resolve_category(&self, slug: &str) -> AppResult<CategoryId> {
        self.categories
            .find_by_slug(slug)
            .await?
            .map(|category| category.id)
            .ok_or_else(|| unknown_slug::<Category>(slug))
    }

    /// 按给出顺序解析体裁，重复的 slug 只保留一次
    async fn resolve_genres(&self, slugs: &[String]) -> AppResult<Vec<GenreId>> {
        let mut ids: Vec<GenreId> = Vec::with_capacity(slugs.len());
        for slug in slugs {
            let genre = self
                .genres
                .find_by_slug(slug)
                .await?
                .ok_or_else(|| unknown_slug::<Genre>(slug))?;
            if !ids.contains(&genre.id) {
                ids.push(genre.id);
            }
        }
        Ok(ids)
    }
}

async fn list_slugs<T: SlugEntity>(
    repo: &dyn SlugRepository<T>,
    search: Option<&str>,
    page: PageRequest,
) -> AppResult<Page<SlugView>> {
    let items = repo.list(search, page).await?;
    Ok(items.map(|item| SlugView::from_entity(&item)))
}

async fn get_slug<T: SlugEntity>(
    repo: &dyn SlugRepository<T>,
    slug: &str,
) -> AppResult<SlugView> {
    let item = repo
        .find_by_slug(slug)
        .await?
        .ok_or_else(slug_not_found::<T>)?;
    Ok(SlugView::from_entity(&item))
}

async fn create_slug<T: SlugEntity>(
    repo: &dyn SlugRepository<T>,
    kind: ResourceKind,
    actor: &Actor,
    input: SlugCreate,
) -> AppResult<SlugView> {
    authorize(actor, Action::Create, kind, None)?;
    validate(&input, SLUG_CREATE_RULES)?;

    // slug 与名称都必须唯一
    if repo.find_by_slug(&input.slug).await?.is_some() {
        return Err(AppError::validation(format!(
            "slug: {} with this slug already exists",
            T::LABEL
        )));
    }
    if repo.exists_by_name(&input.name).await? {
        return Err(AppError::validation(format!(
            "name: {} with this name already exists",
            T::LABEL
        )));
    }

    let created = repo.create(&input.name, &input.slug).await?;
    info!(kind = T::LABEL, slug = %created.slug(), "Catalog entry created");
    Ok(SlugView::from_entity(&created))
}

async fn delete_slug<T: SlugEntity>(
    repo: &dyn SlugRepository<T>,
    kind: ResourceKind,
    actor: &Actor,
    slug: &str,
) -> AppResult<()> {
    authorize(actor, Action::Delete, kind, None)?;

    if !repo.delete_by_slug(slug).await? {
        return Err(slug_not_found::<T>());
    }

    info!(kind = T::LABEL, slug = %slug, "Catalog entry deleted");
    Ok(())
}

fn slug_not_found<T: SlugEntity>() -> AppError {
    AppError::not_found(format!("{} not found", T::LABEL))
}

fn unknown_slug<T: SlugEntity>(slug: &str) -> AppError {
    AppError::validation(format!(
        "{}: object with slug={} does not exist",
        T::LABEL,
        slug
    ))
}

fn title_not_found() -> AppError {
    AppError::not_found("Title not found")
}
