//! 分类、体裁与作品

use yamdb_common::{CategoryId, GenreId, TitleId};

/// 以 slug 为外部标识的分类项（分类 / 体裁）
pub trait SlugEntity: Clone + Send + Sync + 'static {
    /// 存储表名
    const TABLE: &'static str;
    /// 用于错误信息
    const LABEL: &'static str;

    fn from_parts(id: i64, name: String, slug: String) -> Self;
    fn id_value(&self) -> i64;
    fn name(&self) -> &str;
    fn slug(&self) -> &str;
}

/// 分类（作品最多属于一个）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// 体裁（作品可属于多个）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
    pub slug: String,
}

macro_rules! slug_entity {
    ($ty:ident, $id:ident, $table:literal, $label:literal) => {
        impl SlugEntity for $ty {
            const TABLE: &'static str = $table;
            const LABEL: &'static str = $label;

            fn from_parts(id: i64, name: String, slug: String) -> Self {
                Self {
                    id: $id(id),
                    name,
                    slug,
                }
            }

            fn id_value(&self) -> i64 {
                self.id.value()
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn slug(&self) -> &str {
                &self.slug
            }
        }
    };
}

slug_entity!(Category, CategoryId, "categories", "category");
slug_entity!(Genre, GenreId, "genres", "genre");

/// 作品（读模型，附带分类、体裁与实时评分）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub genres: Vec<Genre>,
    /// 读取时计算
    pub rating: Option<u8>,
}

/// 新作品
#[derive(Debug, Clone)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub genre_ids: Vec<GenreId>,
}

/// 作品的局部修改，`None` 表示保持不变
#[derive(Debug, Clone, Default)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub genre_ids: Option<Vec<GenreId>>,
}

/// 作品列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    /// 分类 slug，精确匹配
    pub category: Option<String>,
    /// 体裁 slug，精确匹配
    pub genre: Option<String>,
    pub year: Option<i32>,
    /// 名称包含（不区分大小写）
    pub name: Option<String>,
}
