//! 通用类型定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
        )]
        #[serde(transparent)]
        #[display("{_0}")]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }
    };
}

entity_id!(
    /// 用户 ID
    UserId
);
entity_id!(
    /// 分类 ID
    CategoryId
);
entity_id!(
    /// 体裁 ID
    GenreId
);
entity_id!(
    /// 作品 ID
    TitleId
);
entity_id!(
    /// 评论 ID
    ReviewId
);
entity_id!(
    /// 回复 ID
    CommentId
);

/// 分页上限配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// limit/offset 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::resolve(None, None, &PageLimits::default())
    }
}

impl PageRequest {
    /// 按配置补齐默认值并截断 limit
    pub fn resolve(limit: Option<u32>, offset: Option<u32>, limits: &PageLimits) -> Self {
        let limit = match limit {
            Some(0) | None => limits.default_limit,
            Some(l) => l.min(limits.max_limit),
        };
        Self {
            limit,
            offset: offset.unwrap_or(0),
        }
    }

    /// 对内存中的集合切片
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            request,
        }
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.request.offset) + u64::from(self.request.limit) < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.request.offset > 0
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}
