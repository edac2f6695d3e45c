//! 列表分页
//!
//! 响应形如 `{count, next, previous, results}`，翻页链接为相对路径，
//! 保留原有查询参数并改写 `limit` / `offset`

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use yamdb_common::Page;

/// 分页与搜索查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn from_page(page: Page<T>, uri: &Uri) -> Self {
        let limit = page.request.limit;
        let offset = page.request.offset;

        let next = page
            .has_next()
            .then(|| page_link(uri, limit, Some(offset.saturating_add(limit))));

        // 回到第一页时去掉 offset
        let previous = page.has_previous().then(|| {
            let previous_offset = offset.saturating_sub(limit);
            page_link(uri, limit, (previous_offset > 0).then_some(previous_offset))
        });

        Self {
            count: page.total,
            next,
            previous,
            results: page.items,
        }
    }
}

fn page_link(uri: &Uri, limit: u32, offset: Option<u32>) -> String {
    let existing = uri.query().unwrap_or_default();

    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(existing.as_bytes()) {
        if key != "limit" && key != "offset" {
            query.append_pair(&key, &value);
        }
    }
    query.append_pair("limit", &limit.to_string());
    if let Some(offset) = offset {
        query.append_pair("offset", &offset.to_string());
    }

    format!("{}?{}", uri.path(), query.finish())
}
