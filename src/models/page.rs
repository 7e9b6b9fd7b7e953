//! 分页响应
//!
//! 服务端分页接口返回 `{<items>, currentPage, totalPages, totalItems, hasNext, hasPrevious}`，
//! 旧接口直接返回数组，两种格式都需要兼容

use serde::Deserialize;

/// 分页元数据
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
}

impl PageMeta {
    /// 不分页响应视为单页
    pub fn single(item_count: usize) -> Self {
        Self {
            current_page: 0,
            total_pages: if item_count == 0 { 0 } else { 1 },
            total_items: item_count as u64,
            has_next: false,
            has_previous: false,
        }
    }

    /// 下一页页码
    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then(|| self.current_page + 1)
    }

    /// 上一页页码
    pub fn previous_page(&self) -> Option<u32> {
        (self.has_previous && self.current_page > 0).then(|| self.current_page - 1)
    }

    /// 是否需要显示翻页控件
    pub fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }

    /// 形如 "第 1 / 3 页"
    pub fn label(&self) -> String {
        format!("第 {} / {} 页", self.current_page + 1, self.total_pages.max(1))
    }
}

/// 列表响应：分页对象或裸数组
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<P, T> {
    Bare(Vec<T>),
    Paged(P),
}

impl<P, T> Listing<P, T> {
    /// 统一转换为分页对象
    pub fn resolve(self, from_bare: impl FnOnce(Vec<T>, PageMeta) -> P) -> P {
        match self {
            Listing::Paged(page) => page,
            Listing::Bare(items) => {
                let meta = PageMeta::single(items.len());
                from_bare(items, meta)
            }
        }
    }
}
