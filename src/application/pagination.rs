//! Listing pagination models.

use serde::Serialize;

/// "Showing 7–12 of 20" summary for a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl PageRange {
    /// `None` when there is nothing to show.
    pub fn new(page: u32, limit: u32, total_docs: u64) -> Option<Self> {
        if total_docs == 0 {
            return None;
        }
        let limit = u64::from(limit.max(1));
        let page = u64::from(page.max(1));
        let start = (page - 1) * limit + 1;
        Some(Self {
            start: if start > total_docs { 0 } else { start },
            end: (page * limit).min(total_docs),
            total: total_docs,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaginationItem {
    Previous { href: Option<String> },
    Ellipsis,
    Page { number: u32, href: String, active: bool },
    Next { href: Option<String> },
}

/// Previous/next controls around the current page and its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub items: Vec<PaginationItem>,
}

impl Pagination {
    pub fn build(page: u32, total_pages: u32, href: impl Fn(u32) -> String) -> Self {
        let total_pages = total_pages.max(1);
        let page = page.clamp(1, total_pages);
        let has_prev = page > 1;
        let has_next = page < total_pages;

        let mut items = vec![PaginationItem::Previous {
            href: has_prev.then(|| href(page - 1)),
        }];
        if page > 2 {
            items.push(PaginationItem::Ellipsis);
        }
        if has_prev {
            items.push(PaginationItem::Page {
                number: page - 1,
                href: href(page - 1),
                active: false,
            });
        }
        items.push(PaginationItem::Page {
            number: page,
            href: href(page),
            active: true,
        });
        if has_next {
            items.push(PaginationItem::Page {
                number: page + 1,
                href: href(page + 1),
                active: false,
            });
        }
        if page + 1 < total_pages {
            items.push(PaginationItem::Ellipsis);
        }
        items.push(PaginationItem::Next {
            href: has_next.then(|| href(page + 1)),
        });

        Self {
            page,
            total_pages,
            items,
        }
    }
}
