use axum::http::Uri;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const MAX_PAGE_SIZE: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid page {page}: there are {pages} page(s)")]
pub struct InvalidPage {
    pub page: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    /// Missing values fall back to page 1 and the default size. A zero size
    /// also means the default; larger sizes are capped at `MAX_PAGE_SIZE`.
    pub fn new(page: Option<usize>, per_page: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1),
            per_page: per_page
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub pages: usize,
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn paginate(items: Vec<T>, request: PageRequest, uri: &Uri) -> Result<Self, InvalidPage> {
        let count = items.len();
        let pages = count.div_ceil(request.per_page).max(1);

        if request.page == 0 || request.page > pages {
            return Err(InvalidPage {
                page: request.page,
                pages,
            });
        }

        let offset = (request.page - 1) * request.per_page;
        let results = items
            .into_iter()
            .skip(offset)
            .take(request.per_page)
            .collect();

        Ok(Self {
            pages,
            count,
            next: (request.page < pages).then(|| page_link(uri, request.page + 1)),
            previous: (request.page > 1).then(|| page_link(uri, request.page - 1)),
            results,
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            pages: self.pages,
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Same path and query with `page` replaced. Page 1 drops the parameter.
pub fn page_link(uri: &Uri, page: usize) -> String {
    let mut params: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && *pair != "page" && !pair.starts_with("page="))
        .map(str::to_string)
        .collect();

    if page > 1 {
        params.push(format!("page={page}"));
    }

    if params.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), params.join("&"))
    }
}
