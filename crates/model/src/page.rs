//! Pagination: bounded page sizes and opaque offset-encoded continuation
//! tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PAGE_SIZE: i64 = 1;
pub const MAX_PAGE_SIZE: i64 = 200;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

const TOKEN_VERSION: &str = "v1";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PageError {
    #[error("page size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}, got {0}")]
    SizeOutOfRange(i64),

    #[error("malformed page token")]
    MalformedToken,
}

/// A validated page request. Construct through [`PageRequest::new`] so the
/// bounds and token decoding are enforced in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    size: i64,
    offset: i64,
}

impl PageRequest {
    /// Validates the size (defaulting when absent) and decodes the opaque
    /// continuation token into an offset.
    pub fn new(size: Option<i64>, token: Option<&str>) -> Result<Self, PageError> {
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&size) {
            return Err(PageError::SizeOutOfRange(size));
        }
        let offset = match token {
            Some(t) => decode_token(t)?,
            None => 0,
        };
        Ok(Self { size, offset })
    }

    pub fn first(size: i64) -> Result<Self, PageError> {
        Self::new(Some(size), None)
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Token for the page after this one, given how many rows came back.
    /// Returns `None` when the page was short, meaning the listing is done.
    pub fn next_token(&self, returned: usize) -> Option<String> {
        if (returned as i64) < self.size {
            None
        } else {
            Some(encode_token(self.offset + self.size))
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            size: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// One page of results plus the continuation token, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn from_request(items: Vec<T>, request: &PageRequest) -> Self {
        let next_token = request.next_token(items.len());
        Self { items, next_token }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_token: None,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_token: self.next_token,
        }
    }
}

fn encode_token(offset: i64) -> String {
    URL_SAFE_NO_PAD.encode(format!("{TOKEN_VERSION}:{offset}"))
}

fn decode_token(token: &str) -> Result<i64, PageError> {
    let raw = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| PageError::MalformedToken)?;
    let text = String::from_utf8(raw).map_err(|_| PageError::MalformedToken)?;
    let offset = text
        .strip_prefix(TOKEN_VERSION)
        .and_then(|rest| rest.strip_prefix(':'))
        .and_then(|n| n.parse::<i64>().ok())
        .ok_or(PageError::MalformedToken)?;
    if offset < 0 {
        return Err(PageError::MalformedToken);
    }
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_size_applies() {
        let page = PageRequest::new(None, None).unwrap();
        assert_eq!(page.size(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn size_bounds() {
        assert_eq!(
            PageRequest::new(Some(0), None),
            Err(PageError::SizeOutOfRange(0))
        );
        assert_eq!(
            PageRequest::new(Some(201), None),
            Err(PageError::SizeOutOfRange(201))
        );
        assert!(PageRequest::new(Some(1), None).is_ok());
        assert!(PageRequest::new(Some(200), None).is_ok());
    }

    #[test]
    fn token_round_trips() {
        let first = PageRequest::new(Some(10), None).unwrap();
        let token = first.next_token(10).expect("full page continues");
        let second = PageRequest::new(Some(10), Some(&token)).unwrap();
        assert_eq!(second.offset(), 10);
    }

    #[test]
    fn short_page_ends_listing() {
        let page = PageRequest::new(Some(10), None).unwrap();
        assert_eq!(page.next_token(7), None);
    }

    #[test]
    fn garbage_tokens_rejected() {
        for bad in ["definitely not base64 ~~~", "djI6MTA", ""] {
            // "djI6MTA" is a valid encoding of "v2:10" — wrong version.
            assert_eq!(
                PageRequest::new(None, Some(bad)).unwrap_err(),
                PageError::MalformedToken,
                "token {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn negative_offsets_rejected() {
        let token = URL_SAFE_NO_PAD.encode("v1:-5");
        assert_eq!(
            PageRequest::new(None, Some(&token)).unwrap_err(),
            PageError::MalformedToken
        );
    }

    #[test]
    fn paging_through_25_in_tens() {
        // Mirrors the search-pagination scenario: 25 rows, size 10 -> 10/10/5.
        let mut request = PageRequest::new(Some(10), None).unwrap();
        let total = 25i64;
        let mut seen = 0i64;
        loop {
            let remaining = (total - request.offset()).max(0);
            let returned = remaining.min(request.size());
            seen += returned;
            match request.next_token(returned as usize) {
                Some(token) => {
                    request = PageRequest::new(Some(10), Some(&token)).unwrap();
                }
                None => break,
            }
        }
        assert_eq!(seen, 25);
    }
}
