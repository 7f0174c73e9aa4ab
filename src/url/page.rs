use crate::UrlError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// Path grammar for a chained page: `/s/<chainToken>/<bookId>-<pageIndex>`
static PAGE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/s/([^/]+)/([^/-]+)-(\d+)/?$").unwrap());

/// Identifies one page inside a single traversal
///
/// The chain token is issued by the previous page's content. It cannot be
/// derived from the page index and is meaningless outside the traversal that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageIdentity {
    /// Groups all pages of one work
    pub book_id: String,

    /// 1-based position in the chain
    pub page_index: u32,

    /// Opaque token required to fetch this page
    pub chain_token: String,
}

impl PageIdentity {
    /// Returns the identity of the following page, reached with `next_token`
    pub fn advance(&self, next_token: impl Into<String>) -> Self {
        Self {
            book_id: self.book_id.clone(),
            page_index: self.page_index.saturating_add(1),
            chain_token: next_token.into(),
        }
    }
}

impl fmt::Display for PageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} ({})", self.book_id, self.page_index, self.chain_token)
    }
}

/// Largest page index a URL may carry; the page after it must still be addressable
pub const MAX_PAGE_INDEX: u32 = u32::MAX - 1;

/// A page URL split into the site origin and the page identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAddress {
    /// Scheme, host and port without a trailing slash (e.g. `https://example.org`)
    pub origin: String,

    /// The page within the chain
    pub identity: PageIdentity,
}

impl PageAddress {
    /// Builds the page URL for this address
    pub fn to_url(&self) -> String {
        build_page_url(&self.origin, &self.identity)
    }

    /// Returns the address of the following page on the same origin
    pub fn advance(&self, next_token: impl Into<String>) -> Self {
        Self {
            origin: self.origin.clone(),
            identity: self.identity.advance(next_token),
        }
    }
}

/// Builds a page URL from an origin and a page identity
///
/// # Examples
///
/// ```
/// use pagechain::url::{build_page_url, PageIdentity};
///
/// let identity = PageIdentity {
///     book_id: "555".to_string(),
///     page_index: 2,
///     chain_token: "def456".to_string(),
/// };
/// assert_eq!(
///     build_page_url("https://example.org", &identity),
///     "https://example.org/s/def456/555-2"
/// );
/// ```
pub fn build_page_url(origin: &str, identity: &PageIdentity) -> String {
    format!(
        "{}/s/{}/{}-{}",
        origin.trim_end_matches('/'),
        identity.chain_token,
        identity.book_id,
        identity.page_index
    )
}

/// Parses a page URL into its origin and page identity
///
/// # Parsing Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP(S) scheme and a host
/// 3. Match the path against `/s/<chainToken>/<bookId>-<pageIndex>`
/// 4. Reject a page index of 0 or one that does not fit in `u32`
///
/// Query strings and fragments are ignored.
///
/// # Examples
///
/// ```
/// use pagechain::url::parse_page_url;
///
/// let address = parse_page_url("https://example.org/s/abc123/555-1").unwrap();
/// assert_eq!(address.origin, "https://example.org");
/// assert_eq!(address.identity.book_id, "555");
/// assert_eq!(address.identity.page_index, 1);
/// assert_eq!(address.identity.chain_token, "abc123");
/// ```
pub fn parse_page_url(url_str: &str) -> Result<PageAddress, UrlError> {
    // Step 1: Parse the URL
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(format!("{url_str}: {e}")))?;

    // Step 2: Validate scheme and host
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(url_str.to_string()));
    }

    // Step 3: Match the path grammar
    let captures = PAGE_PATH_RE
        .captures(url.path())
        .ok_or_else(|| UrlError::NotAPageUrl(url_str.to_string()))?;

    // Step 4: Validate the page index
    let page_index: u32 = captures[3]
        .parse()
        .map_err(|_| UrlError::InvalidPageIndex(url_str.to_string()))?;
    if page_index == 0 || page_index > MAX_PAGE_INDEX {
        return Err(UrlError::InvalidPageIndex(url_str.to_string()));
    }

    Ok(PageAddress {
        origin: url.origin().ascii_serialization(),
        identity: PageIdentity {
            book_id: captures[2].to_string(),
            page_index,
            chain_token: captures[1].to_string(),
        },
    })
}
