//! URL construction beneath a fixed base URL
//!
//! The proxy mounts every route under a path prefix
//! (e.g. `/api/motor-proxy/api`), so URLs are built by appending path
//! segments rather than by relative resolution, which would drop the last
//! prefix segment.

use crate::{UrlError, UrlResult};
use url::Url;

/// Builds upstream URLs from a base URL
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Creates a builder rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Fails when the URL does not parse, is not http(s), or cannot carry
    /// path segments (e.g. `mailto:`).
    pub fn new(base_url: &str) -> UrlResult<Self> {
        let base = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(UrlError::InvalidScheme(base.scheme().to_string()));
        }

        if base.cannot_be_a_base() {
            return Err(UrlError::CannotBeABase(base_url.to_string()));
        }

        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Appends path segments to the base URL, percent-encoding each one
    ///
    /// A segment containing `/` is encoded as `%2F` and stays one segment.
    pub fn segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Always Ok: `new` rejects cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Appends a literal path (with optional query string) to the base URL
    ///
    /// Used by the probes, whose endpoint list is written as path strings.
    pub fn path(&self, path_and_query: &str) -> UrlResult<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path_and_query.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| UrlError::Parse(format!("{}: {}", joined, e)))
    }

    /// `GET {base}/years`
    pub fn years(&self) -> Url {
        self.segments(&["years"])
    }

    /// `GET {base}/year/{year}/makes`
    pub fn makes(&self, year: i32) -> Url {
        self.segments(&["year", &year.to_string(), "makes"])
    }

    /// `GET {base}/year/{year}/make/{make_name}/models`
    ///
    /// The make's display name is percent-encoded into its own segment.
    pub fn models(&self, year: i32, make_name: &str) -> Url {
        self.segments(&["year", &year.to_string(), "make", make_name, "models"])
    }
}
