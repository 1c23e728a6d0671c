//! URL utilities for building listings service endpoints and artwork links

use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Parse and validate a URL
    ///
    /// # Returns
    ///
    /// * `Ok(Url)` - Successfully parsed URL
    /// * `Err(url::ParseError)` - Parse error
    pub fn parse_and_validate(url: &str) -> Result<Url, url::ParseError> {
        Url::parse(url)
    }

    /// Append an API path to the service base path
    ///
    /// Unlike [`Url::join`], the base path is always kept: the listings service
    /// is versioned by path segment (`.../20141201`).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use listings_sync::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::endpoint("https://json.example.org/20141201/", "/token"),
    ///     "https://json.example.org/20141201/token"
    /// );
    /// ```
    pub fn endpoint(base: &str, path: &str) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Whether an artwork reference already carries an absolute http(s) location
    pub fn is_absolute_http(uri: &str) -> bool {
        uri.to_ascii_lowercase().contains("http")
    }

    /// Resolve an artwork reference against the service image path
    ///
    /// Absolute references are returned untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use listings_sync::utils::url::UrlUtils;
    ///
    /// let base = "https://json.example.org/20141201";
    /// assert_eq!(
    ///     UrlUtils::resolve_image(base, "assets/p123_v_h.jpg"),
    ///     "https://json.example.org/20141201/image/assets/p123_v_h.jpg"
    /// );
    /// assert_eq!(
    ///     UrlUtils::resolve_image(base, "https://cdn.example.org/p.jpg"),
    ///     "https://cdn.example.org/p.jpg"
    /// );
    /// ```
    pub fn resolve_image(base: &str, uri: &str) -> String {
        if Self::is_absolute_http(uri) {
            uri.to_string()
        } else {
            Self::endpoint(base, &format!("image/{}", uri.trim_start_matches('/')))
        }
    }

    /// Mask a token for safe logging, keeping only a short prefix
    pub fn mask_token(token: &str) -> String {
        let prefix: String = token.chars().take(4).collect();
        format!("{prefix}****")
    }
}
