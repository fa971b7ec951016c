//! Cookie helpers for the CSRF handshake with the backend.

/// Name of the cookie carrying the CSRF token.
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";

/// Look up `name` in a `name=value; other=value` cookie string and URL-decode its value.
///
/// Returns `None` when the cookie is absent or its value is not valid percent-encoding.
pub fn get_cookie(cookies: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }

    let raw = cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(name)?.strip_prefix('='))?;

    match urlencoding::decode(raw) {
        Ok(value) => Some(value.into_owned()),
        Err(e) => {
            tracing::warn!(cookie = name, "Ignoring cookie with invalid encoding: {e}");
            None
        }
    }
}

/// Build a `Cookie` request header from the `Set-Cookie` values of a response.
///
/// Attributes (`Path`, `Expires`, ...) are dropped; only `name=value` pairs are kept.
pub fn cookie_header_from_set_cookie<'a, I>(set_cookies: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let pairs: Vec<&str> = set_cookies
        .into_iter()
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    if pairs.is_empty() { None } else { Some(pairs.join("; ")) }
}
