//! Small utility helpers used across modules.

use axum::http::HeaderMap;

/// Header carrying the authenticated user's id, set by the auth proxy in front of us.
pub const USER_ID_HEADER: &str = "x-user-id";

/// User id from the request headers. Blank or non-UTF-8 values count as anonymous.
pub fn user_id_from_headers(headers: &HeaderMap) -> Option<String> {
  headers
    .get(USER_ID_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

/// Log-safe truncation for large strings, cut on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
