//! Nickname handling. The nickname travels in the `u` query parameter of a
//! shared link so it survives reloads without an account.

use url::Url;

pub const ANONYMOUS: &str = "Anonymous";

/// Query parameter carrying the nickname.
pub const NICKNAME_PARAM: &str = "u";

const MAX_NICKNAME_CHARS: usize = 40;

/// Trim and bound a free-text nickname; blank becomes `"Anonymous"`.
pub fn normalize_user_name(name: Option<&str>) -> String {
    let trimmed = name.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return ANONYMOUS.to_string();
    }
    trimmed.chars().take(MAX_NICKNAME_CHARS).collect()
}

/// Read the nickname from a full URL or a bare query string (`?u=ana`).
pub fn nickname_from_query(input: &str) -> String {
    let value = match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == NICKNAME_PARAM)
            .map(|(_, v)| v.into_owned()),
        Err(_) => url::form_urlencoded::parse(input.trim_start_matches('?').as_bytes())
            .find(|(k, _)| k == NICKNAME_PARAM)
            .map(|(_, v)| v.into_owned()),
    };
    normalize_user_name(value.as_deref())
}

/// Attach the nickname to a base link, replacing any existing `u`.
pub fn link_with_nickname(base: &str, name: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != NICKNAME_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(NICKNAME_PARAM, &normalize_user_name(Some(name)));
    Ok(url.into())
}
