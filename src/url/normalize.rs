use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical form used for dedup comparison
///
/// # Normalization Steps
///
/// 1. Reject non-HTTP(S) schemes
/// 2. Lowercase the host and remove any `www.` prefix
/// 3. Drop an explicit default port (`:80` for http, `:443` for https)
/// 4. Normalize the path: collapse `.`/`..` segments and repeated slashes,
///    trim the trailing slash (except for the root `/`)
/// 5. Remove the fragment
/// 6. Sort query parameters by key; drop an empty query entirely
///
/// The function is pure and idempotent: normalizing an already-normalized
/// URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use linden::normalize_url;
/// use url::Url;
///
/// let url = Url::parse("http://WWW.example.com:80/a/b/../c/#frag").unwrap();
/// assert_eq!(normalize_url(&url).unwrap().as_str(), "http://example.com/a/c");
/// ```
pub fn normalize_url(url: &Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "only http and https are supported, got: {}",
            url.scheme()
        )));
    }

    let mut normalized = url.clone();

    // The url crate already lowercases hosts and drops default ports at
    // parse time; the www. prefix is our own convention.
    let bare_host = normalized
        .host_str()
        .ok_or(UrlError::MissingHost)?
        .strip_prefix("www.")
        .map(str::to_string);
    if let Some(bare) = bare_host {
        normalized
            .set_host(Some(&bare))
            .map_err(|e| UrlError::Malformed(format!("failed to set host: {}", e)))?;
    }

    let path = normalize_path(normalized.path());
    normalized.set_path(&path);

    normalized.set_fragment(None);

    if normalized.query().is_some() {
        let mut params: Vec<(String, String)> = normalized
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.sort();

        if params.is_empty() {
            normalized.set_query(None);
        } else {
            // Re-serialize through the form encoder so delimiters inside
            // keys or values stay percent-encoded.
            normalized.query_pairs_mut().clear().extend_pairs(&params);
        }
    }

    Ok(normalized)
}

/// Collapses dot segments and repeated slashes, trims the trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}
