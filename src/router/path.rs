/// Normalize a navigation target to a single-leading-slash path relative to
/// `base_path`. The query string is kept verbatim.
pub fn normalize_path(path: &str, base_path: &str) -> String {
    let mut path = path.trim();
    if let Some(rest) = path.strip_prefix('#') {
        path = rest;
    }
    if let Some(rest) = path.strip_prefix('!') {
        path = rest;
    }

    let mut out = if path.starts_with('/') || path.contains("://") {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    let base = base_path.trim_end_matches('/');
    if !base.is_empty()
        && let Some(rest) = out.strip_prefix(base)
        && (rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
    {
        out = rest.to_string();
    }

    while out.starts_with("//") {
        out.remove(0);
    }
    if out.is_empty() || out.starts_with('?') {
        out.insert(0, '/');
    }
    out
}

/// `(pathname, querystring)`; the query string has no leading `?`.
pub fn split_query(path: &str) -> (&str, &str) {
    match path.split_once('?') {
        Some((pathname, query)) => (pathname, query),
        None => (path, ""),
    }
}

/// Route patterns: literal segments, `:name` for any single segment, and a
/// trailing `*` for any remainder.
pub fn pattern_matches(pattern: &str, pathname: &str) -> bool {
    let mut pat = pattern.trim_matches('/').split('/');
    let mut segs = pathname.trim_matches('/').split('/');
    loop {
        match (pat.next(), segs.next()) {
            (Some("*"), _) => return true,
            (Some(p), Some(s)) if p.starts_with(':') => {
                if s.is_empty() {
                    return false;
                }
            }
            (Some(p), Some(s)) => {
                if p != s {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Percent-encode like `encodeURIComponent`.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
