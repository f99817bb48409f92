//! `Link` response header parsing for cursor pagination.
//!
//! Okta advertises continuation through entries of the form
//! `<https://org.okta.com/api/v1/users?after=00u1&limit=200>; rel="next"`.

/// Relation name carrying the next page URL.
pub const NEXT_REL: &str = "next";

/// Returns the URL of the first entry whose relation equals `rel`.
///
/// Entries are comma separated. Malformed entries (missing angle brackets,
/// missing `;`, unquoted relation) are skipped rather than reported.
pub fn parse_link_header(header: Option<&str>, rel: &str) -> Option<String> {
    header?
        .split(',')
        .filter_map(parse_entry)
        .find(|(_, entry_rel)| *entry_rel == rel)
        .map(|(url, _)| url.to_owned())
}

/// Convenience wrapper for the `rel="next"` lookup.
pub fn next_page_url(header: Option<&str>) -> Option<String> {
    parse_link_header(header, NEXT_REL)
}

fn parse_entry(entry: &str) -> Option<(&str, &str)> {
    // Any `<` may open the URL; try each until one yields a well-formed pair.
    entry
        .match_indices('<')
        .find_map(|(start, _)| parse_from(&entry[start + 1..]))
}

fn parse_from(rest: &str) -> Option<(&str, &str)> {
    let close = rest.find('>')?;
    let url = &rest[..close];
    if url.is_empty() {
        return None;
    }

    let params = rest[close + 1..].strip_prefix(';')?.trim_start();
    let quoted = params.strip_prefix("rel=\"")?;
    let end = quoted.find('"')?;
    let rel = &quoted[..end];
    if rel.is_empty() {
        return None;
    }

    Some((url, rel))
}
