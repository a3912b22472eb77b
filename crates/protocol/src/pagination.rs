//! Cursor-style pagination via the `Link` response header.
//!
//! The server advertises follow-up pages as
//! `Link: <https://api.example.com/v2/items?cursor=abc>; rel="next", <...>; rel="prev"`.
//! Only the `next` relation drives the dispatcher; the rest are parsed and
//! kept for completeness. Link targets are returned as written: absolute, or
//! relative to the page that carried them (see [`crate::BaseUrl::join`]).

use std::collections::BTreeMap;

/// Relations parsed from one `Link` header value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationLink {
    relations: BTreeMap<String, String>,
}

impl PaginationLink {
    /// Parses a `Link` header value.
    ///
    /// Entries without a `<url>` or without a `rel` parameter are ignored.
    /// Relation names are matched case-insensitively, quotes are optional,
    /// and a space-separated `rel` list registers the URL under each name.
    /// When a relation appears twice the first URL wins.
    pub fn parse(header: &str) -> Self {
        let mut relations = BTreeMap::new();
        let mut rest = header;

        while let Some(open) = rest.find('<') {
            let after_open = &rest[open + 1..];
            let Some(close) = after_open.find('>') else {
                break;
            };
            let url = after_open[..close].trim();
            let after_close = &after_open[close + 1..];
            let params_end = after_close.find('<').unwrap_or(after_close.len());
            let params = &after_close[..params_end];

            for param in params.split(';') {
                let param = param.trim().trim_end_matches(',').trim();
                let Some((key, value)) = param.split_once('=') else {
                    continue;
                };
                if !key.trim().eq_ignore_ascii_case("rel") {
                    continue;
                }
                for rel in value.trim().trim_matches('"').split_whitespace() {
                    relations
                        .entry(rel.to_ascii_lowercase())
                        .or_insert_with(|| url.to_string());
                }
            }

            rest = &after_close[params_end..];
        }

        Self { relations }
    }

    /// Returns the URL registered for `relation`.
    pub fn get(&self, relation: &str) -> Option<&str> {
        self.relations
            .get(&relation.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the continuation URL, if another page exists.
    pub fn next(&self) -> Option<&str> {
        self.get("next")
    }

    /// Returns `true` if no relation was parsed.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
