//! Environment seen by the wrapped build tool.

/// Proxy chain used when `GOPROXY` is unset.
pub const DEFAULT_GOPROXY: &str = "https://proxy.golang.org,direct";

/// `(GOPROXY, GONOSUMDB)` values with the local proxy injected.
///
/// The proxy goes first in the chain so a 404 falls through to whatever
/// was configured before. Private patterns are appended to `GONOSUMDB`
/// because the public checksum database cannot know them.
pub fn proxy_env<'a>(
    proxy_url: &str,
    patterns: impl IntoIterator<Item = &'a str>,
    current_goproxy: Option<&str>,
    current_gonosumdb: Option<&'a str>,
) -> [(&'static str, String); 2] {
    let upstream = current_goproxy
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_GOPROXY);
    let goproxy = format!("{proxy_url},{upstream}");

    let gonosumdb = current_gonosumdb
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .into_iter()
        .chain(patterns)
        .collect::<Vec<_>>()
        .join(",");

    [("GOPROXY", goproxy), ("GONOSUMDB", gonosumdb)]
}
