//! Target classification and host comparison helpers.

use subtle::ConstantTimeEq;
use url::Url;

/// Whether the target looks like an absolute HTTP(S) URL,
/// matching `^https?://` case-insensitively.
pub(crate) fn is_http_url(target: &str) -> bool {
    has_prefix_ignore_case(target, "http://") || has_prefix_ignore_case(target, "https://")
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Extracts the host of an absolute URL, if parsable.
pub(crate) fn url_host(target: &str) -> Option<String> {
    Url::parse(target)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
}

/// Constant-time host equality. Length differences short-circuit inside
/// `subtle`, which is fine: host lengths are not secret.
pub(crate) fn hosts_equal(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
