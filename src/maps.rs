//! Multi-stop directions links.

/// Directions endpoint that takes each stop as a path segment.
pub const DIRECTIONS_BASE_URL: &str = "https://www.google.com/maps/dir/";

/// Builds a directions link visiting `addresses` in order.
pub fn directions_link<S: AsRef<str>>(addresses: &[S]) -> String {
    directions_link_with_base(DIRECTIONS_BASE_URL, addresses)
}

/// Like [`directions_link`] with a custom base. A trailing `/` is added to the
/// base when missing; the link always ends with `/`.
pub fn directions_link_with_base<S: AsRef<str>>(base: &str, addresses: &[S]) -> String {
    let segments = addresses
        .iter()
        .map(|address| urlencoding::encode(address.as_ref()).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    let separator = if base.ends_with('/') { "" } else { "/" };
    format!("{base}{separator}{segments}/")
}
