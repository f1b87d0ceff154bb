//! Shareable paths for persisted sequences

/// Default path prefix under which sequences are shared
pub const DEFAULT_PREFIX: &str = "/literate-diffs";

/// `<prefix>/<id>`
pub fn share_path(prefix: &str, id: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), id)
}

/// The id embedded in a share path: the first segment after `prefix`.
/// Returns `None` for paths outside the prefix.
pub fn id_from_path<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix.trim_end_matches('/'))?;
    let rest = rest.strip_prefix('/')?;
    rest.split('/').next().filter(|id| !id.is_empty())
}
