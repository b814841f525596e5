//! Orphaned picture detection

use crate::PICTURES_DIR;

/// Archive entries under `Pictures/` that none of `buffers` mention.
///
/// A picture counts as referenced when its full archive path appears
/// literally in any buffer, which is how `xlink:href` attributes spell it.
pub fn find_orphans<'a, I>(entry_names: I, buffers: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    entry_names
        .into_iter()
        .filter(|name| name.starts_with(PICTURES_DIR) && !name.ends_with('/'))
        .filter(|name| !buffers.iter().any(|buffer| buffer.contains(name)))
        .map(str::to_string)
        .collect()
}
