//! Timezone database resource replacement
//!
//! The timezone database has no fixed index in the pack; it is recognised by
//! a zone name it is known to contain.

use fwpatch_pack::ResourcePack;
use tracing::{info, warn};

/// Swap every resource containing `marker` for `replacement`.
///
/// Returns the pack's blobs in order, ready to re-encode, and the 1-based
/// indices that were replaced.
pub fn replace_tz_resource(
    pack: ResourcePack,
    marker: &[u8],
    replacement: &[u8],
) -> (Vec<Vec<u8>>, Vec<usize>) {
    let matches: Vec<bool> = pack
        .entries()
        .iter()
        .map(|entry| entry.contains(marker))
        .collect();

    let mut replaced = Vec::new();
    let resources = pack
        .into_resources()
        .into_iter()
        .zip(matches)
        .enumerate()
        .map(|(position, (data, is_tz))| {
            if is_tz {
                let index = position.saturating_add(1);
                info!(
                    index,
                    old_len = data.len(),
                    new_len = replacement.len(),
                    "Replaced timezone database resource"
                );
                replaced.push(index);
                replacement.to_vec()
            } else {
                data
            }
        })
        .collect();

    if replaced.is_empty() {
        warn!(
            marker = %String::from_utf8_lossy(marker),
            "No timezone database resource found, pack left unchanged"
        );
    }
    (resources, replaced)
}
