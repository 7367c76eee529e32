use log::debug;

use crate::{comments::strip_comments, regions::split_regions};

/// Whole-bundle transformation applied once after traversal
///
/// Code around the `plugindef` function is stripped of comments and blank
/// lines; the `plugindef` region only loses its comments so that its layout
/// is kept. With `strip` off the bundle is returned unchanged.
pub fn finalize_bundle(bundle: &str, strip: bool) -> String {
    if !strip {
        return bundle.to_owned();
    }

    let parts = split_regions(bundle);
    debug!(
        "Post-processing bundle: prolog {} bytes, plugindef {} bytes, epilog {} bytes",
        parts.prolog.len(),
        parts.plugindef.len(),
        parts.epilog.len()
    );

    let mut finalized = strip_comments(parts.prolog, true);
    finalized.push_str(&strip_comments(parts.plugindef, false));
    finalized.push_str(&strip_comments(parts.epilog, true));
    finalized
}
