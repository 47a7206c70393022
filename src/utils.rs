//! Utility functions for output naming and path manipulation

use std::path::{Path, PathBuf};

/// Derive the on-disk path for a numbered chunk from the bundle base path
///
/// `/out/social_papers.pdf` with chunk 2 becomes `/out/social_papers_chunk2.pdf`.
pub fn chunk_path(base: &Path, chunk: u32) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_chunk{chunk}.{ext}"),
        None => format!("{stem}_chunk{chunk}"),
    };
    match base.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Replace characters that are awkward in filenames with safe equivalents
pub fn sanitize_name(name: &str) -> String {
    name.replace(':', "_").replace('&', "_and_")
}

/// Build the output base name for a collection bundle
///
/// Mirrors the naming convention for nested collection paths: the top-level
/// segment is dropped when the path is nested, the remaining segments are
/// joined with `_`, an optional subcollection name is appended, and the
/// result is sanitized and suffixed with `_papers`.
pub fn bundle_base_name(collection_path: &str, subcollection: Option<&str>) -> String {
    let segments: Vec<&str> = collection_path.split('>').map(str::trim).collect();
    let relevant = if segments.len() > 1 {
        &segments[1..]
    } else {
        &segments[..]
    };
    let mut name = relevant.join("_");
    if let Some(sub) = subcollection {
        name.push('_');
        name.push_str(sub);
    }
    format!("{}_papers", sanitize_name(&name))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_path_inserts_suffix_before_extension() {
        let base = Path::new("/out/social_papers.pdf");
        assert_eq!(
            chunk_path(base, 1),
            PathBuf::from("/out/social_papers_chunk1.pdf")
        );
        assert_eq!(
            chunk_path(base, 12),
            PathBuf::from("/out/social_papers_chunk12.pdf")
        );
    }

    #[test]
    fn chunk_path_without_extension() {
        let base = Path::new("bundle");
        assert_eq!(chunk_path(base, 3), PathBuf::from("bundle_chunk3"));
    }

    #[test]
    fn sanitize_name_replaces_awkward_characters() {
        assert_eq!(sanitize_name("s3:sci-insights"), "s3_sci-insights");
        assert_eq!(sanitize_name("mind & brain"), "mind _and_ brain");
    }

    #[test]
    fn bundle_base_name_drops_top_level_segment() {
        assert_eq!(
            bundle_base_name("TICS>s3:sci-insights>s3.3:social", None),
            "s3_sci-insights_s3.3_social_papers"
        );
    }

    #[test]
    fn bundle_base_name_single_segment() {
        assert_eq!(bundle_base_name("reading", None), "reading_papers");
    }

    #[test]
    fn bundle_base_name_appends_subcollection() {
        assert_eq!(
            bundle_base_name("rev>s2:advances", Some("s2.1:neurotech")),
            "s2_advances_s2.1_neurotech_papers"
        );
    }
}
