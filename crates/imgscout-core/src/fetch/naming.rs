//! Output file naming: sanitized alt text or ordinal, URL-derived extension, and
//! collision-free allocation within one process.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Extensions kept from the URL path; anything else is saved as [`DEFAULT_EXTENSION`].
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Suffix of the file bytes stream into before verification.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the in-progress file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Makes alt text safe as a file stem.
///
/// - Replaces path separators, `* ? : " < > |`, whitespace and control characters with `_`
/// - Collapses consecutive underscores
/// - Keeps at most `max_chars` characters
/// - Trims leading/trailing dots and underscores
pub fn sanitize_stem(name: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(name.len().min(max_chars * 4));
    let mut prev_underscore = false;
    let mut kept = 0usize;

    for c in name.chars() {
        if kept >= max_chars {
            break;
        }
        let unsafe_char = c.is_control()
            || c.is_whitespace()
            || matches!(c, '/' | '\\' | '*' | '?' | ':' | '"' | '<' | '>' | '|');
        if unsafe_char {
            if !prev_underscore {
                out.push('_');
                kept += 1;
            }
            prev_underscore = true;
        } else {
            out.push(c);
            kept += 1;
            prev_underscore = false;
        }
    }

    out.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// File stem for a download: sanitized alt text, or `image_<ordinal>` when there is none.
pub fn base_name(alt: Option<&str>, ordinal: usize, max_chars: usize) -> String {
    alt.map(|a| sanitize_stem(a, max_chars))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("image_{}", ordinal))
}

/// Extension from the last URL path segment when it is a known image type, else `jpg`.
pub fn extension_from_url(url: &str) -> &'static str {
    let Ok(parsed) = url::Url::parse(url) else {
        return DEFAULT_EXTENSION;
    };
    let Some(segment) = parsed.path().rsplit('/').next() else {
        return DEFAULT_EXTENSION;
    };
    let Some((_, ext)) = segment.rsplit_once('.') else {
        return DEFAULT_EXTENSION;
    };
    IMAGE_EXTENSIONS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(ext))
        .copied()
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Hands out unused paths in one directory: `stem.ext`, then `stem_1.ext`, `stem_2.ext`, ...
///
/// A path is taken when it (or its `.part` file) exists on disk or was handed out earlier
/// and not released. Sequential use within one process only.
#[derive(Debug)]
pub struct NameAllocator {
    dir: PathBuf,
    reserved: HashSet<PathBuf>,
}

impl NameAllocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            reserved: HashSet::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_taken(&self, path: &Path) -> bool {
        self.reserved.contains(path) || path.exists() || temp_path(path).exists()
    }

    pub fn allocate(&mut self, stem: &str, ext: &str) -> PathBuf {
        let mut path = self.dir.join(format!("{}.{}", stem, ext));
        let mut counter = 1u32;
        while self.is_taken(&path) {
            path = self.dir.join(format!("{}_{}.{}", stem, counter, ext));
            counter += 1;
        }
        self.reserved.insert(path.clone());
        path
    }

    /// Makes a path available again after a failed download.
    pub fn release(&mut self, path: &Path) {
        self.reserved.remove(path);
    }
}
