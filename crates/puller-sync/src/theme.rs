//! Theme manifest validation.
//!
//! A valid theme root contains a `style.css` whose header block declares a
//! non-empty `Theme Name`. The header is searched in the first 8 KiB, the
//! same window the host CMS reads.

use std::io::Read;
use std::path::Path;

use crate::SyncError;

const MANIFEST: &str = "style.css";
const HEADER_WINDOW: usize = 8192;

/// Validate `dir` as a theme root; returns the declared theme name.
///
/// On failure, one level of subdirectories is scanned for a manifest and a
/// discovered candidate is named in the error as a configuration hint.
pub fn validate_theme_root(dir: &Path) -> Result<String, SyncError> {
    let manifest = dir.join(MANIFEST);
    if !manifest.is_file() {
        let mut message = format!("missing {MANIFEST}");
        if let Some(candidate) = manifest_hint(dir) {
            message.push_str(&format!(
                "; found a theme in subdirectory {candidate:?}, set it as the theme path"
            ));
        }
        return Err(SyncError::NotATheme(message));
    }

    match read_theme_name(&manifest)? {
        Some(name) => Ok(name),
        None => Err(SyncError::NotATheme(format!(
            "{MANIFEST} has no Theme Name header"
        ))),
    }
}

/// Scan one level of subdirectories for a manifest with a theme name.
pub fn manifest_hint(dir: &Path) -> Option<String> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let manifest = entry.path().join(MANIFEST);
        if manifest.is_file() && matches!(read_theme_name(&manifest), Ok(Some(_))) {
            return Some(entry.file_name().to_string_lossy().into_owned());
        }
    }
    None
}

fn read_theme_name(manifest: &Path) -> Result<Option<String>, SyncError> {
    let mut file = std::fs::File::open(manifest)?;
    let mut buf = vec![0u8; HEADER_WINDOW];
    let read = file.read(&mut buf)?;
    buf.truncate(read);
    let header = String::from_utf8_lossy(&buf);
    Ok(parse_theme_name(&header))
}

fn parse_theme_name(header: &str) -> Option<String> {
    for line in header.lines() {
        let line = line.trim_start_matches(['/', '*', ' ', '\t']);
        let Some(rest) = strip_prefix_ignore_case(line, "theme name:") else {
            continue;
        };
        let name = rest.trim_end_matches("*/").trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    None
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
