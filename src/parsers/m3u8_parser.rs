//! M3U8 playlist parsing utilities

use url::Url;

/// Extract segment URLs from raw playlist content.
///
/// Blank lines and `#`-prefixed comment/tag lines are skipped; every other
/// line is resolved to an absolute URL against `manifest_url` (lines that are
/// already absolute are used as-is). Order follows the manifest; duplicate
/// lines are kept.
pub fn parse_segment_urls(
    content: &str,
    manifest_url: &str,
) -> Result<Vec<String>, url::ParseError> {
    let base = Url::parse(manifest_url)?;
    let mut segments = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let resolved = if line.starts_with("http://") || line.starts_with("https://") {
            line.to_string()
        } else {
            base.join(line)?.to_string()
        };
        segments.push(resolved);
    }

    Ok(segments)
}
