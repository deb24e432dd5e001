//! Inline stylesheet and script placeholders in an HTML shell.
//!
//! Placeholder tags are matched by file name only, so the shell can
//! reference sources by whatever relative path suits local previewing.
//! The first stylesheet placeholder becomes one `<style>` block with
//! the combined CSS; placeholders for the remaining stylesheets are
//! erased. The entry script placeholder becomes an inline `<script>`
//! with the bundle.

use std::path::{Path, PathBuf};

use anyhow::Result;
use regex::Regex;

/// Replace `<link>` tags for the listed stylesheets with a single
/// inline `<style>` block containing the combined CSS.
pub fn inline_stylesheets(
    html: &str,
    css_files: &[PathBuf],
    combined_css: &str,
) -> Result<String> {
    let mut html = html.to_string();
    let style_block = format!("<style>\n{}\n</style>", combined_css);
    let mut inlined = false;

    for file in css_files {
        let name = file_name(file);
        let pattern = format!(
            r#"<link[^>]*?href="[^"]*?{}"[^>]*?/?>"#,
            regex::escape(&name)
        );
        let re = Regex::new(&pattern)?;
        match re.find(&html) {
            Some(found) => {
                // Later matches are erased, not duplicated.
                let range = found.start()..found.end();
                if inlined {
                    html.replace_range(range, "");
                } else {
                    html.replace_range(range, &style_block);
                    inlined = true;
                }
            }
            None => {
                log::warn!(
                    "no <link> tag references {:?}; stylesheet not inlined",
                    name
                );
            }
        }
    }

    Ok(html)
}

/// Replace the `<script src>` tag for the entry module with an inline
/// `<script>` containing the bundle.
pub fn inline_entry_script(
    html: &str,
    js_entry: &Path,
    bundle: &str,
) -> Result<String> {
    let mut html = html.to_string();
    let name = file_name(js_entry);
    let pattern = format!(
        r#"<script[^>]*?src="[^"]*?{}"[^>]*?></script>"#,
        regex::escape(&name)
    );
    let re = Regex::new(&pattern)?;
    match re.find(&html) {
        Some(found) => {
            let range = found.start()..found.end();
            let script_block = format!("<script>\n{}\n</script>", bundle);
            html.replace_range(range, &script_block);
        }
        None => {
            log::warn!(
                "no <script> tag references {:?}; bundle not inlined",
                name
            );
        }
    }

    Ok(html)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
