//! Directory index generation
//!
//! Used when a directory has no index file. Entries are sorted
//! case-insensitively; directories get a trailing `/`, symlinks a trailing `@`.

use crate::error::RequestError;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

/// Read `dir` and render its listing; `request_path` is the raw URL path
pub async fn render_listing(dir: &Path, request_path: &str) -> Result<String, RequestError> {
    let mut reader = fs::read_dir(dir)
        .await
        .map_err(|e| RequestError::from_io(dir, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| RequestError::from_io(dir, e))?
    {
        let Ok(file_type) = entry.file_type().await else {
            continue;
        };
        let is_symlink = file_type.is_symlink();
        let is_dir = if is_symlink {
            fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir())
        } else {
            file_type.is_dir()
        };

        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_key(|e| e.name.to_lowercase());

    let display_path = urlencoding::decode(request_path)
        .map_or_else(|_| request_path.to_string(), std::borrow::Cow::into_owned);
    Ok(render_html(&display_path, &entries))
}

pub fn render_html(display_path: &str, entries: &[ListingEntry]) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));

    let mut html = String::new();
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{title}</title>\n</head>\n<body>");
    let _ = writeln!(html, "<h1>{title}</h1>\n<hr>\n<ul>");

    for entry in entries {
        let mut display = entry.name.clone();
        let mut link = urlencoding::encode(&entry.name).into_owned();
        if entry.is_dir {
            display.push('/');
            link.push('/');
        }
        if entry.is_symlink {
            display.push('@');
        }
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            escape_html(&link),
            escape_html(&display)
        );
    }

    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
