//! MIME type detection module
//!
//! Maps file extensions to Content-Type values. A handful of entries are
//! pinned (`.html`, `.wasm`, no extension); everything else falls back to the
//! built-in table and finally to `application/octet-stream`.

use std::collections::HashMap;
use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Entries that take precedence over the built-in table
const PINNED: [(&str, &str); 3] = [
    (".html", "text/html"),
    (".wasm", "application/wasm"),
    ("", OCTET_STREAM),
];

/// Extension → MIME mapping, keyed by the dotted lowercase extension
/// (`".wasm"`) or `""` for files without one. Read-only once built.
#[derive(Debug, Clone)]
pub struct ExtensionMap {
    entries: HashMap<String, String>,
}

impl Default for ExtensionMap {
    fn default() -> Self {
        Self {
            entries: PINNED
                .iter()
                .map(|(ext, mime)| ((*ext).to_string(), (*mime).to_string()))
                .collect(),
        }
    }
}

impl ExtensionMap {
    /// Build the default map plus configured entries. Keys may be given with
    /// or without the leading dot.
    pub fn with_overrides(extra: &HashMap<String, String>) -> Self {
        let mut map = Self::default();
        for (ext, mime) in extra {
            map.entries.insert(normalize_key(ext), mime.clone());
        }
        map
    }

    /// Content-Type for the file at `path`
    ///
    /// # Examples
    /// ```
    /// use servetool::http::mime::ExtensionMap;
    /// use std::path::Path;
    ///
    /// let map = ExtensionMap::default();
    /// assert_eq!(map.lookup(Path::new("pkg/app_bg.wasm")), "application/wasm");
    /// assert_eq!(map.lookup(Path::new("index.html")), "text/html");
    /// assert_eq!(map.lookup(Path::new("LICENSE")), "application/octet-stream");
    /// ```
    pub fn lookup(&self, path: &Path) -> &str {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());

        let key = ext.as_deref().map_or_else(String::new, |e| format!(".{e}"));
        if let Some(mime) = self.entries.get(&key) {
            return mime;
        }

        builtin_content_type(ext.as_deref())
    }
}

fn normalize_key(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Fallback table for extensions not in the map
fn builtin_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",

        // Scripts and data
        Some("js" | "mjs") => "text/javascript",
        Some("json" | "map") => "application/json",
        Some("webmanifest") => "application/manifest+json",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/vnd.microsoft.icon",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",
        Some("hdr") => "image/vnd.radiance",
        Some("ktx2") => "image/ktx2",

        // 3D assets
        Some("gltf") => "model/gltf+json",
        Some("glb") => "model/gltf-binary",
        Some("obj") => "model/obj",

        // Video
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",

        // Audio
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg" | "oga") => "audio/ogg",
        Some("flac") => "audio/flac",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Shaders
        Some("wgsl" | "glsl" | "vert" | "frag") => "text/plain",

        // Archives and documents
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("tar") => "application/x-tar",

        _ => OCTET_STREAM,
    }
}
