//! Filesystem resource dispatch
//!
//! Maps a resolved filesystem path onto one of three response strategies:
//! absent paths get a 404, directories get a generated HTML listing, and
//! regular files are returned whole with a guessed content type. Failures
//! are explicit [`ServeError`] values carrying the status and message to
//! send, never panics.

use crate::handler::router::RequestContext;
use crate::http::{self, mime};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// The filesystem state a resolved path was found in.
///
/// The three variants are mutually exclusive and, together with the `None`
/// classification result, cover every possible path state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Missing,
    Directory,
    File,
}

/// A failed dispatch outcome: the status and message to send back.
#[derive(Debug)]
pub struct ServeError {
    pub status: StatusCode,
    pub message: String,
}

impl ServeError {
    fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }
}

/// Resolve a request path against the configured root directory.
///
/// This is a raw concatenation of the root and the URL path: no `..`
/// normalization and no percent-decoding happen here, so a crafted request
/// can address paths outside the root. Left unguarded on purpose; see
/// DESIGN.md.
pub fn resolve_path(root: &str, request_path: &str) -> PathBuf {
    PathBuf::from(format!("{root}{request_path}"))
}

/// Classify a path into the handler that owns it.
///
/// Predicates run in priority order, each against a fresh filesystem probe:
/// absent first, then directory, then regular file. Returns `None` for paths
/// that exist but are neither (FIFOs, sockets, devices).
pub fn classify(path: &Path) -> Option<Resource> {
    if !path.exists() {
        return Some(Resource::Missing);
    }
    if path.is_dir() {
        return Some(Resource::Directory);
    }
    if path.is_file() {
        return Some(Resource::File);
    }
    None
}

/// Dispatch a resolved path to the first matching handler.
pub async fn serve(
    resolved: &Path,
    ctx: &RequestContext<'_>,
) -> Result<Response<Full<Bytes>>, ServeError> {
    match classify(resolved) {
        Some(Resource::Missing) => Err(ServeError::new(
            StatusCode::NOT_FOUND,
            format!("File/Directory not found: {}", ctx.path),
        )),
        Some(Resource::Directory) => serve_directory(resolved, ctx).await,
        Some(Resource::File) => serve_file(resolved, ctx).await,
        None => Err(ServeError::new(
            StatusCode::NOT_IMPLEMENTED,
            format!("Unsupported resource type: {}", resolved.display()),
        )),
    }
}

/// Serve a directory as a generated HTML listing
async fn serve_directory(
    dir: &Path,
    ctx: &RequestContext<'_>,
) -> Result<Response<Full<Bytes>>, ServeError> {
    let entries = list_entries(dir)
        .await
        .map_err(|e| listing_error(ctx.path, &e))?;
    let html = render_listing(ctx.path, &entries);
    Ok(http::build_html_response(html, ctx.is_head))
}

/// Enumerate a directory's immediate children, sorted lexicographically
async fn list_entries(dir: &Path) -> io::Result<Vec<(String, bool)>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await?.is_dir();
        entries.push((name, is_dir));
    }
    entries.sort();
    Ok(entries)
}

/// Render the listing page. Child directories get a trailing slash on both
/// the href and the displayed name.
fn render_listing(request_path: &str, entries: &[(String, bool)]) -> String {
    let title = format!("Directory listing for {request_path}");
    let mut page_parts = vec![
        format!("<html><head><title>{title}</title></head>"),
        format!("<body><h1>{title}</h1><hr><ul>"),
    ];
    for (name, is_dir) in entries {
        let link = if *is_dir {
            format!("{name}/")
        } else {
            name.clone()
        };
        page_parts.push(format!("<li><a href='{link}'>{link}</a></li>"));
    }
    page_parts.push("</ul><hr></body></html>".to_string());
    page_parts.join("\n")
}

/// Map a listing failure to a 403 naming the request path and the OS error
fn listing_error(request_path: &str, err: &io::Error) -> ServeError {
    ServeError::new(
        StatusCode::FORBIDDEN,
        format!("Permission denied accessing directory: {request_path}, Error: {err}"),
    )
}

/// Serve a regular file: whole-file read, content type guessed from the
/// extension
async fn serve_file(
    path: &Path,
    ctx: &RequestContext<'_>,
) -> Result<Response<Full<Bytes>>, ServeError> {
    // A file that disappears or becomes unreadable between the existence
    // check and the read is reported as not found.
    let content = fs::read(path)
        .await
        .map_err(|e| read_error(ctx.path, &e))?;
    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    Ok(http::build_file_response(content, content_type, ctx.is_head))
}

/// Map a file read failure to a 404 naming the request path and the OS error
fn read_error(request_path: &str, err: &io::Error) -> ServeError {
    ServeError::new(
        StatusCode::NOT_FOUND,
        format!("Could not read file: {request_path}, Error: {err}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            is_head: false,
            access_log: false,
        }
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_resolve_path_is_raw_concatenation() {
        assert_eq!(
            resolve_path("/srv/www", "/readme.html"),
            PathBuf::from("/srv/www/readme.html")
        );
        // Traversal segments pass through untouched
        assert_eq!(
            resolve_path("/srv/www", "/../etc/passwd"),
            PathBuf::from("/srv/www/../etc/passwd")
        );
    }

    #[test]
    fn test_classify_is_exclusive_and_exhaustive() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std_fs::write(&file, b"x").unwrap();
        let missing = dir.path().join("nope");

        assert_eq!(classify(dir.path()), Some(Resource::Directory));
        assert_eq!(classify(&file), Some(Resource::File));
        assert_eq!(classify(&missing), Some(Resource::Missing));
    }

    #[tokio::test]
    async fn test_missing_path_yields_404_with_request_path() {
        let dir = TempDir::new().unwrap();
        let resolved = dir.path().join("missing-thing");

        let err = serve(&resolved, &ctx("/missing-thing")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "File/Directory not found: /missing-thing");
    }

    #[tokio::test]
    async fn test_file_served_byte_identical() {
        let dir = TempDir::new().unwrap();
        let content = b"<html><body>Test content</body></html>";
        std_fs::write(dir.path().join("readme.html"), content).unwrap();
        let resolved = dir.path().join("readme.html");

        let resp = serve(&resolved, &ctx("/readme.html")).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/html");
        assert_eq!(resp.headers()["Content-Length"], "38");
        assert_eq!(body_bytes(resp).await.as_ref(), content);
    }

    #[tokio::test]
    async fn test_unknown_extension_served_as_octet_stream() {
        let dir = TempDir::new().unwrap();
        std_fs::write(dir.path().join("blob.xyz"), b"data").unwrap();
        let resolved = dir.path().join("blob.xyz");

        let resp = serve(&resolved, &ctx("/blob.xyz")).await.unwrap();
        assert_eq!(resp.headers()["Content-Type"], "application/octet-stream");
    }

    #[tokio::test]
    async fn test_directory_listing_sorted_with_trailing_slash() {
        let dir = TempDir::new().unwrap();
        std_fs::write(dir.path().join("a.html"), b"<html></html>").unwrap();
        std_fs::write(dir.path().join("b.txt"), b"text").unwrap();
        std_fs::create_dir(dir.path().join("sub")).unwrap();

        let resp = serve(dir.path(), &ctx("/adir/")).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/html; charset=utf-8");

        let body = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
        assert!(body.contains("Directory listing for /adir/"));
        assert!(body.contains("<li><a href='a.html'>a.html</a></li>"));
        assert!(body.contains("<li><a href='b.txt'>b.txt</a></li>"));
        assert!(body.contains("<li><a href='sub/'>sub/</a></li>"));

        // Entries appear in sorted order
        let a = body.find("a.html").unwrap();
        let b = body.find("b.txt").unwrap();
        let s = body.find("sub/").unwrap();
        assert!(a < b && b < s);
    }

    #[tokio::test]
    async fn test_listing_length_matches_encoded_bytes() {
        let dir = TempDir::new().unwrap();
        std_fs::write(dir.path().join("f.txt"), b"x").unwrap();

        let resp = serve(dir.path(), &ctx("/d/")).await.unwrap();
        let length: usize = resp.headers()["Content-Length"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(length, body_bytes(resp).await.len());
    }

    #[test]
    fn test_listing_error_maps_to_403() {
        let err = listing_error("/adir/", &io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(err.message.contains("/adir/"));
        assert!(err.message.contains("Permission denied"));
    }

    #[test]
    fn test_read_error_maps_to_404() {
        let err = read_error("/gone.txt", &io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.message.starts_with("Could not read file: /gone.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_special_file_yields_501() {
        use std::process::Command;

        let dir = TempDir::new().unwrap();
        let fifo = dir.path().join("pipe");
        let status = Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());

        assert_eq!(classify(&fifo), None);
        let err = serve(&fifo, &ctx("/pipe")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_IMPLEMENTED);
        assert!(err.message.starts_with("Unsupported resource type:"));
    }
}
