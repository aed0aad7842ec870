//! Content-type detection from magic bytes.

use medway_core::PendingFile;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Enough leading bytes to cover every signature `infer` knows about.
pub const SNIFF_LEN: usize = 4100;

const ALLOWED_IMAGE_TYPES: [&str; 4] = ["jpg", "png", "gif", "webp"];

/// Read a bounded prefix and classify the file's real type, independent of
/// its name. `None` means the content matched no known signature, which
/// includes files shorter than any signature.
pub async fn detect_extension(path: &Path) -> io::Result<Option<&'static str>> {
    let mut file = File::open(path).await?;
    let mut buf = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    loop {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
        if filled == buf.len() {
            break;
        }
    }
    buf.truncate(filled);

    Ok(infer::get(&buf).map(|kind| kind.extension()))
}

pub fn is_allowed_image_ext(ext: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&ext)
}

/// True iff the file's sniffed type is one of the image formats the
/// pipeline accepts. Read failures propagate; they are not the same thing
/// as "not an image".
pub async fn is_allowed_image(file: &PendingFile) -> io::Result<bool> {
    let ext = detect_extension(&file.path).await?;
    Ok(ext.is_some_and(is_allowed_image_ext))
}

/// Canonical content type for a sniffed image extension.
pub fn image_content_type(ext: &str) -> &'static str {
    match ext {
        "jpg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
