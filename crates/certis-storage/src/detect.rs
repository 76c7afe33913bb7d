//! Content-type sniffing for uploads that arrive untyped.

/// Guess a MIME type from the leading bytes of an upload.
///
/// Covers the formats the platform actually stores (evidence PDFs, report
/// archives, screenshots); everything else falls back to
/// `application/octet-stream`.
pub fn detect_content_type(head: &[u8]) -> &'static str {
    if head.starts_with(b"%PDF-") {
        return "application/pdf";
    }

    if head.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return "image/png";
    }

    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }

    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return "image/gif";
    }

    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return "image/webp";
    }

    if head.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
        return "application/zip";
    }

    if head.starts_with(&[0x1F, 0x8B]) {
        return "application/gzip";
    }

    if !head.is_empty() && head.iter().take(512).all(|b| !is_binary_byte(*b)) {
        return "text/plain; charset=utf-8";
    }

    "application/octet-stream"
}

fn is_binary_byte(b: u8) -> bool {
    b < 0x08 || (0x0E..0x20).contains(&b) && b != 0x1B || b == 0x7F
}
