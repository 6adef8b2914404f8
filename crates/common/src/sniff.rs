//! Content type detection
//!
//! Archive entries carry no stored MIME type, so the type is taken from the
//! payload: a table of magic signatures first, then a text / binary split of
//! the leading bytes. The entry's file name only narrows the type within
//! whichever side of that split the bytes fell on.

use std::path::Path;

/// Bytes inspected when sniffing.
pub const SNIFF_LEN: usize = 512;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

struct Signature {
    offset: usize,
    magic: &'static [u8],
    mime: &'static str,
}

const SIGNATURES: &[Signature] = &[
    Signature {
        offset: 0,
        magic: b"%PDF-",
        mime: "application/pdf",
    },
    Signature {
        offset: 0,
        magic: b"\x89PNG\r\n\x1a\n",
        mime: "image/png",
    },
    Signature {
        offset: 0,
        magic: b"\xff\xd8\xff",
        mime: "image/jpeg",
    },
    Signature {
        offset: 0,
        magic: b"GIF87a",
        mime: "image/gif",
    },
    Signature {
        offset: 0,
        magic: b"GIF89a",
        mime: "image/gif",
    },
    Signature {
        offset: 0,
        magic: b"BM",
        mime: "image/bmp",
    },
    Signature {
        offset: 0,
        magic: b"\x00\x00\x01\x00",
        mime: "image/x-icon",
    },
    Signature {
        offset: 8,
        magic: b"WEBP",
        mime: "image/webp",
    },
    Signature {
        offset: 0,
        magic: b"PK\x03\x04",
        mime: "application/zip",
    },
    Signature {
        offset: 0,
        magic: b"\x1f\x8b\x08",
        mime: "application/x-gzip",
    },
    Signature {
        offset: 0,
        magic: b"Rar!\x1a\x07",
        mime: "application/x-rar-compressed",
    },
    Signature {
        offset: 0,
        magic: b"7z\xbc\xaf\x27\x1c",
        mime: "application/x-7z-compressed",
    },
    Signature {
        offset: 0,
        magic: b"\x00asm",
        mime: "application/wasm",
    },
    Signature {
        offset: 0,
        magic: b"OggS\x00",
        mime: "application/ogg",
    },
    Signature {
        offset: 0,
        magic: b"ID3",
        mime: "audio/mpeg",
    },
    Signature {
        offset: 0,
        magic: b"fLaC",
        mime: "audio/flac",
    },
    Signature {
        offset: 4,
        magic: b"ftyp",
        mime: "video/mp4",
    },
    Signature {
        offset: 0,
        magic: b"\x1aE\xdf\xa3",
        mime: "video/webm",
    },
    Signature {
        offset: 0,
        magic: b"%!PS-Adobe-",
        mime: "application/postscript",
    },
    Signature {
        offset: 0,
        magic: b"wOFF",
        mime: "font/woff",
    },
    Signature {
        offset: 0,
        magic: b"wOF2",
        mime: "font/woff2",
    },
];

const HTML_MARKERS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Best-effort content type for `data`. `name` never turns a binary payload
/// into text or the other way round.
pub fn detect_content_type(data: &[u8], name: Option<&Path>) -> String {
    let sample = &data[..data.len().min(SNIFF_LEN)];

    if let Some(mime) = sniff_bom(sample) {
        return mime.to_string();
    }

    if let Some(sig) = SIGNATURES.iter().find(|sig| {
        sample
            .get(sig.offset..sig.offset + sig.magic.len())
            .map(|window| window == sig.magic)
            .unwrap_or(false)
    }) {
        return sig.mime.to_string();
    }

    let text = trim_leading_whitespace(sample);
    if HTML_MARKERS.iter().any(|marker| has_tag_prefix(text, marker)) {
        return "text/html; charset=utf-8".to_string();
    }
    if text.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8".to_string();
    }

    let binary = sample.iter().any(|b| is_binary_byte(*b));
    let guess = name
        .and_then(|n| mime_guess::from_path(n).first())
        .filter(|g| g.essence_str() != OCTET_STREAM);

    match guess {
        // the payload decides between text and binary, the name only refines it
        Some(guess) if binary && guess.type_() != mime_guess::mime::TEXT => guess.to_string(),
        Some(guess) if !binary && guess.type_() == mime_guess::mime::TEXT => {
            with_utf8_charset(&guess)
        }
        Some(guess) if !binary && is_textual(&guess) => guess.to_string(),
        _ if binary => OCTET_STREAM.to_string(),
        _ => TEXT_PLAIN.to_string(),
    }
}

/// Types that are text on the wire without being `text/*`.
fn is_textual(mime: &mime_guess::Mime) -> bool {
    matches!(
        mime.essence_str(),
        "application/json" | "application/javascript" | "application/xml" | "image/svg+xml"
    )
}

fn with_utf8_charset(mime: &mime_guess::Mime) -> String {
    if mime.get_param(mime_guess::mime::CHARSET).is_some() {
        mime.to_string()
    } else {
        format!("{}; charset=utf-8", mime.essence_str())
    }
}

fn sniff_bom(sample: &[u8]) -> Option<&'static str> {
    if sample.starts_with(b"\xef\xbb\xbf") {
        Some(TEXT_PLAIN)
    } else if sample.starts_with(b"\xfe\xff") {
        Some("text/plain; charset=utf-16be")
    } else if sample.starts_with(b"\xff\xfe") {
        Some("text/plain; charset=utf-16le")
    } else {
        None
    }
}

fn trim_leading_whitespace(sample: &[u8]) -> &[u8] {
    let start = sample
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(sample.len());
    &sample[start..]
}

/// Case-insensitive tag match that requires the tag to be terminated by a
/// space or `>`, so `<Address` does not count as `<A`.
fn has_tag_prefix(text: &[u8], marker: &[u8]) -> bool {
    if text.len() < marker.len() + 1 {
        return false;
    }
    let head = &text[..marker.len()];
    if !head.eq_ignore_ascii_case(marker) {
        return false;
    }
    marker == b"<!--" || matches!(text[marker.len()], b' ' | b'>')
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf() {
        assert_eq!(
            detect_content_type(b"%PDF-1.7\n...", None),
            "application/pdf"
        );
    }

    #[test]
    fn test_png() {
        let data = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
        assert_eq!(detect_content_type(data, None), "image/png");
    }

    #[test]
    fn test_webp_offset() {
        assert_eq!(
            detect_content_type(b"RIFF\x00\x00\x00\x00WEBPVP8 ", None),
            "image/webp"
        );
    }

    #[test]
    fn test_html() {
        assert_eq!(
            detect_content_type(b"  \n<!doctype html><html></html>", None),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            detect_content_type(b"<p>hi</p>", None),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_tag_needs_terminator() {
        assert_eq!(detect_content_type(b"<Address>", None), TEXT_PLAIN);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(detect_content_type(b"just some words\n", None), TEXT_PLAIN);
    }

    #[test]
    fn test_binary() {
        assert_eq!(detect_content_type(&[0u8, 1, 2, 3, 250], None), OCTET_STREAM);
    }

    #[test]
    fn test_empty_is_text() {
        assert_eq!(detect_content_type(b"", None), TEXT_PLAIN);
    }

    #[test]
    fn test_name_hint_when_bytes_are_ambiguous() {
        let mime = detect_content_type(b"body { color: red; }", Some(Path::new("site.css")));
        assert_eq!(mime, "text/css; charset=utf-8");
    }

    #[test]
    fn test_signature_beats_name_hint() {
        let mime = detect_content_type(b"%PDF-1.4", Some(Path::new("notes.txt")));
        assert_eq!(mime, "application/pdf");
    }

    #[test]
    fn test_text_name_hint_gets_charset() {
        assert_eq!(
            detect_content_type(b"plain words", Some(Path::new("a/b.txt"))),
            TEXT_PLAIN
        );
    }

    #[test]
    fn test_binary_payload_overrides_text_name() {
        let data = [0u8, 1, 2, 3, 0xfa, 0, 0];
        assert_eq!(
            detect_content_type(&data, Some(Path::new("blob.txt"))),
            OCTET_STREAM
        );
    }

    #[test]
    fn test_binary_name_hint_refines_binary_payload() {
        let data = [0xffu8, 0xfb, 0x90, 0x00, 0x01];
        assert_eq!(
            detect_content_type(&data, Some(Path::new("track.mp3"))),
            "audio/mpeg"
        );
    }

    #[test]
    fn test_text_payload_ignores_binary_name() {
        assert_eq!(
            detect_content_type(b"not really an image", Some(Path::new("fake.png"))),
            TEXT_PLAIN
        );
    }

    #[test]
    fn test_json_name_hint() {
        assert_eq!(
            detect_content_type(b"{\"a\": 1}", Some(Path::new("data.json"))),
            "application/json"
        );
    }
}
