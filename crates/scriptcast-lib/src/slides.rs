//! Slide-deck text extraction — base64 PPTX → slide text in slide order.
//!
//! A PPTX is a ZIP archive with one `ppt/slides/slideN.xml` per slide. Text
//! runs live in `<a:t>` elements; everything else is ignored.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use base64::{Engine, engine::general_purpose};
use regex::Regex;
use tracing::info;

use crate::error::{Error, Result};

static RE_SLIDE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d*)\.xml$").unwrap());
static RE_TEXT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a:t(?:\s[^>]*)?>([^<]*)</a:t>").unwrap());
static RE_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(amp|lt|gt|quot|apos|#\d+|#x[0-9a-fA-F]+);").unwrap());

/// Text pulled from a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideText {
    /// One paragraph per slide that had text, separated by blank lines.
    pub text: String,
    /// Number of slide files in the archive, including empty slides.
    pub slide_count: usize,
}

/// Decode a base64 PPTX and extract its slide text.
pub fn extract_text(data: &str) -> Result<SlideText> {
    let data = data.trim();
    if data.is_empty() {
        return Err(Error::MissingParameter("data"));
    }
    // Data URLs from browsers carry a "data:...;base64," prefix.
    let data = data.split_once(";base64,").map_or(data, |(_, b64)| b64);
    let bytes = general_purpose::STANDARD.decode(data)?;
    extract_from_bytes(&bytes)
}

/// Extract slide text from raw PPTX bytes.
pub fn extract_from_bytes(bytes: &[u8]) -> Result<SlideText> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let caps = RE_SLIDE_PATH.captures(name)?;
            let number = caps[1].parse().unwrap_or(0);
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    let mut paragraphs = Vec::new();
    for (_, name) in &slides {
        let mut xml = String::new();
        archive.by_name(name)?.read_to_string(&mut xml)?;

        let runs: Vec<String> = RE_TEXT_RUN
            .captures_iter(&xml)
            .map(|caps| unescape_xml(&caps[1]).trim().to_string())
            .filter(|run| !run.is_empty())
            .collect();
        if !runs.is_empty() {
            paragraphs.push(runs.join(" "));
        }
    }

    if paragraphs.is_empty() {
        return Err(Error::EmptyResult(
            "No text content found in PowerPoint file".into(),
        ));
    }

    let text = paragraphs.join("\n\n");
    info!("extracted {} chars from {} slides", text.len(), slides.len());

    Ok(SlideText {
        text,
        slide_count: slides.len(),
    })
}

fn unescape_xml(s: &str) -> String {
    RE_ENTITY
        .replace_all(s, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .unwrap_or_else(|| entity[1..].parse())
                    .ok()
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    fn slide_xml(runs: &[&str]) -> String {
        let body: String = runs
            .iter()
            .map(|r| format!("<a:r><a:t>{r}</a:t></a:r>"))
            .collect();
        format!(r#"<?xml version="1.0"?><p:sld><p:txBody>{body}</p:txBody></p:sld>"#)
    }

    fn pptx(files: &[(&str, String)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn slides_in_numeric_order() {
        let bytes = pptx(&[
            ("ppt/slides/slide10.xml", slide_xml(&["Ten"])),
            ("ppt/slides/slide2.xml", slide_xml(&["Two", "  more "])),
            ("ppt/slides/slide1.xml", slide_xml(&["One"])),
            ("ppt/slides/_rels/slide1.xml.rels", "<a:t>rels</a:t>".into()),
            ("ppt/presentation.xml", slide_xml(&["ignored"])),
        ]);
        let out = extract_from_bytes(&bytes).unwrap();
        assert_eq!(out.text, "One\n\nTwo more\n\nTen");
        assert_eq!(out.slide_count, 3);
    }

    #[test]
    fn empty_slides_are_skipped_but_counted() {
        let bytes = pptx(&[
            ("ppt/slides/slide1.xml", slide_xml(&["  "])),
            ("ppt/slides/slide2.xml", slide_xml(&["Hello"])),
        ]);
        let out = extract_from_bytes(&bytes).unwrap();
        assert_eq!(out.text, "Hello");
        assert_eq!(out.slide_count, 2);
    }

    #[test]
    fn no_text_is_empty_result() {
        let bytes = pptx(&[("ppt/slides/slide1.xml", slide_xml(&[]))]);
        assert!(matches!(extract_from_bytes(&bytes), Err(Error::EmptyResult(_))));
    }

    #[test]
    fn unescapes_entities() {
        let bytes = pptx(&[("ppt/slides/slide1.xml", slide_xml(&["Q&amp;A &lt;live&gt; &#233;t&#xE9;"]))]);
        assert_eq!(extract_from_bytes(&bytes).unwrap().text, "Q&A <live> été");
    }

    #[test]
    fn run_with_attributes() {
        let xml = r#"<a:t xml:space="preserve"> spaced </a:t>"#.to_string();
        let bytes = pptx(&[("ppt/slides/slide1.xml", xml)]);
        assert_eq!(extract_from_bytes(&bytes).unwrap().text, "spaced");
    }

    #[test]
    fn base64_and_data_url_input() {
        let bytes = pptx(&[("ppt/slides/slide1.xml", slide_xml(&["Hi"]))]);
        let b64 = general_purpose::STANDARD.encode(&bytes);
        assert_eq!(extract_text(&b64).unwrap().text, "Hi");
        let data_url = format!("data:application/vnd.ms-powerpoint;base64,{b64}");
        assert_eq!(extract_text(&data_url).unwrap().text, "Hi");
    }

    #[test]
    fn missing_and_invalid_input() {
        assert!(matches!(extract_text(""), Err(Error::MissingParameter("data"))));
        assert!(matches!(extract_text("@@@"), Err(Error::Decode(_))));
        let not_zip = general_purpose::STANDARD.encode(b"plain text");
        assert!(matches!(extract_text(&not_zip), Err(Error::Archive(_))));
    }
}
