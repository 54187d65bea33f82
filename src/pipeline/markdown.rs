//! Inline OCR-extracted images into the Markdown document.
//!
//! Markdown-producing OCR services return figures separately from the text:
//! the document references them by name (`![](img_0.jpg)`) and the response
//! carries a name → base64 map. The attachment handed to the user must be
//! self-contained, so each reference is rewritten to a `data:` URI.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").unwrap());

/// Prefix applied to bare base64 payloads.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Whether an image value is already a complete data URI.
pub fn is_data_uri(value: &str) -> bool {
    value.trim_start().starts_with("data:")
}

/// Replace every image reference whose target names an entry in `images`.
///
/// Entries that already hold a data URI are skipped, and references to
/// unknown names are left untouched. Alt text is preserved. The output
/// depends only on the inputs, so replaying the same response is
/// byte-identical.
pub fn inline_images(markdown: &str, images: &BTreeMap<String, String>) -> String {
    if images.is_empty() {
        return markdown.to_string();
    }
    RE_IMAGE
        .replace_all(markdown, |caps: &regex::Captures<'_>| {
            let alt = &caps[1];
            let target = caps[2].trim();
            match images.get(target) {
                Some(value) if !is_data_uri(value) => {
                    format!("![{}]({}{})", alt, JPEG_DATA_URI_PREFIX, value.trim())
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bare_reference_becomes_data_uri() {
        let out = inline_images("![](img1)", &images(&[("img1", "ZZZ")]));
        assert_eq!(out, "![](data:image/jpeg;base64,ZZZ)");
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let md = "a ![](p.jpg) b ![](p.jpg)";
        let out = inline_images(md, &images(&[("p.jpg", "QQ")]));
        assert_eq!(out.matches("data:image/jpeg;base64,QQ").count(), 2);
    }

    #[test]
    fn alt_text_is_kept() {
        let out = inline_images("![Figure 1](f1)", &images(&[("f1", "AA")]));
        assert_eq!(out, "![Figure 1](data:image/jpeg;base64,AA)");
    }

    #[test]
    fn existing_data_uri_values_are_skipped() {
        let md = "![](img1)";
        let out = inline_images(md, &images(&[("img1", "data:image/png;base64,AAA")]));
        assert_eq!(out, md);
    }

    #[test]
    fn unknown_references_are_untouched() {
        let md = "![](https://example.org/x.png) and ![](other)";
        let out = inline_images(md, &images(&[("img1", "ZZZ")]));
        assert_eq!(out, md);
    }

    #[test]
    fn no_images_is_identity() {
        let md = "# Title\n\n![](img1)\n";
        assert_eq!(inline_images(md, &BTreeMap::new()), md);
    }
}
