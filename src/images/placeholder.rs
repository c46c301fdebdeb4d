//! Last-resort SVG placeholder, delivered inline as a data URI.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::experiments::bucketing::hash_string;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const PALETTE: [&str; 6] = ["#6366f1", "#8b5cf6", "#06b6d4", "#10b981", "#f59e0b", "#ef4444"];

pub const DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

/// Background colour for a term; the same term always gets the same colour.
pub fn colour_for(term: &str) -> &'static str {
    PALETTE[hash_string(term) as usize % PALETTE.len()]
}

pub fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

pub fn svg_markup(term: &str) -> String {
    let label = if term.trim().is_empty() { "Image Placeholder".to_string() } else { escape_xml(term) };
    let bg = colour_for(term);
    format!(
        r##"<svg width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg">
  <rect width="100%" height="100%" fill="{bg}"/>
  <rect width="90%" height="80%" x="5%" y="10%" fill="none" stroke="#ffffff" stroke-width="2" stroke-dasharray="10,5"/>
  <text x="50%" y="45%" dominant-baseline="middle" text-anchor="middle" fill="#ffffff" font-family="Arial, sans-serif" font-size="24" font-weight="bold">Fashion Design</text>
  <text x="50%" y="55%" dominant-baseline="middle" text-anchor="middle" fill="#ffffff" font-family="Arial, sans-serif" font-size="16">{label}</text>
  <text x="50%" y="75%" dominant-baseline="middle" text-anchor="middle" fill="#ffffff" font-family="Arial, sans-serif" font-size="12" opacity="0.8">Fashun.co.in</text>
</svg>"##
    )
}

pub fn svg_data_uri(term: &str) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(svg_markup(term)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(uri: &str) -> String {
        let payload = uri.strip_prefix(DATA_URI_PREFIX).unwrap();
        String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn test_produces_base64_svg() {
        let svg = decode(&svg_data_uri("black hoodie"));
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">black hoodie</text>"));
    }

    #[test]
    fn test_escapes_markup_in_term() {
        let svg = decode(&svg_data_uri("<script>alert('x')</script> & co"));
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("&lt;script&gt;alert(&apos;x&apos;)&lt;/script&gt; &amp; co"));
    }

    #[test]
    fn test_colour_is_deterministic() {
        assert_eq!(colour_for("streetwear"), colour_for("streetwear"));
        assert!(PALETTE.contains(&colour_for("")));
        assert!(decode(&svg_data_uri("")).contains("Image Placeholder"));
    }
}
