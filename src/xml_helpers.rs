//! Shared XML attribute and text helpers for the container reader and writer.
//!
//! Attribute lookups handle UTF-8 conversion and unescaping; missing or
//! malformed attributes come back as `None`.

use std::fmt::Write as _;

use quick_xml::events::BytesStart;

/// Extract a string attribute value by key.
///
/// Returns `None` if the attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|s| s.into_owned());
        }
    }
    None
}

/// Extract a string attribute by local name (ignoring namespace prefix).
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return attr.unescape_value().ok().map(|s| s.into_owned());
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `f64` attribute value by key.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Returns `None` if missing. Recognizes `"1"`, `"true"` as true; anything else as false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

/// Extract the `val` attribute as a string. Very common in XLSX XML.
pub fn attr_val(e: &BytesStart) -> Option<String> {
    attr_string(e, b"val")
}

/// Extract the `val` attribute as `f64`.
pub fn attr_val_f64(e: &BytesStart) -> Option<f64> {
    attr_f64(e, b"val")
}

/// Boolean toggle elements such as `<b/>` or `<i val="0"/>`: present means
/// on unless `val` says otherwise.
pub fn toggle_on(e: &BytesStart) -> bool {
    attr_val(e).map_or(true, |v| !matches!(v.as_str(), "0" | "false"))
}

/// Normalize a file color to `RRGGBB` (opaque) or `RRGGBBAA`.
///
/// `AARRGGBB` with an `FF` alpha drops the alpha; any other alpha moves to
/// the end. Six-digit input passes through. Anything else is rejected.
pub fn normalize_argb(argb: &str) -> Option<String> {
    let hex = argb.trim().trim_start_matches('#');
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(hex.to_string()),
        8 => {
            let (alpha, rgb) = hex.split_at(2);
            if alpha.eq_ignore_ascii_case("ff") {
                Some(rgb.to_string())
            } else {
                Some(format!("{rgb}{alpha}"))
            }
        }
        _ => None,
    }
}

/// Inverse of [`normalize_argb`]: `RRGGBB` -> `FFRRGGBB`, `RRGGBBAA` -> `AARRGGBB`.
pub fn to_argb(rgb: &str) -> String {
    let hex = rgb.trim_start_matches('#');
    match hex.len() {
        8 if hex.is_ascii() => {
            let (rgb, alpha) = hex.split_at(6);
            format!("{alpha}{rgb}")
        }
        _ => format!("FF{hex}"),
    }
}

/// The `rgb` attribute of a color element, normalized. Theme and indexed
/// colors have no fixed value and are skipped.
pub fn color_rgb(e: &BytesStart) -> Option<String> {
    attr_string(e, b"rgb").and_then(|rgb| normalize_argb(&rgb))
}

/// Characters XML 1.0 cannot carry, even as character references.
fn is_xml_illegal(ch: char) -> bool {
    matches!(ch, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&apos;"),
        _ => out.push(ch),
    }
}

/// Escape text for element content and attribute values. Characters XML
/// cannot carry are dropped.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars().filter(|&ch| !is_xml_illegal(ch)) {
        push_escaped(&mut out, ch);
    }
    out
}

/// `_xHHHH_` escape at the start of `s`, if there is one.
fn xstring_escape_at(s: &str) -> Option<u32> {
    let hex = s.strip_prefix("_x")?.get(..5)?.strip_suffix('_')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Escape cell and comment text. Control characters become `_xHHHH_`,
/// and a literal `_x` that would read as such an escape becomes `_x005F_x`.
pub fn xml_escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, ch) in s.char_indices() {
        if is_xml_illegal(ch) {
            let _ = write!(out, "_x{:04X}_", u32::from(ch));
        } else if ch == '_' && s.get(i..).and_then(xstring_escape_at).is_some() {
            out.push_str("_x005F_");
        } else {
            push_escaped(&mut out, ch);
        }
    }
    out
}

/// Decode `_xHHHH_` escapes in already-unescaped cell and comment text.
pub fn decode_xstring(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(at) = rest.find("_x") {
        let (head, tail) = rest.split_at(at);
        out.push_str(head);
        match xstring_escape_at(tail).and_then(char::from_u32) {
            Some(ch) => {
                out.push(ch);
                rest = tail.get(7..).unwrap_or_default();
            }
            None => {
                out.push_str("_x");
                rest = tail.get(2..).unwrap_or_default();
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        // Strip < and > / /> to get just the tag content
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string() {
        let e = make_start(r#"<foo name="a &amp; b" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("a & b".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_numbers() {
        let e = make_start(r#"<foo count="42" ht="15.75" />"#);
        assert_eq!(attr_u32(&e, b"count"), Some(42));
        assert_eq!(attr_f64(&e, b"ht"), Some(15.75));
        assert_eq!(attr_u32(&e, b"ht"), None);
    }

    #[test]
    fn test_attr_bool() {
        let e = make_start(r#"<foo a="1" b="0" c="true" />"#);
        assert_eq!(attr_bool(&e, b"a"), Some(true));
        assert_eq!(attr_bool(&e, b"b"), Some(false));
        assert_eq!(attr_bool(&e, b"c"), Some(true));
        assert_eq!(attr_bool(&e, b"missing"), None);
    }

    #[test]
    fn test_local_name_lookup() {
        let e = make_start(r#"<sheet name="Data" r:id="rId3" />"#);
        assert_eq!(attr_string_local(&e, b"id"), Some("rId3".to_string()));
        assert_eq!(attr_string(&e, b"id"), None);
    }

    #[test]
    fn test_toggle() {
        assert!(toggle_on(&make_start("<b/>")));
        assert!(toggle_on(&make_start(r#"<b val="1"/>"#)));
        assert!(!toggle_on(&make_start(r#"<b val="0"/>"#)));
    }

    #[test]
    fn test_argb_normalization() {
        assert_eq!(normalize_argb("FFFF0000").as_deref(), Some("FF0000"));
        assert_eq!(normalize_argb("ffff0000").as_deref(), Some("ff0000"));
        assert_eq!(normalize_argb("80112233").as_deref(), Some("11223380"));
        assert_eq!(normalize_argb("00FF00").as_deref(), Some("00FF00"));
        assert_eq!(normalize_argb("theme"), None);
        assert_eq!(to_argb("FF0000"), "FFFF0000");
        assert_eq!(normalize_argb(&to_argb("ab12cd")).as_deref(), Some("ab12cd"));
        assert_eq!(to_argb("11223380"), "80112233");
    }

    #[test]
    fn test_color_rgb() {
        let e = make_start(r#"<color rgb="FF00B050" />"#);
        assert_eq!(color_rgb(&e).as_deref(), Some("00B050"));
        let theme = make_start(r#"<color theme="1" />"#);
        assert_eq!(color_rgb(&theme), None);
    }

    #[test]
    fn test_escape() {
        assert_eq!(xml_escape(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
        assert_eq!(xml_escape("tab\tbell\u{7}"), "tab\tbell");
    }

    #[test]
    fn test_control_characters_in_text() {
        assert_eq!(xml_escape_text("a\u{1}b"), "a_x0001_b");
        assert_eq!(xml_escape_text("line\nnext\u{1f}"), "line\nnext_x001F_");
        assert_eq!(xml_escape_text("id_x0041_"), "id_x005F_x0041_");
        assert_eq!(xml_escape_text("snake_xray <b>"), "snake_xray &lt;b&gt;");
    }

    #[test]
    fn test_decode_xstring() {
        assert_eq!(decode_xstring("a_x0001_b"), "a\u{1}b");
        assert_eq!(decode_xstring("id_x005F_x0041_"), "id_x0041_");
        assert_eq!(decode_xstring("snake_xray_x"), "snake_xray_x");
        assert_eq!(decode_xstring("_x00e9_t_x00E9_"), "\u{e9}t\u{e9}");
        for text in ["a\u{1}b", "id_x0041_", "plain", "_x_x0007__"] {
            assert_eq!(decode_xstring(&xml_escape_text(text)), text);
        }
    }
}
