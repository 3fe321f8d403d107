//! String escaping shared by the JSON encoder and the HTTP envelope.
//!
//! Every control character below U+0020 is rewritten so that encoded output
//! can never carry raw control bytes to a collector or chat client. All other
//! characters, including non-ASCII text and U+007F, pass through unchanged.

/// Append an escaped copy of `s` to `out`.
pub fn escape_into(out: &mut String, s: &str) {
    out.reserve(s.len());
    for c in s.chars() {
        match c {
            '\\' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\u{08}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{0c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if c < ' ' => push_unicode_escape(out, c),
            c => out.push(c),
        }
    }
}

/// Return an escaped copy of `s`.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    escape_into(&mut out, s);
    out
}

/// Append `s` escaped and wrapped in double quotes. `None` renders as `""`.
pub fn quote_into(out: &mut String, s: Option<&str>) {
    out.push('"');
    if let Some(s) = s {
        escape_into(out, s);
    }
    out.push('"');
}

fn push_unicode_escape(out: &mut String, c: char) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let code = c as u32;
    out.push_str("\\u");
    for shift in [12, 8, 4, 0] {
        out.push(HEX[((code >> shift) & 0xf) as usize] as char);
    }
}
