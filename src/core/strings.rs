//! String-literal handling shared by the schema and textformat parsers.
//!
//! Both grammars use C-style escapes; `bytes` fields may produce content
//! that is not valid UTF-8, so the byte-level form is the primitive.

/// Strip quotes and process escapes, yielding raw bytes.
///
/// Accepts single- or double-quoted input as produced by the lexers.
pub fn unquote_bytes(quoted: &str) -> Result<Vec<u8>, String> {
    let bytes = quoted.as_bytes();
    if bytes.len() < 2 {
        return Err("string literal too short".to_string());
    }
    let quote = bytes[0];
    if (quote != b'"' && quote != b'\'') || bytes[bytes.len() - 1] != quote {
        return Err("malformed string literal".to_string());
    }
    let inner = &bytes[1..bytes.len() - 1];

    let mut out = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        let b = inner[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }
        i += 1;
        let Some(&escape) = inner.get(i) else {
            return Err("trailing backslash in string literal".to_string());
        };
        i += 1;
        match escape {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'?' => out.push(b'?'),
            b'\\' | b'\'' | b'"' => out.push(escape),
            b'0'..=b'7' => {
                let mut value = (escape - b'0') as u32;
                let mut digits = 1;
                while digits < 3 {
                    match inner.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            i += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                if value > 0xff {
                    return Err(format!("octal escape out of range: \\{value:o}"));
                }
                out.push(value as u8);
            }
            b'x' | b'X' => {
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match inner.get(i) {
                        Some(&d) if d.is_ascii_hexdigit() => {
                            value = value * 16 + (d as char).to_digit(16).unwrap_or(0);
                            i += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                if digits == 0 {
                    return Err("\\x escape with no hex digits".to_string());
                }
                out.push(value as u8);
            }
            b'u' => {
                let mut value = 0u32;
                for _ in 0..4 {
                    match inner.get(i) {
                        Some(&d) if d.is_ascii_hexdigit() => {
                            value = value * 16 + (d as char).to_digit(16).unwrap_or(0);
                            i += 1;
                        }
                        _ => return Err("\\u escape needs 4 hex digits".to_string()),
                    }
                }
                match char::from_u32(value) {
                    Some(c) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    }
                    None => return Err(format!("invalid \\u escape: {value:04x}")),
                }
            }
            other => return Err(format!("unknown escape '\\{}'", other as char)),
        }
    }
    Ok(out)
}

/// Strip quotes and process escapes, yielding a UTF-8 string.
pub fn unquote(quoted: &str) -> Result<String, String> {
    let bytes = unquote_bytes(quoted)?;
    String::from_utf8(bytes).map_err(|_| "string literal is not valid UTF-8".to_string())
}
