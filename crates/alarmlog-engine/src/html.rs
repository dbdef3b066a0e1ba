//! HTML escaping for text embedded in the report body.

use std::fmt::{self, Write};

use askama_escape::{Escaper, MarkupDisplay};

/// Escaper writing markup-significant and non-ASCII characters as
/// hexadecimal character references (`<` becomes `&#x3C;`).
///
/// Registered with askama under the `he` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexEntities;

impl Escaper for HexEntities {
    fn write_escaped<W: Write>(&self, mut fmt: W, string: &str) -> fmt::Result {
        let mut start = 0;
        for (i, c) in string.char_indices() {
            if !needs_reference(c) {
                continue;
            }
            fmt.write_str(&string[start..i])?;
            write!(fmt, "&#x{:X};", c as u32)?;
            start = i + c.len_utf8();
        }
        fmt.write_str(&string[start..])
    }
}

fn needs_reference(c: char) -> bool {
    matches!(c, '"' | '&' | '\'' | '<' | '>' | '`') || !c.is_ascii()
}

/// Escapes `text` with [`HexEntities`].
pub fn encode_html(text: &str) -> String {
    MarkupDisplay::new_unsafe(text, HexEntities).to_string()
}
