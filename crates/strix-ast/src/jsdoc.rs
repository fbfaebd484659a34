//! JSDoc records and the annotation subset the analysis passes query.
//!
//! Only four pieces of information survive from a comment: duplicate
//! suppression, `@typedef`-ness, `@fileoverview`-ness, and the set of names
//! referenced from type annotations.

use strix_common::{Atom, Interner};

#[derive(Clone, Debug, Default)]
pub struct JsDoc {
    /// `@suppress {duplicate}` (possibly among other suppressions).
    pub suppress_duplicate: bool,
    /// `@typedef` — the declaration defines a type alias.
    pub is_typedef: bool,
    /// `@fileoverview` — the record applies to the whole file.
    pub is_fileoverview: bool,
    /// Root names referenced inside `@type`/`@typedef` braces: for
    /// `{foo.bar.Baz}` only `foo` is recorded, since that is the binding a
    /// type annotation keeps alive.
    pub type_names: Vec<Atom>,
}

impl JsDoc {
    /// Parse the body of a `/** ... */` comment (delimiters optional).
    pub fn parse(text: &str, interner: &mut Interner) -> JsDoc {
        let text = text
            .trim_start_matches("/**")
            .trim_end_matches("*/");
        let mut doc = JsDoc::default();
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'@' {
                i += 1;
                continue;
            }
            i += 1;
            let tag_start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            let tag = &text[tag_start..i];
            match tag {
                "fileoverview" => doc.is_fileoverview = true,
                "typedef" => {
                    doc.is_typedef = true;
                    i = collect_brace_names(text, i, interner, &mut doc.type_names);
                }
                "type" => {
                    i = collect_brace_names(text, i, interner, &mut doc.type_names);
                }
                "suppress" => {
                    let mut names = Vec::new();
                    let mut scratch = Interner::new();
                    let end = collect_brace_names(text, i, &mut scratch, &mut names);
                    if names.iter().any(|&a| scratch.resolve(a) == "duplicate") {
                        doc.suppress_duplicate = true;
                    }
                    i = end;
                }
                _ => {}
            }
        }
        doc
    }
}

/// Scan an optional `{...}` group following a tag, interning the root name of
/// every dotted identifier chain found inside. Returns the index to resume
/// scanning at.
fn collect_brace_names(
    text: &str,
    mut i: usize,
    interner: &mut Interner,
    out: &mut Vec<Atom>,
) -> usize {
    let bytes = text.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'{' {
        return i;
    }
    i += 1;
    let mut depth = 1usize;
    let mut after_dot = false;
    while i < bytes.len() && depth > 0 {
        let b = bytes[i];
        match b {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                i += 1;
            }
            b'.' => {
                after_dot = true;
                i += 1;
            }
            _ if is_ident_start(b) => {
                let start = i;
                while i < bytes.len() && is_ident_part(bytes[i]) {
                    i += 1;
                }
                if !after_dot {
                    out.push(interner.intern(&text[start..i]));
                }
                after_dot = false;
            }
            _ => {
                after_dot = false;
                i += 1;
            }
        }
    }
    i
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}
