//! Plain-text excerpts derived from markdown post bodies.
//!
//! This is a marker stripper, not a markdown parser: headings, emphasis and
//! code markers are removed verbatim and `[text](url)` collapses to `text`.
//! Line breaks are kept as written.

pub const DEFAULT_EXCERPT_LENGTH: usize = 200;

const ELLIPSIS: &str = "...";

const STRIPPED_MARKERS: [&str; 12] = [
    "###### ", "##### ", "#### ", "### ", "## ", "# ", "**", "*", "__", "_", "```", "`",
];

/// Build the excerpt for `content`, cut at `max_len` bytes.
///
/// The cut is fixed-length rather than word-aware; when it would split a
/// multi-byte character it moves back to the previous character boundary.
/// The ellipsis is appended only when something was cut.
pub fn generate_excerpt(content: &str, max_len: usize) -> String {
    if content.is_empty() {
        return String::new();
    }

    let mut excerpt = extract_plain_text(content);
    if excerpt.len() > max_len {
        let cut = floor_char_boundary(&excerpt, max_len);
        excerpt.truncate(cut);
        excerpt.push_str(ELLIPSIS);
    }
    excerpt
}

/// Remove markdown markers from `markdown`, keeping link text.
pub fn extract_plain_text(markdown: &str) -> String {
    let mut result = markdown.to_string();
    for marker in STRIPPED_MARKERS {
        result = remove_all(result, marker);
    }
    strip_links(&result)
}

// Removal repeats until no occurrence remains, so runs like `***` are fully
// consumed by the `**` then `*` passes.
fn remove_all(mut input: String, marker: &str) -> String {
    while input.contains(marker) {
        input = input.replace(marker, "");
    }
    input
}

fn strip_links(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(offset) = input[cursor..].find('[') {
        let open = cursor + offset;
        output.push_str(&input[cursor..open]);

        match link_bounds(bytes, open) {
            Some((close_bracket, close_paren)) => {
                output.push_str(&input[open + 1..close_bracket]);
                cursor = close_paren + 1;
            }
            None => {
                output.push('[');
                cursor = open + 1;
            }
        }
    }

    output.push_str(&input[cursor..]);
    output
}

/// Locate `]`, then `(`, then `)` after the `[` at `open`.
fn link_bounds(bytes: &[u8], open: usize) -> Option<(usize, usize)> {
    let mut close_bracket = None;
    let mut open_paren = None;

    for (index, byte) in bytes.iter().enumerate().skip(open + 1) {
        match (byte, close_bracket, open_paren) {
            (b']', None, _) => close_bracket = Some(index),
            (b'(', Some(_), None) => open_paren = Some(index),
            (b')', Some(bracket), Some(_)) => return Some((bracket, index)),
            _ => {}
        }
    }

    None
}

fn floor_char_boundary(value: &str, index: usize) -> usize {
    let mut cut = index.min(value.len());
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}
