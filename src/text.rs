//! Plain-text cleanup for scraped lyrics and artist-name canonicalization.
//!
//! Scraped fragments arrive with HTML entities, Windows line endings,
//! runs of spaces and the occasional inline `<script>` block. [`normalize`]
//! turns them into text suitable for storing on a track.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<script.*?</script>").expect("valid regex"));
static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("valid regex"));
static NON_WORD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").expect("valid regex"));
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\(\[].*?[\)\]]").expect("valid regex"));

/// Entities decoded by [`unescape`]. The HTML parser has already decoded
/// everything else, so `&lt;` left in the text is literal.
const ENTITIES: &[(&str, &str)] = &[("&nbsp;", " ")];

/// Decode bytes as UTF-8, dropping invalid sequences entirely.
pub fn decode_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Decode the entities that survive HTML parsing on lyrics pages.
pub fn unescape(text: &str) -> String {
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, plain)| acc.replace(entity, plain))
}

/// Clean a scraped HTML fragment into plain text.
///
/// Normalizing text that is already clean (no entities, no script tags,
/// single spaces, `\n` line endings) returns it unchanged.
pub fn normalize(html: &str) -> String {
    let text = unescape(html);
    let text = text.replace('\r', "\n");
    let text = SPACE_RUN.replace_all(&text, " ");
    let text = SCRIPT_BLOCK.replace_all(&text, "");
    // U+2005 (four-per-em) shows up on lyrics pages, U+2007 (figure space) too
    text.replace(['\u{2005}', '\u{2007}'], " ")
}

/// [`normalize`] for raw response bytes.
pub fn normalize_bytes(html: &[u8]) -> String {
    normalize(&decode_utf8(html))
}

/// Canonical slug used to compare artist names across sources.
///
/// `"Beyoncé"` and `"beyonce"` both become `"beyonce"`.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();
    NON_WORD_RUN
        .replace_all(ascii.trim(), "-")
        .trim_matches('-')
        .to_string()
}

/// Remove `(...)` and `[...]` annotations such as `(Remix)` or `[Chorus]`.
pub fn strip_annotations(text: &str) -> String {
    ANNOTATION.replace_all(text, "").into_owned()
}
