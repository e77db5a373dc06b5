//! Lyrics extraction from Genius song pages.
//!
//! Genius has shipped several page layouts over the years. Each layout gets
//! its own strategy; they are tried in order and the first hit wins.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::INSTRUMENTAL;

static CLASSIC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.lyrics").expect("valid selector"));
static CONTAINER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[class*="Lyrics__Container"]"#).expect("valid selector")
});
static PLACEHOLDER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[class*="LyricsPlaceholder__Message"]"#).expect("valid selector")
});

const INSTRUMENTAL_MESSAGE: &str = "This song is an instrumental";

/// One way of finding lyrics in a parsed page.
type Strategy = fn(&Html) -> Option<String>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("classic", classic),
    ("container", container),
    ("instrumental", instrumental),
];

/// Extract lyrics from a song page, or `None` if no layout matched.
pub fn extract_lyrics(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for (name, strategy) in STRATEGIES {
        if let Some(lyrics) = strategy(&document) {
            debug!("lyrics extracted using the {} layout", name);
            return Some(lyrics);
        }
    }

    debug!("Couldn't scrape the page...");
    None
}

/// Old layout: everything inside `<div class="lyrics">`.
///
/// The markup already carries its own newlines next to each `<br>`.
fn classic(document: &Html) -> Option<String> {
    let div = document.select(&CLASSIC).next()?;
    let mut text = String::new();
    collect_text(div, false, &mut text);
    Some(text)
}

/// Current layout: one or more `Lyrics__Container` divs whose parent holds
/// the whole song, with line breaks as `<br>` and ad slots in between.
fn container(document: &Html) -> Option<String> {
    let div = document.select(&CONTAINER).next()?;
    debug!("Unusual song page");
    let root = div.parent().and_then(ElementRef::wrap).unwrap_or(div);
    let mut text = String::new();
    collect_text(root, true, &mut text);
    Some(text)
}

/// Placeholder shown instead of lyrics for instrumentals.
fn instrumental(document: &Html) -> Option<String> {
    document
        .select(&PLACEHOLDER)
        .any(|div| div.text().collect::<String>().trim() == INSTRUMENTAL_MESSAGE)
        .then(|| {
            debug!("This is an instrumental song");
            INSTRUMENTAL.to_string()
        })
}

fn has_class_containing(element: &scraper::node::Element, needle: &str) -> bool {
    element.classes().any(|class| class.contains(needle))
}

/// Append the text under `element`, skipping scripts.
///
/// With `breaks` set, `<br>` and ad containers each become a newline.
fn collect_text(element: ElementRef<'_>, breaks: bool, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => match el.name() {
                "script" | "style" => {}
                "br" if breaks => out.push('\n'),
                "div" if breaks && has_class_containing(el, "InreadAd__Container") => {
                    out.push('\n')
                }
                _ => {
                    if let Some(child) = ElementRef::wrap(child) {
                        collect_text(child, breaks, out);
                    }
                }
            },
            _ => {}
        }
    }
}
