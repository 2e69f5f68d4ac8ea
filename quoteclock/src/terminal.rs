//! Terminal rendering of display snapshots
//!
//! Bold fragments are wrapped in ANSI bold/reset sequences; the plain style
//! emits the text unchanged, for logs and pipes.

use crate::interface::{DisplayState, Language, TextFragment};

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStyle {
    Ansi,
    Plain,
}

/// Quote text on the first line, attribution (if any) on the second
pub fn render_display(display: &DisplayState, style: RenderStyle) -> String {
    let mut out = String::new();
    for fragment in &display.fragments {
        match (fragment, style) {
            (TextFragment::Bold(text), RenderStyle::Ansi) => {
                out.push_str(BOLD);
                out.push_str(text);
                out.push_str(RESET);
            }
            (TextFragment::Bold(text), RenderStyle::Plain) | (TextFragment::Normal(text), _) => {
                out.push_str(text);
            }
        }
    }

    if let Some(attribution) = attribution(display) {
        out.push('\n');
        match style {
            RenderStyle::Ansi => {
                out.push_str(DIM);
                out.push_str("  -- ");
                out.push_str(&attribution);
                out.push_str(RESET);
            }
            RenderStyle::Plain => {
                out.push_str("  -- ");
                out.push_str(&attribution);
            }
        }
    }
    out
}

fn attribution(display: &DisplayState) -> Option<String> {
    match (display.source.is_empty(), display.author.is_empty()) {
        (true, true) => None,
        (false, true) => Some(display.source.clone()),
        (true, false) => Some(display.author.clone()),
        (false, false) => Some(format!("{}, {}", display.source, display.author)),
    }
}

/// Language switcher line, current language in brackets: `[en] pt`
pub fn render_languages(options: &[Language], current: Option<&Language>) -> String {
    options
        .iter()
        .map(|language| {
            if Some(language) == current {
                format!("[{}]", language)
            } else {
                language.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
