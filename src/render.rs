use crate::console::{ConsoleSnapshot, LineKind, OutputLine};
use crate::overlay::Overlay;
use ammonia::clean_text;
use std::fmt::Write;

/// Renders the console log and the open overlay, if any, as an HTML
/// fragment. Every piece of text goes through `clean_text`, so commands
/// typed by the visitor never turn into markup.
pub fn render_fragment(snapshot: &ConsoleSnapshot) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"console-output\">");
    for line in &snapshot.lines {
        render_line(&mut html, line);
    }
    html.push_str("</div>");
    if let Some(overlay) = &snapshot.overlay {
        render_overlay(&mut html, overlay);
    }
    html
}

fn render_line(html: &mut String, line: &OutputLine) {
    let kind = line.kind.as_str();
    if line.kind == LineKind::Blank {
        let _ = write!(html, "<div class=\"console-line console-line--{kind}\"><br></div>");
        return;
    }
    let _ = write!(
        html,
        "<div class=\"console-line console-line--{kind}\" data-line-id=\"{}\">{}</div>",
        line.id,
        clean_text(&line.text)
    );
}

fn render_overlay(html: &mut String, overlay: &Overlay) {
    let _ = write!(
        html,
        "<div class=\"easter-egg-overlay\" data-dismiss=\"backdrop\" data-egg=\"{}\">",
        overlay.egg.token()
    );
    html.push_str("<div class=\"easter-egg-modal\" role=\"dialog\" aria-modal=\"true\">");
    html.push_str("<button class=\"easter-egg-close\" data-dismiss=\"close\" aria-label=\"Zamknij\">×</button>");
    for image in &overlay.images {
        let _ = write!(
            html,
            "<img class=\"easter-egg-image\" src=\"{}\" alt=\"{}\">",
            clean_text(&image.src),
            clean_text(&image.alt)
        );
    }
    let _ = write!(
        html,
        "<p class=\"easter-egg-caption\">{}</p>",
        clean_text(&overlay.caption)
    );
    html.push_str("</div></div>");
}
