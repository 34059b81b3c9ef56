//! Rich-text runs to inline Markdown.

use blockscribe_shared::RichText;

/// Render a sequence of runs as inline Markdown.
pub fn render_rich_text(runs: &[RichText]) -> String {
    runs.iter().map(render_run).collect()
}

/// Wrap one run in its annotations (bold, italic, code, strikethrough, in
/// that order), then in a link if it has a target.
fn render_run(run: &RichText) -> String {
    let mut text = run.plain_text.clone();
    if text.is_empty() {
        return text;
    }

    let a = &run.annotations;
    if a.bold {
        text = format!("**{text}**");
    }
    if a.italic {
        text = format!("*{text}*");
    }
    if a.code {
        text = format!("`{text}`");
    }
    if a.strikethrough {
        text = format!("~~{text}~~");
    }
    if let Some(href) = run.href.as_deref().filter(|h| !h.is_empty()) {
        text = format!("[{text}]({href})");
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockscribe_shared::Annotations;

    fn styled(text: &str, annotations: Annotations) -> RichText {
        RichText {
            plain_text: text.into(),
            href: None,
            annotations,
        }
    }

    #[test]
    fn plain_runs_concatenate() {
        let runs = vec![RichText::plain("Hello, "), RichText::plain("world")];
        assert_eq!(render_rich_text(&runs), "Hello, world");
    }

    #[test]
    fn single_annotations() {
        let bold = Annotations {
            bold: true,
            ..Annotations::default()
        };
        let code = Annotations {
            code: true,
            ..Annotations::default()
        };
        let strike = Annotations {
            strikethrough: true,
            ..Annotations::default()
        };
        assert_eq!(render_run(&styled("b", bold)), "**b**");
        assert_eq!(render_run(&styled("x()", code)), "`x()`");
        assert_eq!(render_run(&styled("old", strike)), "~~old~~");
    }

    #[test]
    fn annotations_nest_in_fixed_order() {
        let all = Annotations {
            bold: true,
            italic: true,
            code: true,
            strikethrough: true,
            underline: true,
        };
        assert_eq!(render_run(&styled("t", all)), "~~`***t***`~~");
    }

    #[test]
    fn link_wraps_formatted_text() {
        let run = styled(
            "docs",
            Annotations {
                bold: true,
                ..Annotations::default()
            },
        )
        .linked("https://example.com/docs");
        assert_eq!(render_run(&run), "[**docs**](https://example.com/docs)");
    }

    #[test]
    fn empty_run_renders_nothing() {
        let run = RichText::plain("").linked("https://example.com");
        assert_eq!(render_run(&run), "");
    }
}
