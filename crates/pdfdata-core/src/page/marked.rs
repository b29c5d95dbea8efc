//! Marked-content strategy.
//!
//! `P` sections start paragraphs, which start cells; a paragraph that
//! begins left of and below the previous cell starts a new row. `Span`
//! sections continue the open cell while they stay adjacent to it.

use std::collections::BTreeSet;

use crate::checkpoint::Interrupted;
use crate::error::DiagnosticCode;
use crate::fragment::{ContentItem, Fragment};
use crate::geometry::BBox;

use super::{RowBuilder, skip_artifact};

const ARTIFACT: &str = "Artifact";

/// Standard structure types plus the optional-content tag.
const KNOWN_TAGS: &[&str] = &[
    "Document", "DocumentFragment", "Part", "Art", "Sect", "Div", "Aside", "BlockQuote",
    "Caption", "TOC", "TOCI", "Index", "NonStruct", "Private", "Title", "FENote", "P", "H",
    "H1", "H2", "H3", "H4", "H5", "H6", "L", "LI", "Lbl", "LBody", "Table", "TR", "TH", "TD",
    "THead", "TBody", "TFoot", "Span", "Sub", "Em", "Strong", "Quote", "Note", "Reference",
    "BibEntry", "Code", "Link", "Annot", "Ruby", "RB", "RT", "RP", "Warichu", "WT", "WP",
    "Figure", "Formula", "Form", ARTIFACT, "OC", "Textbox",
];

struct MarkedState {
    paragraph: bool,
    span: bool,
    open: Vec<String>,
    artifact_depth: usize,
    prev: Option<BBox>,
    reported: BTreeSet<String>,
}

impl MarkedState {
    fn begin(&mut self, builder: &mut RowBuilder<'_>, tag: &str) {
        if tag == ARTIFACT {
            self.artifact_depth += 1;
        } else if !KNOWN_TAGS.contains(&tag) && self.reported.insert(tag.to_string()) {
            builder.diagnose(
                DiagnosticCode::UnknownTag,
                format!("unknown marked-content tag {tag:?}"),
            );
        }
        self.open.push(tag.to_string());
    }

    fn end(&mut self, builder: &mut RowBuilder<'_>) {
        match self.open.pop() {
            Some(tag) if tag == ARTIFACT => {
                self.artifact_depth = self.artifact_depth.saturating_sub(1);
            }
            Some(tag) if tag == "Span" => self.span = false,
            Some(_) => {}
            None => builder.diagnose(
                DiagnosticCode::UnbalancedMarkedContent,
                "EMC without matching BMC/BDC".to_string(),
            ),
        }
    }

    fn text(
        &mut self,
        builder: &mut RowBuilder<'_>,
        fragment: &Fragment,
    ) -> Result<(), Interrupted> {
        if self.paragraph || (self.span && !builder.is_adjacent(fragment)) {
            if let Some(bbox) = builder.flush_cell()? {
                self.prev = Some(bbox);
            }
        }

        if self.paragraph && fragment.text != " " && !builder.row_is_empty() {
            if let Some(prev) = self.prev {
                if fragment.x <= prev.x2 && fragment.y < prev.y2 {
                    builder.end_row();
                    self.prev = None;
                }
            }
        }

        builder.add(fragment);
        self.paragraph = false;
        Ok(())
    }
}

pub(super) fn parse(
    builder: &mut RowBuilder<'_>,
    items: &[ContentItem],
    keep_artifacts: bool,
) -> Result<(), Interrupted> {
    let mut state = MarkedState {
        paragraph: false,
        span: false,
        open: Vec::new(),
        artifact_depth: 0,
        prev: None,
        reported: BTreeSet::new(),
    };

    for item in items {
        match item {
            ContentItem::BeginMarkedContent { tag } => state.begin(builder, tag),
            ContentItem::BeginMarkedContentProps { tag, .. } => {
                match tag.as_str() {
                    "P" => {
                        if state.span {
                            state.span = false;
                        } else {
                            state.paragraph = true;
                        }
                    }
                    "Span" => state.span = true,
                    _ => {}
                }
                state.begin(builder, tag);
            }
            ContentItem::EndMarkedContent => state.end(builder),
            ContentItem::Text(fragment) => {
                if skip_artifact(fragment, state.artifact_depth > 0, keep_artifacts) {
                    continue;
                }
                builder.check_direction(fragment);
                state.text(builder, fragment)?;
            }
        }
    }

    if !state.open.is_empty() {
        builder.diagnose(
            DiagnosticCode::UnbalancedMarkedContent,
            format!("{} marked-content section(s) left open", state.open.len()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::checkpoint::{Checkpoint, Interrupted, NoCheckpoint};
    use crate::error::DiagnosticCode;
    use crate::fragment::{ContentItem, Fragment, TextDirection};
    use crate::options::ParserOptions;
    use crate::page::{PageCells, PageParser, Strategy};

    fn p(id: u32) -> ContentItem {
        ContentItem::BeginMarkedContentProps {
            tag: "P".into(),
            id: Some(id),
        }
    }

    fn span(id: u32) -> ContentItem {
        ContentItem::BeginMarkedContentProps {
            tag: "Span".into(),
            id: Some(id),
        }
    }

    fn emc() -> ContentItem {
        ContentItem::EndMarkedContent
    }

    fn text(s: &str, x: f64, y: f64) -> ContentItem {
        let width = s.chars().count() as f64 * 6.0;
        Fragment::new(s, x, y, width).with_height(12.0).into()
    }

    fn parse_with(options: &ParserOptions, items: &[ContentItem]) -> PageCells {
        PageParser::new(Strategy::Marked, options)
            .parse(1, items, &NoCheckpoint)
            .unwrap()
    }

    fn parse(items: &[ContentItem]) -> PageCells {
        parse_with(&ParserOptions::default(), items)
    }

    #[test]
    fn paragraphs_become_cells_and_rows() {
        let items = vec![
            p(0),
            text("Name", 0.0, 100.0),
            emc(),
            p(1),
            text("Age", 50.0, 100.0),
            emc(),
            p(2),
            text("John", 0.0, 80.0),
            emc(),
            p(3),
            text("23", 50.0, 80.0),
            emc(),
        ];
        let page = parse(&items);
        assert_eq!(page.rows(), vec![vec!["Name", "Age"], vec!["John", "23"]]);
        assert!(page.diagnostics.is_empty());
    }

    #[test]
    fn span_continues_adjacent_text() {
        let items = vec![
            p(0),
            text("Total", 0.0, 100.0),
            span(1),
            text(" due", 30.0, 100.0),
            emc(),
            emc(),
            p(2),
            text("40", 80.0, 100.0),
            emc(),
        ];
        let page = parse(&items);
        assert_eq!(page.rows(), vec![vec!["Total due", "40"]]);
    }

    #[test]
    fn non_adjacent_span_starts_new_cell() {
        let items = vec![
            p(0),
            text("Total", 0.0, 100.0),
            span(1),
            text("40", 120.0, 100.0),
            emc(),
            emc(),
        ];
        let page = parse(&items);
        assert_eq!(page.rows(), vec![vec!["Total", "40"]]);
    }

    #[test]
    fn p_inside_span_closes_span_instead_of_starting_paragraph() {
        let items = vec![
            p(0),
            text("Annual", 0.0, 100.0),
            span(1),
            text(" income", 36.0, 100.0),
            p(2),
            text(" total", 78.0, 100.0),
            emc(),
            emc(),
            emc(),
        ];
        let page = parse(&items);
        assert_eq!(page.rows(), vec![vec!["Annual income total"]]);
    }

    #[test]
    fn lone_space_paragraph_does_not_break_row() {
        let items = vec![
            p(0),
            text("A", 0.0, 100.0),
            emc(),
            p(1),
            text(" ", 0.0, 90.0),
            emc(),
            p(2),
            text("B", 50.0, 100.0),
            emc(),
        ];
        let page = parse(&items);
        assert_eq!(page.rows().len(), 1);
        assert_eq!(page.cells.len(), 3);
    }

    #[test]
    fn artifacts_skipped_unless_enabled() {
        let items = vec![
            ContentItem::BeginMarkedContent {
                tag: "Artifact".into(),
            },
            text("Page 1", 0.0, 20.0),
            emc(),
            p(0),
            text("Name", 0.0, 100.0),
            emc(),
        ];
        let page = parse(&items);
        assert_eq!(page.rows(), vec![vec!["Name"]]);

        let options = ParserOptions {
            artifacts: true,
            ..ParserOptions::default()
        };
        let page = parse_with(&options, &items);
        assert_eq!(page.cells.len(), 2);
    }

    #[test]
    fn unknown_tag_reported_once() {
        let items = vec![
            ContentItem::BeginMarkedContentProps {
                tag: "Widget".into(),
                id: None,
            },
            text("x", 0.0, 0.0),
            emc(),
            ContentItem::BeginMarkedContent {
                tag: "Widget".into(),
            },
            emc(),
        ];
        let page = parse(&items);
        assert_eq!(page.cells.len(), 1);
        let unknown: Vec<_> = page
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::UnknownTag)
            .collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].page, Some(1));
    }

    #[test]
    fn unbalanced_marked_content_reported() {
        let page = parse(&[emc(), p(0), text("x", 0.0, 0.0)]);
        let codes: Vec<_> = page.diagnostics.iter().map(|d| d.code.clone()).collect();
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::UnbalancedMarkedContent,
                DiagnosticCode::UnbalancedMarkedContent
            ]
        );
    }

    #[test]
    fn non_ltr_text_flagged_but_kept() {
        let rtl = Fragment::new("abc", 0.0, 0.0, 18.0).with_direction(TextDirection::Rtl);
        let page = parse(&[p(0), rtl.into(), emc()]);
        assert_eq!(page.cells.len(), 1);
        assert_eq!(page.diagnostics[0].code, DiagnosticCode::NonLtrText);
    }

    struct CancelImmediately;

    impl Checkpoint for CancelImmediately {
        fn check(&self) -> Result<(), Interrupted> {
            Err(Interrupted)
        }
    }

    #[test]
    fn checkpoint_interrupts_at_cell_flush() {
        let items = vec![
            p(0),
            text("a", 0.0, 0.0),
            emc(),
            p(1),
            text("b", 20.0, 0.0),
            emc(),
        ];
        let result = PageParser::new(Strategy::Marked, &ParserOptions::default()).parse(
            1,
            &items,
            &CancelImmediately,
        );
        assert_eq!(result.unwrap_err(), Interrupted);
    }
}
