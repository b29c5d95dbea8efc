//! Page parser and table assembler working together over several pages.

use pdfdata_core::*;

fn text(s: &str, x: f64, y: f64) -> Fragment {
    Fragment::new(s, x, y, s.chars().count() as f64 * 6.0).with_height(12.0)
}

/// One lined page with a header row and the given data rows.
fn lined_page(rows: &[[&str; 3]]) -> Vec<ContentItem> {
    let mut items: Vec<ContentItem> = vec![
        text("Page header", 0.0, 770.0).with_eol().into(),
        text("Name", 0.0, 700.0).into(),
        text("Party", 100.0, 700.0).into(),
        text("Votes", 200.0, 700.0).with_eol().into(),
    ];
    for (i, row) in rows.iter().enumerate() {
        let y = 680.0 - i as f64 * 20.0;
        items.push(text(row[0], 0.0, y).into());
        items.push(text(row[1], 100.0, y).into());
        items.push(text(row[2], 200.0, y).with_eol().into());
    }
    items.push(text("Page 1", 0.0, 20.0).with_eol().into());
    items
}

fn run(options: &ParserOptions, pages: &[Vec<ContentItem>]) -> Vec<Vec<String>> {
    let parser = PageParser::new(Strategy::Lined, options);
    let mut table = TableAssembler::new(options);
    let mut rows = Vec::new();
    for (i, items) in pages.iter().enumerate() {
        let page = parser.parse(i + 1, items, &NoCheckpoint).unwrap();
        table.begin_page(792.0);
        for cell in page.cells {
            table.insert_cell(cell);
        }
        table.process_cells(&mut rows, &NoCheckpoint).unwrap();
        if table.table_done() {
            break;
        }
    }
    rows
}

fn banded() -> ParserOptions {
    ParserOptions::builder()
        .page_header(40.0)
        .page_footer(40.0)
        .build()
        .unwrap()
}

#[test]
fn header_repeated_on_every_page_is_emitted_once() {
    let pages = vec![
        lined_page(&[["Ann", "Green", "10"], ["Bob", "Blue", "12"]]),
        lined_page(&[["Cy", "Red", "7"]]),
    ];
    let rows = run(&banded(), &pages);
    assert_eq!(
        rows,
        vec![
            vec!["Name", "Party", "Votes"],
            vec!["Ann", "Green", "10"],
            vec!["Bob", "Blue", "12"],
            vec!["Cy", "Red", "7"],
        ]
    );
}

#[test]
fn exclusion_bands_off_keeps_running_text() {
    let pages = vec![lined_page(&[["Ann", "Green", "10"]])];
    let rows = run(&ParserOptions::default(), &pages);
    assert_eq!(rows[0], vec!["Page header"]);
    assert_eq!(rows.last().unwrap(), &vec!["Page 1"]);
}

#[test]
fn stop_heading_halts_before_later_pages() {
    let mut first = lined_page(&[["Ann", "Green", "10"]]);
    first.push(text("Total", 0.0, 300.0).into());
    first.push(text("10", 200.0, 300.0).with_eol().into());
    let pages = vec![first, lined_page(&[["Cy", "Red", "7"]])];
    let options = ParserOptions::builder()
        .page_header(40.0)
        .page_footer(40.0)
        .stop_heading_pattern("^Total")
        .build()
        .unwrap();
    let rows = run(&options, &pages);
    assert_eq!(
        rows,
        vec![vec!["Name", "Party", "Votes"], vec!["Ann", "Green", "10"]]
    );
}

#[test]
fn same_input_twice_gives_same_rows() {
    let pages = vec![
        lined_page(&[["Ann", "Green", "10"]]),
        lined_page(&[["Bob", "Blue", "12"]]),
    ];
    assert_eq!(run(&banded(), &pages), run(&banded(), &pages));
}

#[test]
fn rows_come_top_to_bottom_with_cells_left_to_right() {
    let options = ParserOptions::builder().has_header(false).build().unwrap();
    // Emitted bottom row first and right to left within rows.
    let items: Vec<ContentItem> = vec![
        text("d", 60.0, 80.0).into(),
        text("c", 0.0, 80.0).with_eol().into(),
        text("b", 60.0, 100.0).into(),
        text("a", 0.0, 100.0).with_eol().into(),
    ];
    let rows = run(&options, &[items]);
    assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
}

#[cfg(feature = "serde")]
#[test]
fn content_items_from_json() {
    let json = r#"[
        {"type": "text", "text": "Name", "x": 0, "y": 100, "width": 24, "height": 12},
        {"type": "text", "text": "Age", "x": 50, "y": 100, "width": 18, "height": 12, "has_eol": true},
        {"type": "text", "text": "John", "x": 0, "y": 80, "width": 24, "height": 12},
        {"type": "text", "text": "23", "x": 50, "y": 80, "width": 12, "height": 12, "has_eol": true}
    ]"#;
    let items: Vec<ContentItem> = serde_json::from_str(json).unwrap();
    let rows = run(&ParserOptions::default(), &[items]);
    assert_eq!(rows, vec![vec!["Name", "Age"], vec!["John", "23"]]);
}
