//! PDF fixtures built with lopdf for the integration tests.

#![allow(dead_code)]

use lopdf::{Document, Object, Stream, dictionary};

pub const COLUMNS: [f64; 3] = [72.0, 200.0, 320.0];
pub const FONT_SIZE: f64 = 10.0;

/// A line of text on a page: cells at the given x positions.
#[derive(Debug, Clone)]
pub struct Line {
    pub y: f64,
    pub cells: Vec<(String, f64)>,
}

impl Line {
    /// Cells laid out in [`COLUMNS`] order.
    pub fn row(y: f64, texts: &[&str]) -> Self {
        Self {
            y,
            cells: texts
                .iter()
                .zip(COLUMNS)
                .map(|(t, x)| (t.to_string(), x))
                .collect(),
        }
    }

    pub fn at(y: f64, cells: &[(&str, f64)]) -> Self {
        Self {
            y,
            cells: cells.iter().map(|(t, x)| (t.to_string(), *x)).collect(),
        }
    }
}

/// Lines stacked downward from `top` every 20 points.
pub fn table(top: f64, rows: &[&[&str]]) -> Vec<Line> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| Line::row(top - i as f64 * 20.0, r))
        .collect()
}

/// One `BT … Tj ET` block per cell.
pub fn lined_content(lines: &[Line]) -> Vec<u8> {
    let mut out = String::new();
    for line in lines {
        for (text, x) in &line.cells {
            out.push_str(&format!(
                "BT /F1 {FONT_SIZE} Tf {x} {} Td ({text}) Tj ET\n",
                line.y
            ));
        }
    }
    out.into_bytes()
}

/// Each cell wrapped in a `P` section with its own MCID.
pub fn marked_content(lines: &[Line]) -> Vec<u8> {
    let mut out = String::new();
    let mut mcid = 0;
    for line in lines {
        for (text, x) in &line.cells {
            out.push_str(&format!(
                "/P <</MCID {mcid}>> BDC BT /F1 {FONT_SIZE} Tf {x} {} Td ({text}) Tj ET EMC\n",
                line.y
            ));
            mcid += 1;
        }
    }
    out.into_bytes()
}

/// A US Letter document with one page per content stream.
pub fn build_pdf(pages: &[Vec<u8>], marked: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for content in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if marked {
        catalog.set("MarkInfo", dictionary! { "Marked" => true });
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Election results spread over two pages with the header repeated.
pub fn results_pdf(marked: bool) -> Vec<u8> {
    let content = if marked { marked_content } else { lined_content };
    let mut first = vec![Line::row(760.0, &["County Returns 2024"])];
    first.extend(table(
        700.0,
        &[
            &["Name", "Party", "Votes"],
            &["Ann", "Green", "10"],
            &["Bob", "Blue", "12"],
        ],
    ));
    let mut second = table(
        700.0,
        &[&["Name", "Party", "Votes"], &["Cy", "Red", "7"], &["Dee", "Gold", "3"]],
    );
    second.push(Line::row(600.0, &["Notes"]));
    second.push(Line::row(580.0, &["Turnout", "was", "low"]));
    build_pdf(&[content(&first), content(&second)], marked)
}

pub fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect()
}
