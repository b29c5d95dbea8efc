//! Parsing fragment dumps instead of PDF files.

#![cfg(feature = "serde")]

use pdfdata::{DataParser, MemorySource, ParserOptions, ParserState};

const DUMP: &str = r#"{
  "marked": true,
  "metadata": { "title": "Returns" },
  "pages": [
    {
      "height": 400,
      "items": [
        { "type": "beginMarkedContentProps", "tag": "P", "id": 0 },
        { "type": "text", "text": "Name", "x": 0, "y": 300, "width": 24, "height": 12 },
        { "type": "endMarkedContent" },
        { "type": "beginMarkedContentProps", "tag": "P", "id": 1 },
        { "type": "text", "text": "Votes", "x": 100, "y": 300, "width": 30, "height": 12 },
        { "type": "endMarkedContent" },
        { "type": "beginMarkedContentProps", "tag": "P", "id": 2 },
        { "type": "text", "text": "Ann", "x": 0, "y": 280, "width": 18, "height": 12 },
        { "type": "endMarkedContent" },
        { "type": "beginMarkedContentProps", "tag": "P", "id": 3 },
        { "type": "text", "text": "10", "x": 100, "y": 280, "width": 12, "height": 12 },
        { "type": "endMarkedContent" },
        { "type": "beginMarkedContent", "tag": "Shape" },
        { "type": "endMarkedContent" }
      ]
    }
  ]
}"#;

#[test]
fn dump_is_parsed_with_marked_strategy() {
    let source = MemorySource::from_json(DUMP).unwrap();
    let mut parser = DataParser::new(ParserOptions::default())
        .unwrap()
        .with_source(source);

    let info = parser.open().unwrap();
    assert!(info.marked);
    assert_eq!(info.metadata.title.as_deref(), Some("Returns"));

    let rows = parser.parse().unwrap();
    assert_eq!(rows, vec![vec!["Name", "Votes"], vec!["Ann", "10"]]);
    assert_eq!(parser.state(), ParserState::Finished);

    // The unknown tag is reported, not fatal.
    assert_eq!(parser.diagnostics().len(), 1);
    assert_eq!(parser.diagnostics()[0].page, Some(1));
}

#[test]
fn options_round_trip_through_json() {
    let options = ParserOptions::builder()
        .heading("Returns")
        .cells("2-4")
        .page_header(36.0)
        .build()
        .unwrap();
    let json = serde_json::to_string(&options).unwrap();
    let back: ParserOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(back, options);
}
