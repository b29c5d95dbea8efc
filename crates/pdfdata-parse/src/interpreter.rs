//! Content stream interpreter.
//!
//! Decodes a page's content stream with [`lopdf::content::Content`] and
//! walks its operators, maintaining text state and the marked-content
//! stack. Each text-showing operator yields one [`Fragment`]; marked
//! content operators are passed through as [`ContentItem`] events. Form
//! XObjects are interpreted recursively via `Do`.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfdata_core::{ContentItem, Diagnostic, DiagnosticCode, Fragment, Matrix, TextDirection};
use tracing::{debug, trace, warn};
use unicode_normalization::UnicodeNormalization;

use crate::error::BackendError;
use crate::font::PdfFont;
use crate::text_state::TextState;

/// Maximum nesting of Form XObjects.
pub const MAX_FORM_DEPTH: usize = 10;

/// A `TJ` adjustment more negative than this (thousandths of an em) is
/// read as a word gap.
pub const KERNING_SPACE_THRESHOLD: f64 = -250.0;

/// Output of interpreting one page.
#[derive(Debug, Default)]
pub struct Interpretation {
    pub items: Vec<ContentItem>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
struct MarkedSection {
    tag: String,
    id: Option<u32>,
}

/// Interpret a page content stream.
///
/// `ctm` is the initial transformation, normally a translation that moves
/// the MediaBox origin to `(0, 0)`.
pub fn interpret_page(
    doc: &Document,
    page_number: usize,
    content: &[u8],
    resources: &Dictionary,
    ctm: Matrix,
) -> Result<Interpretation, BackendError> {
    let mut interpreter = Interpreter {
        doc,
        page_number,
        state: TextState::new(ctm),
        marked: Vec::new(),
        fonts: HashMap::new(),
        reported_fonts: HashSet::new(),
        out: Interpretation::default(),
    };
    interpreter.run(content, resources, 0)?;
    mark_line_ends(&mut interpreter.out.items);
    debug!(
        page = page_number,
        items = interpreter.out.items.len(),
        "interpreted page content"
    );
    Ok(interpreter.out)
}

struct Interpreter<'a> {
    doc: &'a Document,
    page_number: usize,
    state: TextState,
    marked: Vec<MarkedSection>,
    fonts: HashMap<ObjectId, Rc<PdfFont>>,
    reported_fonts: HashSet<String>,
    out: Interpretation,
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

fn operand(op: &Operation, index: usize) -> f64 {
    op.operands.get(index).and_then(number).unwrap_or(0.0)
}

fn operand_name(op: &Operation, index: usize) -> Option<String> {
    op.operands
        .get(index)
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

fn matrix_from(values: &[Object]) -> Option<Matrix> {
    let v: Vec<f64> = values.iter().filter_map(number).collect();
    (v.len() == 6).then(|| Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]))
}

/// Raw stream bytes, decompressed when a filter is present.
pub(crate) fn stream_bytes(stream: &lopdf::Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Interpreter(format!("stream decompression failed: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

fn direction_of(dx: f64, dy: f64) -> TextDirection {
    if dx.abs() >= dy.abs() {
        if dx < 0.0 {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        }
    } else if dy < 0.0 {
        TextDirection::Ttb
    } else {
        TextDirection::Btt
    }
}

impl<'a> Interpreter<'a> {
    fn diagnose(&mut self, code: DiagnosticCode, description: String) {
        warn!(page = self.page_number, code = %code, "{description}");
        self.out
            .diagnostics
            .push(Diagnostic::new(code, description).on_page(self.page_number));
    }

    fn run(
        &mut self,
        content: &[u8],
        resources: &'a Dictionary,
        depth: usize,
    ) -> Result<(), BackendError> {
        if depth > MAX_FORM_DEPTH {
            return Err(BackendError::Interpreter(format!(
                "Form XObject recursion depth {depth} exceeds limit {MAX_FORM_DEPTH}"
            )));
        }
        let content = Content::decode(content)
            .map_err(|e| BackendError::Interpreter(format!("invalid content stream: {e}")))?;

        for op in &content.operations {
            trace!(operator = %op.operator, "content operator");
            match op.operator.as_str() {
                "q" => self.state.save(),
                "Q" => self.state.restore(),
                "cm" => {
                    if let Some(m) = matrix_from(&op.operands) {
                        self.state.concat_ctm(m);
                    }
                }
                "BT" => self.state.begin_text(),
                "ET" => self.state.end_text(),
                "Tf" => {
                    self.state.params.font_name = operand_name(op, 0).unwrap_or_default();
                    self.state.params.font_size = operand(op, 1);
                }
                "Tc" => self.state.params.char_spacing = operand(op, 0),
                "Tw" => self.state.params.word_spacing = operand(op, 0),
                "Tz" => self.state.params.h_scaling = operand(op, 0),
                "TL" => self.state.params.leading = operand(op, 0),
                "Ts" => self.state.params.rise = operand(op, 0),
                "Td" => self.state.move_text_position(operand(op, 0), operand(op, 1)),
                "TD" => self
                    .state
                    .move_text_position_and_set_leading(operand(op, 0), operand(op, 1)),
                "Tm" => {
                    if let Some(m) = matrix_from(&op.operands) {
                        self.state.set_text_matrix(m);
                    }
                }
                "T*" => self.state.move_to_next_line(),
                "Tj" => self.show_text(resources, &op.operands),
                "TJ" => {
                    if let Some(Ok(parts)) = op.operands.first().map(Object::as_array) {
                        self.show_text(resources, parts);
                    }
                }
                "'" => {
                    self.state.move_to_next_line();
                    self.show_text(resources, &op.operands);
                }
                "\"" => {
                    self.state.params.word_spacing = operand(op, 0);
                    self.state.params.char_spacing = operand(op, 1);
                    self.state.move_to_next_line();
                    self.show_text(resources, op.operands.get(2..).unwrap_or_default());
                }
                "BMC" => {
                    let tag = operand_name(op, 0).unwrap_or_default();
                    self.begin_marked(tag.clone(), None);
                    self.out.items.push(ContentItem::BeginMarkedContent { tag });
                }
                "BDC" => {
                    let tag = operand_name(op, 0).unwrap_or_default();
                    let id = self.marked_content_id(resources, op.operands.get(1));
                    self.begin_marked(tag.clone(), id);
                    self.out
                        .items
                        .push(ContentItem::BeginMarkedContentProps { tag, id });
                }
                "EMC" => {
                    self.marked.pop();
                    self.out.items.push(ContentItem::EndMarkedContent);
                }
                "Do" => {
                    if let Some(name) = operand_name(op, 0) {
                        self.do_xobject(resources, &name, depth)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn begin_marked(&mut self, tag: String, id: Option<u32>) {
        self.marked.push(MarkedSection { tag, id });
    }

    /// MCID from an inline property list or a `/Properties` resource.
    fn marked_content_id(&self, resources: &Dictionary, props: Option<&Object>) -> Option<u32> {
        let dict = match props? {
            Object::Dictionary(d) => d,
            Object::Name(name) => resources
                .get(b"Properties")
                .ok()
                .map(|o| resolve(self.doc, o))
                .and_then(|o| o.as_dict().ok())?
                .get(name)
                .ok()
                .map(|o| resolve(self.doc, o))
                .and_then(|o| o.as_dict().ok())?,
            _ => return None,
        };
        dict.get(b"MCID")
            .ok()
            .and_then(number)
            .filter(|n| *n >= 0.0)
            .map(|n| n as u32)
    }

    /// Load the current font, reporting a missing resource once per name.
    fn current_font(&mut self, resources: &Dictionary) -> Rc<PdfFont> {
        let doc = self.doc;
        let name = self.state.params.font_name.clone();
        let entry = resources
            .get(b"Font")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|fonts| fonts.get(name.as_bytes()).ok());

        match entry {
            Some(Object::Reference(id)) => {
                if let Some(font) = self.fonts.get(id) {
                    return Rc::clone(font);
                }
                let font = doc
                    .get_object(*id)
                    .and_then(Object::as_dict)
                    .map(|d| PdfFont::from_dict(doc, d))
                    .unwrap_or_default();
                let font = Rc::new(font);
                self.fonts.insert(*id, Rc::clone(&font));
                font
            }
            Some(Object::Dictionary(d)) => Rc::new(PdfFont::from_dict(doc, d)),
            _ => {
                if self.reported_fonts.insert(format!("missing:{name}")) {
                    self.diagnose(
                        DiagnosticCode::MissingFont,
                        format!("font /{name} not found in resources"),
                    );
                }
                Rc::new(PdfFont::default())
            }
        }
    }

    /// Show strings and `TJ` adjustments as one fragment.
    fn show_text(&mut self, resources: &Dictionary, parts: &[Object]) {
        let font = self.current_font(resources);
        let font_size = self.state.params.font_size;
        let h_scale = self.state.h_scale();
        let start = self.state.origin();
        let height = self.state.effective_font_size();
        let mut text = String::new();
        let mut fallback = false;

        for part in parts {
            match part {
                Object::String(bytes, _) => {
                    for glyph in font.decode(bytes) {
                        fallback |= glyph.fallback;
                        text.push_str(&glyph.text);
                        let mut tx =
                            glyph.width / 1000.0 * font_size + self.state.params.char_spacing;
                        if !font.is_composite() && glyph.code == 32 {
                            tx += self.state.params.word_spacing;
                        }
                        self.state.advance(tx * h_scale);
                    }
                }
                other => {
                    if let Some(adjust) = number(other) {
                        self.state.advance(-adjust / 1000.0 * font_size * h_scale);
                        if adjust < KERNING_SPACE_THRESHOLD
                            && !text.is_empty()
                            && !text.ends_with(' ')
                        {
                            text.push(' ');
                        }
                    }
                }
            }
        }

        if fallback {
            let name = self.state.params.font_name.clone();
            if self.reported_fonts.insert(format!("fallback:{name}")) {
                self.diagnose(
                    DiagnosticCode::EncodingFallback,
                    format!("font /{name} has codes without a Unicode mapping"),
                );
            }
        }

        let text: String = text.nfkc().collect();
        if text.is_empty() {
            return;
        }
        let end = self.state.origin();
        let (dx, dy) = (end.0 - start.0, end.1 - start.1);
        let mut fragment = Fragment::new(text, start.0, start.1, dx.hypot(dy))
            .with_height(height)
            .with_direction(direction_of(dx, dy));
        if let Some(section) = self.marked.last() {
            fragment = fragment.with_tag(section.tag.clone(), section.id);
        }
        if self.marked.iter().any(|s| s.tag == "Artifact") {
            fragment = fragment.as_artifact();
        }
        self.out.items.push(fragment.into());
    }

    fn do_xobject(
        &mut self,
        resources: &'a Dictionary,
        name: &str,
        depth: usize,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let stream = resources
            .get(b"XObject")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|x| x.get(name.as_bytes()).ok())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok());
        let Some(stream) = stream else {
            self.diagnose(
                DiagnosticCode::Other("MISSING_XOBJECT".into()),
                format!("XObject /{name} not found in resources"),
            );
            return Ok(());
        };
        let is_form = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == b"Form");
        if !is_form {
            return Ok(());
        }

        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .unwrap_or(resources);
        let content = stream_bytes(stream)?;

        self.state.save();
        if let Some(m) = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| o.as_array().ok())
            .and_then(|a| matrix_from(a))
        {
            self.state.concat_ctm(m);
        }
        let result = self.run(&content, form_resources, depth + 1);
        self.state.restore();
        result
    }
}

/// Set `has_eol` on the last fragment of each visual line: the next
/// fragment's baseline moves by more than half the font size, or there is
/// no next fragment.
fn mark_line_ends(items: &mut [ContentItem]) {
    let positions: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| matches!(item, ContentItem::Text(_)))
        .map(|(i, _)| i)
        .collect();
    for (k, &i) in positions.iter().enumerate() {
        let next_y = positions.get(k + 1).and_then(|&j| match &items[j] {
            ContentItem::Text(f) => Some(f.y),
            _ => None,
        });
        if let ContentItem::Text(frag) = &mut items[i] {
            frag.has_eol = next_y.is_none_or(|y| (y - frag.y).abs() > frag.font_size() / 2.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    fn fragments(out: &Interpretation) -> Vec<&Fragment> {
        out.items
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    fn helvetica(doc: &mut Document) -> Dictionary {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        dictionary! { "Font" => dictionary! { "F1" => Object::Reference(font_id) } }
    }

    fn run(doc: &Document, content: &[u8], resources: &Dictionary) -> Interpretation {
        interpret_page(doc, 1, content, resources, Matrix::identity()).unwrap()
    }

    #[test]
    fn tj_yields_positioned_fragment() {
        let mut doc = Document::with_version("1.5");
        let resources = helvetica(&mut doc);
        let out = run(&doc, b"BT /F1 10 Tf 72 700 Td (Name) Tj ET", &resources);
        let frags = fragments(&out);
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "Name");
        assert_eq!((frags[0].x, frags[0].y), (72.0, 700.0));
        // Four glyphs at the default width of 500/1000 em.
        assert!((frags[0].width - 20.0).abs() < 1e-9);
        assert_eq!(frags[0].height, Some(10.0));
        assert!(frags[0].has_eol);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn tj_array_large_gap_inserts_space() {
        let mut doc = Document::with_version("1.5");
        let resources = helvetica(&mut doc);
        let out = run(
            &doc,
            b"BT /F1 10 Tf 0 0 Td [(Ab) -20 (c) -1000 (Dd)] TJ ET",
            &resources,
        );
        let frags = fragments(&out);
        assert_eq!(frags[0].text, "Abc Dd");
        // 5 glyphs * 5 + 0.2 + 10 of kerning.
        assert!((frags[0].width - 35.2).abs() < 1e-9);
    }

    #[test]
    fn line_ends_follow_baseline_changes() {
        let mut doc = Document::with_version("1.5");
        let resources = helvetica(&mut doc);
        let out = run(
            &doc,
            b"BT /F1 10 Tf 14 TL 0 100 Td (a) Tj 50 0 Td (b) Tj T* (c) Tj ' (d) Tj ET",
            &resources,
        );
        let frags = fragments(&out);
        let eols: Vec<bool> = frags.iter().map(|f| f.has_eol).collect();
        let ys: Vec<f64> = frags.iter().map(|f| f.y).collect();
        assert_eq!(ys, vec![100.0, 100.0, 86.0, 72.0]);
        assert_eq!(eols, vec![false, true, true, true]);
        assert_eq!(frags[2].x, 50.0);
    }

    #[test]
    fn marked_content_events_and_tags() {
        let mut doc = Document::with_version("1.5");
        let resources = helvetica(&mut doc);
        let out = run(
            &doc,
            b"/P <</MCID 3>> BDC BT /F1 10 Tf (A) Tj ET EMC \
              /Artifact BMC BT /F1 10 Tf 0 20 Td (1) Tj ET EMC",
            &resources,
        );
        assert_eq!(
            out.items[0],
            ContentItem::BeginMarkedContentProps {
                tag: "P".into(),
                id: Some(3)
            }
        );
        assert_eq!(out.items[2], ContentItem::EndMarkedContent);
        let frags = fragments(&out);
        assert_eq!(frags[0].tag.as_deref(), Some("P"));
        assert_eq!(frags[0].id, Some(3));
        assert!(!frags[0].artifact);
        assert!(frags[1].artifact);
    }

    #[test]
    fn mcid_from_properties_resource() {
        let mut doc = Document::with_version("1.5");
        let mut resources = helvetica(&mut doc);
        resources.set(
            "Properties",
            dictionary! { "MC0" => dictionary! { "MCID" => 7 } },
        );
        let out = run(&doc, b"/Span /MC0 BDC BT /F1 10 Tf (x) Tj ET EMC", &resources);
        assert_eq!(fragments(&out)[0].id, Some(7));
    }

    #[test]
    fn missing_font_is_reported_once() {
        let doc = Document::with_version("1.5");
        let out = run(
            &doc,
            b"BT /F9 12 Tf (a) Tj (b) Tj ET",
            &Dictionary::new(),
        );
        assert_eq!(fragments(&out).len(), 2);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].code, DiagnosticCode::MissingFont);
        assert_eq!(out.diagnostics[0].page, Some(1));
    }

    #[test]
    fn ctm_and_text_matrix_scale_height() {
        let mut doc = Document::with_version("1.5");
        let resources = helvetica(&mut doc);
        let out = interpret_page(
            &doc,
            1,
            b"q 2 0 0 2 0 0 cm BT /F1 6 Tf 1 0 0 1 10 10 Tm (x) Tj ET Q",
            &resources,
            Matrix::translation(0.0, -5.0),
        )
        .unwrap();
        let frag = fragments(&out)[0];
        assert_eq!((frag.x, frag.y), (20.0, 15.0));
        assert_eq!(frag.height, Some(12.0));
    }

    #[test]
    fn right_to_left_advance_sets_direction() {
        let mut doc = Document::with_version("1.5");
        let resources = helvetica(&mut doc);
        let out = run(&doc, b"BT /F1 10 Tf -1 0 0 1 100 0 Tm (ab) Tj ET", &resources);
        assert_eq!(fragments(&out)[0].direction, TextDirection::Rtl);
    }

    #[test]
    fn text_is_nfkc_normalized() {
        let mut doc = Document::with_version("1.5");
        let cmap = Stream::new(dictionary! {}, b"beginbfchar <01> <FB01> endbfchar".to_vec());
        let cmap_id = doc.add_object(Object::Stream(cmap));
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "ToUnicode" => Object::Reference(cmap_id),
        });
        let resources = dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
        };
        let out = run(&doc, b"BT /F1 10 Tf <01> Tj ET", &resources);
        assert_eq!(fragments(&out)[0].text, "fi");
    }

    #[test]
    fn form_xobject_is_interpreted() {
        let mut doc = Document::with_version("1.5");
        let font_resources = helvetica(&mut doc);
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 100.into(), 0.into()],
                "Resources" => font_resources,
            },
            b"BT /F1 10 Tf 0 50 Td (inner) Tj ET".to_vec(),
        );
        let form_id = doc.add_object(Object::Stream(form));
        let resources = dictionary! {
            "XObject" => dictionary! { "Fm0" => Object::Reference(form_id) },
        };
        let out = run(&doc, b"/Fm0 Do /Nope Do", &resources);
        let frags = fragments(&out);
        assert_eq!(frags[0].text, "inner");
        assert_eq!((frags[0].x, frags[0].y), (100.0, 50.0));
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn self_referencing_form_hits_depth_limit() {
        let mut doc = Document::with_version("1.5");
        let form_id = doc.new_object_id();
        let form = Stream::new(
            dictionary! {
                "Subtype" => "Form",
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Me" => Object::Reference(form_id) },
                },
            },
            b"/Me Do".to_vec(),
        );
        doc.objects.insert(form_id, Object::Stream(form));
        let resources = dictionary! {
            "XObject" => dictionary! { "Me" => Object::Reference(form_id) },
        };
        let err = interpret_page(&doc, 1, b"/Me Do", &resources, Matrix::identity()).unwrap_err();
        assert!(err.to_string().contains("recursion depth"));
    }

    #[test]
    fn direction_from_displacement() {
        assert_eq!(direction_of(5.0, 0.0), TextDirection::Ltr);
        assert_eq!(direction_of(0.0, 0.0), TextDirection::Ltr);
        assert_eq!(direction_of(-5.0, 1.0), TextDirection::Rtl);
        assert_eq!(direction_of(0.0, -5.0), TextDirection::Ttb);
        assert_eq!(direction_of(1.0, 5.0), TextDirection::Btt);
    }
}
