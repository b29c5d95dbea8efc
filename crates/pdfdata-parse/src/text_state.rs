//! Text and graphics state for the content stream interpreter.
//!
//! Tracks the text object (BT/ET), the text and line matrices moved by
//! Td, TD, T*, Tm and glyph advances, and the parameters saved and
//! restored by q/Q together with the CTM.

use pdfdata_core::Matrix;

/// Text parameters that belong to the graphics state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    /// Character spacing (Tc).
    pub char_spacing: f64,
    /// Word spacing (Tw), applied to single-byte code 32.
    pub word_spacing: f64,
    /// Horizontal scaling (Tz) as a percentage.
    pub h_scaling: f64,
    /// Leading (TL).
    pub leading: f64,
    /// Resource name of the current font (Tf).
    pub font_name: String,
    /// Current font size (Tf).
    pub font_size: f64,
    /// Rise (Ts).
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font_name: String::new(),
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

/// Interpreter state: graphics stack plus the current text object.
#[derive(Debug, Clone)]
pub struct TextState {
    pub params: TextParams,
    ctm: Matrix,
    stack: Vec<(Matrix, TextParams)>,
    in_text_object: bool,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl TextState {
    /// Start with the given CTM (e.g. a translation to the page origin).
    pub fn new(ctm: Matrix) -> Self {
        Self {
            params: TextParams::default(),
            ctm,
            stack: Vec::new(),
            in_text_object: false,
            text_matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
        }
    }

    pub fn ctm(&self) -> Matrix {
        self.ctm
    }

    pub fn in_text_object(&self) -> bool {
        self.in_text_object
    }

    /// `q`
    pub fn save(&mut self) {
        self.stack.push((self.ctm, self.params.clone()));
    }

    /// `Q`; an unmatched `Q` is ignored.
    pub fn restore(&mut self) {
        if let Some((ctm, params)) = self.stack.pop() {
            self.ctm = ctm;
            self.params = params;
        }
    }

    /// `cm`: prepend a matrix to the CTM.
    pub fn concat_ctm(&mut self, m: Matrix) {
        self.ctm = m.concat(&self.ctm);
    }

    /// `BT`
    pub fn begin_text(&mut self) {
        self.text_matrix = Matrix::identity();
        self.line_matrix = Matrix::identity();
        self.in_text_object = true;
    }

    /// `ET`
    pub fn end_text(&mut self) {
        self.in_text_object = false;
    }

    /// `Tm`: replaces both text and line matrix.
    pub fn set_text_matrix(&mut self, m: Matrix) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// `TD`: `-ty TL` then `tx ty Td`.
    pub fn move_text_position_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.params.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`
    pub fn move_to_next_line(&mut self) {
        let leading = self.params.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Move the text matrix by `tx` text-space units along the baseline.
    pub fn advance(&mut self, tx: f64) {
        self.text_matrix = Matrix::translation(tx, 0.0).concat(&self.text_matrix);
    }

    /// Text space to user space, including the rise.
    pub fn text_to_user(&self) -> Matrix {
        Matrix::translation(0.0, self.params.rise)
            .concat(&self.text_matrix)
            .concat(&self.ctm)
    }

    /// Current glyph origin in user space.
    pub fn origin(&self) -> (f64, f64) {
        self.text_to_user().apply(0.0, 0.0)
    }

    /// Effective font size in user space.
    pub fn effective_font_size(&self) -> f64 {
        let m = self.text_matrix.concat(&self.ctm);
        self.params.font_size * m.scale_y()
    }

    /// Horizontal scaling as a fraction.
    pub fn h_scale(&self) -> f64 {
        self.params.h_scaling / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn td_moves_relative_to_line_start() {
        let mut s = TextState::new(Matrix::identity());
        s.begin_text();
        s.move_text_position(72.0, 720.0);
        s.advance(30.0);
        assert_point(s.origin(), (102.0, 720.0));
        s.move_text_position(0.0, -14.0);
        assert_point(s.origin(), (72.0, 706.0));
    }

    #[test]
    fn td_upper_sets_leading_for_t_star() {
        let mut s = TextState::new(Matrix::identity());
        s.begin_text();
        s.set_text_matrix(Matrix::translation(10.0, 100.0));
        s.move_text_position_and_set_leading(0.0, -12.0);
        assert_eq!(s.params.leading, 12.0);
        s.move_to_next_line();
        assert_point(s.origin(), (10.0, 76.0));
    }

    #[test]
    fn ctm_and_rise_apply() {
        let mut s = TextState::new(Matrix::translation(-10.0, -20.0));
        s.concat_ctm(Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
        s.begin_text();
        s.move_text_position(5.0, 5.0);
        s.params.rise = 1.0;
        // (5, 6) scaled by 2 then shifted to the page origin.
        assert_point(s.origin(), (0.0, -8.0));
    }

    #[test]
    fn q_restores_ctm_and_params() {
        let mut s = TextState::new(Matrix::identity());
        s.params.font_size = 12.0;
        s.save();
        s.concat_ctm(Matrix::new(3.0, 0.0, 0.0, 3.0, 0.0, 0.0));
        s.params.font_size = 8.0;
        assert_eq!(s.effective_font_size(), 24.0);
        s.restore();
        assert_eq!(s.params.font_size, 12.0);
        assert_eq!(s.ctm(), Matrix::identity());
        s.restore();
        assert_eq!(s.ctm(), Matrix::identity());
    }

    #[test]
    fn bt_et_track_text_object() {
        let mut s = TextState::new(Matrix::identity());
        assert!(!s.in_text_object());
        s.begin_text();
        assert!(s.in_text_object());
        s.end_text();
        assert!(!s.in_text_object());
        assert_eq!(s.h_scale(), 1.0);
    }
}
