//! Glyph outlines for text objects.
//!
//! One sans-serif face is picked from the font database and every text
//! object is laid out with it: one row per `\n`-separated line, glyphs
//! advanced left to right with no shaping or kerning.

use fontdb::{Database, Family, ID, Query, Stretch, Style, Weight};
use lessonboard_core::shapes::Text;
use std::sync::OnceLock;
use tiny_skia::{Path, PathBuilder, Transform};

/// Families tried, in order, before the database's generic sans-serif.
const PREFERRED_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
    "Helvetica",
];

/// A font database plus the face used for every text object.
pub struct FontBook {
    db: Database,
    face: Option<ID>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .field("face", &self.face)
            .finish()
    }
}

impl FontBook {
    /// Fonts installed on the system.
    pub fn system() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        Self::from_database(db)
    }

    /// A single font file (TTF/OTF bytes).
    pub fn from_font_data(data: Vec<u8>) -> Self {
        let mut db = Database::new();
        db.load_font_data(data);
        Self::from_database(db)
    }

    pub fn from_database(db: Database) -> Self {
        let mut families: Vec<Family<'_>> =
            PREFERRED_FAMILIES.iter().copied().map(Family::Name).collect();
        families.push(Family::SansSerif);
        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let face = db
            .query(&query)
            .or_else(|| db.faces().next().map(|info| info.id));

        match face.and_then(|id| db.face(id)) {
            Some(info) => log::debug!(
                "Text face: {}",
                info.families.first().map(|(name, _)| name.as_str()).unwrap_or("unnamed")
            ),
            None => log::warn!("No font faces found, text objects will not be rasterized"),
        }
        Self { db, face }
    }

    /// The system font book, loaded on first use.
    pub fn shared() -> &'static FontBook {
        static BOOK: OnceLock<FontBook> = OnceLock::new();
        BOOK.get_or_init(FontBook::system)
    }

    pub fn has_font(&self) -> bool {
        self.face.is_some()
    }

    /// Glyph outlines of `text` in content coordinates, one path per
    /// visible glyph. Empty without a usable face.
    pub fn text_outlines(&self, text: &Text) -> Vec<Path> {
        let Some(id) = self.face else {
            return Vec::new();
        };
        if !(text.font_size.is_finite() && text.font_size > 0.0) {
            return Vec::new();
        }

        self.db
            .with_face_data(id, |data, index| match ttf_parser::Face::parse(data, index) {
                Ok(face) => layout(&face, text),
                Err(e) => {
                    log::warn!("Unreadable font face: {}", e);
                    Vec::new()
                }
            })
            .unwrap_or_default()
    }
}

fn layout(face: &ttf_parser::Face<'_>, text: &Text) -> Vec<Path> {
    let units_per_em = face.units_per_em();
    if units_per_em == 0 {
        return Vec::new();
    }
    let scale = (text.font_size / units_per_em as f64) as f32;
    let ascent = face.ascender() as f32 * scale;
    let line_height = text.line_height() as f32;
    let left = text.position.x as f32;

    let mut glyphs = Vec::new();
    for (row, line) in text.content.lines().enumerate() {
        let baseline = text.position.y as f32 + row as f32 * line_height + ascent;
        let mut pen = left;
        for ch in line.chars() {
            let glyph = face.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0));
            let mut builder = GlyphOutlineBuilder::new();
            if face.outline_glyph(glyph, &mut builder).is_some() {
                // Font units are y-up; content space is y-down.
                let placement = Transform::from_row(scale, 0.0, 0.0, -scale, pen, baseline);
                if let Some(path) = builder.finish().and_then(|path| path.transform(placement)) {
                    glyphs.push(path);
                }
            }
            pen += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
        }
    }
    glyphs
}

/// Collects a glyph outline, in font units, into a tiny-skia path.
struct GlyphOutlineBuilder {
    builder: PathBuilder,
}

impl GlyphOutlineBuilder {
    fn new() -> Self {
        Self {
            builder: PathBuilder::new(),
        }
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl ttf_parser::OutlineBuilder for GlyphOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
