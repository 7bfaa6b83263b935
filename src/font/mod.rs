//! # Font Management
//!
//! Text is measured against one of two kinds of face. The built-in
//! families (Helvetica, Times, Courier) carry AFM width tables and are
//! always available. Documents may register TrueType/OpenType faces,
//! whose advances are read once through ttf-parser. Nothing here embeds or
//! subsets fonts.

pub mod metrics;

use crate::error::FolioError;
use crate::model::FontEntry;
use crate::resources::read_source_bytes;
pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

/// The families every document can use without registering anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFamily {
    Helvetica,
    Times,
    Courier,
}

impl BuiltinFamily {
    /// Recognise a family name, including the usual generic aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "helvetica" | "arial" | "sans-serif" | "sans" => Some(Self::Helvetica),
            "times" | "times new roman" | "times-roman" | "serif" => Some(Self::Times),
            "courier" | "courier new" | "monospace" => Some(Self::Courier),
            _ => None,
        }
    }

    /// Italic faces share their upright widths.
    pub fn metrics(self, bold: bool) -> &'static StandardFontMetrics {
        match (self, bold) {
            (Self::Helvetica, true) => &metrics::HELVETICA_BOLD,
            (Self::Helvetica, false) => &metrics::HELVETICA,
            (Self::Times, _) => &metrics::TIMES,
            (Self::Courier, _) => &metrics::COURIER,
        }
    }
}

/// Advances and vertical extents of a registered font, in font units.
#[derive(Debug, Clone)]
pub struct LoadedFace {
    units_per_em: f64,
    advances: HashMap<char, u16>,
    missing_advance: u16,
    ascender: i16,
    descender: i16,
}

impl LoadedFace {
    /// Read every Unicode-mapped advance out of the font's cmap.
    pub fn parse(data: &[u8]) -> Result<Self, FolioError> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| FolioError::Font(format!("Unreadable font data: {}", e)))?;

        let mut advances = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|code| {
                    let advance = char::from_u32(code).and_then(|ch| {
                        let glyph = subtable.glyph_index(code)?;
                        Some((ch, face.glyph_hor_advance(glyph)?))
                    });
                    if let Some((ch, advance)) = advance {
                        advances.entry(ch).or_insert(advance);
                    }
                });
            }
        }

        let units_per_em = face.units_per_em();
        let missing_advance = advances
            .get(&' ')
            .copied()
            .filter(|w| *w > 0)
            .unwrap_or(units_per_em / 2);

        Ok(Self {
            units_per_em: f64::from(units_per_em.max(1)),
            advances,
            missing_advance,
            ascender: face.ascender(),
            descender: face.descender(),
        })
    }

    fn advance(&self, ch: char, font_size: f64) -> f64 {
        let units = self.advances.get(&ch).copied().unwrap_or(self.missing_advance);
        f64::from(units) / self.units_per_em * font_size
    }
}

/// A face picked for one style, ready to measure with.
#[derive(Debug, Clone, Copy)]
pub enum Face<'a> {
    Builtin(&'static StandardFontMetrics),
    Loaded(&'a LoadedFace),
}

impl Face<'_> {
    /// Advance width of one character in points.
    pub fn advance(&self, ch: char, font_size: f64) -> f64 {
        match self {
            Face::Builtin(m) => m.char_width(ch, font_size),
            Face::Loaded(f) => f.advance(ch, font_size),
        }
    }

    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.advance(ch, font_size)).sum()
    }

    /// (ascent, descent) in points, both positive.
    pub fn extents(&self, font_size: f64) -> (f64, f64) {
        let (ascender, descender, upem) = match self {
            Face::Builtin(m) => (m.ascender, m.descender, 1000.0),
            Face::Loaded(f) => (f.ascender, f.descender, f.units_per_em),
        };
        (
            f64::from(ascender) / upem * font_size,
            -f64::from(descender) / upem * font_size,
        )
    }
}

/// Registered faces, grouped by lowercased family name.
#[derive(Debug, Default)]
pub struct FontRegistry {
    families: HashMap<String, Vec<RegisteredFace>>,
}

#[derive(Debug)]
struct RegisteredFace {
    weight: u32,
    italic: bool,
    face: LoadedFace,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face from raw TrueType/OpenType bytes. A later face with
    /// the same weight and slant replaces the earlier one.
    pub fn register(
        &mut self,
        family: &str,
        weight: u32,
        italic: bool,
        data: &[u8],
    ) -> Result<(), FolioError> {
        let face = LoadedFace::parse(data)?;
        let faces = self
            .families
            .entry(family.trim().to_ascii_lowercase())
            .or_default();
        faces.retain(|f| !(f.weight == weight && f.italic == italic));
        faces.push(RegisteredFace { weight, italic, face });
        Ok(())
    }

    /// Pick a face for a family, weight and slant. Registered faces win,
    /// preferring a matching slant and then the nearest weight. Unknown
    /// families measure as Helvetica.
    pub fn resolve(&self, family: &str, weight: u32, italic: bool) -> Face<'_> {
        let key = family.trim().to_ascii_lowercase();
        if let Some(faces) = self.families.get(&key) {
            let best = faces
                .iter()
                .min_by_key(|f| (f.italic != italic, f.weight.abs_diff(weight)));
            if let Some(found) = best {
                return Face::Loaded(&found.face);
            }
        }

        let builtin = BuiltinFamily::from_name(family).unwrap_or_else(|| {
            log::debug!("No font for family '{}', measuring as Helvetica", family);
            BuiltinFamily::Helvetica
        });
        Face::Builtin(builtin.metrics(weight >= 600))
    }
}

/// Shared font context used by layout.
#[derive(Debug, Default)]
pub struct FontContext {
    registry: FontRegistry,
}

impl FontContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context with the document's fonts registered.
    pub fn with_fonts(entries: &[FontEntry]) -> Result<Self, FolioError> {
        let mut registry = FontRegistry::new();
        for entry in entries {
            let data = read_source_bytes(&entry.src).map_err(|e| {
                FolioError::Font(format!("Font '{}' could not be loaded: {}", entry.family, e))
            })?;
            registry.register(&entry.family, entry.weight, entry.italic, &data)?;
        }
        Ok(Self { registry })
    }

    pub fn face(&self, family: &str, weight: u32, italic: bool) -> Face<'_> {
        self.registry.resolve(family, weight, italic)
    }
}
