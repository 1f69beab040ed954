//! Measurement and image-size oracles: the two external collaborators
//! `spec.md` §6 names explicitly. Text shaping and image decoding never
//! happen inside this crate; every width the engine needs for text or
//! replaced content comes from here.

use crate::pixels::CSSPixels;

/// Text width/height measurement, consumed by the intrinsic sizer, the
/// inline formatter and the text layout module.
pub trait MeasureTextOracle {
    /// The rendered size of `text` set at `font_size`, `bold` or not, as
    /// a single unbroken run.
    fn measure_text(&self, text: &str, font_size: CSSPixels, bold: bool) -> (CSSPixels, CSSPixels);

    /// Break `text` into lines, given that the first line has
    /// `first_line_max` available and every subsequent line has
    /// `subsequent_max` available (`spec.md` §4.7: the first line may be
    /// narrower because of preceding inline content on the same line).
    fn break_text(
        &self,
        text: &str,
        font_size: CSSPixels,
        bold: bool,
        first_line_max: CSSPixels,
        subsequent_max: CSSPixels,
    ) -> Vec<String>;

    /// The first whitespace-delimited token of `text`, used by §9.5's
    /// clear-before-breaking rule and by the intrinsic sizer's
    /// min-content computation.
    fn first_word<'a>(&self, text: &'a str) -> &'a str {
        text.split_whitespace().next().unwrap_or(text)
    }

    /// The line height a line box should use when it contains no text at
    /// all at this font size (the CSS "strut", `spec.md` GLOSSARY).
    fn natural_line_height(&self, font_size: CSSPixels) -> CSSPixels {
        font_size * 1.2
    }
}

/// Intrinsic image dimensions, consumed for replaced elements.
/// `spec.md` §7: a failed lookup degrades to a placeholder rather than
/// propagating an error — `image_dimensions` therefore never returns
/// `Result`; callers that want to distinguish "loaded" from "placeholder"
/// use the `Ok`/`Err` of the returned `Result` alias below at the call
/// site instead of threading failure through every caller.
pub trait ImageOracle {
    fn image_dimensions(&self, src: &str) -> Result<(CSSPixels, CSSPixels), ImageLoadError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLoadError;

/// The 100x100 fallback size `spec.md` §7 mandates for unresolved images.
pub const PLACEHOLDER_IMAGE_SIZE: (f32, f32) = (100.0, 100.0);

#[must_use]
pub fn image_size_or_placeholder(oracle: &dyn ImageOracle, src: &str) -> (CSSPixels, CSSPixels) {
    match oracle.image_dimensions(src) {
        Ok(size) => size,
        Err(_) => {
            log::debug!("image '{src}' failed to load, using placeholder size");
            (
                CSSPixels(PLACEHOLDER_IMAGE_SIZE.0),
                CSSPixels(PLACEHOLDER_IMAGE_SIZE.1),
            )
        },
    }
}

/// A deterministic, shaping-free oracle useful for tests and for
/// headless layout where no real font is loaded: every glyph occupies a
/// fixed fraction of the font size, wide enough that whole-word
/// line-breaking behaves sensibly without needing real font metrics.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonospaceOracle;

impl MeasureTextOracle for MonospaceOracle {
    fn measure_text(&self, text: &str, font_size: CSSPixels, bold: bool) -> (CSSPixels, CSSPixels) {
        let advance = if bold { 0.64 } else { 0.6 };
        let width = font_size * advance * text.chars().count() as f32;
        (width, self.natural_line_height(font_size))
    }

    fn break_text(
        &self,
        text: &str,
        font_size: CSSPixels,
        bold: bool,
        first_line_max: CSSPixels,
        subsequent_max: CSSPixels,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut max_for_current_line = first_line_max;

        for word in text.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            let (width, _) = self.measure_text(&candidate, font_size, bold);

            if width <= max_for_current_line || current.is_empty() {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                max_for_current_line = subsequent_max;
                current = word.to_string();
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }

        lines
    }
}
