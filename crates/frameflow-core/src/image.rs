// crates/frameflow-core/src/image.rs
// ============================================================================
// Module: SVG Image Renderer
// Description: Built-in image renderer producing SVG data URLs.
// Purpose: Render simple text frames without an external rasterizer.
// Dependencies: async-trait, base64
// ============================================================================

//! ## Overview
//! [`SvgImageRenderer`] draws the text leaves of an [`ImageElement`] tree as
//! centered lines on a solid background and returns a
//! `data:image/svg+xml;base64,...` URL. The root node's `background`,
//! `color` and `font-size` props override the renderer defaults. Richer
//! rasterizers plug in through [`ImageRenderer`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::core::frame::ImageElement;
use crate::core::frame::ImageOptions;
use crate::interfaces::ImageRenderError;
use crate::interfaces::ImageRenderer;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum element nesting depth accepted by the renderer.
pub const MAX_ELEMENT_DEPTH: usize = 32;

/// Maximum number of text lines drawn.
pub const MAX_TEXT_LINES: usize = 64;

// ============================================================================
// SECTION: Renderer
// ============================================================================

/// Renders element trees as SVG text frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgImageRenderer {
    /// Default background fill.
    background: String,
    /// Default text fill.
    color: String,
    /// Default font size in pixels.
    font_size: u32,
}

impl Default for SvgImageRenderer {
    fn default() -> Self {
        Self {
            background: "#17101f".to_string(),
            color: "#ffffff".to_string(),
            font_size: 48,
        }
    }
}

impl SvgImageRenderer {
    /// Creates a renderer with default colors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the default background fill.
    #[must_use]
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    /// Overrides the default text fill.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Renders the SVG document.
    ///
    /// # Errors
    ///
    /// Returns [`ImageRenderError`] when the element is too deep, has too many
    /// lines, or the dimensions are zero.
    pub fn render_svg(
        &self,
        element: &ImageElement,
        options: &ImageOptions,
    ) -> Result<String, ImageRenderError> {
        let (width, height) = options.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageRenderError::Failed("image dimensions must be positive".to_string()));
        }
        let mut lines = Vec::new();
        collect_text(element, 0, &mut lines)?;
        if lines.len() > MAX_TEXT_LINES {
            return Err(ImageRenderError::Unsupported(format!(
                "at most {MAX_TEXT_LINES} text lines are supported"
            )));
        }
        let root_prop = |name: &str| match element {
            ImageElement::Node {
                props, ..
            } => props.get(name).cloned(),
            ImageElement::Text(_) => None,
        };
        let background = root_prop("background").unwrap_or_else(|| self.background.clone());
        let color = root_prop("color").unwrap_or_else(|| self.color.clone());
        let font_size = match root_prop("font-size") {
            Some(raw) => raw
                .trim_end_matches("px")
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| ImageRenderError::Unsupported(format!("invalid font-size: {raw}")))?,
            None => self.font_size,
        };

        let line_height = font_size.saturating_mul(5) / 4;
        let line_count = u32::try_from(lines.len())
            .map_err(|_| ImageRenderError::Unsupported("too many text lines".to_string()))?;
        let block = line_height.saturating_mul(line_count);
        let first_baseline = height.saturating_sub(block) / 2 + line_height / 2;

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
             viewBox=\"0 0 {width} {height}\"><rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(&background)
        );
        let mut y = first_baseline;
        for line in &lines {
            svg.push_str(&format!(
                "<text x=\"50%\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"{font_size}\" \
                 fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>",
                escape_xml(&color),
                escape_xml(line)
            ));
            y = y.saturating_add(line_height);
        }
        svg.push_str("</svg>");
        Ok(svg)
    }
}

#[async_trait]
impl ImageRenderer for SvgImageRenderer {
    async fn render(
        &self,
        element: &ImageElement,
        options: &ImageOptions,
    ) -> Result<String, ImageRenderError> {
        let svg = self.render_svg(element, options)?;
        Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes())))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Collects non-empty text leaves in document order.
fn collect_text(
    element: &ImageElement,
    depth: usize,
    lines: &mut Vec<String>,
) -> Result<(), ImageRenderError> {
    if depth > MAX_ELEMENT_DEPTH {
        return Err(ImageRenderError::Unsupported(format!(
            "element nesting exceeds {MAX_ELEMENT_DEPTH} levels"
        )));
    }
    match element {
        ImageElement::Text(text) => {
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
        ImageElement::Node {
            children, ..
        } => {
            for child in children {
                collect_text(child, depth + 1, lines)?;
            }
        }
    }
    Ok(())
}

/// Escapes text for SVG content and attributes.
fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
