//! # Background Patterns
//!
//! Background images are painted as tiling patterns. Each image is
//! registered once in the document's shared resources, however many blocks
//! use it; each block gets its own pattern describing tile size, step and
//! start point.
//!
//! The start point is in PDF user space (origin bottom-left), because that
//! is what a pattern matrix needs. Everything else in the layout tree uses
//! a top-left origin.

use super::position::BackgroundUse;
use super::{ComponentRef, LayoutContext};
use crate::style::PatternRepeat;
use crate::units::{Point, Rect, Size};
use serde::Serialize;
use std::collections::BTreeMap;

/// Step used on an axis that doesn't repeat. Large enough that a second
/// tile never lands on the page.
pub const NO_REPEAT_STEP: f64 = i32::MAX as f64;

/// Resources shared by every page of the document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SharedResources {
    /// Keyed by image source.
    pub images: BTreeMap<String, ImageResource>,
    pub patterns: Vec<TilingPattern>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageResource {
    pub key: String,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TilingPattern {
    pub key: String,
    pub image_key: String,
    pub owner: Option<ComponentRef>,
    pub page_index: usize,
    /// The painted area: the block's border box, top-left origin.
    pub bounds: Rect,
    pub tile: Size,
    pub step: Size,
    /// First tile's top-left corner in PDF user space.
    pub start: Point,
    pub repeat: PatternRepeat,
}

impl SharedResources {
    /// Register an image source, returning its resource key.
    fn image_key(&mut self, src: &str, width_px: u32, height_px: u32) -> String {
        let next = self.images.len() + 1;
        self.images
            .entry(src.to_string())
            .or_insert_with(|| ImageResource {
                key: format!("Img{}", next),
                width_px,
                height_px,
            })
            .key
            .clone()
    }
}

pub fn build_resources(ctx: &LayoutContext<'_>, backgrounds: &[BackgroundUse]) -> SharedResources {
    let mut resources = SharedResources::default();
    for background in backgrounds {
        let image = &background.image;
        let info = match ctx.image_info(&image.src) {
            Some(info) if info.width_px > 0 && info.height_px > 0 => info,
            _ => {
                log::warn!(
                    "Background image for {} is unavailable; no pattern created",
                    background
                        .owner
                        .as_ref()
                        .and_then(|o| o.name.as_deref())
                        .unwrap_or("block")
                );
                continue;
            }
        };

        let image_key = resources.image_key(&image.src, info.width_px, info.height_px);
        let natural = Size::new(info.width_px as f64, info.height_px as f64);
        let bounds = background.bounds;

        let (tile, offset) = match image.repeat {
            PatternRepeat::Fill => {
                let scale = (bounds.width / natural.width).max(bounds.height / natural.height);
                let tile = Size::new(natural.width * scale, natural.height * scale);
                let offset = Point::new(
                    (bounds.width - tile.width) / 2.0,
                    (bounds.height - tile.height) / 2.0,
                );
                (tile, offset)
            }
            _ => {
                let tile = match (image.size_x, image.size_y) {
                    (Some(w), Some(h)) => Size::new(w, h),
                    (Some(w), None) => Size::new(w, w * natural.height / natural.width),
                    (None, Some(h)) => Size::new(h * natural.width / natural.height, h),
                    (None, None) => natural,
                };
                (tile, Point::new(image.x.unwrap_or(0.0), image.y.unwrap_or(0.0)))
            }
        };

        let step = Size::new(
            match image.repeat {
                PatternRepeat::Repeat | PatternRepeat::RepeatX => image.step_x.unwrap_or(tile.width),
                _ => NO_REPEAT_STEP,
            },
            match image.repeat {
                PatternRepeat::Repeat | PatternRepeat::RepeatY => {
                    image.step_y.unwrap_or(tile.height)
                }
                _ => NO_REPEAT_STEP,
            },
        );
        let start = Point::new(
            bounds.x + offset.x,
            background.page_height - (bounds.y + offset.y),
        );

        let key = format!("Ptn{}", resources.patterns.len() + 1);
        log::trace!("Pattern {} uses {} on page {}", key, image_key, background.page_index);
        resources.patterns.push(TilingPattern {
            key,
            image_key,
            owner: background.owner.clone(),
            page_index: background.page_index,
            bounds,
            tile,
            step,
            start,
            repeat: image.repeat,
        });
    }
    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::layout::{ComponentRegistry, LayoutEngine};
    use crate::model::Document;
    use crate::resources::tests::png_data_uri;
    use crate::style::BackgroundImage;

    fn build(images: Vec<BackgroundImage>, bounds: Rect) -> SharedResources {
        let engine = LayoutEngine::new();
        let fonts = FontContext::new();
        let registry = ComponentRegistry::build(&Document::new(vec![]));
        let ctx = LayoutContext {
            engine: &engine,
            fonts: &fonts,
            registry: &registry,
        };
        let uses: Vec<BackgroundUse> = images
            .into_iter()
            .map(|image| BackgroundUse {
                owner: None,
                page_index: 0,
                page_height: 300.0,
                bounds,
                image,
            })
            .collect();
        build_resources(&ctx, &uses)
    }

    fn image(src: &str, repeat: PatternRepeat) -> BackgroundImage {
        BackgroundImage {
            src: src.to_string(),
            repeat,
            ..Default::default()
        }
    }

    #[test]
    fn repeating_tile_uses_natural_size() {
        let uri = png_data_uri(30, 20);
        let res = build(
            vec![image(&uri, PatternRepeat::Repeat)],
            Rect::new(10.0, 10.0, 100.0, 50.0),
        );
        let pattern = &res.patterns[0];
        assert_eq!(pattern.tile, Size::new(30.0, 20.0));
        assert_eq!(pattern.step, Size::new(30.0, 20.0));
        assert_eq!(pattern.start, Point::new(10.0, 290.0));
    }

    #[test]
    fn one_declared_side_scales_the_other() {
        let uri = png_data_uri(30, 20);
        let mut img = image(&uri, PatternRepeat::Repeat);
        img.size_x = Some(60.0);
        let res = build(vec![img], Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(res.patterns[0].tile, Size::new(60.0, 40.0));
    }

    #[test]
    fn no_repeat_axes_use_the_sentinel_step() {
        let uri = png_data_uri(30, 20);
        let res = build(
            vec![
                image(&uri, PatternRepeat::NoRepeat),
                image(&uri, PatternRepeat::RepeatX),
            ],
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        assert_eq!(res.patterns[0].step, Size::new(NO_REPEAT_STEP, NO_REPEAT_STEP));
        assert_eq!(res.patterns[1].step, Size::new(30.0, NO_REPEAT_STEP));
    }

    #[test]
    fn fill_covers_and_centers() {
        let uri = png_data_uri(30, 20);
        let res = build(
            vec![image(&uri, PatternRepeat::Fill)],
            Rect::new(0.0, 0.0, 60.0, 60.0),
        );
        let pattern = &res.patterns[0];
        assert_eq!(pattern.tile, Size::new(90.0, 60.0));
        assert_eq!(pattern.start, Point::new(-15.0, 300.0));
    }

    #[test]
    fn image_is_registered_once() {
        let uri = png_data_uri(30, 20);
        let res = build(
            vec![
                image(&uri, PatternRepeat::Repeat),
                image(&uri, PatternRepeat::Repeat),
            ],
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        assert_eq!(res.images.len(), 1);
        assert_eq!(res.patterns.len(), 2);
        assert_eq!(res.patterns[0].image_key, res.patterns[1].image_key);
        assert_ne!(res.patterns[0].key, res.patterns[1].key);
    }

    #[test]
    fn missing_image_creates_no_pattern() {
        let res = build(
            vec![image("./no/such/image.png", PatternRepeat::Repeat)],
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        assert!(res.patterns.is_empty());
        assert!(res.images.is_empty());
    }
}
