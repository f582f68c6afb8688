//! Canvas 2D backend (wasm only)
//!
//! Walks a [`Scene`] draw list and paints it to a `CanvasRenderingContext2d`.
//! Sprites whose images never loaded are skipped silently - the gate already
//! logged the failure.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement};

use super::scene::{Scene, Text, TextStyle};
use crate::assets::web::SpriteStore;

const FONT_FAMILY: &str = "\"Nasalization\", sans-serif";

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;
        Ok(Self { canvas, ctx })
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    /// Paint one frame
    pub fn render(&self, scene: &Scene, sprites: &SpriteStore) {
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;
        self.ctx.clear_rect(0.0, 0.0, w, h);

        if let Some(key) = scene.background {
            if let Some(img) = sprites.get(key) {
                let _ = self
                    .ctx
                    .draw_image_with_html_image_element_and_dw_and_dh(img, 0.0, 0.0, w, h);
            }
        }

        for rect in &scene.rects {
            self.set_fill(&rect.color.css());
            self.ctx.fill_rect(
                rect.pos.x as f64,
                rect.pos.y as f64,
                rect.size.x as f64,
                rect.size.y as f64,
            );
        }

        for disc in &scene.discs {
            self.set_fill(&disc.color.css());
            self.ctx.begin_path();
            let _ = self.ctx.arc(
                disc.pos.x as f64,
                disc.pos.y as f64,
                disc.radius.max(0.1) as f64,
                0.0,
                std::f64::consts::TAU,
            );
            self.ctx.fill();
        }

        for sprite in &scene.sprites {
            let Some(img) = sprites.get(sprite.key) else {
                continue;
            };
            self.ctx.save();
            let _ = self
                .ctx
                .translate(sprite.pos.x as f64, sprite.pos.y as f64);
            let _ = self.ctx.rotate(sprite.rotation as f64);
            let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                img,
                -(sprite.size.x as f64) / 2.0,
                -(sprite.size.y as f64) / 2.0,
                sprite.size.x as f64,
                sprite.size.y as f64,
            );
            self.ctx.restore();
        }

        for glow in &scene.glows {
            self.set_fill(&glow.color.css());
            self.ctx.begin_path();
            let _ = self.ctx.arc(
                glow.pos.x as f64,
                glow.pos.y as f64,
                glow.radius.max(0.1) as f64,
                0.0,
                std::f64::consts::TAU,
            );
            self.ctx.fill();
        }

        for stroke in &scene.strokes {
            if stroke.points.len() < 2 {
                continue;
            }
            self.ctx.save();
            if let Some(shadow) = stroke.shadow {
                self.ctx.set_shadow_blur(15.0);
                self.ctx.set_shadow_color(&shadow.css());
            }
            self.ctx
                .set_stroke_style(&JsValue::from_str(&stroke.color.css()));
            self.ctx.set_line_width(stroke.width as f64);
            self.ctx.begin_path();
            self.ctx
                .move_to(stroke.points[0].x as f64, stroke.points[0].y as f64);
            for p in &stroke.points[1..] {
                self.ctx.line_to(p.x as f64, p.y as f64);
            }
            self.ctx.stroke();
            self.ctx.restore();
        }

        for bar in &scene.bars {
            let (x, y) = (bar.pos.x as f64, bar.pos.y as f64);
            let (bw, bh) = (bar.size.x as f64, bar.size.y as f64);
            self.set_fill("gray");
            self.ctx.fill_rect(x, y, bw, bh);
            self.set_fill(&bar.fill.css());
            self.ctx
                .fill_rect(x, y, bw * bar.fraction.clamp(0.0, 1.0) as f64, bh);
            self.ctx.set_stroke_style(&JsValue::from_str("white"));
            self.ctx.set_line_width(2.0);
            self.ctx.stroke_rect(x, y, bw, bh);
        }

        for text in &scene.texts {
            self.draw_text(text, w);
        }
    }

    fn set_fill(&self, css: &str) {
        self.ctx.set_fill_style(&JsValue::from_str(css));
    }

    fn draw_text(&self, text: &Text, canvas_width: f64) {
        self.ctx.save();
        self.ctx
            .set_font(&format!("{}px {}", text.size_px, FONT_FAMILY));
        self.ctx.set_text_align("center");

        match self.text_fill(&text.style, canvas_width) {
            Fill::Css(css) => self.set_fill(&css),
            Fill::Gradient(gradient) => self.ctx.set_fill_style(gradient.as_ref()),
        }

        let _ = self.ctx.translate(text.pos.x as f64, text.pos.y as f64);
        if text.scale != 1.0 {
            let _ = self.ctx.scale(text.scale as f64, text.scale as f64);
        }
        let _ = self.ctx.fill_text(&text.content, 0.0, 0.0);
        if text.outline {
            self.ctx.set_stroke_style(&JsValue::from_str("black"));
            self.ctx.set_line_width(4.0);
            let _ = self.ctx.stroke_text(&text.content, 0.0, 0.0);
        }
        self.ctx.restore();
    }

    fn text_fill(&self, style: &TextStyle, canvas_width: f64) -> Fill {
        match style {
            TextStyle::Solid(color) => Fill::Css(color.css()),
            TextStyle::Rainbow { base_hue } => {
                let g = self.horizontal_gradient(canvas_width);
                let _ = g.add_color_stop(0.0, &format!("hsl({base_hue}, 100%, 50%)"));
                let _ = g.add_color_stop(
                    0.5,
                    &format!("hsl({}, 100%, 50%)", (base_hue + 120.0) % 360.0),
                );
                let _ = g.add_color_stop(
                    1.0,
                    &format!("hsl({}, 100%, 50%)", (base_hue + 240.0) % 360.0),
                );
                Fill::Gradient(g)
            }
            TextStyle::Sunset => {
                let g = self.horizontal_gradient(canvas_width);
                let _ = g.add_color_stop(0.0, "orange");
                let _ = g.add_color_stop(0.5, "gold");
                let _ = g.add_color_stop(1.0, "red");
                Fill::Gradient(g)
            }
            TextStyle::Neon => {
                let g = self.horizontal_gradient(canvas_width);
                let _ = g.add_color_stop(0.0, "cyan");
                let _ = g.add_color_stop(0.5, "magenta");
                let _ = g.add_color_stop(1.0, "yellow");
                Fill::Gradient(g)
            }
        }
    }

    fn horizontal_gradient(&self, width: f64) -> CanvasGradient {
        self.ctx.create_linear_gradient(0.0, 0.0, width, 0.0)
    }
}

enum Fill {
    Css(String),
    Gradient(CanvasGradient),
}
