use anyhow::{Result, ensure};
use perivis_core::{Phase, Shape, Trial};
use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Transform};

/// Eccentricity circle radius, px (7.37 cm at 96 DPI in the reference
/// setup).
const CIRCLE_RADIUS_PX: f32 = 278.0;
/// Silhouette bounding box, px (1.57 cm at 96 DPI).
const SHAPE_SIZE_PX: f32 = 59.0;
const FIXATION_DOT_RADIUS: f32 = 6.0;
/// Inner vertex radius of the five-point star, as a fraction of the
/// outer radius.
const STAR_INNER_RATIO: f32 = 0.4;

/// Software renderer for the experiment frames. The state machine only
/// hands it a phase and a trial snapshot; everything about geometry and
/// rasterization stays on this side of the boundary.
pub struct ShapeRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),
    circle_radius: f32,
    shape_size: f32,
    shape_color: Color,
    paths: Vec<(Shape, Path)>,
    canvas: Pixmap,
}

impl ShapeRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_layout(width, height, CIRCLE_RADIUS_PX, SHAPE_SIZE_PX)
    }

    /// Layout numbers come from display calibration and are opaque
    /// configuration here.
    pub fn with_layout(width: u32, height: u32, circle_radius: f32, shape_size: f32) -> Self {
        let mut canvas = Pixmap::new(width.max(1), height.max(1)).expect("canvas pixmap");
        canvas.fill(Color::BLACK);

        let paths = Shape::ALL
            .iter()
            .map(|&shape| (shape, shape_path(shape, shape_size)))
            .collect();

        Self {
            width,
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            circle_radius,
            shape_size,
            shape_color: Color::WHITE,
            paths,
            canvas,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.center = (width as f32 / 2.0, height as f32 / 2.0);
        self.canvas = Pixmap::new(width.max(1), height.max(1)).expect("canvas pixmap");
        self.canvas.fill(Color::BLACK);
    }

    /// Rasterizes one frame for the given phase into `frame` (RGBA8,
    /// same dimensions as the renderer).
    pub fn render_frame(&mut self, phase: Phase, trial: Option<&Trial>, frame: &mut [u8]) -> Result<()> {
        self.canvas.fill(Color::BLACK);

        match phase {
            Phase::Display => {
                if let Some(trial) = trial {
                    self.draw_peripheral(trial.shape, trial.position);
                    match trial.fixation_shape {
                        Some(shape) => self.draw_centered(shape),
                        None => self.draw_fixation_dot(),
                    }
                }
            }
            Phase::Choice => self.draw_choice_row(),
            _ if phase.shows_fixation() => self.draw_fixation_dot(),
            // Intro and results text lives outside the framebuffer.
            _ => {}
        }

        ensure!(
            frame.len() == self.canvas.data().len(),
            "frame buffer is {} bytes, canvas is {}",
            frame.len(),
            self.canvas.data().len()
        );
        frame.copy_from_slice(self.canvas.data());
        Ok(())
    }

    fn path_for(&self, shape: Shape) -> &Path {
        self.paths
            .iter()
            .find(|(s, _)| *s == shape)
            .map(|(_, p)| p)
            .expect("all shapes pre-built")
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(self.shape_color);
        paint.anti_alias = true;
        paint
    }

    fn fill_at(&mut self, shape: Shape, x: f32, y: f32) {
        let paint = self.paint();
        let path = self.path_for(shape).clone();
        self.canvas.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::from_translate(x, y),
            None,
        );
    }

    fn draw_fixation_dot(&mut self) {
        let (cx, cy) = self.center;
        let mut pb = PathBuilder::new();
        pb.push_circle(cx, cy, FIXATION_DOT_RADIUS);
        if let Some(path) = pb.finish() {
            let paint = self.paint();
            self.canvas
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Places the shape on the eccentricity circle at `position`
    /// degrees, centered on that point.
    fn draw_peripheral(&mut self, shape: Shape, position: u16) {
        let (cx, cy) = self.center;
        let angle = (position as f32).to_radians();
        let x = cx + angle.cos() * self.circle_radius - self.shape_size / 2.0;
        let y = cy + angle.sin() * self.circle_radius - self.shape_size / 2.0;
        self.fill_at(shape, x, y);
    }

    fn draw_centered(&mut self, shape: Shape) {
        let (cx, cy) = self.center;
        let half = self.shape_size / 2.0;
        self.fill_at(shape, cx - half, cy - half);
    }

    /// Reminder row of the selectable shapes, in declared order.
    fn draw_choice_row(&mut self) {
        let (cx, cy) = self.center;
        let gap = self.shape_size * 0.5;
        let count = Shape::ALL.len() as f32;
        let total = count * self.shape_size + (count - 1.0) * gap;
        let mut x = cx - total / 2.0;
        let y = cy - self.shape_size / 2.0;
        for shape in Shape::ALL {
            self.fill_at(shape, x, y);
            x += self.shape_size + gap;
        }
    }
}

/// Silhouette outline with a `size` × `size` bounding box at the
/// origin.
pub fn shape_path(shape: Shape, size: f32) -> Path {
    let half = size / 2.0;
    let mut pb = PathBuilder::new();
    match shape {
        Shape::Circle => {
            pb.push_circle(half, half, half);
        }
        Shape::Square => {
            if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, size, size) {
                pb.push_rect(rect);
            }
        }
        Shape::Triangle => {
            pb.move_to(half, 0.0);
            pb.line_to(size, size);
            pb.line_to(0.0, size);
            pb.close();
        }
        Shape::Star => {
            for i in 0..5 {
                let outer = (i as f32 * 72.0 - 90.0).to_radians();
                let inner = (i as f32 * 72.0 + 36.0 - 90.0).to_radians();
                let ox = half + half * outer.cos();
                let oy = half + half * outer.sin();
                if i == 0 {
                    pb.move_to(ox, oy);
                } else {
                    pb.line_to(ox, oy);
                }
                pb.line_to(
                    half + half * STAR_INNER_RATIO * inner.cos(),
                    half + half * STAR_INNER_RATIO * inner.sin(),
                );
            }
            pb.close();
        }
        Shape::Cross => {
            let t = size / 6.0;
            pb.move_to(half - t, 0.0);
            pb.line_to(half + t, 0.0);
            pb.line_to(half + t, half - t);
            pb.line_to(size, half - t);
            pb.line_to(size, half + t);
            pb.line_to(half + t, half + t);
            pb.line_to(half + t, size);
            pb.line_to(half - t, size);
            pb.line_to(half - t, half + t);
            pb.line_to(0.0, half + t);
            pb.line_to(0.0, half - t);
            pb.line_to(half - t, half - t);
            pb.close();
        }
    }
    pb.finish().expect("non-degenerate shape path")
}
