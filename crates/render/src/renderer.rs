use std::fmt::Write;

use crate::frame::RenderFrame;

/// Renderer-agnostic interface. All backends implement this trait.
///
/// A backend consumes captured frames and keeps its own resources (buffers,
/// programs) in sync with the frame's lifecycle sets. It never touches the
/// simulation.
pub trait Renderer {
    /// What one frame produces.
    type Output;

    fn render(&mut self, frame: &RenderFrame) -> Self::Output;
}

/// Text backend: one line per drawable. Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

fn fmt_position(out: &mut String, label: &str, p: Option<glam::Vec3>) {
    match p {
        Some(p) => {
            let _ = write!(out, " {label}=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
        }
        None => {
            let _ = write!(out, " {label}=-");
        }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, frame: &RenderFrame) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} (tick={}, t={:.2}s, x{}{}) ===",
            self.frames,
            frame.tick,
            frame.elapsed,
            frame.time_scale,
            if frame.halted { ", halted" } else { "" }
        );
        let _ = write!(
            out,
            "Drawables: {} (+{} -{})",
            frame.drawables.len(),
            frame.added.len(),
            frame.removed.len()
        );
        fmt_position(&mut out, "sun", frame.sun_position);
        fmt_position(&mut out, "player", frame.player_position);
        out.push('\n');

        for d in &frame.drawables {
            let Some(kind) = d.appearance.geometry else {
                continue;
            };
            let p = d.transform.w_axis;
            let _ = writeln!(
                out,
                "  [{}] {:?}({}) {:?} pos=({:.2}, {:.2}, {:.2})",
                d.entity,
                kind,
                d.appearance.size,
                d.appearance.shader,
                p.x,
                p.y,
                p.z
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameAnchors;
    use glam::Vec3;
    use orbital_common::GeometryKind;
    use orbital_kernel::Simulation;

    #[test]
    fn debug_renderer_empty_world() {
        let mut sim = Simulation::default();
        let frame = RenderFrame::capture(&mut sim, FrameAnchors::default());
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&frame);

        assert!(output.contains("tick=0"));
        assert!(output.contains("Drawables: 0"));
        assert!(output.contains("sun=-"));
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn debug_renderer_lists_drawables() {
        let mut sim = Simulation::default();
        let ship = sim.world.spawn(Some(GeometryKind::Rocket), 0.5, None);
        sim.world.translate(ship, Vec3::new(1.0, 2.0, 3.0));
        sim.world.spawn_node();

        let frame = RenderFrame::capture(
            &mut sim,
            FrameAnchors {
                sun: None,
                player: Some(ship),
            },
        );
        let output = DebugTextRenderer::new().render(&frame);

        assert!(output.contains("Drawables: 1 (+2 -0)"));
        assert!(output.contains("Rocket(0.5)"));
        assert!(output.contains("pos=(1.00, 2.00, 3.00)"));
        assert!(output.contains("player=(1.00, 2.00, 3.00)"));
    }
}
