// Mandala geometry, rotation and symmetry compositing.

use std::f64::consts::TAU;
use viz_core::canvas::cache::GradientCache;
use viz_core::canvas::recording::{count_commands, DrawCommand, RecordingHost};
use viz_core::config::{MandalaConfig, SymmetryMode, Theme, VisualizationConfig};
use viz_core::constants::{KALEIDOSCOPE_COPIES, MAX_ROTATION_SPEED};
use viz_core::renderer::{MandalaRenderer, OptimizedMandalaRenderer, Renderer};

fn config(f: impl FnOnce(&mut MandalaConfig)) -> VisualizationConfig {
    let mut cfg = MandalaConfig {
        glow_intensity: 0.0,
        ..MandalaConfig::default()
    };
    f(&mut cfg);
    VisualizationConfig::mandala(cfg)
}

fn standard(cfg: &VisualizationConfig) -> (RecordingHost, MandalaRenderer<RecordingHost>) {
    let host = RecordingHost::new(400.0, 300.0, 1.0);
    let mut r = MandalaRenderer::new(host.clone(), 1000.0);
    assert!(r.initialize());
    r.update_configuration(cfg);
    (host, r)
}

fn optimized(cfg: &VisualizationConfig) -> (RecordingHost, OptimizedMandalaRenderer<RecordingHost>) {
    let host = RecordingHost::new(400.0, 300.0, 1.0);
    let mut r = OptimizedMandalaRenderer::new(host.clone(), 1000.0);
    assert!(r.initialize());
    r.update_configuration(cfg);
    (host, r)
}

fn fills(cmds: &[DrawCommand]) -> usize {
    count_commands(cmds, |c| matches!(c, DrawCommand::Fill))
}

fn layers(cmds: &[DrawCommand]) -> usize {
    count_commands(cmds, |c| matches!(c, DrawCommand::DrawLayer { .. }))
}

#[test]
fn rotation_stays_in_one_turn() {
    for speed in [720.0, 33.3, -90.0] {
        let (_host, mut r) = standard(&config(|c| c.rotation_speed = speed));
        let mut t = 0.0;
        for _ in 0..500 {
            t += 16.7;
            let rot = r.advance_rotation(t);
            assert!((0.0..TAU).contains(&rot), "rotation {rot} at speed {speed}");
        }
    }
}

#[test]
fn extreme_rotation_speed_is_clamped_and_stays_finite() {
    let (_host, mut r) = standard(&config(|c| c.rotation_speed = 1e308));
    assert_eq!(r.config().rotation_speed, MAX_ROTATION_SPEED);
    r.advance_rotation(0.0);
    let rot = r.advance_rotation(1e12);
    assert!((0.0..TAU).contains(&rot), "rotation {rot}");
}

#[test]
fn first_frame_does_not_rotate() {
    let (_host, mut r) = standard(&config(|c| c.rotation_speed = 90.0));
    r.render_at(&[255; 1024], 5000.0);
    assert_eq!(r.rotation(), 0.0);
    r.render_at(&[255; 1024], 6000.0);
    assert!((r.rotation() - TAU / 4.0).abs() < 1e-9);
}

#[test]
fn segments_cover_every_cell_at_full_scale() {
    let (_host, r) = standard(&config(|c| {
        c.segments = 16;
        c.rings = 4;
    }));
    let segments = r.derive_segments(&[255; 1024]);
    assert_eq!(segments.len(), 64);
    // R = min(200, 150)
    let outermost = segments.iter().map(|s| s.outer_radius).fold(0.0, f64::max);
    assert!((outermost - 0.9 * 150.0).abs() < 1e-9);
    assert!(segments.iter().all(|s| s.inner_radius >= 0.15 * 150.0 - 1e-9));
    assert!(segments.iter().all(|s| s.bin < 1024));
}

#[test]
fn silent_input_draws_no_cells() {
    let (host, mut r) = standard(&config(|_| {}));
    host.clear_commands();
    r.render_at(&[0; 1024], 0.0);
    assert_eq!(fills(&host.commands()), 0);
}

#[test]
fn standard_renderer_fills_each_cell() {
    let cfg = config(|c| {
        c.segments = 12;
        c.rings = 3;
    });
    let (host, mut r) = standard(&cfg);
    host.clear_commands();
    r.render_at(&[255; 1024], 0.0);
    let cmds = host.commands();
    assert_eq!(fills(&cmds), 36);
    assert!(cmds.contains(&DrawCommand::GlobalAlpha(1.0)));
    assert_eq!(r.cached_gradients(), 3);

    r.set_theme(Theme::Light);
    assert_eq!(r.cached_gradients(), 0);
}

#[test]
fn radial_symmetry_composites_rotated_layers() {
    let (host, mut r) = standard(&config(|c| c.symmetry_mode = SymmetryMode::Radial4x));
    assert!(r.has_offscreen());
    host.clear_commands();
    r.render_at(&[255; 1024], 0.0);
    let screen = host.commands();
    assert_eq!(layers(&screen), 4);
    assert_eq!(count_commands(&screen, |c| matches!(c, DrawCommand::Rotate(_))), 3);
    // the cells themselves land in the off-screen buffer
    assert_eq!(fills(&screen), 0);
    assert!(fills(&host.offscreen_commands()) > 0);
}

#[test]
fn kaleidoscope_adds_fading_scaled_copies() {
    let (host, mut r) = standard(&config(|c| c.symmetry_mode = SymmetryMode::Kaleidoscope));
    host.clear_commands();
    r.render_at(&[255; 1024], 0.0);
    let screen = host.commands();
    assert_eq!(layers(&screen), 1 + KALEIDOSCOPE_COPIES);
    let alphas: Vec<f64> = screen
        .iter()
        .filter_map(|c| match c {
            DrawCommand::GlobalAlpha(a) if *a < 0.99 => Some(*a),
            _ => None,
        })
        .collect();
    assert_eq!(alphas.len(), KALEIDOSCOPE_COPIES);
    assert!(alphas.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn missing_offscreen_falls_back_to_direct_drawing() {
    let host = RecordingHost::new(400.0, 300.0, 1.0);
    host.deny_offscreen();
    let mut r = MandalaRenderer::new(host.clone(), 1000.0);
    assert!(r.initialize());
    r.update_configuration(&config(|c| c.symmetry_mode = SymmetryMode::MirrorX));
    assert!(!r.has_offscreen());
    host.clear_commands();
    r.render_at(&[255; 1024], 0.0);
    let screen = host.commands();
    assert_eq!(layers(&screen), 0);
    assert!(fills(&screen) > 0);
}

#[test]
fn glow_is_reset_after_each_pass() {
    let (host, mut r) = standard(&config(|c| c.glow_intensity = 0.5));
    host.clear_commands();
    r.render_at(&[255; 1024], 0.0);
    let cmds = host.commands();
    assert!(cmds.contains(&DrawCommand::ShadowBlur(12.0)));
    assert_eq!(cmds.last(), Some(&DrawCommand::Restore));
    let last_blur = cmds
        .iter()
        .rev()
        .find_map(|c| match c {
            DrawCommand::ShadowBlur(b) => Some(*b),
            _ => None,
        });
    assert_eq!(last_blur, Some(0.0));
}

#[test]
fn optimized_renderer_batches_by_ring_and_level() {
    let cfg = config(|c| {
        c.segments = 32;
        c.rings = 5;
    });
    let (host, mut r) = optimized(&cfg);
    host.clear_commands();
    r.render_at(&[255; 1024], 0.0);
    // every cell shares the top response level, so one fill per ring
    assert_eq!(fills(&host.commands()), 5);
    assert_eq!(r.cached_gradients(), 5);
}

#[test]
fn optimized_symmetry_redraws_from_data() {
    let cfg = config(|c| {
        c.rings = 3;
        c.symmetry_mode = SymmetryMode::Radial8x;
    });
    let (host, mut r) = optimized(&cfg);
    host.clear_commands();
    r.render_at(&[255; 1024], 0.0);
    let cmds = host.commands();
    assert_eq!(fills(&cmds), 3 * 8);
    assert_eq!(layers(&cmds), 0);
    assert_eq!(host.offscreen_count(), 0);
}

#[test]
fn ring_count_change_rebuilds_gradients() {
    let (_host, mut r) = optimized(&config(|c| c.rings = 3));
    r.render_at(&[255; 1024], 0.0);
    assert_eq!(r.cached_gradients(), 3);
    r.update_configuration(&config(|c| c.rings = 6));
    assert_eq!(r.cached_gradients(), 0);
    r.render_at(&[255; 1024], 16.0);
    assert_eq!(r.cached_gradients(), 6);
}

#[test]
fn dispose_releases_offscreen_and_is_idempotent() {
    let (host, mut r) = standard(&config(|c| c.symmetry_mode = SymmetryMode::MirrorY));
    assert!(r.has_offscreen());
    r.dispose();
    assert!(!r.has_offscreen());
    r.dispose();
    host.clear_commands();
    r.render_at(&[255; 1024], 0.0);
    assert!(host.commands().is_empty());
}

/// `(x, y, radius, start, end)` of every arc, sorted so batching order
/// does not matter.
fn arcs(cmds: &[DrawCommand]) -> Vec<(f64, f64, f64, f64, f64)> {
    let mut out: Vec<_> = cmds
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Arc {
                x,
                y,
                radius,
                start,
                end,
                ..
            } => Some((*x, *y, *radius, *start, *end)),
            _ => None,
        })
        .collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

fn ramp() -> Vec<u8> {
    (0..1024).map(|i| (i * 7 % 256) as u8).collect()
}

#[test]
fn both_renderers_draw_the_same_cells() {
    let cfg = config(|c| {
        c.segments = 24;
        c.rings = 5;
        c.rotation_speed = 45.0;
    });
    let data = ramp();
    let (std_host, mut std_r) = standard(&cfg);
    let (opt_host, mut opt_r) = optimized(&cfg);
    for t in [0.0, 500.0] {
        std_host.clear_commands();
        opt_host.clear_commands();
        std_r.render_at(&data, t);
        opt_r.render_at(&data, t);
    }
    assert_eq!(std_r.rotation(), opt_r.rotation());

    let expected = arcs(&std_host.commands());
    assert!(!expected.is_empty());
    assert_eq!(expected, arcs(&opt_host.commands()));
}

#[test]
fn radial_copy_matches_base_rotated_by_half_turn() {
    let cfg = config(|c| {
        c.rings = 3;
        c.symmetry_mode = SymmetryMode::Radial2x;
    });
    let data = ramp();
    let (std_host, mut std_r) = standard(&cfg);
    let (opt_host, mut opt_r) = optimized(&cfg);
    std_host.clear_commands();
    opt_host.clear_commands();
    std_r.render_at(&data, 0.0);
    opt_r.render_at(&data, 0.0);

    // the standard renderer rotates the whole buffer by π
    assert!(std_host.commands().contains(&DrawCommand::Rotate(std::f64::consts::PI)));
    let base = arcs(&std_host.offscreen_commands());

    let drawn = arcs(&opt_host.commands());
    assert_eq!(drawn.len(), 2 * base.len());
    let mut rotated: Vec<_> = base
        .iter()
        .map(|&(x, y, r, s, e)| (x, y, r, s + std::f64::consts::PI, e + std::f64::consts::PI))
        .collect();
    let mut both = base.clone();
    both.append(&mut rotated);
    both.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    assert_eq!(drawn, both);
}

#[test]
fn batched_fills_reuse_one_native_gradient_per_ring() {
    let cfg = config(|c| {
        c.rings = 8;
        c.symmetry_mode = SymmetryMode::Radial8x;
    });
    let (host, mut r) = optimized(&cfg);
    let mut cache = GradientCache::new();
    let mut assigned = 0;
    for frame in 0..4 {
        host.clear_commands();
        r.render_at(&ramp(), frame as f64 * 16.0);
        for cmd in host.commands() {
            if let DrawCommand::FillStyle(paint) = cmd {
                assigned += 1;
                cache.get_or_build(&paint, || Some(()));
            }
        }
    }
    assert!(assigned > 8 * 8);
    assert_eq!(cache.built(), 8);
}
