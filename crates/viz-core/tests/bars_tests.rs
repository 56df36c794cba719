// Bar layout, magnitudes and peak hold, rendered into the recording backend.

use viz_core::canvas::recording::{count_commands, filled_rects, DrawCommand, RecordingHost};
use viz_core::canvas::CompositeOp;
use viz_core::config::{BarConfig, BarVisualMode, ColorMode, VisualizationConfig};
use viz_core::effects::{BarEffects, BarSample};
use viz_core::renderer::bars::{log_bins, BarLayout};
use viz_core::renderer::{BarRenderer, Renderer};

fn ready_renderer(width: f64, height: f64) -> (RecordingHost, BarRenderer<RecordingHost>) {
    let host = RecordingHost::new(width, height, 1.0);
    let mut renderer = BarRenderer::new(host.clone(), 1000.0);
    assert!(renderer.initialize());
    (host, renderer)
}

#[test]
fn layout_is_ordered_and_fits_the_canvas() {
    let cfg = BarConfig::default();
    for &count in &[8usize, 13, 64, 100, 256] {
        for &width in &[40.0, 300.0, 1920.0] {
            let layout = BarLayout::compute(width, count, 1024, &cfg);
            let slots = layout.slots();
            assert_eq!(slots.len(), count);
            for pair in slots.windows(2) {
                assert!(
                    pair[0].x + pair[0].width <= pair[1].x + 1e-9,
                    "bars overlap at count {count}, width {width}"
                );
            }
            let last = slots[slots.len() - 1];
            assert!(last.x + last.width <= width + 1e-9);
            assert!(slots[0].x >= 0.0);
        }
    }
}

#[test]
fn bins_are_non_decreasing_and_skip_dc() {
    for &bin_count in &[2usize, 64, 1024, 4096] {
        for &bars in &[8usize, 64, 256] {
            let bins = log_bins(bars, bin_count, &BarConfig::default());
            assert!(bins.windows(2).all(|w| w[0] <= w[1]));
            assert!(bins.iter().all(|&b| b >= 1 && b < bin_count));
        }
    }
}

#[test]
fn frequency_range_bounds_the_bins() {
    // 44.1 kHz over 1024 bins: ~21.5 Hz per bin
    let cfg = BarConfig {
        min_frequency_hz: 215.0,
        max_frequency_hz: 2150.0,
        ..BarConfig::default()
    };
    let bins = log_bins(32, 1024, &cfg);
    assert_eq!(bins[0], 10);
    assert_eq!(bins[31], 100);
}

#[test]
fn silent_input_draws_no_bars() {
    let (host, mut renderer) = ready_renderer(300.0, 150.0);
    host.clear_commands();
    renderer.render(&[0u8; 1024]);
    assert!(renderer.samples().iter().all(|s| s.height == 0.0));
    // background only
    assert_eq!(filled_rects(&host.commands()).len(), 1);
}

#[test]
fn full_scale_input_reaches_ninety_percent() {
    let (host, mut renderer) = ready_renderer(300.0, 150.0);
    host.clear_commands();
    renderer.render(&[255u8; 1024]);
    let samples = renderer.samples();
    assert_eq!(samples.len(), 64);
    for s in samples {
        assert!((s.height - 135.0).abs() < 1e-9);
        assert_eq!(s.magnitude, 1.0);
    }
    let rects = filled_rects(&host.commands());
    assert_eq!(rects.len(), 1 + 64);
    assert!(rects[1..].iter().all(|r| (r.1 - 15.0).abs() < 1e-9));
}

#[test]
fn short_buffers_count_missing_bins_as_silence() {
    let (_host, mut renderer) = ready_renderer(300.0, 150.0);
    renderer.render(&[]);
    assert!(renderer.samples().iter().all(|s| s.height == 0.0));
}

#[test]
fn sensitivity_scales_then_clamps() {
    let (_host, mut renderer) = ready_renderer(300.0, 150.0);
    let cfg = VisualizationConfig {
        sensitivity: 2.0,
        ..VisualizationConfig::bars(BarConfig::default())
    };
    renderer.update_configuration(&cfg);
    renderer.render(&[64u8; 1024]);
    let expected = 64.0 / 255.0 * 2.0;
    assert!(renderer
        .samples()
        .iter()
        .all(|s| (s.magnitude - expected).abs() < 1e-12));
    renderer.render(&[200u8; 1024]);
    assert!(renderer.samples().iter().all(|s| s.magnitude == 1.0));
}

#[test]
fn bar_count_changes_relayout_and_reset_peaks() {
    let (_host, mut renderer) = ready_renderer(300.0, 150.0);
    let cfg = BarConfig {
        visual_mode: BarVisualMode::PeakHold,
        ..BarConfig::default()
    };
    renderer.update_configuration(&VisualizationConfig::bars(cfg));
    renderer.render(&[255u8; 1024]);
    assert_eq!(renderer.peaks().len(), 64);

    renderer.set_bar_count(1000);
    assert_eq!(renderer.config().bar_count, 256);
    assert_eq!(renderer.layout().len(), 256);
    assert!(renderer.peaks().is_empty());
}

#[test]
fn unchanged_layout_settings_keep_the_layout() {
    let (_host, mut renderer) = ready_renderer(300.0, 150.0);
    let before = renderer.layout().clone();
    let cfg = BarConfig {
        color_mode: ColorMode::Rainbow,
        ..BarConfig::default()
    };
    renderer.update_configuration(&VisualizationConfig::bars(cfg));
    assert_eq!(renderer.layout(), &before);

    renderer.update_frequency_bin_count(256);
    assert_ne!(renderer.layout(), &before);
}

#[test]
fn resize_recomputes_layout_width() {
    let (host, mut renderer) = ready_renderer(300.0, 150.0);
    host.set_css_size(600.0, 150.0);
    renderer.resize();
    let last = *renderer.layout().slots().last().unwrap();
    assert!((last.x + last.width - 600.0).abs() < 1e-9);
}

#[test]
fn peak_hold_tracks_rises_and_decays_to_zero() {
    let bar = |h: f64| BarSample {
        x: 0.0,
        width: 4.0,
        height: h,
        magnitude: h / 100.0,
    };
    let mut fx = BarEffects::new(0.9);
    fx.update_peaks(&[bar(40.0)]);
    fx.update_peaks(&[bar(70.0)]);
    // rising bars never leave the peak above them
    assert_eq!(fx.peaks()[0], 70.0);

    let mut last = fx.peaks()[0];
    for _ in 0..200 {
        fx.update_peaks(&[bar(0.0)]);
        let p = fx.peaks()[0];
        assert!(p <= last);
        last = p;
    }
    assert_eq!(last, 0.0);
}

#[test]
fn visual_modes_draw_their_extras() {
    let (host, mut renderer) = ready_renderer(300.0, 150.0);
    let mut render = |mode: BarVisualMode| {
        let cfg = BarConfig {
            visual_mode: mode,
            ..BarConfig::default()
        };
        renderer.update_configuration(&VisualizationConfig::bars(cfg));
        host.clear_commands();
        renderer.render(&[180u8; 1024]);
        host.commands()
    };

    let wave = render(BarVisualMode::Wave);
    assert_eq!(count_commands(&wave, |c| matches!(c, DrawCommand::Stroke)), 1);
    assert!(wave.contains(&DrawCommand::ShadowBlur(0.0)));

    let mirror = render(BarVisualMode::Mirror);
    assert!(mirror.contains(&DrawCommand::Scale(1.0, -1.0)));

    let three_d = render(BarVisualMode::ThreeD);
    assert_eq!(count_commands(&three_d, |c| matches!(c, DrawCommand::Fill)), 2 * 64);

    let peaks = render(BarVisualMode::PeakHold);
    // background + bars + caps
    assert_eq!(filled_rects(&peaks).len(), 1 + 64 + 64);
}

#[test]
fn mirror_fade_is_clipped_to_the_reflection() {
    let (host, mut renderer) = ready_renderer(200.0, 100.0);
    renderer.update_configuration(&VisualizationConfig::bars(BarConfig {
        visual_mode: BarVisualMode::Mirror,
        ..BarConfig::default()
    }));
    host.clear_commands();
    renderer.render(&[255u8; 1024]);
    let cmds = host.commands();

    let mask = cmds
        .iter()
        .position(|c| *c == DrawCommand::Composite(CompositeOp::DestinationIn))
        .expect("mirror mode masks the reflection");
    let scope = cmds[..mask]
        .iter()
        .rposition(|c| *c == DrawCommand::Save)
        .expect("mask runs inside save/restore");
    let clip = &cmds[scope..mask];
    assert!(clip.contains(&DrawCommand::Rect {
        x: 0.0,
        y: 50.0,
        w: 200.0,
        h: 50.0
    }));
    assert_eq!(clip.last(), Some(&DrawCommand::Clip));

    // the clip is dropped again before anything else draws
    let restore = cmds[mask..]
        .iter()
        .position(|c| *c == DrawCommand::Restore)
        .map(|i| mask + i)
        .expect("mask scope is closed");
    assert!(!cmds[restore..].contains(&DrawCommand::Clip));
}

#[test]
fn unavailable_context_leaves_renderer_inert() {
    let host = RecordingHost::new(300.0, 150.0, 1.0);
    host.deny_context();
    let mut renderer = BarRenderer::new(host.clone(), 12.0);
    assert!(!renderer.initialize());
    renderer.render(&[255u8; 1024]);
    assert!(host.commands().is_empty());
    assert!(renderer.samples().is_empty());
}
