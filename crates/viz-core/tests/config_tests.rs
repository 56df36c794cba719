// Settings as they arrive from the front end (camelCase JSON).

use viz_core::config::*;
use viz_core::constants::*;
use viz_core::renderer::PerformanceStats;
use viz_core::zoom::ZoomConfig;

#[test]
fn bars_config_parses_with_defaults() {
    let json = r#"{
        "mode": "bars",
        "theme": "light",
        "sensitivity": 1.5,
        "barCount": 96,
        "colorMode": "rainbow",
        "visualMode": "peak-hold"
    }"#;
    let cfg: VisualizationConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.theme, Theme::Light);
    assert_eq!(cfg.sensitivity, 1.5);
    assert_eq!(cfg.mode(), VisualizationMode::Bars);
    let ModeConfig::Bars(bars) = cfg.mode else {
        panic!("expected bars config");
    };
    assert_eq!(bars.bar_count, 96);
    assert_eq!(bars.color_mode, ColorMode::Rainbow);
    assert_eq!(bars.visual_mode, BarVisualMode::PeakHold);
    assert_eq!(bars.peak_decay_rate, 0.95);
    assert_eq!(bars.sample_rate_hz, DEFAULT_SAMPLE_RATE_HZ);
}

#[test]
fn mandala_config_parses_enums() {
    let json = r##"{
        "mode": "mandala",
        "symmetryMode": "radial-8x",
        "colorPalette": "custom",
        "customColors": ["#fff", "#123456"],
        "rotationSpeed": -30
    }"##;
    let cfg: VisualizationConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.theme, Theme::Dark);
    assert_eq!(cfg.sensitivity, 1.0);
    let ModeConfig::Mandala(m) = cfg.mode else {
        panic!("expected mandala config");
    };
    assert_eq!(m.symmetry_mode, SymmetryMode::Radial8x);
    assert_eq!(m.color_palette, ColorPalette::Custom);
    assert_eq!(m.custom_colors.len(), 2);
    assert_eq!(m.rotation_speed, -30.0);
    assert_eq!(m.segments, 24);
}

#[test]
fn three_d_mode_uses_its_wire_name() {
    let v: BarVisualMode = serde_json::from_str("\"3d\"").unwrap();
    assert_eq!(v, BarVisualMode::ThreeD);
    assert_eq!(serde_json::to_string(&SymmetryMode::MirrorX).unwrap(), "\"mirror-x\"");
}

#[test]
fn config_without_mode_is_rejected() {
    assert!(serde_json::from_str::<VisualizationConfig>(r#"{"theme":"dark"}"#).is_err());
}

#[test]
fn out_of_range_values_are_clamped_not_rejected() {
    let json = r#"{"mode":"mandala","segments":500,"rings":1,"innerRadius":2.0,"glowIntensity":-1}"#;
    let cfg: VisualizationConfig = serde_json::from_str(json).unwrap();
    let ModeConfig::Mandala(m) = cfg.normalized().mode else {
        panic!("expected mandala config");
    };
    assert_eq!(m.segments, MAX_SEGMENTS);
    assert_eq!(m.rings, MIN_RINGS);
    assert!(m.inner_radius < m.outer_radius);
    assert!(m.outer_radius <= MAX_RADIUS_FRACTION);
    assert_eq!(m.glow_intensity, 0.0);
}

#[test]
fn frequency_range_is_kept_below_nyquist() {
    let cfg = BarConfig {
        sample_rate_hz: 8000.0,
        min_frequency_hz: 5000.0,
        max_frequency_hz: 100.0,
        ..BarConfig::default()
    }
    .normalized();
    assert_eq!(cfg.min_frequency_hz, 4000.0);
    assert_eq!(cfg.max_frequency_hz, 4000.0);
}

#[test]
fn zoom_config_fills_missing_fields() {
    let cfg: ZoomConfig = serde_json::from_str(r#"{"maxZoom": 3}"#).unwrap();
    assert_eq!(cfg.max_zoom, 3.0);
    assert_eq!(cfg.min_zoom, DEFAULT_MIN_ZOOM);
    assert!(cfg.smooth_transition);
}

#[test]
fn performance_stats_serialize_for_the_front_end() {
    let v = serde_json::to_value(PerformanceStats::default()).unwrap();
    assert_eq!(v["averageFPS"], 60.0);
    assert_eq!(v["isPerformant"], true);
    assert_eq!(v["renderBudgetMs"], 12.0);
    assert_eq!(v["lastFrameTimeMs"], 0.0);
}

#[test]
fn zoom_events_serialize_with_a_type_tag() {
    use viz_core::zoom::ZoomEvent;
    let v = serde_json::to_value(ZoomEvent::Zoom {
        level: 2.0,
        pan_x: 10.0,
        pan_y: -5.0,
    })
    .unwrap();
    assert_eq!(v["type"], "zoom");
    assert_eq!(v["level"], 2.0);
    assert_eq!(v["panX"], 10.0);
    assert_eq!(v["panY"], -5.0);

    let v = serde_json::to_value(ZoomEvent::DragStart { x: 1.0, y: 2.0 }).unwrap();
    assert_eq!(v["type"], "dragStart");
    let v = serde_json::to_value(ZoomEvent::DragEnd).unwrap();
    assert_eq!(v, serde_json::json!({"type": "dragEnd"}));
}
