// Shared renderer lifecycle: sizing, frame budget and disposal.

use std::thread::sleep;
use std::time::Duration;
use viz_core::canvas::recording::{DrawCommand, RecordingHost};
use viz_core::config::Theme;
use viz_core::renderer::{BarRenderer, RenderCore, Renderer};
use viz_core::zoom::{ZoomConfig, ZoomManager};
use viz_core::RenderError;

#[test]
fn backing_store_follows_device_pixel_ratio() {
    let host = RecordingHost::new(300.0, 150.0, 2.0);
    let mut core = RenderCore::new(host.clone(), 12.0);
    core.initialize().unwrap();
    assert_eq!(host.backing_size(), (600, 300));
    assert_eq!(core.center(), (150.0, 75.0));
    assert!(host
        .commands()
        .contains(&DrawCommand::SetTransform([2.0, 0.0, 0.0, 2.0, 0.0, 0.0])));

    host.set_css_size(0.0, 0.0);
    assert!(core.resize());
    assert_eq!(host.backing_size(), (1, 1));
}

#[test]
fn missing_context_is_reported() {
    let host = RecordingHost::new(300.0, 150.0, 1.0);
    host.deny_context();
    let mut core = RenderCore::new(host, 12.0);
    assert_eq!(core.initialize(), Err(RenderError::ContextUnavailable));
    assert!(!core.is_ready());
    assert!(!core.perform_render(|_, _| {}));
}

#[test]
fn overrun_skips_exactly_the_next_frame() {
    let host = RecordingHost::new(100.0, 100.0, 1.0);
    let mut core = RenderCore::new(host, 12.0);
    core.initialize().unwrap();

    assert!(core.perform_render(|_, _| sleep(Duration::from_millis(25))));
    assert!(core.performance_stats().last_frame_time_ms > 12.0);
    assert!(!core.performance_stats().is_performant);
    assert!(!core.perform_render(|_, _| {}));
    assert!(core.perform_render(|_, _| {}));
    assert!(core.perform_render(|_, _| {}));
    assert_eq!(core.budget().skipped_frames(), 1);
}

#[test]
fn frame_clears_with_theme_background_then_restores() {
    let host = RecordingHost::new(100.0, 50.0, 1.0);
    let mut core = RenderCore::new(host.clone(), 1000.0);
    core.initialize().unwrap();
    core.set_theme(Theme::Light);
    host.clear_commands();
    core.perform_render(|_, frame| assert_eq!(frame.theme, Theme::Light));

    let cmds = host.commands();
    assert!(cmds.contains(&DrawCommand::FillStyle(Theme::Light.background().into())));
    assert!(cmds.contains(&DrawCommand::FillRect {
        x: 0.0,
        y: 0.0,
        w: 100.0,
        h: 50.0
    }));
    assert_eq!(cmds.last(), Some(&DrawCommand::Restore));
}

#[test]
fn attached_zoom_is_bound_and_applied() {
    let host = RecordingHost::new(200.0, 100.0, 1.0);
    let mut renderer = BarRenderer::new(host.clone(), 1000.0);
    renderer.initialize();
    let mut zoom = ZoomManager::new(ZoomConfig {
        smooth_transition: false,
        ..ZoomConfig::default()
    });
    zoom.bind_canvas(viz_core::zoom::CanvasRect::new(1.0, 1.0));
    renderer.attach_zoom_manager(zoom);
    let zoom = renderer.core_mut().zoom_mut().unwrap();
    zoom.set_zoom(2.0, None, None);

    host.clear_commands();
    renderer.render(&[0; 1024]);
    assert!(host.commands().contains(&DrawCommand::Scale(2.0, 2.0)));

    host.set_css_size(400.0, 100.0);
    renderer.resize();
    let zoom = renderer.core().zoom().unwrap();
    assert!(zoom.viewport_bounds().unwrap().width > 199.0);
}

#[test]
fn dispose_is_idempotent_and_stops_drawing() {
    let host = RecordingHost::new(200.0, 100.0, 1.0);
    let mut renderer = BarRenderer::new(host.clone(), 12.0);
    renderer.initialize();
    renderer.attach_zoom_manager(ZoomManager::default());
    renderer.dispose();
    assert!(renderer.core().is_disposed());
    assert!(renderer.core().zoom().is_none());
    renderer.dispose();

    host.clear_commands();
    renderer.render(&[255; 1024]);
    assert!(host.commands().is_empty());
    assert!(!renderer.initialize());
}
