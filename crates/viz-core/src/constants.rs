//! Rendering and interaction tuning constants.
//!
//! These constants express intended behavior (budgets, clamp limits, easing
//! durations) and keep magic numbers out of the renderers.

// Frame budget / FPS tracking
pub const DEFAULT_RENDER_BUDGET_MS: f64 = 12.0;
pub const FPS_SAMPLE_INTERVAL_FRAMES: u32 = 60;
pub const FPS_HISTORY_LEN: usize = 10;
pub const PERFORMANT_FPS: f64 = 55.0;
pub const ASSUMED_FPS: f64 = 60.0; // reported before the first sample exists

// Bars
pub const MIN_BAR_COUNT: usize = 8;
pub const MAX_BAR_COUNT: usize = 256;
pub const BAR_SPACING: f64 = 2.0; // CSS px between bars
pub const BAR_HEADROOM: f64 = 0.9; // fraction of height a full-scale bar reaches
pub const MIN_PEAK_DECAY: f64 = 0.8;
pub const MAX_PEAK_DECAY: f64 = 0.99;
pub const PEAK_CAP_HEIGHT: f64 = 3.0;
pub const MAX_DEPTH_3D: f64 = 10.0; // extrusion of a full-scale bar
pub const WAVE_BAR_ALPHA: f64 = 0.7;
pub const WAVE_LINE_WIDTH: f64 = 2.0;
pub const WAVE_GLOW_BLUR: f64 = 12.0;
pub const MIRROR_FADE_ALPHA: f64 = 0.6; // alpha at the midline of the reflection

// Analysed frequency range defaults
pub const DEFAULT_MIN_FREQUENCY_HZ: f64 = 20.0;
pub const DEFAULT_MAX_FREQUENCY_HZ: f64 = 20_000.0;
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 44_100.0;
pub const DEFAULT_FREQUENCY_BIN_COUNT: usize = 1024;

// Mandala
pub const MIN_SEGMENTS: usize = 8;
pub const MAX_SEGMENTS: usize = 64;
pub const MIN_RINGS: usize = 3;
pub const MAX_RINGS: usize = 8;
pub const MIN_RADIUS_FRACTION: f64 = 0.01;
pub const MAX_RADIUS_FRACTION: f64 = 0.99;
pub const MIN_CELL_RESPONSE: f64 = 0.01; // cells quieter than this are skipped
pub const CELL_BASE_ALPHA: f64 = 0.55;
pub const CELL_ALPHA_SPAN: f64 = 0.45;
pub const GLOW_MAX_BLUR: f64 = 24.0;
pub const RESPONSE_LEVELS: usize = 8; // buckets used by the batched renderer
pub const TRIG_TABLE_SIZE: usize = 360;
pub const MAX_ROTATION_SPEED: f64 = 3600.0; // degrees per second, either direction

// Symmetry compositing
pub const MIRROR_COPY_ALPHA: f64 = 0.5;
pub const RADIAL_COPY_ALPHA: f64 = 0.7;
pub const KALEIDOSCOPE_COPIES: usize = 5;
pub const KALEIDOSCOPE_SCALE_STEP: f64 = 0.1;
pub const KALEIDOSCOPE_BASE_ALPHA: f64 = 0.6;
pub const KALEIDOSCOPE_ALPHA_STEP: f64 = 0.1;

// Backends
pub const GRADIENT_CACHE_CAPACITY: usize = 256; // native gradients kept per context

// Zoom
pub const DEFAULT_MIN_ZOOM: f64 = 0.5;
pub const DEFAULT_MAX_ZOOM: f64 = 5.0;
pub const DEFAULT_ZOOM_STEP: f64 = 0.25; // additive, per zoom_in/zoom_out
pub const DEFAULT_TRANSITION_MS: f64 = 250.0;
pub const DOUBLE_CLICK_ZOOM: f64 = 2.0;
pub const WHEEL_DELTA_PER_STEP: f64 = 100.0; // one notch on most mice
