//! Owns the active renderer and swaps it on mode change.

use crate::canvas::CanvasHost;
use crate::config::{
    BarConfig, MandalaConfig, ModeConfig, Theme, VisualizationConfig, VisualizationMode,
};
use crate::constants::DEFAULT_RENDER_BUDGET_MS;
use crate::renderer::{
    BarRenderer, MandalaRenderer, OptimizedMandalaRenderer, PerformanceStats, Renderer,
};
use crate::zoom::{ZoomConfig, ZoomManager};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FactoryOptions {
    pub prefer_optimized_mandala: bool,
    pub render_budget_ms: f64,
    /// `None` disables zoom/pan entirely.
    pub zoom: Option<ZoomConfig>,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            prefer_optimized_mandala: true,
            render_budget_ms: DEFAULT_RENDER_BUDGET_MS,
            zoom: Some(ZoomConfig::default()),
        }
    }
}

pub type DynRenderer<H> = Box<dyn Renderer<Host = H>>;

pub struct RendererFactory<H: CanvasHost + Clone + 'static> {
    host: H,
    options: FactoryOptions,
    active: Option<DynRenderer<H>>,
    /// Holds the zoom manager while no renderer is active.
    parked_zoom: Option<ZoomManager>,
    theme: Theme,
    sensitivity: f64,
    bars: BarConfig,
    mandala: MandalaConfig,
    bin_count: Option<usize>,
    disposed: bool,
}

impl<H: CanvasHost + Clone + 'static> RendererFactory<H> {
    pub fn new(host: H, options: FactoryOptions) -> Self {
        Self {
            host,
            parked_zoom: options.zoom.map(ZoomManager::new),
            options,
            active: None,
            theme: Theme::default(),
            sensitivity: 1.0,
            bars: BarConfig::default(),
            mandala: MandalaConfig::default(),
            bin_count: None,
            disposed: false,
        }
    }

    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    pub fn mode(&self) -> Option<VisualizationMode> {
        self.active.as_ref().map(|r| r.mode())
    }

    pub fn active(&self) -> Option<&dyn Renderer<Host = H>> {
        self.active.as_deref()
    }

    pub fn active_mut(&mut self) -> Option<&mut (dyn Renderer<Host = H> + 'static)> {
        self.active.as_deref_mut()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Current settings for `mode`, with the shared theme and sensitivity.
    pub fn config_for(&self, mode: VisualizationMode) -> VisualizationConfig {
        let mode = match mode {
            VisualizationMode::Bars => ModeConfig::Bars(self.bars.clone()),
            VisualizationMode::Mandala => ModeConfig::Mandala(self.mandala.clone()),
        };
        VisualizationConfig {
            theme: self.theme,
            sensitivity: self.sensitivity,
            mode,
        }
    }

    fn create(&self, mode: VisualizationMode) -> DynRenderer<H> {
        let host = self.host.clone();
        let budget = self.options.render_budget_ms;
        match mode {
            VisualizationMode::Bars => Box::new(BarRenderer::new(host, budget)),
            VisualizationMode::Mandala if self.options.prefer_optimized_mandala => {
                Box::new(OptimizedMandalaRenderer::new(host, budget))
            }
            VisualizationMode::Mandala => Box::new(MandalaRenderer::new(host, budget)),
        }
    }

    /// Make `mode` the active renderer. The zoom manager moves from the
    /// outgoing renderer to the new one. Returns whether the new renderer
    /// initialized; a failed one is kept but draws nothing, and asking for
    /// the same mode again retries it.
    pub fn set_mode(&mut self, mode: VisualizationMode) -> bool {
        if self.disposed {
            log::warn!("[factory] set_mode after dispose");
            return false;
        }
        if let Some(active) = self.active.as_mut() {
            if active.mode() == mode {
                if active.core().is_ready() {
                    return true;
                }
                log::info!("[factory] retrying {:?} initialization", mode);
                return active.initialize();
            }
        }

        let zoom = match self.active.take() {
            Some(mut old) => {
                let zoom = old.take_zoom_manager();
                old.dispose();
                zoom
            }
            None => None,
        }
        .or_else(|| self.parked_zoom.take());

        let mut renderer = self.create(mode);
        let ready = renderer.initialize();
        if let Some(zoom) = zoom {
            renderer.attach_zoom_manager(zoom);
        }
        renderer.update_configuration(&self.config_for(mode));
        if let Some(count) = self.bin_count {
            renderer.update_frequency_bin_count(count);
        }
        log::info!("[factory] active renderer: {:?} (ready: {})", mode, ready);
        self.active = Some(renderer);
        ready
    }

    pub fn render(&mut self, frequency_data: &[u8]) {
        if let Some(r) = self.active.as_mut() {
            r.render(frequency_data);
        }
    }

    pub fn resize(&mut self) {
        if let Some(r) = self.active.as_mut() {
            r.resize();
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        if let Some(r) = self.active.as_mut() {
            r.set_theme(theme);
        }
    }

    /// Store the settings and apply them, switching renderer when the
    /// config is for a different mode.
    pub fn update_configuration(&mut self, config: &VisualizationConfig) {
        let config = config.normalized();
        self.theme = config.theme;
        self.sensitivity = config.sensitivity;
        match &config.mode {
            ModeConfig::Bars(b) => self.bars = b.clone(),
            ModeConfig::Mandala(m) => self.mandala = m.clone(),
        }
        if self.mode() != Some(config.mode()) {
            self.set_mode(config.mode());
            return;
        }
        if let Some(r) = self.active.as_mut() {
            r.update_configuration(&config);
        }
    }

    pub fn update_frequency_bin_count(&mut self, count: usize) {
        self.bin_count = Some(count);
        if let Some(r) = self.active.as_mut() {
            r.update_frequency_bin_count(count);
        }
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        self.active
            .as_ref()
            .map(|r| r.performance_stats())
            .unwrap_or_default()
    }

    pub fn zoom(&self) -> Option<&ZoomManager> {
        match &self.active {
            Some(r) => r.core().zoom(),
            None => self.parked_zoom.as_ref(),
        }
    }

    pub fn zoom_mut(&mut self) -> Option<&mut ZoomManager> {
        match self.active.as_mut() {
            Some(r) => r.core_mut().zoom_mut(),
            None => self.parked_zoom.as_mut(),
        }
    }

    /// Dispose the renderer and the zoom manager, once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let mut zoom = self.parked_zoom.take();
        if let Some(mut r) = self.active.take() {
            zoom = zoom.or_else(|| r.take_zoom_manager());
            r.dispose();
        }
        if let Some(mut zoom) = zoom {
            zoom.dispose();
        }
        log::info!("[factory] disposed");
    }
}

impl<H: CanvasHost + Clone + 'static> Drop for RendererFactory<H> {
    fn drop(&mut self) {
        self.dispose();
    }
}
