//! Ring/segment geometry shared by both mandala renderers.

use crate::canvas::{CompositeOp, DrawContext};
use crate::config::{MandalaConfig, SymmetryMode};
use crate::constants::*;
use smallvec::{smallvec, SmallVec};
use std::f64::consts::TAU;

/// One drawable cell of the mandala for a given frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MandalaSegment {
    pub ring: usize,
    pub segment: usize,
    pub bin: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Shaped magnitude in `[0, 1]`.
    pub response: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingBand {
    pub inner: f64,
    pub outer: f64,
}

impl RingBand {
    #[inline]
    pub fn width(&self) -> f64 {
        self.outer - self.inner
    }
}

/// Concentric bands between `inner_radius·R` and `outer_radius·R`.
pub fn ring_bands(config: &MandalaConfig, radius: f64) -> SmallVec<[RingBand; 8]> {
    let rings = config.rings.max(1);
    let inner = config.inner_radius * radius;
    let band = (config.outer_radius - config.inner_radius) * radius / rings as f64;
    (0..rings)
        .map(|r| RingBand {
            inner: inner + band * r as f64,
            outer: inner + band * (r + 1) as f64,
        })
        .collect()
}

/// Frequency bin read by cell `(ring, segment)`.
///
/// Bins are split evenly across rings (inner rings read lower bins), then
/// across the segments inside each ring.
pub fn bin_for(ring: usize, segment: usize, rings: usize, segments: usize, bin_count: usize) -> usize {
    if bin_count == 0 {
        return 0;
    }
    let bins_per_ring = (bin_count / rings.max(1)).max(1);
    let offset = segment * bins_per_ring / segments.max(1);
    (ring * bins_per_ring + offset).min(bin_count - 1)
}

/// `min(1, v/255·sensitivity)^(1 + pulse)`.
#[inline]
pub fn cell_response(value: u8, sensitivity: f64, pulse_reactivity: f64) -> f64 {
    let magnitude = (value as f64 / 255.0 * sensitivity).clamp(0.0, 1.0);
    magnitude.powf(1.0 + pulse_reactivity)
}

#[inline]
pub fn cell_alpha(response: f64) -> f64 {
    CELL_BASE_ALPHA + CELL_ALPHA_SPAN * response.clamp(0.0, 1.0)
}

/// Every audible cell for this frame, ring by ring.
pub fn derive_segments(
    data: &[u8],
    config: &MandalaConfig,
    sensitivity: f64,
    bin_count: usize,
    radius: f64,
    rotation: f64,
) -> Vec<MandalaSegment> {
    let segments = config.segments.max(1);
    let slice = TAU / segments as f64;
    let bands = ring_bands(config, radius);
    let mut out = Vec::with_capacity(bands.len() * segments);

    for (ring, band) in bands.iter().enumerate() {
        for segment in 0..segments {
            let bin = bin_for(ring, segment, bands.len(), segments, bin_count);
            let value = data.get(bin).copied().unwrap_or(0);
            let response = cell_response(value, sensitivity, config.pulse_reactivity);
            if response < MIN_CELL_RESPONSE {
                continue;
            }
            let start_angle = rotation + slice * segment as f64;
            out.push(MandalaSegment {
                ring,
                segment,
                bin,
                start_angle,
                end_angle: start_angle + slice,
                inner_radius: band.inner,
                outer_radius: band.inner + response * band.width(),
                response,
            });
        }
    }
    out
}

/// Append the closed outline of a cell to the current path: outer arc,
/// line to the inner arc's end, inner arc back, close.
pub fn trace_cell<C: DrawContext>(ctx: &mut C, cx: f64, cy: f64, seg: &MandalaSegment) {
    let (start, end) = (seg.start_angle, seg.end_angle);
    ctx.move_to(cx + seg.outer_radius * start.cos(), cy + seg.outer_radius * start.sin());
    ctx.arc(cx, cy, seg.outer_radius, start, end, false);
    ctx.line_to(cx + seg.inner_radius * end.cos(), cy + seg.inner_radius * end.sin());
    ctx.arc(cx, cy, seg.inner_radius, end, start, true);
    ctx.close_path();
}

/// One extra copy of the base pattern produced by a symmetry mode, as a
/// transform about the canvas center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SymmetryCopy {
    pub rotation: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub scale: f64,
    pub alpha: f64,
    pub composite: CompositeOp,
}

impl SymmetryCopy {
    fn rotated(rotation: f64, scale: f64, alpha: f64) -> Self {
        Self {
            rotation,
            flip_x: false,
            flip_y: false,
            scale,
            alpha,
            composite: CompositeOp::Lighter,
        }
    }

    fn mirrored(flip_x: bool, flip_y: bool) -> Self {
        Self {
            rotation: 0.0,
            flip_x,
            flip_y,
            scale: 1.0,
            alpha: MIRROR_COPY_ALPHA,
            composite: CompositeOp::Screen,
        }
    }

    /// Map a cell of the base pattern onto this copy.
    pub fn apply(&self, seg: &MandalaSegment) -> MandalaSegment {
        let map = |a: f64| {
            let a = if self.flip_x { std::f64::consts::PI - a } else { a };
            let a = if self.flip_y { -a } else { a };
            a + self.rotation
        };
        let (mut start, mut end) = (map(seg.start_angle), map(seg.end_angle));
        if self.flip_x != self.flip_y {
            // a single reflection reverses orientation
            std::mem::swap(&mut start, &mut end);
        }
        MandalaSegment {
            start_angle: start,
            end_angle: end,
            inner_radius: seg.inner_radius * self.scale,
            outer_radius: seg.outer_radius * self.scale,
            ..*seg
        }
    }
}

/// Extra copies drawn on top of the base pattern for `mode`.
pub fn symmetry_copies(mode: SymmetryMode) -> SmallVec<[SymmetryCopy; 8]> {
    match mode {
        SymmetryMode::None => SmallVec::new(),
        SymmetryMode::MirrorX => smallvec![SymmetryCopy::mirrored(true, false)],
        SymmetryMode::MirrorY => smallvec![SymmetryCopy::mirrored(false, true)],
        SymmetryMode::Radial2x | SymmetryMode::Radial4x | SymmetryMode::Radial8x => {
            let folds = mode.radial_folds().unwrap_or(1);
            (1..folds)
                .map(|k| SymmetryCopy::rotated(TAU * k as f64 / folds as f64, 1.0, RADIAL_COPY_ALPHA))
                .collect()
        }
        SymmetryMode::Kaleidoscope => (1..=KALEIDOSCOPE_COPIES)
            .map(|k| {
                let k = k as f64;
                SymmetryCopy::rotated(
                    (60.0 * k).to_radians(),
                    1.0 - KALEIDOSCOPE_SCALE_STEP * k,
                    KALEIDOSCOPE_BASE_ALPHA - KALEIDOSCOPE_ALPHA_STEP * k,
                )
            })
            .collect(),
    }
}

/// Accumulates rotation from frame timestamps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationClock {
    rotation: f64,
    last_ms: Option<f64>,
}

impl RotationClock {
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Advance by `speed_deg_per_s` over the time since the previous call.
    /// The first call only records the timestamp. The result is in `[0, 2π)`.
    pub fn advance(&mut self, timestamp_ms: f64, speed_deg_per_s: f64) -> f64 {
        if let Some(last) = self.last_ms {
            let dt = ((timestamp_ms - last) / 1000.0).max(0.0);
            let delta = speed_deg_per_s.to_radians() * dt;
            if delta.is_finite() {
                self.rotation += delta.rem_euclid(TAU);
            } else {
                log::debug!("[mandala] rotation step overflowed; frame held");
            }
        }
        self.last_ms = Some(timestamp_ms);
        self.rotation = self.rotation.rem_euclid(TAU);
        if self.rotation >= TAU {
            self.rotation = 0.0;
        }
        self.rotation
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
