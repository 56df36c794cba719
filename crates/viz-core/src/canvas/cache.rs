//! Memo of backend gradient objects keyed by their [`Paint`] description.
//!
//! Renderers cache gradient *descriptions*; a backend still has to turn each
//! one into a native object (a `CanvasGradient` in the browser) whenever it
//! is assigned. [`GradientCache`] lets the backend build that object once per
//! distinct gradient and hand back the same one afterwards.

use super::{ColorStops, Paint};
use crate::constants::GRADIENT_CACHE_CAPACITY;
use fnv::FnvHashMap;
use smallvec::SmallVec;

/// Bit pattern of a gradient's geometry and stops.
type GradientKey = SmallVec<[u64; 32]>;

fn push_stops(key: &mut GradientKey, stops: &ColorStops) {
    key.push(stops.len() as u64);
    for stop in stops {
        let c = stop.color;
        key.push(stop.offset.to_bits());
        key.push(u64::from(c.r) << 16 | u64::from(c.g) << 8 | u64::from(c.b));
        key.push(c.a.to_bits());
    }
}

/// `None` for solid colors, which need no native object.
fn gradient_key(paint: &Paint) -> Option<GradientKey> {
    let mut key = GradientKey::new();
    match paint {
        Paint::Solid(_) => return None,
        Paint::Linear(g) => {
            key.push(1);
            key.extend([g.x0, g.y0, g.x1, g.y1].map(f64::to_bits));
            push_stops(&mut key, &g.stops);
        }
        Paint::Radial(g) => {
            key.push(2);
            key.extend([g.x0, g.y0, g.r0, g.x1, g.y1, g.r1].map(f64::to_bits));
            push_stops(&mut key, &g.stops);
        }
    }
    Some(key)
}

pub struct GradientCache<G> {
    entries: FnvHashMap<GradientKey, G>,
    capacity: usize,
    built: u64,
}

impl<G: Clone> GradientCache<G> {
    pub fn new() -> Self {
        Self::with_capacity(GRADIENT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FnvHashMap::default(),
            capacity: capacity.max(1),
            built: 0,
        }
    }

    /// The native object for `paint`, building it with `build` on a miss.
    ///
    /// Returns `None` for solid paints and when `build` fails. A full cache is
    /// emptied before the new entry goes in; bar gradients follow bar heights
    /// and would otherwise grow it without bound.
    pub fn get_or_build(&mut self, paint: &Paint, build: impl FnOnce() -> Option<G>) -> Option<G> {
        let key = gradient_key(paint)?;
        if let Some(g) = self.entries.get(&key) {
            return Some(g.clone());
        }
        let g = build()?;
        if self.entries.len() >= self.capacity {
            log::debug!("[canvas] gradient cache full; cleared {} entries", self.entries.len());
            self.entries.clear();
        }
        self.built += 1;
        self.entries.insert(key, g.clone());
        Some(g)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Native objects constructed so far.
    pub fn built(&self) -> u64 {
        self.built
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<G: Clone> Default for GradientCache<G> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{even_stops, LinearGradient, RadialGradient, Rgba};

    fn radial(r1: f64) -> Paint {
        Paint::Radial(RadialGradient {
            x0: 50.0,
            y0: 50.0,
            r0: 10.0,
            x1: 50.0,
            y1: 50.0,
            r1,
            stops: even_stops(&[Rgba::BLACK, Rgba::WHITE]),
        })
    }

    #[test]
    fn equal_gradients_are_built_once() {
        let mut cache = GradientCache::new();
        let mut builds = 0;
        for _ in 0..10 {
            let g = cache.get_or_build(&radial(40.0), || {
                builds += 1;
                Some(builds)
            });
            assert_eq!(g, Some(1));
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.built(), 1);

        cache.get_or_build(&radial(41.0), || Some(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn stop_changes_miss() {
        let mut cache = GradientCache::new();
        let linear = |color| {
            Paint::Linear(LinearGradient {
                x0: 0.0,
                y0: 0.0,
                x1: 0.0,
                y1: 100.0,
                stops: even_stops(&[Rgba::BLACK, color]),
            })
        };
        cache.get_or_build(&linear(Rgba::WHITE), || Some(()));
        cache.get_or_build(&linear(Rgba::WHITE.with_alpha(0.5)), || Some(()));
        assert_eq!(cache.built(), 2);
    }

    #[test]
    fn solid_paint_and_failed_builds_are_not_stored() {
        let mut cache: GradientCache<u8> = GradientCache::new();
        assert_eq!(cache.get_or_build(&Paint::Solid(Rgba::WHITE), || Some(1)), None);
        assert_eq!(cache.get_or_build(&radial(5.0), || None), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn full_cache_starts_over() {
        let mut cache = GradientCache::with_capacity(4);
        for r in 0..6 {
            cache.get_or_build(&radial(r as f64), || Some(r));
        }
        assert!(cache.len() <= 4);
        assert_eq!(cache.get_or_build(&radial(5.0), || Some(99)), Some(5));
    }
}
