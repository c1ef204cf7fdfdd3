// src/wavefront.rs

use log::debug;

/// Span of the excitation band along the propagation axis (inclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lo: f64,
    pub hi: f64,
}

impl Band {
    #[inline]
    pub fn contains(&self, y: f64) -> bool {
        y >= self.lo && y <= self.hi
    }
}

/// Traveling SAW excitation band.
///
/// `leading_edge` is the band centre. The band enters from just before the
/// film start and, once it has fully left the far end, restarts there.
#[derive(Debug, Clone, PartialEq)]
pub struct Wavefront {
    leading_edge: f64,
    band_width: f64,
    speed: f64,
    film_length: f64,
    enabled: bool,
}

impl Wavefront {
    /// A disabled wavefront parked at the start position.
    pub fn new(band_width: f64, speed: f64, film_length: f64) -> Self {
        let band_width = band_width.max(0.0);
        Self {
            leading_edge: -0.5 * band_width,
            band_width,
            speed,
            film_length,
            enabled: false,
        }
    }

    /// Band centre position when entering the film.
    pub fn start_position(&self) -> f64 {
        -0.5 * self.band_width
    }

    pub fn leading_edge(&self) -> f64 {
        self.leading_edge
    }

    pub fn band_width(&self) -> f64 {
        self.band_width
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn film_length(&self) -> f64 {
        self.film_length
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Switch the excitation on or off.
    ///
    /// Switching on from off restarts the band at the film start. Switching off
    /// hides the band; cells it already triggered are unaffected.
    pub fn set_enabled(&mut self, on: bool) {
        if on == self.enabled {
            return;
        }
        self.enabled = on;
        if on {
            self.leading_edge = self.start_position();
            debug!("SAW on: band restarted at y = {:.3e}", self.leading_edge);
        } else {
            debug!("SAW off at y = {:.3e}", self.leading_edge);
        }
    }

    /// Move the band by `speed * dt`. Returns true if it wrapped this call.
    pub fn advance(&mut self, dt: f64) -> bool {
        if !self.enabled || !(dt > 0.0) {
            return false;
        }
        self.leading_edge += self.speed * dt;
        if self.leading_edge > self.film_length + 0.5 * self.band_width {
            self.leading_edge = self.start_position();
            debug!("SAW band left the film; restarting pass");
            return true;
        }
        false
    }

    /// Current band span, or `None` while the excitation is off.
    pub fn band(&self) -> Option<Band> {
        if !self.enabled {
            return None;
        }
        let half = 0.5 * self.band_width;
        Some(Band {
            lo: self.leading_edge - half,
            hi: self.leading_edge + half,
        })
    }

    /// True iff the band is visible and covers longitudinal coordinate `y`.
    pub fn overlaps(&self, y: f64) -> bool {
        self.band().is_some_and(|b| b.contains(y))
    }
}
