// src/simulation.rs
//
// Domain grid: owns every cell and the SAW band, and advances them together.
//
// One tick:
//   1. apply the excitation switch and move the band,
//   2. take a single band snapshot,
//   3. per cell (in parallel): trigger if covered and at rest, otherwise step.
//
// Cells never look at each other, so step 3 is a plain parallel map.

use log::{info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::control::Toggles;
use crate::domain::{DomainCell, DomainState, Dynamics, Excitation};
use crate::metrics::AggregateMetrics;
use crate::params::SimParams;
use crate::wavefront::{Band, Wavefront};

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Cells that went AtRest -> Holding this tick.
    pub triggered: usize,
    /// The band left the film and restarted.
    pub wrapped: bool,
}

#[derive(Debug, Clone)]
pub struct DomainGrid {
    params: SimParams,
    cells: Vec<DomainCell>,
    wavefront: Wavefront,
    dynamics: Dynamics,
    plain: Excitation,
    enhanced: Excitation,
    /// Enhancement switch as read by the most recent tick.
    enhancement: bool,
    elapsed: f64,
    ticks: u64,
}

impl DomainGrid {
    /// Lay out the nx × ny lattice from `params`, each cell perturbed by a
    /// seeded uniform jitter around the base orientation.
    pub fn new(params: SimParams) -> Self {
        let grid = params.grid();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let spread = params.perturbation_deg.abs();

        let mut cells = Vec::with_capacity(grid.n_cells());
        for j in 0..grid.ny {
            for i in 0..grid.nx {
                let jitter = if spread > 0.0 {
                    rng.gen_range(-spread..=spread)
                } else {
                    0.0
                };
                let angle = (params.base_angle_deg + jitter).to_radians();
                cells.push(DomainCell::new(grid.cell_center(i, j), angle));
            }
        }

        info!(
            "domain grid: {} × {} cells, pitch {:.3e} m, film {:.3e} × {:.3e} m, seed {}",
            grid.nx,
            grid.ny,
            grid.pitch,
            grid.lx(),
            grid.ly(),
            params.seed
        );
        Self::from_cells(params, cells)
    }

    /// Build a grid around caller-supplied cells (arbitrary layout).
    ///
    /// The wavefront still spans `params.film_length()`.
    pub fn from_cells(params: SimParams, cells: Vec<DomainCell>) -> Self {
        let wavefront = Wavefront::new(params.band_width, params.saw_speed, params.film_length());
        Self {
            dynamics: params.dynamics(),
            plain: params.excitation(false),
            enhanced: params.excitation(true),
            params,
            cells,
            wavefront,
            enhancement: false,
            elapsed: 0.0,
            ticks: 0,
        }
    }

    /// Advance the whole simulation by `dt` seconds.
    ///
    /// Each switch is read exactly once. A cell triggered in this tick gets the
    /// rotation/retention of the current enhancement state and keeps them even
    /// if the switch changes later.
    ///
    /// A non-positive `dt` advances nothing. Switching the excitation off still
    /// takes effect (the band is hidden at once); switching it on waits for a
    /// real tick, since that restarts the band.
    pub fn tick(&mut self, dt: f64, excitation_enabled: bool, enhancement_enabled: bool) -> TickReport {
        if !(dt > 0.0) {
            if !excitation_enabled {
                self.wavefront.set_enabled(false);
            }
            return TickReport::default();
        }

        self.enhancement = enhancement_enabled;
        self.wavefront.set_enabled(excitation_enabled);
        let wrapped = self.wavefront.advance(dt);

        let band: Option<Band> = self.wavefront.band();
        let excitation = if enhancement_enabled {
            self.enhanced
        } else {
            self.plain
        };
        let dynamics = self.dynamics;

        let triggered: usize = self
            .cells
            .par_iter_mut()
            .map(|cell| {
                let covered = band.is_some_and(|b| b.contains(cell.longitudinal()));
                if covered && cell.trigger(excitation) {
                    trace!(
                        "trigger at {:?}: target {:.2}°, retention {:.2} s",
                        cell.position(),
                        cell.target_angle().to_degrees(),
                        cell.retention_remaining()
                    );
                    1
                } else {
                    cell.step(dt, &dynamics);
                    0
                }
            })
            .sum();

        self.elapsed += dt;
        self.ticks += 1;

        TickReport { triggered, wrapped }
    }

    /// `tick` driven by a toggle snapshot.
    pub fn tick_with(&mut self, dt: f64, toggles: Toggles) -> TickReport {
        self.tick(dt, toggles.excitation, toggles.enhancement)
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn cells(&self) -> &[DomainCell] {
        &self.cells
    }

    pub fn wavefront(&self) -> &Wavefront {
        &self.wavefront
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Simulated time (s).
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Enhancement switch as seen by the last tick.
    pub fn enhancement_enabled(&self) -> bool {
        self.enhancement
    }

    /// Band span carrying triboelectric charge: visible only with both switches on.
    pub fn tribo_band(&self) -> Option<Band> {
        if self.enhancement {
            self.wavefront.band()
        } else {
            None
        }
    }

    pub fn count_in(&self, state: DomainState) -> usize {
        self.cells.iter().filter(|c| c.state() == state).count()
    }

    /// Digital twin readout values for the current grid state.
    pub fn metrics(&self) -> AggregateMetrics {
        AggregateMetrics::compute(&self.cells, &self.params, self.enhancement)
    }
}
