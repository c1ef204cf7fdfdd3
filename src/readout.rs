// src/readout.rs
//
// Text block for the digital twin monitor. Pure formatting over the configured
// constants, the current switches and the latest metrics.

use std::fmt;

use crate::control::Toggles;
use crate::metrics::AggregateMetrics;
use crate::params::SimParams;

pub struct DigitalTwinReadout<'a> {
    pub params: &'a SimParams,
    pub toggles: Toggles,
    pub metrics: AggregateMetrics,
}

impl<'a> DigitalTwinReadout<'a> {
    pub fn new(params: &'a SimParams, toggles: Toggles, metrics: AggregateMetrics) -> Self {
        Self {
            params,
            toggles,
            metrics,
        }
    }
}

impl fmt::Display for DigitalTwinReadout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.params;
        let tribo = self.toggles.enhancement;
        let boost_pct = (p.enhancement_factor - 1.0) * 100.0;

        writeln!(f, "--- DIGITAL TWIN MONITOR ---")?;
        writeln!(f, "Research parameters:")?;
        writeln!(f, "  SAW freq:                 {:.1} MHz (visual)", p.saw_freq_hz / 1e6)?;
        writeln!(f, "  Magnetoelastic Δθ:        {:.1}°", p.max_rotation_deg(false))?;
        writeln!(
            f,
            "  Tribo-enhanced Δθ:        {:.1}° (+{:.0}%)",
            p.max_rotation_deg(true),
            boost_pct
        )?;
        writeln!(
            f,
            "  Base retention (τ_strain): {:.0} ms (demo scale)",
            p.retention_plain_s * 1000.0
        )?;
        writeln!(
            f,
            "  Tribo retention (τ_tribo): {:.0} ms (demo scale)",
            p.retention_enhanced_s * 1000.0
        )?;
        writeln!(f, "  Predicted max ΔB (strain): ~{} nT", p.field_max_plain_nt)?;
        writeln!(f, "  Predicted max ΔB (tribo):  ~{} nT", p.field_max_enhanced_nt)?;
        writeln!(f)?;
        writeln!(f, "Current simulation state:")?;
        writeln!(
            f,
            "  SAW status:               {}",
            if self.toggles.excitation { "PROPAGATING" } else { "IDLE" }
        )?;
        writeln!(
            f,
            "  Triboelectric coupling:   {}",
            if tribo { "ACTIVE" } else { "INACTIVE" }
        )?;
        writeln!(f, "  Expected max rotation:    {:.1}°", p.max_rotation_deg(tribo))?;
        writeln!(f, "  Expected retention (τ):   {:.1} s (demo scale)", p.retention_s(tribo))?;
        writeln!(
            f,
            "  Avg. flipped state:       {:.1}% of max potential rotation",
            self.metrics.avg_completion_pct
        )?;
        write!(f, "  Estimated ΔB field:       {:.1} nT", self.metrics.delta_b_nt)
    }
}
