// src/visualisation.rs

use crate::domain::Polarity;
use crate::simulation::DomainGrid;
use plotters::prelude::*;
use std::io;
use std::process::Command;

const NM: f64 = 1e9;

fn polarity_color(p: Polarity) -> RGBColor {
    match p {
        Polarity::Up => RGBColor(220, 40, 40),
        Polarity::Down => RGBColor(40, 70, 220),
        Polarity::Neutral => RGBColor(128, 128, 128),
    }
}

/// Save a plan view of the film as a PNG.
/// - one square per domain, coloured by polarity (red = up, blue = down, grey = neutral)
/// - a black stroke per domain showing the current orientation
/// - the SAW band in yellow (orange while triboelectric coupling is active)
pub fn save_polarity_plot(
    sim: &DomainGrid,
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = sim.params();
    let pitch = params.pitch * NM;
    let width = (params.film_width() * NM).max(pitch);
    let length = (params.film_length() * NM).max(pitch);

    // Keep the strip's aspect ratio, long axis vertical.
    let h = 900u32;
    let w = ((h as f64) * (width / length)).clamp(240.0, 900.0) as u32 + 120;
    let root = BitMapBackend::new(filename, (w, h)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(format!("t = {:.2} s", sim.elapsed()), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..width, 0.0..length)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x (nm)")
        .y_desc("y (nm, SAW axis)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let half = 0.45 * pitch;
    chart.draw_series(sim.cells().iter().map(|c| {
        let (x, y) = c.position();
        let (x, y) = (x * NM, y * NM);
        Rectangle::new(
            [(x - half, y - half), (x + half, y + half)],
            polarity_color(c.polarity()).filled(),
        )
    }))?;

    // Orientation strokes, measured from the long axis.
    chart.draw_series(sim.cells().iter().map(|c| {
        let (x, y) = c.position();
        let (x, y) = (x * NM, y * NM);
        let (axial, transverse) = c.arrow(0.8 * half);
        PathElement::new(
            vec![(x - transverse, y - axial), (x + transverse, y + axial)],
            BLACK.stroke_width(2),
        )
    }))?;

    if let Some(band) = sim.wavefront().band() {
        let lo = (band.lo * NM).clamp(0.0, length);
        let hi = (band.hi * NM).clamp(0.0, length);
        if hi > lo {
            let color = if sim.tribo_band().is_some() {
                RGBColor(255, 140, 0)
            } else {
                RGBColor(255, 215, 0)
            };
            chart.draw_series(std::iter::once(Rectangle::new(
                [(0.0, lo), (width, hi)],
                color.mix(0.45).filled(),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

/// Plot the digital twin readout over time: average flipped state (%) on top,
/// estimated ΔB (nT) below with the baseline and both ceilings marked.
pub fn save_metrics_plot(
    times: &[f64],
    completion_pct: &[f64],
    delta_b_nt: &[f64],
    base_nt: f64,
    ceilings_nt: (f64, f64),
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(&t_min), Some(&t_max)) = (times.first(), times.last()) else {
        return Ok(()); // nothing to plot
    };
    let t_max = if t_max > t_min { t_max } else { t_min + 1.0 };

    let root = BitMapBackend::new(filename, (1024, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(450);

    let mut top = ChartBuilder::on(&upper)
        .margin(20)
        .caption("Average domain flipped state", ("sans-serif", 24))
        .set_left_and_bottom_label_area_size(60)
        .build_cartesian_2d(t_min..t_max, 0.0..105.0)?;
    top.configure_mesh()
        .x_desc("time (s)")
        .y_desc("% of max rotation")
        .draw()?;
    top.draw_series(LineSeries::new(
        times.iter().zip(completion_pct).map(|(&t, &v)| (t, v)),
        &RED,
    ))?;

    let (plain, enhanced) = ceilings_nt;
    let y_max = plain.max(enhanced) * 1.1;
    let y_min = (base_nt * 0.9).min(0.0);

    let mut bottom = ChartBuilder::on(&lower)
        .margin(20)
        .caption("Estimated ΔB", ("sans-serif", 24))
        .set_left_and_bottom_label_area_size(60)
        .build_cartesian_2d(t_min..t_max, y_min..y_max)?;
    bottom
        .configure_mesh()
        .x_desc("time (s)")
        .y_desc("ΔB (nT)")
        .draw()?;

    bottom
        .draw_series(LineSeries::new(
            times.iter().zip(delta_b_nt).map(|(&t, &v)| (t, v)),
            &BLUE,
        ))?
        .label("simulated")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    for (level, label, color) in [
        (base_nt, "baseline", BLACK),
        (plain, "strain max", GREEN),
        (enhanced, "tribo max", MAGENTA),
    ] {
        bottom
            .draw_series(LineSeries::new(
                [(t_min, level), (t_max, level)],
                &color.mix(0.6),
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    bottom
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Use `ffmpeg` to stitch frames/polarity_*.png into an MP4 movie.
pub fn make_movie_with_ffmpeg(pattern: &str, output: &str, fps: u32) -> io::Result<()> {
    let fps = fps.to_string();
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-framerate",
            fps.as_str(),
            "-pattern_type",
            "glob",
            "-i",
            pattern,
            // even dimensions for yuv420p
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-pix_fmt",
            "yuv420p",
            output,
        ])
        .status()?;

    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("ffmpeg exited with {status}"),
        ));
    }

    Ok(())
}
