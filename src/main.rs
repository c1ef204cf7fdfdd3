// src/main.rs
//
// Host loop for the SAW / triboelectric domain-switching simulator.
//
// Two modes:
//   - headless (default): runs for `duration` simulated seconds as fast as
//     possible, applying any scheduled switch changes;
//   - realtime: paces ticks at 1/dt per second and reads switch commands from
//     stdin (s = SAW, t = tribo, q = quit).
//
// Examples:
//
//   cargo run --release -- demo saw=on tribo_at=6 duration=14 movie
//       -> one plain pass, boost switched on mid-run, frames + MP4.
//
//   cargo run --release -- toy saw=on tribo=on saw_off_at=1 duration=8
//       -> single enhanced pass on the small strip, then watch it relax.
//
//   RUST_LOG=debug cargo run -- demo realtime
//       -> interactive run; wavefront wraps and switch changes are logged.
//
// Outputs (per run directory):
//   runs/<run_id>/
//     ├── config.json
//     ├── metrics.csv
//     ├── metrics_vs_time.png
//     ├── frames/polarity_*.png
//     └── polarity_evolution.mp4   (if `movie` is enabled)

use std::collections::VecDeque;
use std::env;
use std::error::Error;
use std::fs::{create_dir_all, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use tribomag_sim::config::{RunConfig, RunInfo, Schedule};
use tribomag_sim::control::{SharedToggles, Toggles};
use tribomag_sim::error::{SimError, SimResult};
use tribomag_sim::params::{Preset, SimParams};
use tribomag_sim::readout::DigitalTwinReadout;
use tribomag_sim::simulation::DomainGrid;
use tribomag_sim::visualisation::{make_movie_with_ffmpeg, save_metrics_plot, save_polarity_plot};

const DEFAULT_DURATION_S: f64 = 12.0;
const DEFAULT_SAVE_EVERY: usize = 10;
const MAX_DURATION_S: f64 = 24.0 * 3600.0;
const MAX_STEPS: usize = 50_000_000;
// Samples kept for the metrics plot; metrics.csv always has the full record.
const MAX_PLOT_SAMPLES: usize = 50_000;

fn print_usage() {
    eprintln!(
        r#"Usage:
  cargo run -- [demo|toy] [realtime] [movie]
             [saw=on|off] [tribo=on|off]
             [saw_off_at=T] [tribo_at=T] [tribo_off_at=T]
             [duration=T] [dt=VAL] [seed=N]
             [save=N] [frames=N] [fps=N]
             [params=PATH] [out=DIR] [run=RUN_ID]

Notes:
  - `params=PATH` loads a JSON parameter set (missing keys take the preset values).
  - Scheduled switch times are simulated seconds.
  - `duration` must be finite and at most one simulated day.
  - Open-ended realtime runs save no periodic frames unless `save=` or `frames=`
    is given, and the metrics plot shows only the latest samples.
  - In realtime mode type `s` + Enter to toggle the SAW, `t` for the tribo boost,
    `q` to quit.
"#
    );
}

fn parse_switch(v: &str) -> Option<bool> {
    let v = v.trim();
    if v.eq_ignore_ascii_case("on") || v == "1" || v.eq_ignore_ascii_case("true") {
        Some(true)
    } else if v.eq_ignore_ascii_case("off") || v == "0" || v.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn sanitize_run_id(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn default_run_id(preset: Preset, realtime: bool) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0));
    let ts = format!("{}{:03}", now.as_secs(), now.subsec_millis());
    let mode = if realtime { "realtime" } else { "headless" };
    format!("{}_{}_{}", ts, preset.as_str(), mode)
}

fn unique_run_dir(out_root: &str, run_id: &str) -> PathBuf {
    let base = PathBuf::from(out_root);
    let mut dir = base.join(run_id);
    if !dir.exists() {
        return dir;
    }
    for k in 1..1000 {
        let cand = base.join(format!("{}_{}", run_id, k));
        if !cand.exists() {
            dir = cand;
            break;
        }
    }
    dir
}

/// Stdin reader standing in for the UI buttons.
fn spawn_console_controls(toggles: Arc<SharedToggles>, running: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "s" | "saw" => {
                    let t = toggles.toggle_excitation();
                    info!("SAW switched {}", if t.excitation { "on" } else { "off" });
                }
                "t" | "tribo" => {
                    let t = toggles.toggle_enhancement();
                    info!("tribo boost switched {}", if t.enhancement { "on" } else { "off" });
                }
                "q" | "quit" => {
                    running.store(false, Ordering::Release);
                    break;
                }
                "" => {}
                other => warn!("unknown command '{other}' (use s, t or q)"),
            }
        }
    });
}

/// Accept a parsed `duration=` value only if it is a usable length of time.
fn checked_duration(d: f64) -> Option<f64> {
    (d.is_finite() && (0.0..=MAX_DURATION_S).contains(&d)).then_some(d)
}

/// Number of ticks for a run of `duration` seconds.
fn step_count(duration: f64, dt: f64) -> SimResult<usize> {
    let n = (duration / dt).round();
    if n.is_finite() && n >= 0.0 && n <= MAX_STEPS as f64 {
        Ok(n as usize)
    } else {
        Err(SimError::InvalidParams {
            name: "duration",
            reason: format!("{duration} s at dt = {dt} s needs more than {MAX_STEPS} ticks"),
        })
    }
}

/// Ticks between saved frames, or `None` for no periodic frames.
///
/// An explicit `save=` wins; `frames=` is spread over the run. Open-ended runs
/// only write frames when one of the two was given.
fn frame_stride(
    save: Option<usize>,
    frames: Option<usize>,
    n_steps: Option<usize>,
) -> Option<usize> {
    match (save, frames, n_steps) {
        (Some(s), _, _) => Some(s.max(1)),
        (None, Some(target), Some(n)) => {
            let denom = target.saturating_sub(1).max(1);
            Some(((n as f64) / (denom as f64)).ceil().max(1.0) as usize)
        }
        (None, Some(_), None) | (None, None, Some(_)) => Some(DEFAULT_SAVE_EVERY),
        (None, None, None) => None,
    }
}

/// Time series for the metrics plot, holding at most `cap` latest samples.
struct MetricSeries {
    cap: usize,
    times: VecDeque<f64>,
    completion: VecDeque<f64>,
    delta_b: VecDeque<f64>,
}

impl MetricSeries {
    fn new(n_steps: Option<usize>) -> Self {
        let cap = n_steps.map_or(MAX_PLOT_SAMPLES, |n| n.saturating_add(1).min(MAX_PLOT_SAMPLES));
        Self {
            cap,
            times: VecDeque::with_capacity(cap),
            completion: VecDeque::with_capacity(cap),
            delta_b: VecDeque::with_capacity(cap),
        }
    }

    fn push(&mut self, t: f64, completion_pct: f64, delta_b_nt: f64) {
        if self.times.len() == self.cap {
            self.times.pop_front();
            self.completion.pop_front();
            self.delta_b.pop_front();
        }
        self.times.push_back(t);
        self.completion.push_back(completion_pct);
        self.delta_b.push_back(delta_b_nt);
    }

    fn len(&self) -> usize {
        self.times.len()
    }

    fn plot(&mut self, params: &SimParams, filename: &str) -> Result<(), Box<dyn Error>> {
        save_metrics_plot(
            self.times.make_contiguous(),
            self.completion.make_contiguous(),
            self.delta_b.make_contiguous(),
            params.field_base_nt,
            (params.field_max_plain_nt, params.field_max_enhanced_nt),
            filename,
        )
    }
}

fn save_frame(sim: &DomainGrid, frames_dir: &Path, frame_idx: usize) {
    let fname = frames_dir.join(format!("polarity_{:06}.png", frame_idx));
    if let Err(e) = save_polarity_plot(sim, &fname.to_string_lossy()) {
        warn!("could not save frame {}: {e}", fname.to_string_lossy());
    }
}

fn main() -> SimResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = env::args().collect();

    let mut preset: Preset = Preset::Demo;
    let mut realtime = false;
    let mut make_movie_flag = false;
    let mut schedule = Schedule::default();

    let mut duration_override: Option<f64> = None;
    let mut dt_override: Option<f64> = None;
    let mut seed_override: Option<u64> = None;
    let mut save_override: Option<usize> = None;
    let mut frames_target: Option<usize> = None;
    let mut fps: u32 = 20;
    let mut params_path: Option<PathBuf> = None;

    let mut out_root_override: Option<String> = None;
    let mut run_id_override: Option<String> = None;

    for arg in argv.iter().skip(1) {
        if arg == "-h" || arg == "--help" || arg == "help" {
            print_usage();
            return Ok(());
        }
        if let Some(p) = Preset::from_arg(arg) {
            preset = p;
            continue;
        }
        if arg == "realtime" {
            realtime = true;
            continue;
        }
        if arg == "movie" {
            make_movie_flag = true;
            continue;
        }

        if let Some(v) = arg.strip_prefix("saw=") {
            match parse_switch(v) {
                Some(on) => schedule.saw = on,
                None => warn!("could not parse saw value '{v}', expected on/off"),
            }
            continue;
        }
        if let Some(v) = arg.strip_prefix("tribo=") {
            match parse_switch(v) {
                Some(on) => schedule.tribo = on,
                None => warn!("could not parse tribo value '{v}', expected on/off"),
            }
            continue;
        }
        if let Some(v) = arg.strip_prefix("saw_off_at=") {
            schedule.saw_off_at = v.parse::<f64>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("tribo_at=") {
            schedule.tribo_at = v.parse::<f64>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("tribo_off_at=") {
            schedule.tribo_off_at = v.parse::<f64>().ok();
            continue;
        }

        if let Some(v) = arg.strip_prefix("duration=") {
            match v.parse::<f64>().ok().and_then(checked_duration) {
                Some(d) => duration_override = Some(d),
                None => warn!(
                    "ignoring duration '{v}': expected a finite value in [0, {MAX_DURATION_S}] s"
                ),
            }
            continue;
        }
        if let Some(v) = arg.strip_prefix("dt=") {
            dt_override = v.parse::<f64>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("seed=") {
            seed_override = v.parse::<u64>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("save=") {
            save_override = v.parse::<usize>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("frames=") {
            frames_target = v.parse::<usize>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("fps=") {
            fps = v.parse::<u32>().unwrap_or(fps);
            continue;
        }
        if let Some(v) = arg.strip_prefix("params=") {
            params_path = Some(PathBuf::from(v));
            continue;
        }
        if let Some(v) = arg.strip_prefix("out=") {
            out_root_override = Some(v.to_string());
            continue;
        }
        if let Some(v) = arg.strip_prefix("run=") {
            run_id_override = Some(v.to_string());
            continue;
        }

        warn!("ignoring unknown argument '{arg}'");
    }

    let mut params = match &params_path {
        Some(path) => SimParams::from_json_file_with(path, &SimParams::new(preset))?,
        None => SimParams::new(preset),
    };
    if let Some(dt) = dt_override {
        params.dt = dt;
    }
    if let Some(seed) = seed_override {
        params.seed = seed;
    }
    params.validate()?;

    let dt = params.dt;
    let duration: Option<f64> = match (duration_override, realtime) {
        (Some(d), _) => Some(d),
        (None, true) => None,
        (None, false) => Some(DEFAULT_DURATION_S),
    };
    let n_steps: Option<usize> = duration.map(|d| step_count(d, dt)).transpose()?;
    let save_every = frame_stride(save_override, frames_target, n_steps);
    if realtime && save_every.is_none() {
        info!("open-ended realtime run: periodic frames off (pass save=N or frames=N)");
    }

    // -------- output directory setup --------
    let out_root = out_root_override.unwrap_or_else(|| "runs".to_string());
    create_dir_all(&out_root)?;

    let run_id = sanitize_run_id(
        &run_id_override.unwrap_or_else(|| default_run_id(preset, realtime)),
    );
    let run_dir = unique_run_dir(&out_root, &run_id);
    create_dir_all(&run_dir)?;
    let frames_dir = run_dir.join("frames");
    create_dir_all(&frames_dir)?;

    let run_config = RunConfig::new(
        &params,
        schedule,
        RunInfo {
            binary: "tribomag-sim".to_string(),
            run_id: run_id.clone(),
            preset: preset.as_str().to_string(),
            dt,
            duration,
            realtime,
            output_stride: save_every,
        },
    );
    run_config.write_to_dir(&run_dir)?;

    let grid = params.grid();
    println!("--- tribomag-sim run config ---");
    println!("run_dir: {}", run_dir.to_string_lossy());
    println!("preset:  {}", preset.as_str());
    println!(
        "grid:    nx={} ny={} pitch={:.3e} (Lx={:.3e}, Ly={:.3e})",
        grid.nx,
        grid.ny,
        grid.pitch,
        grid.lx(),
        grid.ly()
    );
    println!(
        "switch:  Δθ={:.1}°/{:.1}°  τ={:.1}/{:.1} s  approach={}/{}  eps={}°",
        params.max_rotation_deg(false),
        params.max_rotation_deg(true),
        params.retention_plain_s,
        params.retention_enhanced_s,
        params.holding_fraction,
        params.relaxing_fraction,
        params.epsilon_deg
    );
    println!(
        "SAW:     band={:.3e} m speed={:.3e} m/s  dt={}  duration={}",
        params.band_width,
        params.saw_speed,
        dt,
        duration.map_or_else(|| "until quit".to_string(), |d| format!("{d} s"))
    );
    println!(
        "toggles: saw={} tribo={}  schedule: saw_off_at={:?} tribo_at={:?} tribo_off_at={:?}",
        schedule.saw, schedule.tribo, schedule.saw_off_at, schedule.tribo_at, schedule.tribo_off_at
    );
    println!("-------------------------------");

    let toggles = Arc::new(SharedToggles::new(Toggles::new(schedule.saw, schedule.tribo)));
    let running = Arc::new(AtomicBool::new(true));
    if realtime {
        spawn_console_controls(Arc::clone(&toggles), Arc::clone(&running));
        println!("realtime: type s (SAW), t (tribo), q (quit) + Enter");
    }

    let mut sim = DomainGrid::new(params.clone());

    // CSV output
    let file_metrics: File = File::create(run_dir.join("metrics.csv"))?;
    let mut writer_metrics: BufWriter<File> = BufWriter::new(file_metrics);
    writeln!(
        writer_metrics,
        "t,saw,tribo,holding,relaxing,avg_completion_pct,delta_b_nt"
    )?;

    let mut series = MetricSeries::new(n_steps);

    let print_every = n_steps.map_or(100, |n| (n / 20).max(10));

    let mut saw_off_at = schedule.saw_off_at;
    let mut tribo_at = schedule.tribo_at;
    let mut tribo_off_at = schedule.tribo_off_at;
    let tol_time = 1e-9;

    let mut frame_idx: usize = 0;
    if save_every.is_some() {
        save_frame(&sim, &frames_dir, frame_idx);
        frame_idx += 1;
    }

    let mut last_toggles = toggles.snapshot();
    println!("{}", DigitalTwinReadout::new(&params, last_toggles, sim.metrics()));

    let tick_period = Duration::from_secs_f64(dt);
    let mut next_deadline = Instant::now() + tick_period;
    let mut step: usize = 0;

    while running.load(Ordering::Acquire) {
        if n_steps.is_some_and(|n| step >= n) {
            break;
        }

        // Scheduled switch changes land before the snapshot for this tick.
        let t = sim.elapsed();
        if saw_off_at.is_some_and(|at| t + tol_time >= at) {
            toggles.set_excitation(false);
            saw_off_at = None;
        }
        if tribo_at.is_some_and(|at| t + tol_time >= at) {
            toggles.set_enhancement(true);
            tribo_at = None;
        }
        if tribo_off_at.is_some_and(|at| t + tol_time >= at) {
            toggles.set_enhancement(false);
            tribo_off_at = None;
        }

        let snap = toggles.snapshot();
        if snap != last_toggles {
            debug!("toggles changed at t = {:.2} s: {:?}", t, snap);
            last_toggles = snap;
            println!("{}", DigitalTwinReadout::new(&params, snap, sim.metrics()));
        }

        let report = sim.tick_with(dt, snap);
        step += 1;
        if report.wrapped {
            info!("t = {:.2} s: SAW pass complete, restarting", sim.elapsed());
        }

        let m = sim.metrics();
        let t = sim.elapsed();
        series.push(t, m.avg_completion_pct, m.delta_b_nt);
        writeln!(
            writer_metrics,
            "{:.4},{},{},{},{},{:.6},{:.6}",
            t,
            u8::from(snap.excitation),
            u8::from(snap.enhancement),
            m.holding,
            m.relaxing,
            m.avg_completion_pct,
            m.delta_b_nt
        )?;

        if step % print_every == 0 {
            println!(
                "step {:6}, t = {:6.2} s, holding = {:4}, relaxing = {:4}, flipped = {:5.1}%, ΔB = {:5.1} nT",
                step, t, m.holding, m.relaxing, m.avg_completion_pct, m.delta_b_nt
            );
        }

        if save_every.is_some_and(|s| step % s == 0) || n_steps == Some(step) {
            save_frame(&sim, &frames_dir, frame_idx);
            frame_idx += 1;
        }

        if realtime {
            let now = Instant::now();
            if next_deadline > now {
                thread::sleep(next_deadline - now);
            }
            next_deadline += tick_period;
        }
    }
    writer_metrics.flush()?;

    println!(
        "{}",
        DigitalTwinReadout::new(&params, toggles.snapshot(), sim.metrics())
    );

    debug!("plotting the last {} samples", series.len());
    if let Err(e) = series.plot(&params, &run_dir.join("metrics_vs_time.png").to_string_lossy()) {
        warn!("could not save metrics plot: {e}");
    }

    if make_movie_flag {
        let pattern = frames_dir.join("polarity_*.png").to_string_lossy().to_string();
        let movie_path = run_dir.join("polarity_evolution.mp4");
        if let Err(e) = make_movie_with_ffmpeg(&pattern, &movie_path.to_string_lossy(), fps) {
            warn!("could not create movie with ffmpeg: {e}");
        } else {
            println!("Saved movie to {}", movie_path.to_string_lossy());
        }
    } else {
        println!("Movie generation skipped (no 'movie' flag).");
    }

    println!("Done. {} ticks, outputs in {}", step, run_dir.to_string_lossy());
    Ok(())
}
