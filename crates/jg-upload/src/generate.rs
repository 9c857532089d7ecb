//! Noise-driven program generation.
//!
//! Every frame samples a coherent 3D noise field (grid x, grid y, time) at the
//! valve locations and opens the brightest valves until the target share of
//! open valves is reached. Two fields with different feature sizes can be
//! mixed. Runs of identical frames collapse into one program line.

use crate::error::{HostError, HostResult};
use crate::host::{HostLine, HostProgram};
use jg_core::{BIAS, N_VALVES, VALVE_POINTS};
use jg_program::MAX_LINES;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Noise pixels between neighbouring grid coordinates.
const PIXEL_DIST: f64 = 32.0;

/// Generator settings, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    pub name: String,
    /// Frames to generate, one program line at most per frame.
    pub n_frames: usize,
    /// Frame duration [ms]
    pub frame_ms: u16,
    /// Coherent feature size of field A [pixels]
    pub feature_size_a: f64,
    /// Coherent feature size of field B [pixels], 0 disables mixing
    pub feature_size_b: f64,
    /// Time step of field A per frame [noise units]
    pub t_step_a: f64,
    /// Time step of field B per frame [noise units]
    pub t_step_b: f64,
    pub seed_a: u64,
    pub seed_b: u64,
    /// Share of valves open in every frame [0-1]
    pub target_transparency: f64,
    /// Shortest open or closed spell of a valve [frames], 0 or 1 disables
    pub min_valve_duration: usize,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            name: "Coherent noise".to_owned(),
            n_frames: MAX_LINES,
            frame_ms: 50,
            feature_size_a: 50.0,
            feature_size_b: 100.0,
            t_step_a: 0.1,
            t_step_b: 0.1,
            seed_a: 1,
            seed_b: 13,
            target_transparency: 0.4,
            min_valve_duration: 5,
        }
    }
}

impl NoiseParams {
    pub fn validate(&self) -> HostResult<()> {
        let invalid = |what: String| Err(HostError::InvalidParams { what });

        if self.n_frames == 0 || self.n_frames > MAX_LINES {
            return invalid(format!("n_frames = {} must be in 1..={MAX_LINES}", self.n_frames));
        }
        if self.frame_ms == 0 {
            return invalid("frame_ms must be positive".to_owned());
        }
        if !(self.feature_size_a.is_finite() && self.feature_size_a > 0.0) {
            return invalid("feature_size_a must be positive".to_owned());
        }
        if !(self.feature_size_b.is_finite() && self.feature_size_b >= 0.0) {
            return invalid("feature_size_b must not be negative".to_owned());
        }
        if !(self.t_step_a.is_finite() && self.t_step_b.is_finite()) {
            return invalid("time steps must be finite".to_owned());
        }
        if !(0.0..=1.0).contains(&self.target_transparency) {
            return invalid(format!(
                "target_transparency = {} must be in 0..=1",
                self.target_transparency
            ));
        }
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> HostResult<Self> {
        let params: NoiseParams = serde_yaml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load_yaml(path: &Path) -> HostResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

/// Generate a program from `params`.
pub fn generate(params: &NoiseParams) -> HostResult<HostProgram> {
    params.validate()?;

    let field_a = GradientNoise::new(params.seed_a);
    let field_b = (params.feature_size_b > 0.0).then(|| GradientNoise::new(params.seed_b));
    let n_open = (params.target_transparency * N_VALVES as f64).round() as usize;

    let mut frames = Vec::with_capacity(params.n_frames);
    let mut levels = [0.0; N_VALVES];
    for frame in 0..params.n_frames {
        let t = frame as f64;
        for (level, &p) in levels.iter_mut().zip(VALVE_POINTS.iter()) {
            let (px, py) = (pixel(p.x), pixel(p.y));
            let a = field_a.sample(
                px / params.feature_size_a,
                py / params.feature_size_a,
                t * params.t_step_a,
            );
            *level = match &field_b {
                Some(b) => {
                    let fb = params.feature_size_b;
                    (a + b.sample(px / fb, py / fb, t * params.t_step_b)) / 2.0
                }
                None => a,
            };
        }
        frames.push(open_brightest(&levels, n_open));
    }

    enforce_min_duration(&mut frames, params.min_valve_duration);

    let program = HostProgram {
        name: params.name.clone(),
        lines: collapse_frames(&frames, params.frame_ms),
    };
    program.validate()?;
    debug!(
        frames = params.n_frames,
        lines = program.lines.len(),
        open = n_open,
        "program generated"
    );
    Ok(program)
}

fn pixel(c: i8) -> f64 {
    f64::from(c + BIAS) * PIXEL_DIST + (PIXEL_DIST - 1.0)
}

fn open_brightest(levels: &[f64; N_VALVES], n_open: usize) -> [bool; N_VALVES] {
    let mut order: Vec<usize> = (0..N_VALVES).collect();
    order.sort_by(|&i, &j| levels[j].total_cmp(&levels[i]));
    let mut open = [false; N_VALVES];
    for &i in order.iter().take(n_open) {
        open[i] = true;
    }
    open
}

/// Hold every valve state for at least `min_frames` frames after it changed.
fn enforce_min_duration(frames: &mut [[bool; N_VALVES]], min_frames: usize) {
    if min_frames <= 1 || frames.is_empty() {
        return;
    }
    for v in 0..N_VALVES {
        let mut state = frames[0][v];
        let mut since = 0;
        for (t, frame) in frames.iter_mut().enumerate().skip(1) {
            if frame[v] != state && t - since >= min_frames {
                state = frame[v];
                since = t;
            }
            frame[v] = state;
        }
    }
}

fn collapse_frames(frames: &[[bool; N_VALVES]], frame_ms: u16) -> Vec<HostLine> {
    let mut lines = Vec::new();
    for run in frames.chunk_by(|a, b| a == b) {
        let points: Vec<(i8, i8)> = VALVE_POINTS
            .iter()
            .zip(run[0].iter())
            .filter(|&(_, &open)| open)
            .map(|(p, _)| (p.x, p.y))
            .collect();
        let duration_ms = run.len() as u32 * u32::from(frame_ms);
        push_run(&mut lines, duration_ms, &points);
    }
    lines
}

/// Append a run as lines of at most `u16::MAX` ms. Empty lines never end in a
/// 0xFF duration byte.
fn push_run(lines: &mut Vec<HostLine>, mut duration_ms: u32, points: &[(i8, i8)]) {
    while duration_ms > 0 {
        let mut chunk = duration_ms.min(u32::from(u16::MAX)) as u16;
        if points.is_empty() && chunk & 0xff == 0xff {
            chunk -= 1;
        }
        lines.push(HostLine {
            duration_ms: chunk,
            points: points.to_vec(),
        });
        duration_ms -= u32::from(chunk);
    }
}

/// Seeded 3D gradient noise, roughly in [-1, 1].
struct GradientNoise {
    perm: [u8; 512],
}

impl GradientNoise {
    fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut StdRng::seed_from_u64(seed));
        Self {
            perm: std::array::from_fn(|i| table[i & 255]),
        }
    }

    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, xf) = lattice(x);
        let (yi, yf) = lattice(y);
        let (zi, zf) = lattice(z);
        let (u, v, w) = (fade(xf), fade(yf), fade(zf));
        let p = |i: usize| usize::from(self.perm[i]);

        let a = p(xi) + yi;
        let aa = p(a) + zi;
        let ab = p(a + 1) + zi;
        let b = p(xi + 1) + yi;
        let ba = p(b) + zi;
        let bb = p(b + 1) + zi;

        let near = lerp(
            v,
            lerp(u, grad(p(aa), xf, yf, zf), grad(p(ba), xf - 1.0, yf, zf)),
            lerp(
                u,
                grad(p(ab), xf, yf - 1.0, zf),
                grad(p(bb), xf - 1.0, yf - 1.0, zf),
            ),
        );
        let far = lerp(
            v,
            lerp(
                u,
                grad(p(aa + 1), xf, yf, zf - 1.0),
                grad(p(ba + 1), xf - 1.0, yf, zf - 1.0),
            ),
            lerp(
                u,
                grad(p(ab + 1), xf, yf - 1.0, zf - 1.0),
                grad(p(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0),
            ),
        );
        lerp(w, near, far)
    }
}

fn lattice(c: f64) -> (usize, f64) {
    let floor = c.floor();
    ((floor as i64 & 255) as usize, c - floor)
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = match h {
        0..=3 => y,
        12 | 14 => x,
        _ => z,
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}
