//! Writes a synthetic 20 Hz recorder CSV with the quirks real logs have:
//! a quoted header line, a duplicated column, a few garbage cells and a
//! `TimeMarker` column.

use std::f64::consts::PI;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

const SAMPLE_RATE: f64 = 20.0;

#[derive(Parser, Debug)]
#[command(name = "generate_sample", about = "Write a synthetic flight log CSV")]
struct Args {
    /// Output path.
    #[arg(default_value = "sample_flight.csv")]
    out: PathBuf,

    /// Number of rows (20 per second).
    #[arg(long, default_value_t = 2400)]
    rows: usize,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

const COLUMNS: [&str; 15] = [
    "TimeMarker",
    "VelocityX",
    "VelocityY",
    "VelocityZ",
    "RollAngle",
    "PitchAngle",
    "PresentTrueHeading",
    "PresentMagneticHeading",
    "PlatformAzimuth",
    "RollRate",
    "PitchRate",
    "YawRate",
    "BlendedEllipsoidHeight",
    "DistanceToSteerpoint",
    // recorders sometimes emit a channel twice
    "RollRate",
];

/// One row of a gentle S-turn climb, in recorder units (ft/s, radians,
/// normalized rates).
fn sample_row(i: usize, rng: &mut SimpleRng, distance: &mut f64) -> Vec<String> {
    let t = i as f64 / SAMPLE_RATE;
    let heading = 0.6 * (t / 40.0).sin();
    let speed = 420.0 + 10.0 * (t / 17.0).sin();
    let vx = speed * heading.cos();
    let vy = speed * heading.sin();
    let vz = 8.0 * (t / 25.0).cos();
    let roll = 0.5 * (t / 40.0).cos() + rng.gauss(0.0, 0.01);
    let pitch = 0.05 + 0.02 * (t / 25.0).cos() + rng.gauss(0.0, 0.005);
    let roll_rate = 0.5 / 40.0 * -(t / 40.0).sin() * 180.0 / PI / 180.0;
    let yaw_rate = 0.6 / 40.0 * (t / 40.0).cos() * 180.0 / PI / 180.0;
    let height = 12_000.0 + 200.0 * (t / 25.0).sin() + rng.gauss(0.0, 3.0);
    *distance = (*distance - speed / SAMPLE_RATE).max(0.0);

    let secs = 12 * 3600 + (t as u64);
    let marker = format!(
        "R {:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        secs / 60 % 60,
        secs % 60,
        (i % 20) * 50
    );
    let true_heading = heading.rem_euclid(2.0 * PI);
    let mut row = vec![
        marker,
        format!("{vx:.3}"),
        format!("{vy:.3}"),
        format!("{vz:.3}"),
        format!("{roll:.5}"),
        format!("{pitch:.5}"),
        format!("{true_heading:.5}"),
        format!("{:.5}", (true_heading - 0.05).rem_euclid(2.0 * PI)),
        format!("{:.5}", (true_heading + 0.01).rem_euclid(2.0 * PI)),
        format!("{roll_rate:.6}"),
        format!("{:.6}", rng.gauss(0.0, 0.001)),
        format!("{yaw_rate:.6}"),
        format!("{height:.1}"),
        format!("{distance:.1}"),
        format!("{roll_rate:.6}"),
    ];

    // sprinkle the damage a flaky recorder leaves behind
    if i % 997 == 13 {
        row[4] = "ERR".to_string();
    }
    if i % 613 == 7 {
        row[12] = String::new();
    }
    row
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(42);

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .from_path(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    // header as one quoted field, the way the recorder exports it
    writer.write_record([format!("\"{}\"", COLUMNS.join(","))])?;

    let mut distance = 60_000.0;
    for i in 0..args.rows {
        writer.write_record(sample_row(i, &mut rng, &mut distance))?;
    }
    writer.flush()?;

    log::info!("wrote {} rows to {}", args.rows, args.out.display());
    println!("Wrote {} rows to {}", args.rows, args.out.display());
    Ok(())
}
