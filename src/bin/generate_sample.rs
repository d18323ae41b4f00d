use std::f64::consts::PI;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate, Timelike};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// One hourly reading in the PRSA station layout.
#[derive(Debug, Serialize)]
struct Reading {
    #[serde(rename = "No")]
    no: i64,
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    #[serde(rename = "SO2")]
    so2: Option<f64>,
    #[serde(rename = "NO2")]
    no2: Option<f64>,
    #[serde(rename = "O3")]
    o3: Option<f64>,
    #[serde(rename = "TEMP")]
    temp: Option<f64>,
    wd: &'static str,
    station: &'static str,
}

const WIND_DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

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

    /// `value` most of the time, a large spike with probability `p_spike`,
    /// nothing with probability `p_missing`.
    fn observe(&mut self, value: f64, p_spike: f64, p_missing: f64) -> Option<f64> {
        let roll = self.next_f64();
        if roll < p_missing {
            None
        } else if roll < p_missing + p_spike {
            Some(value * (4.0 + 6.0 * self.next_f64()))
        } else {
            Some(value)
        }
    }
}

fn generate(rng: &mut SimpleRng) -> Result<Vec<Reading>> {
    let start = NaiveDate::from_ymd_opt(2013, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    let end = NaiveDate::from_ymd_opt(2017, 3, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid end date")?;

    let mut readings = Vec::new();
    let mut ts = start;
    let mut no = 1;
    while ts < end {
        // 0 in mid-January, 1 in mid-July
        let season = 0.5 - 0.5 * (2.0 * PI * (ts.ordinal() as f64 - 15.0) / 365.25).cos();
        let daily = (2.0 * PI * (ts.hour() as f64 - 9.0) / 24.0).sin();

        let temp = -6.0 + 32.0 * season + 4.0 * daily + rng.gauss(0.0, 2.0);
        let o3 = (15.0 + 2.2 * (temp + 6.0) + 12.0 * daily + rng.gauss(0.0, 10.0)).max(1.0);
        let so2 = (3.0 + 25.0 * (1.0 - season).powi(2) + rng.gauss(0.0, 3.0)).max(1.0);
        let no2 = (25.0 + 30.0 * (1.0 - season) + rng.gauss(0.0, 8.0)).max(2.0);

        readings.push(Reading {
            no,
            year: ts.year() as i64,
            month: ts.month() as i64,
            day: ts.day() as i64,
            hour: ts.hour() as i64,
            so2: rng.observe(so2, 0.01, 0.01),
            no2: rng.observe(no2, 0.005, 0.01),
            o3: rng.observe(o3, 0.005, 0.01),
            temp: rng.observe(temp, 0.0, 0.002),
            wd: WIND_DIRECTIONS[(rng.next_u64() % WIND_DIRECTIONS.len() as u64) as usize],
            station: "Changping",
        });
        ts += Duration::hours(1);
        no += 1;
    }
    Ok(readings)
}

fn write_csv(path: &str, readings: &[Reading]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for reading in readings {
        writer.serialize(reading)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, readings: &[Reading]) -> Result<()> {
    let int = |f: fn(&Reading) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(readings.iter().map(f).collect::<Vec<_>>()))
    };
    let float = |f: fn(&Reading) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(readings.iter().map(f).collect::<Vec<_>>()))
    };
    let text = |f: fn(&Reading) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(readings.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("No", DataType::Int64, false),
        Field::new("year", DataType::Int64, false),
        Field::new("month", DataType::Int64, false),
        Field::new("day", DataType::Int64, false),
        Field::new("hour", DataType::Int64, false),
        Field::new("SO2", DataType::Float64, true),
        Field::new("NO2", DataType::Float64, true),
        Field::new("O3", DataType::Float64, true),
        Field::new("TEMP", DataType::Float64, true),
        Field::new("wd", DataType::Utf8, false),
        Field::new("station", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            int(|r| r.no),
            int(|r| r.year),
            int(|r| r.month),
            int(|r| r.day),
            int(|r| r.hour),
            float(|r| r.so2),
            float(|r| r.no2),
            float(|r| r.o3),
            float(|r| r.temp),
            text(|r| r.wd),
            text(|r| r.station),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let readings = generate(&mut rng)?;

    let csv_path = "sample_changping.csv";
    let parquet_path = "sample_changping.parquet";
    write_csv(csv_path, &readings)?;
    write_parquet(parquet_path, &readings)?;

    println!(
        "Wrote {} hourly readings to {csv_path} and {parquet_path}",
        readings.len()
    );
    Ok(())
}
