use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Pick a value from weighted alternatives.
    fn choose<'a>(&mut self, weighted: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        let mut roll = self.next_f64() * total;
        for (value, weight) in weighted {
            if roll < *weight {
                return value;
            }
            roll -= weight;
        }
        weighted.last().map(|(v, _)| *v).unwrap_or("Unknown")
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let n_patients = 5000;

    let races = [
        ("White", 55.0),
        ("Black or African American", 18.0),
        ("Asian", 12.0),
        ("American Indian or Alaska Native", 3.0),
        ("Unknown", 12.0),
    ];
    let ethnicities = [
        ("Non-Hispanic", 70.0),
        ("Hispanic or Latino", 18.0),
        ("Unknown", 12.0),
    ];
    let genders = [("Female", 58.0), ("Male", 41.0), ("Unknown", 1.0)];
    let sites = [
        ("Breast", 30.0),
        ("Lung", 18.0),
        ("Colon", 12.0),
        ("Prostate", 10.0),
        ("Ovary", 6.0),
        ("Pancreas", 5.0),
        ("Kidney", 5.0),
        ("Bladder", 4.0),
        ("Unknown", 10.0),
    ];
    let stages = [
        ("I", 28.0),
        ("II", 26.0),
        ("III", 18.0),
        ("IV", 13.0),
        ("Unknown", 15.0),
    ];

    let mut race_col = Vec::with_capacity(n_patients);
    let mut ethnicity_col = Vec::with_capacity(n_patients);
    let mut gender_col = Vec::with_capacity(n_patients);
    let mut age_col: Vec<Option<f64>> = Vec::with_capacity(n_patients);
    let mut site_col = Vec::with_capacity(n_patients);
    let mut stage_col = Vec::with_capacity(n_patients);

    for _ in 0..n_patients {
        race_col.push(rng.choose(&races));
        ethnicity_col.push(rng.choose(&ethnicities));
        gender_col.push(rng.choose(&genders));
        site_col.push(rng.choose(&sites));
        stage_col.push(rng.choose(&stages));

        // Ages cluster around 62, clamped to a plausible range; ~6% missing.
        if rng.next_f64() < 0.06 {
            age_col.push(None);
        } else {
            age_col.push(Some(rng.gauss(62.0, 13.0).clamp(18.0, 95.0).round()));
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("race", DataType::Utf8, false),
        Field::new("ethnicity", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("age", DataType::Float64, true),
        Field::new("site", DataType::Utf8, false),
        Field::new("stage", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(race_col)),
            Arc::new(StringArray::from(ethnicity_col)),
            Arc::new(StringArray::from(gender_col)),
            Arc::new(Float64Array::from(age_col)),
            Arc::new(StringArray::from(site_col)),
            Arc::new(StringArray::from(stage_col)),
        ],
    )
    .expect("building record batch");

    let out_path = "sample_registry.parquet";
    let file = std::fs::File::create(out_path).expect("creating output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("creating parquet writer");
    writer.write(&batch).expect("writing record batch");
    writer.close().expect("closing parquet writer");

    println!("Wrote {n_patients} synthetic patient records to {out_path}");
}
