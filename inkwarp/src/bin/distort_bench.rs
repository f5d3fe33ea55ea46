#[cfg(feature = "bench_distort")]
use inkwarp::{DistortParams, DistortionMode, Distorter};
#[cfg(feature = "bench_distort")]
use std::time::Instant;

#[cfg(not(feature = "bench_distort"))]
fn main() {
    panic!("distort_bench requires --features bench_distort");
}

#[cfg(feature = "bench_distort")]
fn build_markup(count: usize) -> String {
    let mut s = String::from("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 2000 2000\">");
    let side = (count as f64).sqrt().ceil() as usize;
    for k in 0..count {
        let x = (k % side) as f64 * 40.0;
        let y = (k / side) as f64 * 40.0;
        match k % 3 {
            0 => s.push_str(&format!("<circle cx=\"{}\" cy=\"{}\" r=\"15\"/>", x + 20.0, y + 20.0)),
            1 => s.push_str(&format!("<rect x=\"{}\" y=\"{}\" width=\"30\" height=\"30\" rx=\"4\"/>", x, y)),
            _ => s.push_str(&format!(
                "<path d=\"M {} {} q 15 -20 30 0 t 0 30 Z\"/>",
                x,
                y + 10.0
            )),
        }
    }
    s.push_str("</svg>");
    s
}

#[cfg(feature = "bench_distort")]
fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut count = 1_000usize;
    let mut repeats = 10usize;
    let mut frequency = 50.0f64;
    for a in &args[1..] {
        if let Some(val) = a.strip_prefix("--elements=") {
            if let Ok(v) = val.parse() {
                count = v;
            }
        } else if let Some(val) = a.strip_prefix("--repeats=") {
            if let Ok(v) = val.parse() {
                repeats = v;
            }
        } else if let Some(val) = a.strip_prefix("--frequency=") {
            if let Ok(v) = val.parse() {
                frequency = v;
            }
        }
    }

    let markup = build_markup(count);
    let t0 = Instant::now();
    let distorter = match Distorter::from_markup(&markup) {
        Ok(d) => d,
        Err(e) => panic!("bench markup rejected: {e}"),
    };
    let parse_ms = t0.elapsed().as_secs_f64() * 1000.0;

    let mut total_ms = 0.0;
    let mut nodes = 0usize;
    for r in 0..repeats {
        // a new seed each round so the memo never hits
        let params = DistortParams {
            mode: DistortionMode::ALL[r % DistortionMode::ALL.len()],
            frequency,
            seed: r as f64,
            ..Default::default()
        };
        let t = Instant::now();
        let rendered = distorter.render(&params);
        total_ms += t.elapsed().as_secs_f64() * 1000.0;
        nodes = rendered.export.node_count;
    }
    println!(
        "elements={} parse_ms={:.2} repeats={} avg_bake_ms={:.2} nodes={}",
        count,
        parse_ms,
        repeats,
        total_ms / repeats.max(1) as f64,
        nodes
    );
}
