//! Point-source panner benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use osr_core::{Layout, PolarPosition};
use osr_render::PointSourcePanner;

fn bench_psp(c: &mut Criterion) {
    for name in ["0+5+0", "4+7+0", "9+10+3"] {
        let psp = PointSourcePanner::new(&Layout::with_name(name).unwrap()).unwrap();
        let mut gains = vec![0.0; psp.num_channels()];
        c.bench_function(&format!("psp_{name}"), |b| {
            let mut az = 0.0f64;
            b.iter(|| {
                az = (az + 7.3) % 360.0 - 180.0;
                psp.gains_polar(PolarPosition::new(az, 10.0, 1.0), &mut gains);
                black_box(&gains);
            })
        });
    }
}

criterion_group!(benches, bench_psp);
criterion_main!(benches);
