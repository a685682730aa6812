// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Core Profile Updaters Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use std::hint::black_box;
use transport_core::boundary::compute_boundary_conditions_for_t_plus_dt;
use transport_core::charge_states::FullyIonized;
use transport_core::initialization::initial_core_profiles;
use transport_core::updaters::finalize_core_profiles;
use transport_types::config::RuntimeParams;
use transport_types::state::{BootstrapCurrentProfile, SourceProfiles};

fn sources(nx: usize) -> SourceProfiles {
    SourceProfiles::new(BootstrapCurrentProfile::zero_bootstrap(
        Array1::from_elem(nx, 1e8),
        Array1::from_elem(nx + 1, 1e8),
    ))
    .with_psi_source("eccd", Array1::from_elem(nx, 1e5))
}

fn bench_updaters(c: &mut Criterion) {
    let mut group = c.benchmark_group("core_profile_updaters");

    for &nx in &[25usize, 100, 400] {
        let mut params = RuntimeParams::default();
        params.geometry.nx = nx;
        let geo = params.create_geometry().expect("geometry should build");
        let static_slice = params.static_slice();
        let dyn_t = params.dynamic_slice(0.0, &geo).expect("slice at t");
        let dyn_tdt = params.dynamic_slice(0.1, &geo).expect("slice at t+dt");
        let src = sources(nx);
        let core = initial_core_profiles(&dyn_t, &geo, &FullyIonized, &src)
            .expect("initial profiles should build");

        group.bench_with_input(BenchmarkId::new("boundary_conditions", nx), &nx, |b, _| {
            b.iter(|| {
                let bc = compute_boundary_conditions_for_t_plus_dt(
                    0.1,
                    &static_slice,
                    &dyn_t,
                    &dyn_tdt,
                    &geo,
                    &core,
                    &FullyIonized,
                )
                .expect("boundary conditions should resolve");
                black_box(bc.psi);
            })
        });

        group.bench_with_input(BenchmarkId::new("finalize", nx), &nx, |b, _| {
            b.iter_batched(
                || core.clone(),
                |profiles| {
                    let out = finalize_core_profiles(&profiles, &dyn_tdt, &geo, &src)
                        .expect("finalize should succeed");
                    black_box(out.q_face[0]);
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_updaters);
criterion_main!(benches);
