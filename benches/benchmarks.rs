use banquet::layout::FurnitureSpec;
use banquet::layout::Kind;
use banquet::layout::LayoutRequest;
use banquet::layout::Room;
use banquet::numeric::Matrix;
use banquet::stochastic::CmaesConfig;
use banquet::transport::CostMatrix;
use banquet::transport::Distribution;
use banquet::transport::SinkhornConfig;

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        solving_spacious_layout,
        validating_dense_layout,
        computing_sinkhorn_plan,
        computing_sinkhorn_log_plan,
        computing_sinkhorn_divergence,
        minimizing_sphere_cmaes,
}

fn banquet_hall() -> LayoutRequest {
    LayoutRequest::new(
        Room::new(20., 15.),
        vec![
            FurnitureSpec::new(Kind::RoundTable, 1.8, 1.8, 4).with_chairs(6),
            FurnitureSpec::new(Kind::Chair, 0.5, 0.5, 20),
        ],
    )
}

fn marginals(n: usize) -> (Distribution, Distribution, CostMatrix) {
    let a = Distribution::uniform(n);
    let b = Distribution::uniform(n);
    let c = CostMatrix::new(Matrix::from_fn(n, n, |i, j| {
        ((i as f64 - j as f64) / n as f64).abs()
    }))
    .expect("valid cost");
    (a, b, c)
}

fn solving_spacious_layout(c: &mut criterion::Criterion) {
    let request = banquet_hall();
    c.bench_function("solve a 20x15 banquet layout", |b| {
        b.iter(|| banquet::layout::solve(&request))
    });
}

fn validating_dense_layout(c: &mut criterion::Criterion) {
    let request = banquet_hall();
    let result = banquet::layout::solve(&request);
    c.bench_function("validate a solved layout", |b| {
        b.iter(|| banquet::layout::validate(&request.room, &result.placements, &request.options))
    });
}

fn computing_sinkhorn_plan(c: &mut criterion::Criterion) {
    let (a, b, cost) = marginals(64);
    c.bench_function("compute a 64x64 sinkhorn plan", |bench| {
        bench.iter(|| banquet::transport::sinkhorn(&a, &b, &cost, SinkhornConfig::default()))
    });
}

fn computing_sinkhorn_log_plan(c: &mut criterion::Criterion) {
    let (a, b, cost) = marginals(64);
    let config = SinkhornConfig {
        epsilon: 1e-4,
        ..SinkhornConfig::default()
    };
    c.bench_function("compute a 64x64 log-domain plan", |bench| {
        bench.iter(|| banquet::transport::sinkhorn_log(&a, &b, &cost, config))
    });
}

fn computing_sinkhorn_divergence(c: &mut criterion::Criterion) {
    let (a, b, cost) = marginals(32);
    c.bench_function("compute a debiased divergence", |bench| {
        bench.iter(|| banquet::transport::sinkhorn_divergence_symmetric(&a, &b, &cost, 0.05))
    });
}

fn minimizing_sphere_cmaes(c: &mut criterion::Criterion) {
    c.bench_function("minimize a 5d sphere by cmaes", |b| {
        b.iter(|| {
            banquet::stochastic::cmaes(
                &[2., -1., 0.5, 1.5, -2.],
                CmaesConfig::default(),
                |x| x.iter().map(|v| v * v).sum(),
                None,
            )
        })
    });
}
