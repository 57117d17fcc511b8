//! Benchmarks for the driver's advertised near-linear running time
//! (component D), mirroring `hyformal/benches/bench.rs`'s structure: build
//! deterministic synthetic inputs with a seeded RNG, then time the public
//! entry points directly.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use hdtdist::config::TripletAndQuartet;
use hdtdist::driver::{calculate_quartet_distance, calculate_triplet_distance};
use hdtdist::session::Session;

fn label(i: usize) -> String {
    format!("l{i}")
}

/// Fully unbalanced caterpillar on `n` leaves: `(((l0,l1),l2),...,l{n-1});`
fn caterpillar_newick(n: usize) -> String {
    let mut s = label(0);
    for i in 1..n {
        s = format!("({s},{})", label(i));
    }
    format!("{s};")
}

/// Perfectly balanced binary tree on `n` leaves (`n` a power of two).
fn balanced_newick(n: usize) -> String {
    fn build(lo: usize, hi: usize) -> String {
        if hi - lo == 1 {
            return label(lo);
        }
        let mid = lo + (hi - lo) / 2;
        format!("({},{})", build(lo, mid), build(mid, hi))
    }
    format!("{};", build(0, n))
}

/// A random bifurcating tree on `n` leaves, built by repeatedly grafting the
/// next leaf onto a uniformly chosen existing edge (Yule-process shape).
fn random_newick(n: usize, rng: &mut impl Rng) -> String {
    let mut clades: Vec<String> = vec![label(0), label(1)];
    for i in 2..n {
        let idx = rng.random_range(0..clades.len());
        clades[idx] = format!("({},{})", clades[idx], label(i));
    }
    format!("({});", clades.join(","))
}

/// A pure star: every leaf a direct child of the root, `max_degree = n - 1`.
/// This is the degenerate case `counters::combine_general` folds in
/// `O(k^3)`/`O(k^4)` time rather than the paper's `O(log n)`-amortised bound
/// (SPEC_FULL.md §1's documented Non-goal); this benchmark group exists to
/// show that cost directly rather than leave it implicit.
fn star_newick(n: usize) -> String {
    let labels: Vec<String> = (0..n).map(label).collect();
    format!("({});", labels.join(","))
}

fn bench_triplet_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("triplet_distance");

    for &n in &[64usize, 512, 4096] {
        let caterpillar = caterpillar_newick(n);
        let balanced = balanced_newick(n.next_power_of_two());
        group.bench_function(format!("caterpillar_vs_balanced_{n}"), |b| {
            b.iter(|| {
                let session = Session::load("t1.nwk", &caterpillar, "t2.nwk", &balanced).unwrap();
                let total = session.total_leaves();
                black_box(calculate_triplet_distance::<TripletAndQuartet>(
                    session.t1, session.t2, total,
                ))
            })
        });
    }

    group.finish();
}

fn bench_quartet_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("quartet_distance");

    for &n in &[64usize, 512, 4096] {
        let caterpillar = caterpillar_newick(n);
        let balanced = balanced_newick(n.next_power_of_two());
        group.bench_function(format!("caterpillar_vs_balanced_{n}"), |b| {
            b.iter(|| {
                let session = Session::load("t1.nwk", &caterpillar, "t2.nwk", &balanced).unwrap();
                let total = session.total_leaves();
                black_box(calculate_quartet_distance::<TripletAndQuartet>(
                    session.t1, session.t2, total,
                ))
            })
        });
    }

    group.finish();
}

fn bench_random_trees(c: &mut Criterion) {
    let mut group = c.benchmark_group("triplet_distance_random");
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);

    for &n in &[64usize, 512, 4096] {
        let t1 = random_newick(n, &mut rng);
        let t2 = random_newick(n, &mut rng);
        group.bench_function(format!("random_pair_{n}"), |b| {
            b.iter(|| {
                let session = Session::load("t1.nwk", &t1, "t2.nwk", &t2).unwrap();
                let total = session.total_leaves();
                black_box(calculate_triplet_distance::<TripletAndQuartet>(
                    session.t1, session.t2, total,
                ))
            })
        });
    }

    group.finish();
}

/// The star's root is a single `General` node of degree `n - 1`, so every
/// `update_counters` call here pays the full `O(n^3)` (triplets) /
/// `O(n^4)` (quartets) cost in one shot rather than amortising it across an
/// `O(log n)`-deep decomposition. Quartet sizes stop far short of the
/// triplet sizes above: `C(n, 4)` grows a full order faster than `C(n, 3)`,
/// so a size that keeps triplets comfortably sub-second already makes
/// quartets the dominant cost of this whole benchmark binary.
fn bench_star_multifurcation(c: &mut Criterion) {
    let mut group = c.benchmark_group("star_multifurcation");

    for &n in &[64usize, 256, 512] {
        let star = star_newick(n);
        group.bench_function(format!("triplet_self_{n}"), |b| {
            b.iter(|| {
                let session = Session::load("t1.nwk", &star, "t2.nwk", &star).unwrap();
                let total = session.total_leaves();
                black_box(calculate_triplet_distance::<TripletAndQuartet>(
                    session.t1, session.t2, total,
                ))
            })
        });
    }

    for &n in &[16usize, 32, 64] {
        let star = star_newick(n);
        group.bench_function(format!("quartet_self_{n}"), |b| {
            b.iter(|| {
                let session = Session::load("t1.nwk", &star, "t2.nwk", &star).unwrap();
                let total = session.total_leaves();
                black_box(calculate_quartet_distance::<TripletAndQuartet>(
                    session.t1, session.t2, total,
                ))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_triplet_distance,
    bench_quartet_distance,
    bench_random_trees,
    bench_star_multifurcation,
);
criterion_main!(benches);
