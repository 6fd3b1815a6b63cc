use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sloe_chess::board::position::Position;
use sloe_chess::movegen::perft::perft;

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    fen: &'static str,
    expected_nodes: &'static [u64],
}

const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const CASES_QUICK: &[BenchCase] = &[
    BenchCase {
        name: "startpos",
        fen: STARTPOS_FEN,
        expected_nodes: &[20, 400, 8_902],
    },
    BenchCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        expected_nodes: &[48, 2_039],
    },
    BenchCase {
        name: "rook_endgame",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        expected_nodes: &[14, 191, 2_812],
    },
];

const CASES_STANDARD: &[BenchCase] = &[
    BenchCase {
        name: "startpos",
        fen: STARTPOS_FEN,
        expected_nodes: &[20, 400, 8_902, 197_281],
    },
    BenchCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        expected_nodes: &[48, 2_039, 97_862],
    },
    BenchCase {
        name: "rook_endgame",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        expected_nodes: &[14, 191, 2_812, 43_238, 674_624],
    },
    BenchCase {
        name: "promotion_heavy",
        fen: "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        expected_nodes: &[6, 264, 9_467, 422_333],
    },
];

fn selected_cases() -> (&'static str, &'static [BenchCase]) {
    match std::env::var("SLOE_BENCH_SUITE") {
        Ok(value) if value.eq_ignore_ascii_case("standard") => ("standard", CASES_STANDARD),
        _ => ("quick", CASES_QUICK),
    }
}

fn bench_perft(c: &mut Criterion) {
    let (suite_name, cases) = selected_cases();

    let mut group = c.benchmark_group(format!("perft_{suite_name}"));
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(4));
    group.sample_size(20);

    for case in cases {
        let position = Position::from_fen(case.fen).expect("benchmark FEN should parse");

        for (depth_index, &expected) in case.expected_nodes.iter().enumerate() {
            let depth = (depth_index + 1) as u8;

            // Correctness guard before measuring anything.
            let mut warmup = position.clone();
            assert_eq!(
                perft(&mut warmup, depth),
                expected,
                "node mismatch for {} at depth {depth}",
                case.name
            );

            group.throughput(Throughput::Elements(expected));
            let bench_name = format!("{}_d{depth}", case.name);
            let bench_position = position.clone();

            group.bench_with_input(
                BenchmarkId::from_parameter(bench_name),
                &expected,
                |b, &expected| {
                    b.iter(|| {
                        let mut working = bench_position.clone();
                        let nodes = perft(black_box(&mut working), black_box(depth));
                        assert_eq!(nodes, expected);
                        black_box(nodes)
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(perft_benches, bench_perft);
criterion_main!(perft_benches);
