use crate::core::transport::{build_solver, SolverConfig, SolverKind};
use approx::assert_relative_eq;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const 모든_솔버: [SolverKind; 3] = [SolverKind::SinkhornKnopp, SolverKind::LogSinkhorn, SolverKind::Apdagd];

fn 무작위_유사도(rows: usize, cols: usize, scale: f32, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0f32..1.0) * scale)
}

#[test]
fn 솔버_생성_테스트() {
    for kind in 모든_솔버 {
        let solver = build_solver(&SolverConfig::default().with_kind(kind), 0).unwrap();
        println!("솔버 생성: {:?} -> {}", kind, solver.name());
    }
    let names: Vec<&str> = 모든_솔버
        .iter()
        .map(|&k| build_solver(&SolverConfig::default().with_kind(k), 0).unwrap().name())
        .collect();
    assert_eq!(names, vec!["sinkhorn_knopp", "log_sinkhorn", "apdagd"]);

    let mut bad = SolverConfig::default();
    bad.gumbel_tau = 0.0;
    assert!(build_solver(&bad, 0).is_err(), "잘못된 온도 거부");
}

#[test]
fn 모든솔버_행합_유한성_테스트() {
    for kind in 모든_솔버 {
        let mut solver = build_solver(&SolverConfig::default().with_kind(kind), 5).unwrap();
        let sims = 무작위_유사도(24, 6, 1.0, 9);
        let plan = solver.solve(sims.view()).unwrap();

        assert_eq!(plan.coupling.dim(), (24, 6));
        for row in plan.coupling.rows() {
            assert!(row.iter().all(|v| v.is_finite() && *v >= 0.0), "{:?}: 비음수 유한값", kind);
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
        assert!(plan.assignment.indices.iter().all(|&i| i < 6));
        for row in plan.assignment.one_hot.forward().rows() {
            assert_eq!(row.sum(), 1.0);
        }
    }
}

#[test]
fn 극단적스케일_입력_복구_테스트() {
    for kind in 모든_솔버 {
        let mut solver = build_solver(&SolverConfig::default().with_kind(kind), 1).unwrap();
        let sims = 무작위_유사도(16, 4, 1e6, 3);
        let plan = solver.solve(sims.view()).unwrap();

        for row in plan.coupling.rows() {
            assert!(row.iter().all(|v| v.is_finite()), "{:?}: 극단 입력에서도 유한해야 함", kind);
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
        println!(
            "✅ {:?}: 반복 {}, 복구 {}",
            kind, plan.iterations, plan.recovered
        );
    }
}

#[test]
fn 구성_JSON_기본값_테스트() {
    let config: SolverConfig = serde_json::from_str(r#"{"kind": "log_sinkhorn"}"#).unwrap();
    assert_eq!(config.kind, SolverKind::LogSinkhorn);
    assert_eq!(config.log_sinkhorn_iterations, 10, "누락 필드는 기본값");
    assert_eq!(config.sinkhorn_iterations, 3);
    assert_eq!(SolverConfig::default().kind, SolverKind::Apdagd);
}
