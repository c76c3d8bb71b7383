use crate::core::discretize::GumbelDiscretizer;
use crate::core::transport::{Apdagd, TransportSolver};
use approx::assert_relative_eq;
use ndarray::{array, Array2};

fn 솔버() -> Apdagd {
    Apdagd::new(20, 0.05, GumbelDiscretizer::new(0.5, 11).unwrap())
}

#[test]
fn 엔트로피계수_테스트() {
    let solver = 솔버();
    assert_relative_eq!(solver.entropic_gamma(4), 0.05 / (3.0 * 4f64.ln()), epsilon = 1e-15);
    // 대상이 하나여도 ln 1 = 0 으로 나누지 않는다
    assert_relative_eq!(solver.entropic_gamma(1), solver.entropic_gamma(2), epsilon = 1e-15);
}

#[test]
fn APDAGD_균형_할당_테스트() {
    let mut solver = 솔버();
    let sims = array![[0.9f32, 0.1], [0.8, 0.2], [0.7, 0.3], [0.6, 0.4]];
    let plan = solver.solve(sims.view()).unwrap();

    assert_eq!(plan.assignment.indices, vec![0, 0, 1, 1], "균형 제약으로 두 점씩 배정");
    assert!(!plan.recovered);
    assert!(plan.iterations > 0);
    for row in plan.coupling.rows() {
        assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn APDAGD_균등유사도_테스트() {
    let mut solver = 솔버();
    let sims = Array2::<f32>::from_elem((6, 3), -0.2);
    let plan = solver.solve(sims.view()).unwrap();

    assert_eq!(plan.assignment.indices, vec![0; 6]);
    for &v in plan.coupling.iter() {
        assert_relative_eq!(v, 1.0 / 3.0, epsilon = 1e-9);
    }
}

#[test]
fn APDAGD_명시적주변분포_테스트() {
    let solver = 솔버();
    let sims = array![[0.3f32, 0.1], [0.2, 0.2]];
    let (plan, _, _) = solver.couple(sims.view(), &[0.5, 0.5], &[]).unwrap();
    assert_eq!(plan.dim(), (2, 2));

    assert!(solver.couple(sims.view(), &[1.0], &[]).is_err(), "행 주변분포 길이 불일치");
    assert!(solver.couple(sims.view(), &[], &[0.5, -0.5]).is_err(), "음수 질량 거부");
}
