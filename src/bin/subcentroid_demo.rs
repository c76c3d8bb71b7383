use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::path::PathBuf;
use std::process;
use std::thread;
use subcentroid_head::{
    HeadConfig, HeadState, LocalSynchronizer, SolverKind, SubCentroidHead, Synchronizer, ThreadGroup,
};

fn main() {
    env_logger::init();

    let matches = Command::new("subcentroid-demo")
        .version("0.1.0")
        .about("합성 가우시안 혼합으로 서브센트로이드 헤드를 학습하는 데모")
        .subcommand(
            Command::new("train")
                .about("합성 데이터로 학습 스텝 반복")
                .arg(Arg::new("classes").long("classes").value_name("N").default_value("4").help("클래스 수"))
                .arg(Arg::new("dim").long("dim").value_name("D").default_value("16").help("임베딩 차원"))
                .arg(
                    Arg::new("modes")
                        .long("modes")
                        .value_name("M")
                        .default_value("3")
                        .help("클래스당 실제 군집 수"),
                )
                .arg(Arg::new("steps").long("steps").short('s').default_value("40").help("워커당 학습 스텝 수"))
                .arg(Arg::new("batch").long("batch").short('b').default_value("64").help("워커당 배치 크기"))
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .default_value("512")
                        .help("군집 갱신을 발동하는 누적 표본 수"),
                )
                .arg(Arg::new("workers").long("workers").short('w').default_value("1").help("워커 스레드 수"))
                .arg(
                    Arg::new("solver")
                        .long("solver")
                        .value_parser(["sinkhorn_knopp", "log_sinkhorn", "apdagd"])
                        .default_value("apdagd")
                        .help("수송 솔버"),
                )
                .arg(Arg::new("contrast").long("contrast").action(ArgAction::SetTrue).help("대조 손실 사용"))
                .arg(Arg::new("seed").long("seed").default_value("0").help("난수 시드"))
                .arg(Arg::new("config").long("config").short('c').value_name("FILE").help("JSON 구성 파일"))
                .arg(
                    Arg::new("checkpoint")
                        .long("checkpoint")
                        .short('o')
                        .value_name("FILE")
                        .help("학습 후 bincode 체크포인트 저장 경로"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("체크포인트의 카디널리티 테이블 출력")
                .arg(Arg::new("checkpoint").required(true).help("bincode 체크포인트 경로")),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("train", sub_matches)) => handle_train(sub_matches),
        Some(("inspect", sub_matches)) => handle_inspect(sub_matches),
        _ => {
            eprintln!("서브커맨드가 필요합니다. --help를 참고하세요.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("❌ 오류: {:#}", e);
        process::exit(1);
    }
}

fn parse_arg<T>(matches: &ArgMatches, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = matches
        .get_one::<String>(name)
        .with_context(|| format!("인자 {}가 없음", name))?;
    raw.parse::<T>().with_context(|| format!("인자 {}={} 파싱 실패", name, raw))
}

/// 클래스마다 `modes`개의 중심을 갖는 합성 데이터 생성기
struct MixtureSource {
    centers: Array2<f32>,
    modes: usize,
    noise: Normal<f32>,
    rng: StdRng,
}

impl MixtureSource {
    fn new(classes: usize, modes: usize, dim: usize, seed: u64) -> Result<Self> {
        // 중심은 모든 워커가 공유하도록 고정 시드로 만든다
        let mut center_rng = StdRng::seed_from_u64(0x5eed);
        let unit = Normal::new(0.0f32, 1.0)?;
        let centers = Array2::from_shape_simple_fn((classes * modes, dim), || unit.sample(&mut center_rng) * 3.0);
        Ok(Self {
            centers,
            modes,
            noise: Normal::new(0.0f32, 0.5)?,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn batch(&mut self, rows: usize) -> (Array2<f32>, Vec<usize>) {
        let classes = self.centers.nrows() / self.modes;
        let dim = self.centers.ncols();
        let mut features = Array2::zeros((rows, dim));
        let mut labels = Vec::with_capacity(rows);
        for i in 0..rows {
            let class = self.rng.gen_range(0..classes);
            let mode = self.rng.gen_range(0..self.modes);
            let center = self.centers.row(class * self.modes + mode);
            for j in 0..dim {
                features[[i, j]] = center[j] + self.noise.sample(&mut self.rng);
            }
            labels.push(class);
        }
        (features, labels)
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let classes: usize = parse_arg(matches, "classes")?;
    let dim: usize = parse_arg(matches, "dim")?;
    let modes: usize = parse_arg(matches, "modes")?;
    let steps: usize = parse_arg(matches, "steps")?;
    let batch: usize = parse_arg(matches, "batch")?;
    let threshold: usize = parse_arg(matches, "threshold")?;
    let workers: usize = parse_arg::<usize>(matches, "workers")?.max(1);
    let seed: u64 = parse_arg(matches, "seed")?;
    let solver = match parse_arg::<String>(matches, "solver")?.as_str() {
        "sinkhorn_knopp" => SolverKind::SinkhornKnopp,
        "log_sinkhorn" => SolverKind::LogSinkhorn,
        _ => SolverKind::Apdagd,
    };

    let config = match matches.get_one::<String>("config") {
        Some(path) => HeadConfig::from_json_file(path)?,
        None => HeadConfig::new(dim, classes)
            .with_flush_threshold(threshold)
            .with_contrast_loss(matches.get_flag("contrast"), 0.005)
            .with_solver(solver)
            .with_seed(seed),
    };
    config.validate()?;
    info!("학습 구성: {:?}", config);

    let syncs: Vec<Box<dyn Synchronizer>> = if workers > 1 {
        ThreadGroup::create(workers)?
            .into_iter()
            .map(|g| Box::new(g) as Box<dyn Synchronizer>)
            .collect()
    } else {
        vec![Box::new(LocalSynchronizer)]
    };

    let results: Vec<Result<Option<HeadState>>> = thread::scope(|scope| {
        let handles: Vec<_> = syncs
            .into_iter()
            .map(|sync| {
                let config = config.clone();
                scope.spawn(move || run_worker(config, sync, modes, steps, batch))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err(anyhow::anyhow!("워커 스레드 패닉"))))
            .collect()
    });

    let mut final_state = None;
    for result in results {
        if let Some(state) = result? {
            final_state = Some(state);
        }
    }
    let state = final_state.context("랭크 0 결과가 없음")?;
    print_table(&state);

    if let Some(path) = matches.get_one::<String>("checkpoint") {
        let path = PathBuf::from(path);
        state.save_bincode(&path)?;
        println!("💾 체크포인트 저장: {}", path.display());
    }
    Ok(())
}

/// 워커 하나의 학습 루프. 랭크 0만 상태를 돌려준다
fn run_worker(
    config: HeadConfig,
    sync: Box<dyn Synchronizer>,
    modes: usize,
    steps: usize,
    batch: usize,
) -> Result<Option<HeadState>> {
    let rank = sync.rank();
    let mut source = MixtureSource::new(
        config.num_classes,
        modes.max(1),
        config.embedding_dim,
        config.seed.wrapping_add(100 + rank as u64),
    )?;
    let mut head = SubCentroidHead::new(config, sync)?;

    let progress = if rank == 0 {
        let bar = ProgressBar::new(steps as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} {msg}")?
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        Some(bar)
    } else {
        None
    };

    let mut clusters = 0;
    for _ in 0..steps {
        let (x, y) = source.batch(batch);
        let out = head.train_step(x.view(), &y)?;
        if out.clustered {
            clusters += 1;
        }
        if let Some(bar) = &progress {
            let losses: Vec<String> = out.losses.iter().map(|(k, v)| format!("{}={:.4}", k, v)).collect();
            bar.set_message(format!("{} | 버퍼 {} | 군집 {}회", losses.join(" "), out.buffered, clusters));
            bar.inc(1);
        }
    }

    if let Some(bar) = progress {
        bar.finish_with_message(format!("완료: 군집 갱신 {}회", clusters));
        return Ok(Some(head.state()));
    }
    Ok(None)
}

fn print_table(state: &HeadState) {
    println!("클래스 | 서브센트로이드 | 최고 실루엣");
    for (class, (&k, &score)) in state
        .cardinality
        .active_slots()
        .iter()
        .zip(state.cardinality.best_scores())
        .enumerate()
    {
        println!("{:>6} | {:>14} | {:>10.4}", class, k, score);
    }
}

fn handle_inspect(matches: &ArgMatches) -> Result<()> {
    let path = PathBuf::from(parse_arg::<String>(matches, "checkpoint")?);
    let state = HeadState::load_bincode(&path)?;
    let (classes, slots, dim) = state.prototypes.dim();
    println!("📦 {}: 클래스 {}, 최대 슬롯 {}, 차원 {}", path.display(), classes, slots, dim);
    print_table(&state);
    Ok(())
}
