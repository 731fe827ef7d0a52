use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lander_core::constants::{EVAL_EPISODES_DEFAULT, REPLAY_EPISODES_DEFAULT};
use lander_core::{evaluate, EvalConfig, EvaluationReport, LanderParams, LunarLander, Policy};
use lander_ga::config::{SearchConfig, DEFAULT_EVAL_SEED};
use lander_ga::genetic::random_policy;
use lander_ga::search::{run_search, BEST_POLICY_FILE};
use lander_ga::store::{load_policy, save_policy};
use lander_ga::util::{now_unix_s, parse_seed, seed_to_hex, time_seed};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lander-ga")]
#[command(about = "Genetic search for discretized lunar lander control policies")]
struct Cli {
    /// Step limit per episode before truncation
    #[arg(long, global = true)]
    max_episode_steps: Option<u32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a saved policy with rendering and per-episode progress
    Replay {
        #[arg(long)]
        policy: PathBuf,
        #[arg(long, default_value_t = REPLAY_EPISODES_DEFAULT)]
        episodes: u32,
        /// Environment seed (defaults to the current time)
        #[arg(long)]
        seed: Option<String>,
        #[arg(long, default_value_t = false)]
        no_render: bool,
    },
    /// Evolve a policy, save it, then replay the best one found
    Search {
        /// JSON search config; flags below override its fields
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        generations: Option<u32>,
        #[arg(long)]
        population: Option<usize>,
        /// Episodes averaged per fitness evaluation
        #[arg(long)]
        episodes: Option<u32>,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        eval_seed: Option<String>,
        #[arg(long)]
        target_fitness: Option<f64>,
        #[arg(long)]
        jobs: Option<usize>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, default_value_t = REPLAY_EPISODES_DEFAULT)]
        replay_episodes: u32,
        #[arg(long, default_value_t = false)]
        no_replay: bool,
        #[arg(long, default_value_t = false)]
        no_render: bool,
    },
    /// Score a saved policy without rendering
    Evaluate {
        #[arg(long)]
        policy: PathBuf,
        #[arg(long, default_value_t = EVAL_EPISODES_DEFAULT)]
        episodes: u32,
        #[arg(long)]
        seed: Option<String>,
    },
    /// Write a uniformly random policy
    RandomPolicy {
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        max_episode_steps,
        command,
    } = Cli::parse();

    match command {
        Commands::Replay {
            policy,
            episodes,
            seed,
            no_render,
        } => {
            let loaded = load_policy(&policy)?;
            let seed = resolve_seed(seed.as_deref(), time_seed())?;
            let params = lander_params(LanderParams::default(), max_episode_steps);
            let config = EvalConfig {
                render: !no_render,
                ..EvalConfig::replay(episodes)
            };
            println!("policy={}", policy.display());
            let report = replay(&loaded, seed, params, &config)?;
            print_report(seed, &report);
        }
        Commands::Search {
            config,
            generations,
            population,
            episodes,
            seed,
            eval_seed,
            target_fitness,
            jobs,
            out_dir,
            replay_episodes,
            no_replay,
            no_render,
        } => {
            let mut cfg = match config {
                Some(path) => SearchConfig::from_file(&path)?,
                None => SearchConfig::default(),
            };
            if let Some(generations) = generations {
                cfg.generations = generations;
            }
            if let Some(population) = population {
                cfg.ga.population_size = population;
            }
            if let Some(episodes) = episodes {
                cfg.episodes_per_eval = episodes;
            }
            if let Some(seed) = seed.as_deref() {
                cfg.seed = parse_seed(seed)?;
            }
            if let Some(eval_seed) = eval_seed.as_deref() {
                cfg.eval_seed = parse_seed(eval_seed)?;
            }
            if target_fitness.is_some() {
                cfg.target_fitness = target_fitness;
            }
            if jobs.is_some() {
                cfg.jobs = jobs;
            }
            cfg.lander = lander_params(cfg.lander, max_episode_steps);
            let out_dir = out_dir
                .or_else(|| cfg.out_dir.clone())
                .unwrap_or_else(|| PathBuf::from(format!("searches/{}", now_unix_s())));
            cfg.out_dir = Some(out_dir.clone());

            let report = run_search(&cfg)?;

            println!("generations={}", report.generations_run);
            println!("evaluations={}", report.evaluations);
            println!("stopped_early={}", report.stopped_early);
            println!("best_fitness={:.3}", report.best.fitness);
            println!("best_policy={}", out_dir.join(BEST_POLICY_FILE).display());
            println!("out_dir={}", out_dir.display());

            if !no_replay && replay_episodes > 0 {
                let config = EvalConfig {
                    render: !no_render,
                    ..EvalConfig::replay(replay_episodes)
                };
                let seed = time_seed();
                let replayed = replay(&report.best.policy, seed, cfg.lander.clone(), &config)?;
                print_report(seed, &replayed);
            }
        }
        Commands::Evaluate {
            policy,
            episodes,
            seed,
        } => {
            let loaded = load_policy(&policy)?;
            let seed = resolve_seed(seed.as_deref(), DEFAULT_EVAL_SEED)?;
            let params = lander_params(LanderParams::default(), max_episode_steps);
            let report = replay(&loaded, seed, params, &EvalConfig::quiet(episodes))?;
            println!("policy={}", policy.display());
            print_report(seed, &report);
        }
        Commands::RandomPolicy { seed, output } => {
            let seed = resolve_seed(seed.as_deref(), time_seed())?;
            let mut rng = StdRng::seed_from_u64(seed as u64);
            let defaults = SearchConfig::default();
            let policy = random_policy(&mut rng, defaults.ga.gene_lb, defaults.ga.gene_ub);
            let output_path = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "policies/random-{}.json",
                    seed_to_hex(seed).replace("0x", "seed")
                ))
            });
            save_policy(&output_path, &policy)?;
            println!("seed={}", seed_to_hex(seed));
            println!("output={}", output_path.display());
        }
    }

    Ok(())
}

fn resolve_seed(raw: Option<&str>, fallback: u32) -> Result<u32> {
    raw.map(parse_seed).transpose().map(|seed| seed.unwrap_or(fallback))
}

fn lander_params(mut params: LanderParams, max_episode_steps: Option<u32>) -> LanderParams {
    if let Some(steps) = max_episode_steps {
        params.max_episode_steps = steps;
    }
    params
}

fn replay(
    policy: &Policy,
    seed: u32,
    params: LanderParams,
    config: &EvalConfig,
) -> Result<EvaluationReport> {
    let mut env = LunarLander::with_params(seed, params);
    evaluate(&mut env, policy, config)
        .with_context(|| format!("evaluation failed for seed={}", seed_to_hex(seed)))
}

fn print_report(seed: u32, report: &EvaluationReport) {
    println!("seed={}", seed_to_hex(seed));
    println!("episodes={}", report.episodes.len());
    println!("total_reward={:.3}", report.total_reward);
    println!("avg_reward={:.3}", report.fitness());
    println!("truncated={}", report.truncated_count());
    println!("steps={}", report.total_steps());
}
