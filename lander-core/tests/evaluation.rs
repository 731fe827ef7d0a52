use lander_core::{
    evaluate, simulate, Action, EnvError, Environment, EvalConfig, LanderParams, LunarLander,
    Observation, Outcome, Policy, Step, StepInfo,
};

/// Replays fixed per-episode step scripts and records what it was asked to do.
struct ScriptedEnv {
    episodes: Vec<Vec<Step>>,
    episode: usize,
    cursor: usize,
    resets: usize,
    renders: usize,
    actions: Vec<Action>,
}

impl ScriptedEnv {
    fn new(episodes: Vec<Vec<Step>>) -> Self {
        Self {
            episodes,
            episode: 0,
            cursor: 0,
            resets: 0,
            renders: 0,
            actions: Vec::new(),
        }
    }

    fn repeating(script: Vec<Step>, times: usize) -> Self {
        Self::new(vec![script; times])
    }
}

impl Environment for ScriptedEnv {
    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.episode = self.resets;
        self.resets += 1;
        self.cursor = 0;
        Ok(Observation::default())
    }

    fn step(&mut self, action: Action) -> Result<Step, EnvError> {
        self.actions.push(action);
        let script = self.episodes.get(self.episode).ok_or(EnvError::NotReset)?;
        let step = script.get(self.cursor).copied().ok_or(EnvError::EpisodeOver {
            steps: self.cursor as u32,
        })?;
        self.cursor += 1;
        Ok(step)
    }

    fn render(&mut self) -> Result<(), EnvError> {
        self.renders += 1;
        Ok(())
    }
}

fn running(reward: f64, observation: Observation) -> Step {
    Step {
        observation,
        reward,
        terminated: false,
        truncated: false,
        info: StepInfo::default(),
    }
}

fn terminal(reward: f64) -> Step {
    Step {
        terminated: true,
        info: StepInfo {
            steps: 0,
            outcome: Some(Outcome::Landed),
        },
        ..running(reward, Observation::default())
    }
}

fn truncated(reward: f64) -> Step {
    Step {
        truncated: true,
        info: StepInfo {
            steps: 0,
            outcome: Some(Outcome::TimeLimit),
        },
        ..running(reward, Observation::default())
    }
}

fn legs(left: f64, right: f64) -> Observation {
    Observation {
        x: 0.5,
        vy: -0.3,
        angle: 0.2,
        leg_left_contact: left,
        leg_right_contact: right,
        ..Observation::default()
    }
}

#[test]
fn sums_reward_across_episodes() {
    let script = vec![
        running(1.0, Observation::default()),
        running(2.0, Observation::default()),
        terminal(3.0),
    ];
    let mut env = ScriptedEnv::repeating(script, 3);
    let report = evaluate(&mut env, &Policy::zeros(), &EvalConfig::quiet(3)).expect("evaluate");

    assert_eq!(report.total_reward, 18.0);
    assert_eq!(report.fitness(), 6.0);
    assert_eq!(report.episodes.len(), 3);
    assert_eq!(report.total_steps(), 9);
    assert_eq!(report.truncated_count(), 0);
    assert_eq!(report.episodes[2].episode, 3);
    assert_eq!(report.episodes[0].outcome, Some(Outcome::Landed));
    assert_eq!(env.resets, 3);
}

#[test]
fn truncation_discards_accumulated_reward() {
    let script = vec![
        running(50.0, Observation::default()),
        running(50.0, Observation::default()),
        truncated(5.0),
    ];
    let mut env = ScriptedEnv::repeating(script, 1);
    let report = evaluate(&mut env, &Policy::zeros(), &EvalConfig::quiet(1)).expect("evaluate");

    assert_eq!(report.total_reward, f64::NEG_INFINITY);
    assert!(report.episodes[0].truncated);
    assert_eq!(report.episodes[0].steps, 3);
}

#[test]
fn one_truncated_episode_sinks_the_total() {
    let mut env = ScriptedEnv::new(vec![
        vec![running(10.0, Observation::default()), terminal(90.0)],
        vec![running(10.0, Observation::default()), truncated(0.0)],
        vec![terminal(100.0)],
    ]);
    let report = evaluate(&mut env, &Policy::zeros(), &EvalConfig::quiet(3)).expect("evaluate");

    assert_eq!(report.episodes[0].reward, 100.0);
    assert_eq!(report.episodes[1].reward, f64::NEG_INFINITY);
    assert_eq!(report.episodes[2].reward, 100.0);
    assert_eq!(report.total_reward, f64::NEG_INFINITY);
    assert_eq!(report.truncated_count(), 1);
}

#[test]
fn actions_follow_table_and_single_leg_override() {
    let policy = Policy::from_fn(|idx| if idx % 2 == 0 { 0.7 } else { -0.6 });
    let script = vec![
        running(0.0, legs(0.0, 0.0)),
        running(0.0, legs(1.0, 0.0)),
        running(0.0, legs(0.0, 1.0)),
        running(0.0, legs(1.0, 1.0)),
        terminal(0.0),
    ];
    let mut env = ScriptedEnv::repeating(script, 1);
    simulate(&mut env, &policy, &EvalConfig::quiet(1)).expect("simulate");

    assert_eq!(
        env.actions,
        vec![
            Action::IDLE,
            Action::new(0.7, -0.6),
            Action::new(0.05, 0.0),
            Action::new(0.05, 0.0),
            Action::new(0.7, -0.6),
        ]
    );
}

#[test]
fn zero_policy_idles_unless_one_leg_is_down() {
    let script = vec![
        running(0.0, legs(0.0, 0.0)),
        running(0.0, legs(1.0, 1.0)),
        running(0.0, legs(0.0, 0.0)),
        terminal(0.0),
    ];
    let mut env = ScriptedEnv::repeating(script, 2);
    simulate(&mut env, &Policy::zeros(), &EvalConfig::quiet(2)).expect("simulate");

    assert_eq!(env.actions.len(), 8);
    assert!(env.actions.iter().all(|action| *action == Action::IDLE));
}

#[test]
fn renders_before_every_step_only_when_asked() {
    let script = vec![running(0.0, Observation::default()), terminal(0.0)];

    let mut quiet = ScriptedEnv::repeating(script.clone(), 2);
    simulate(&mut quiet, &Policy::zeros(), &EvalConfig::quiet(2)).expect("simulate");
    assert_eq!(quiet.renders, 0);

    let mut shown = ScriptedEnv::repeating(script, 2);
    let config = EvalConfig {
        episodes: 2,
        render: true,
        verbose: false,
    };
    simulate(&mut shown, &Policy::zeros(), &config).expect("simulate");
    assert_eq!(shown.renders, 4);
}

#[test]
fn environment_errors_propagate() {
    // script ends without a terminal step
    let mut env = ScriptedEnv::repeating(vec![running(1.0, Observation::default())], 1);
    let err = evaluate(&mut env, &Policy::zeros(), &EvalConfig::quiet(1))
        .expect_err("exhausted script must fail");
    assert_eq!(err, EnvError::EpisodeOver { steps: 1 });
}

#[test]
fn seeded_lander_evaluation_is_repeatable() {
    let policy = Policy::from_fn(|idx| ((idx * 37 % 19) as f64 / 9.0) - 1.0);
    let config = EvalConfig::quiet(5);

    let mut first = LunarLander::new(0x1A4D_0001);
    let mut second = LunarLander::new(0x1A4D_0001);
    let a = evaluate(&mut first, &policy, &config).expect("evaluate");
    let b = evaluate(&mut second, &policy, &config).expect("evaluate");

    assert_eq!(a, b);
    assert_eq!(a.total_reward, b.total_reward);
}

#[test]
fn endless_climb_is_truncated_to_negative_infinity() {
    let params = LanderParams {
        max_episode_steps: 50,
        ..LanderParams::default()
    };
    let mut env = LunarLander::with_params(9, params);
    let full_main = Policy::from_fn(|idx| if idx % 2 == 0 { 1.0 } else { 0.0 });
    let report = evaluate(&mut env, &full_main, &EvalConfig::quiet(3)).expect("evaluate");

    assert_eq!(report.truncated_count(), 3);
    assert_eq!(report.total_reward, f64::NEG_INFINITY);
    assert!(report
        .episodes
        .iter()
        .all(|ep| ep.outcome == Some(Outcome::TimeLimit) && ep.steps == 50));
}
