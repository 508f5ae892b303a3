//! Pounce entry point
//!
//! Plays one autopiloted run on the headless world and prints the final
//! snapshot as JSON. Usage:
//!
//! ```text
//! pounce [pinball|climb] [--seed N] [--ticks N] [--settings FILE] [--scores FILE]
//! ```
//!
//! `pounce --help` lists the options.

#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use clap::{Parser, ValueEnum};
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use serde::Serialize;

    use pounce::sim::{
        BodyState, BodyView, Game, GameEvent, GameMode, HeadlessWorld, HudSnapshot, ObstacleKind,
        PhysicsBackend, ScenePhase, TickInput,
    };
    use pounce::{HighScores, Settings};

    #[derive(Parser, Debug)]
    #[command(name = "pounce")]
    #[command(about = "Play one autopiloted run on the headless world and print the result as JSON")]
    pub struct Cli {
        /// Game mode
        #[arg(value_enum, default_value_t = CliMode::Pinball)]
        pub mode: CliMode,
        /// Run seed, overriding the settings file
        #[arg(long)]
        pub seed: Option<u64>,
        /// Give up after this many fixed steps
        #[arg(long, default_value_t = 18_000)]
        pub ticks: u64,
        /// Settings JSON (defaults when missing)
        #[arg(long)]
        pub settings: Option<PathBuf>,
        /// Leaderboard JSON to record the run in
        #[arg(long)]
        pub scores: Option<PathBuf>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
    pub enum CliMode {
        Pinball,
        Climb,
    }

    impl From<CliMode> for GameMode {
        fn from(value: CliMode) -> Self {
            match value {
                CliMode::Pinball => GameMode::Pinball,
                CliMode::Climb => GameMode::Climb,
            }
        }
    }

    /// Scripted player: random slingshot pulls, flippers when the body drops
    /// low, and swipe steering toward the next hazard while climbing.
    struct Autopilot {
        rng: Pcg32,
        script: VecDeque<TickInput>,
        flipper_held: Option<Vec2>,
        steer_x: Option<f32>,
    }

    impl Autopilot {
        fn new(seed: u64) -> Self {
            Self {
                rng: Pcg32::seed_from_u64(seed.rotate_left(17) ^ 0x9e37_79b9_7f4a_7c15),
                script: VecDeque::new(),
                flipper_held: None,
                steer_x: None,
            }
        }

        fn next<B: PhysicsBackend>(&mut self, game: &Game<B>) -> TickInput {
            if let Some(input) = self.script.pop_front() {
                return input;
            }
            let scene = game.scene();
            let body = &scene.body;
            match body.state() {
                BodyState::Idle => {
                    self.steer_x = None;
                    let at = body.position();
                    let pull = Vec2::new(
                        self.rng.random_range(-120.0..120.0),
                        self.rng.random_range(200.0..(scene.height * 0.5).max(201.0)),
                    );
                    self.script.extend([
                        TickInput::moved(at + pull * 0.5),
                        TickInput::moved(at + pull),
                        TickInput::up(at + pull),
                    ]);
                    TickInput::down(at)
                }
                BodyState::Flying if scene.mode == GameMode::Pinball => {
                    let pos = body.position();
                    let low = pos.y > scene.height - 330.0 && body.velocity().y > 0.0;
                    match (low, self.flipper_held) {
                        (true, None) => {
                            let press = Vec2::new(pos.x, scene.height * 0.95);
                            self.flipper_held = Some(press);
                            TickInput::down(press)
                        }
                        (false, Some(press)) => {
                            self.flipper_held = None;
                            TickInput::up(press)
                        }
                        _ => TickInput::default(),
                    }
                }
                BodyState::Flying => {
                    let pos = body.position();
                    let target = scene
                        .obstacles
                        .iter()
                        .filter(|o| matches!(o.kind, ObstacleKind::Hazard(_)) && o.pos.y < pos.y)
                        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
                        .map_or(scene.width / 2.0, |o| o.pos.x);
                    let x = self.steer_x.unwrap_or(pos.x) + (target - pos.x).clamp(-20.0, 20.0);
                    self.steer_x = Some(x);
                    TickInput::moved(Vec2::new(x, pos.y))
                }
                BodyState::Charging | BodyState::Landing => TickInput::default(),
            }
        }
    }

    #[derive(Serialize)]
    struct Summary<'a> {
        mode: GameMode,
        seed: u64,
        ticks: u64,
        round: u32,
        hud: HudSnapshot,
        body: BodyView,
        upgrades: &'a [String],
        rank: Option<usize>,
    }

    pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
        let mut settings = match &cli.settings {
            Some(path) => Settings::load_or_default(path),
            None => Settings::default(),
        };
        if let Some(seed) = cli.seed {
            settings.seed = seed;
        }
        let seed = settings.seed;

        let mut game = Game::new(HeadlessWorld::default(), settings, cli.mode.into());
        let mut pilot = Autopilot::new(seed);
        let mut ticks = 0;

        while ticks < cli.ticks && !game.is_over() {
            let input = pilot.next(&game);
            for event in game.tick(&input) {
                match &event {
                    GameEvent::Hud(_) => {}
                    GameEvent::RoundComplete { round } => log::info!("Cleared round {round}"),
                    _ => log::debug!("{event:?}"),
                }
            }
            if game.phase() == ScenePhase::RoundComplete {
                if let Some(event) = game.choose_upgrade(0) {
                    log::info!("{event:?}");
                }
            }
            ticks += 1;
        }
        if !game.is_over() {
            log::warn!("Stopped after {ticks} ticks without finishing the run");
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let rank = match &cli.scores {
            Some(path) => {
                let mut scores = HighScores::load_or_default(path);
                let rank = scores.add_record(game.record(timestamp));
                scores.save(path)?;
                rank
            }
            None => None,
        };

        let summary = Summary {
            mode: game.mode(),
            seed,
            ticks,
            round: game.run().current_round(),
            hud: game.snapshot(),
            body: game.body_view(),
            upgrades: game.run().active_upgrade_ids(),
            rank,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use clap::CommandFactory;

        #[test]
        fn test_cli_definition() {
            Cli::command().debug_assert();
        }

        #[test]
        fn test_cli_defaults() {
            let cli = Cli::try_parse_from(["pounce"]).unwrap();
            assert_eq!(cli.mode, CliMode::Pinball);
            assert_eq!(cli.seed, None);
            assert_eq!(cli.ticks, 18_000);
            assert!(cli.settings.is_none() && cli.scores.is_none());
        }

        #[test]
        fn test_cli_flags() {
            let cli = Cli::try_parse_from([
                "pounce", "climb", "--seed", "42", "--ticks", "600", "--scores", "scores.json",
            ])
            .unwrap();
            assert_eq!(GameMode::from(cli.mode), GameMode::Climb);
            assert_eq!(cli.seed, Some(42));
            assert_eq!(cli.ticks, 600);
            assert_eq!(cli.scores, Some(PathBuf::from("scores.json")));
        }

        #[test]
        fn test_cli_rejects_bad_input() {
            assert!(Cli::try_parse_from(["pounce", "golf"]).is_err());
            assert!(Cli::try_parse_from(["pounce", "--seed", "abc"]).is_err());
            assert!(Cli::try_parse_from(["pounce", "--ticks"]).is_err());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    let cli = autoplay::Cli::parse();
    env_logger::init();
    log::info!("Pounce (headless) starting...");

    if let Err(e) = autoplay::run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by a host renderer on the web
}
