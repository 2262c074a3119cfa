use clap::Parser;
use mazebound::grid::{Cell, MazeGraph};
use mazebound::search::agents::{
    Agent, AgentStep, FritAgent, IdealTree, LrtaAgent, ReconnectStrategyName, RtaaAgent,
};
use mazebound::search::{
    MazeProblem, ObstacleMazeProblem, Plan, Problem, SearchError, Verbosity,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::rc::Rc;
use tracing::{info, warn};

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[clap(rename_all = "kebab-case")]
enum AgentName {
    #[clap(help = "Depth-1 learning real-time A*")]
    Lrta,
    #[clap(help = "Real-time adaptive A* with bounded lookahead")]
    Rtaa,
    #[clap(help = "Follow the ideal tree, reconnect on obstacles")]
    Frit,
}

#[derive(Parser)]
#[command(version)]
/// Run a real-time search agent through a randomly generated maze.
struct Cli {
    #[arg(help = "Number of maze rows", long = "rows", default_value_t = 10)]
    rows: i32,
    #[arg(help = "Number of maze columns", long = "cols", default_value_t = 10)]
    cols: i32,
    #[arg(help = "Seed for maze generation", long = "seed", default_value_t = 0)]
    seed: u64,
    #[arg(
        help = "Draw edge weights uniformly from 1..=20 instead of unit weights",
        long = "weighted"
    )]
    weighted: bool,
    #[arg(
        value_enum,
        help = "The agent to run",
        short = 'a',
        long = "agent",
        default_value_t = AgentName::Rtaa
    )]
    agent: AgentName,
    #[arg(
        help = "Node expansions allowed per bounded search",
        short = 'l',
        long = "lookahead",
        default_value_t = 5
    )]
    lookahead: usize,
    #[arg(
        help = "Edges to traverse between searches (RTAA* only)",
        short = 'm',
        long = "movements",
        default_value_t = 5
    )]
    movements: usize,
    #[arg(
        value_enum,
        help = "The reconnection strategy (FRIT only)",
        short = 's',
        long = "strategy",
        default_value_t = ReconnectStrategyName::Lrta
    )]
    strategy: ReconnectStrategyName,
    #[arg(
        help = "Probability of turning a cell into an obstacle (FRIT only)",
        long = "obstacle-prob",
        default_value_t = 0.1
    )]
    obstacle_probability: f64,
    #[arg(
        help = "Give up after this many control-loop iterations",
        long = "max-steps",
        default_value_t = 100_000
    )]
    max_steps: usize,
    #[arg(
        value_enum,
        help = "The verbosity level",
        short = 'v',
        long = "verbosity",
        default_value_t = Verbosity::Normal
    )]
    verbosity: Verbosity,
    #[arg(help = "Whether to use coloured output", short = 'c', long = "colour")]
    colour: bool,
}

fn main() -> Result<(), SearchError> {
    let cli = Cli::parse();

    let level: tracing::Level = cli.verbosity.into();
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(cli.colour)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let weights = cli.weighted.then_some(1..=20);
    let start: Cell = (0, 0);
    let goal: Cell = (cli.rows - 1, cli.cols - 1);

    match cli.agent {
        AgentName::Lrta => {
            let maze = MazeGraph::maze(cli.rows, cli.cols, &mut rng, weights);
            let problem = Rc::new(MazeProblem::new(Rc::new(maze), start, goal));
            let mut agent = LrtaAgent::new(problem.clone());
            run_episode(&mut agent, problem.as_ref(), start, cli.max_steps)?;
            agent.finalise();
        }
        AgentName::Rtaa => {
            let maze = MazeGraph::maze(cli.rows, cli.cols, &mut rng, weights);
            let problem = Rc::new(MazeProblem::new(Rc::new(maze), start, goal));
            let mut agent = RtaaAgent::new(problem.clone(), cli.lookahead, cli.movements);
            run_episode(&mut agent, problem.as_ref(), start, cli.max_steps)?;
            agent.finalise();
        }
        AgentName::Frit => {
            let (maze, obstacles) = MazeGraph::maze_with_obstacles(
                cli.rows,
                cli.cols,
                &mut rng,
                weights,
                cli.obstacle_probability,
                start,
                goal,
            );
            info!(obstacles = obstacles.len(), "maze generated");
            let problem = Rc::new(ObstacleMazeProblem::new(
                Rc::new(maze),
                start,
                goal,
                obstacles,
            ));
            let ideal_tree = IdealTree::compute(&problem.ideal_view(), &goal);
            let mut agent =
                FritAgent::new(problem.clone(), ideal_tree, cli.strategy, cli.lookahead);
            run_episode(&mut agent, problem.as_ref(), start, cli.max_steps)?;
            agent.finalise();
        }
    }

    Ok(())
}

/// The control loop: query the agent, apply what it committed to, repeat
/// until the goal, a stall, or the step budget.
fn run_episode<P>(
    agent: &mut impl Agent<P>,
    problem: &P,
    start: P::State,
    max_steps: usize,
) -> Result<(), SearchError>
where
    P: Problem,
{
    let mut state = start;
    let mut trajectory = Plan::empty();

    for _ in 0..max_steps {
        match agent.act(&state)? {
            AgentStep::Goal => {
                info!(
                    goal = ?state,
                    steps = trajectory.len(),
                    trajectory_cost = trajectory.cost(),
                    "goal reached"
                );
                return Ok(());
            }
            AgentStep::Move(action) => {
                state = problem.apply(&state, &action);
                trajectory.push(action);
            }
            AgentStep::MoveMany(actions) => {
                for action in actions {
                    state = problem.apply(&state, &action);
                    trajectory.push(action);
                }
            }
            AgentStep::Stalled => {
                warn!(?state, steps = trajectory.len(), "agent stalled, giving up");
                return Ok(());
            }
        }
    }

    warn!(
        ?state,
        steps = trajectory.len(),
        trajectory_cost = trajectory.cost(),
        "step budget exhausted before reaching the goal"
    );
    Ok(())
}
