//! quizmaster CLI.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use quizmaster::{handoff_for, ledger_for, Config, Difficulty, Quiz, QuizError};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quizmaster", version, about = "Timed multiple-choice quiz for the terminal")]
struct Cli {
    /// Config file path (default: ./quizmaster.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for high scores, the last attempt and the log
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a quiz (the default)
    Play {
        /// Skip the home screen and start at this difficulty
        #[arg(short, long)]
        difficulty: Option<Difficulty>,

        /// Questions per attempt
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// JSON file to load the questions from instead of the trivia service
        #[arg(short, long)]
        questions: Option<PathBuf>,
    },

    /// Print the high-score leaderboard
    Scores {
        /// Only show this difficulty
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },

    /// Print the last completed attempt
    Last,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), QuizError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command.unwrap_or(Commands::Play {
        difficulty: None,
        count: None,
        questions: None,
    }) {
        Commands::Play {
            difficulty,
            count,
            questions,
        } => {
            if let Some(count) = count {
                config.question_count = count;
            }
            if questions.is_some() {
                config.questions_file = questions;
            }
            init_logging(&config);

            let quiz = Quiz::from_config(&config)?;
            let quiz = match difficulty {
                Some(difficulty) => quiz.starting_with(difficulty),
                None => quiz,
            };
            quiz.run().await
        }
        Commands::Scores { difficulty } => print_scores(&config, difficulty),
        Commands::Last => print_last(&config),
    }
}

/// Log to a file in the data directory; the TUI owns the terminal.
fn init_logging(config: &Config) {
    let path = config.log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: logging disabled, cannot open {}: {}", path.display(), e);
            return;
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quizmaster=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn print_scores(config: &Config, difficulty: Option<Difficulty>) -> Result<(), QuizError> {
    let entries: Vec<_> = ledger_for(config)
        .all_entries()?
        .into_iter()
        .filter(|entry| difficulty.is_none_or(|d| entry.difficulty == d))
        .collect();

    if entries.is_empty() {
        println!("No high scores yet.");
        return Ok(());
    }

    println!("{:>4}  {:>5}  {:>7}  {:<8}  {}", "#", "score", "percent", "level", "date");
    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:>4}  {:>5}  {:>6}%  {:<8}  {}",
            rank + 1,
            format!("{}/{}", entry.score, entry.total_questions),
            entry.percentage,
            entry.difficulty.as_str(),
            entry.timestamp.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn print_last(config: &Config) -> Result<(), QuizError> {
    let Some(snapshot) = handoff_for(config).latest()? else {
        println!("No quiz results found.");
        return Ok(());
    };

    println!(
        "{} quiz: {}/{} ({}%)",
        snapshot.difficulty().label(),
        snapshot.score(),
        snapshot.total(),
        snapshot.percentage()
    );
    println!("{}", snapshot.verdict_message());
    if snapshot.is_new_high_score() {
        println!("New high score!");
    }
    println!();

    for row in snapshot.review() {
        let correct = row.question.correct_option().unwrap_or("?");
        let mark = if row.is_correct { "+" } else { "-" };
        println!("{} {:2}. {}", mark, row.number, row.question.text);
        match row.answer_text() {
            Some(answer) if row.is_correct => println!("       {}", answer),
            Some(answer) => println!("       {}  (correct: {})", answer, correct),
            None => println!("       no answer  (correct: {})", correct),
        }
    }
    Ok(())
}
