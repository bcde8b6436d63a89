use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use guided_quiz::clients::{GeminiClient, GeminiConfig};
use guided_quiz::config::log_filter_directive;
use guided_quiz::interceptors::FileInterceptor;
use guided_quiz::widgets::{LoadingIndicator, ProgressBar};
use guided_quiz::{GuidedQuestion, QuizTypeMode, Tutor, ValidationPolicy};
use tracing::info;
use tracing_subscriber::EnvFilter;

const BAR_WIDTH: usize = 30;

#[derive(Parser)]
#[command(author, version, about = "Guided literary-analysis quizzes for any passage", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    API_KEY            Gemini API key (required, may live in .env)
    QUIZ_MODEL         Model id [default: gemini-2.5-pro]
    QUIZ_BASE_URL      API base URL
    QUIZ_TEMPERATURE   Sampling temperature
    QUIZ_TIMEOUT_SECS  Request timeout in seconds [default: 120]
    RUST_LOG           Log filter [default: guided_quiz=info]

EXAMPLES:
    quiz generate --name Ada --mode mcq --file poem.txt
    quiz evaluate --answer \"it is sad\" --reference \"the tone is melancholic\"
    quiz run --name Ada --file poem.txt")]
struct Cli {
    /// Override the model id
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Write a markdown transcript of every exchange into this directory
    #[arg(long, global = true)]
    transcripts: Option<PathBuf>,

    /// Skip the question-count and verbatim-quote checks
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate guided questions and print them as JSON
    Generate(QuizArgs),
    /// Grade a free-text answer against a reference answer
    Evaluate {
        /// The student's answer
        #[arg(long)]
        answer: String,
        /// The reference answer
        #[arg(long)]
        reference: String,
    },
    /// Take a quiz interactively
    Run(QuizArgs),
}

#[derive(Args)]
struct QuizArgs {
    /// Student name used to personalise the questions
    #[arg(short, long)]
    name: String,

    /// Question types: mcq, descriptive or blend
    #[arg(short, long, default_value = "blend")]
    mode: QuizTypeMode,

    /// Passage file; read from stdin when omitted
    #[arg(short, long)]
    file: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::new(log_filter_directive());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_tutor(cli: &Cli) -> Result<Tutor<GeminiClient>> {
    let client = if cli.model.is_none() && cli.base_url.is_none() {
        GeminiClient::from_env().context("cannot start without a valid configuration")?
    } else {
        let mut config = GeminiConfig::from_env().context("cannot start without a valid configuration")?;
        if let Some(model) = &cli.model {
            config = config.with_model(model.clone());
        }
        if let Some(base_url) = &cli.base_url {
            config = config.with_base_url(base_url.clone());
        }
        GeminiClient::new(config).context("failed to build HTTP client")?
    };
    let mut tutor = Tutor::new(client);
    if cli.lenient {
        tutor = tutor.with_policy(ValidationPolicy::lenient());
    }
    if let Some(dir) = &cli.transcripts {
        tutor = tutor.with_interceptor(Arc::new(FileInterceptor::new(dir.clone())));
    }
    Ok(tutor)
}

fn read_passage(file: Option<&Path>) -> Result<String> {
    let passage = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read passage: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("failed to read passage from stdin")?;
            buf
        }
    };
    if passage.trim().is_empty() {
        bail!("passage is empty");
    }
    Ok(passage)
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        bail!("input closed");
    }
    Ok(line.trim().to_string())
}

async fn generate(tutor: &Tutor<GeminiClient>, args: &QuizArgs) -> Result<Vec<GuidedQuestion>> {
    let passage = read_passage(args.file.as_deref())?;
    let spinner = LoadingIndicator::start("Generating questions...");
    let result = tutor.generate_guided_questions(&passage, args.mode, &args.name).await;
    spinner.finish();
    Ok(result?)
}

async fn run_session(tutor: &Tutor<GeminiClient>, args: &QuizArgs) -> Result<()> {
    if args.file.is_none() {
        bail!("`run` needs --file so answers can be read from stdin");
    }
    let questions = generate(tutor, args).await?;
    let total = questions.len();
    let mut correct = 0;

    for (index, question) in questions.iter().enumerate() {
        println!("\nQuestion {}/{} · {}", index + 1, total, question.category);
        println!("  \"{}\"", question.relevant_text);
        println!("{}", question.question);
        if let Some(options) = &question.options {
            for (n, option) in options.iter().enumerate() {
                println!("  {}. {}", n + 1, option);
            }
        }

        let answer = loop {
            let line = prompt_line("Your answer (? for a hint): ")?;
            match line.as_str() {
                "?" => println!("Hint: {}", question.hint),
                "" => continue,
                _ => break line,
            }
        };

        let is_correct = match &question.options {
            Some(options) => {
                let choice = answer
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| options.get(i))
                    .map(String::as_str)
                    .unwrap_or(answer.as_str());
                question.check_choice(choice).unwrap_or(false)
            }
            None => {
                let spinner = LoadingIndicator::start("Checking your answer...");
                let result = tutor.evaluate_user_answer(&answer, &question.answer).await;
                spinner.finish();
                let evaluation = result?;
                println!("{}", evaluation.feedback);
                evaluation.is_correct
            }
        };

        if is_correct {
            correct += 1;
            println!("Correct!");
        } else {
            println!("Not quite. Answer: {}", question.answer);
        }
        println!("{}", question.explanation);
        println!("{}", ProgressBar::from_ratio(correct, index + 1).render_styled(BAR_WIDTH));
    }

    info!(target: "guided_quiz::cli", correct, total, "Session finished");
    println!("\nYou answered {} of {} correctly.", correct, total);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Fails on a missing API_KEY before anything touches the network
    let tutor = build_tutor(&cli)?;

    match &cli.command {
        Command::Generate(args) => {
            let questions = generate(&tutor, args).await?;
            println!("{}", serde_json::to_string_pretty(&questions)?);
        }
        Command::Evaluate { answer, reference } => {
            let evaluation = tutor.evaluate_user_answer(answer, reference).await?;
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
        Command::Run(args) => run_session(&tutor, args).await?,
    }
    Ok(())
}
