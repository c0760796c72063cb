use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dotenv::dotenv;
use health_assistant::commands::{self, document, system, CommandHandler, Flow};
use health_assistant::config::{AppConfig, Credentials, DEFAULT_CONFIG_PATH};
use health_assistant::session::UserStore;
use health_assistant::{build_assistant, rebuild_banner, rebuild_index, rebuild_summary, Assistant};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Answers health questions from your PDFs, with a web search fallback", long_about = None)]
struct Args {
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// OpenAI key; overrides OPENAI_API_KEY
    #[arg(short, long)]
    api_key: Option<String>,

    /// Owner of the saved reminders and journal
    #[arg(short, long, default_value = "default")]
    user: String,

    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Interactive chat (default)
    Chat,
    /// Ask a single question and exit
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Rebuild the vector index from the configured PDFs
    Rebuild,
    /// Summarize an indexed PDF by path, file name or number
    Summarize { pdf: String },
    /// Explain the results in a lab report PDF
    AnalyzeLab { pdf: String },
    /// List the configured documents with their chunk counts
    Docs,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("{} {}", "❌ Error:".red(), e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = AppConfig::load(&args.config)?;
    let credentials = Credentials::from_env().with_openai_override(args.api_key.clone());

    match args.command.clone().unwrap_or(Command::Chat) {
        Command::Rebuild => {
            println!("{}", rebuild_banner(&config));
            let chunks = rebuild_index(&config, &credentials).await?;
            println!("{}", rebuild_summary(chunks));
            Ok(())
        }
        Command::Ask { question } => {
            let assistant = init_assistant(&config, &credentials).await?;
            let answer = assistant.ask(&question.join(" ")).await?;
            commands::print_answer(&answer);
            Ok(())
        }
        Command::Summarize { pdf } => {
            let assistant = init_assistant(&config, &credentials).await?;
            document::summarize(&assistant, &config, &pdf).await.map_err(|e| anyhow!(e))
        }
        Command::AnalyzeLab { pdf } => {
            let assistant = init_assistant(&config, &credentials).await?;
            document::analyze_lab(&assistant, &pdf).await.map_err(|e| anyhow!(e))
        }
        Command::Docs => {
            let assistant = init_assistant(&config, &credentials).await?;
            system::print_documents(assistant.store(), &config).await.map_err(|e| anyhow!(e))
        }
        Command::Chat => {
            let assistant = init_assistant(&config, &credentials).await?;
            let user_store = UserStore::load(&args.data_dir, &args.user).await?;
            chat_loop(CommandHandler::new(assistant, config, user_store)).await
        }
    }
}

async fn init_assistant(config: &AppConfig, credentials: &Credentials) -> Result<Assistant> {
    let rule = "=".repeat(60);
    println!("\n{}\nInitializing Health Assistant...\n{}\n", rule, rule);
    Ok(build_assistant(config, credentials, false).await?)
}

async fn chat_loop(mut command_handler: CommandHandler) -> Result<()> {
    system::print_banner();
    system::print_disclaimer();
    system::print_help();

    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        match rl.readline("👤 ") {
            Ok(line) => {
                let input = line.trim();
                if !input.is_empty() {
                    let _ = rl.add_history_entry(input);
                }

                match command_handler.handle_command(input).await {
                    Ok(Flow::Exit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => println!("{}", e.red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\nThank you for using Health Assistant. Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
