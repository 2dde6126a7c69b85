use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ragdesk_core::rag::{RegistryView, RetrievalView};
use ragdesk_core::{Config, Session, Severity, Status, Upload};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragdesk")]
#[command(about = "Chat with a local LLM backend and manage its knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "ragdesk.yaml")]
    config: PathBuf,

    #[arg(short, long, help = "Backend base URL, overrides the config file")]
    server: Option<String>,

    #[arg(short, long, help = "Log client activity to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show current configuration")]
    Show {
        #[arg(long, help = "Print the effective configuration as YAML")]
        yaml: bool,
    },

    #[command(about = "List the models offered by the backend")]
    Models,

    #[command(about = "Model management commands")]
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },

    #[command(about = "Knowledge base commands")]
    Docs {
        #[command(subcommand)]
        command: DocsCommands,
    },

    #[command(about = "Retrieval settings")]
    Rag {
        #[command(subcommand)]
        command: RagCommands,
    },

    #[command(about = "Ask a single question")]
    Ask {
        prompt: String,

        #[arg(short, long)]
        temperature: Option<f64>,

        #[arg(long, help = "Synthesize the reply to the configured WAV file")]
        speak: bool,
    },

    #[command(about = "Interactive chat (type /help for commands)")]
    Chat,

    #[command(about = "Transcribe an audio file")]
    Transcribe { file: PathBuf },
}

#[derive(Subcommand)]
enum ModelCommands {
    #[command(about = "Set the model used for chat")]
    Set {
        #[arg(help = "Model name (e.g., 'llama3.2:1b')")]
        model: String,
    },
}

#[derive(Subcommand)]
enum DocsCommands {
    #[command(about = "List documents in the knowledge base")]
    List,

    #[command(about = "Add a text document")]
    AddText { text: String },

    #[command(about = "Import a web page")]
    AddUrl { url: String },

    #[command(about = "Upload a PDF")]
    AddPdf { file: PathBuf },

    #[command(about = "Delete a document by id")]
    Delete { id: String },

    #[command(about = "Remove every document")]
    Clear {
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum RagCommands {
    #[command(about = "Use the knowledge base when answering")]
    On,

    #[command(about = "Answer without the knowledge base")]
    Off,

    #[command(about = "Set how many passages are retrieved (1-10)")]
    TopK { value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut config = load_config(&cli.config)?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }

    match cli.command {
        Commands::Show { yaml } => show_config(&config, yaml),
        Commands::Models => list_models(&Session::connect(config)).await,
        Commands::Model {
            command: ModelCommands::Set { model },
        } => set_model(&Session::connect(config), &model).await,
        Commands::Docs { command } => docs(&Session::connect(config), command).await,
        Commands::Rag { command } => rag(&Session::connect(config), command).await,
        Commands::Ask {
            prompt,
            temperature,
            speak,
        } => {
            // Spoken explicitly below so the process waits for the file
            let speak = speak || config.speech.enabled;
            config.speech.enabled = false;
            ask(&Session::connect(config), &prompt, temperature, speak).await
        }
        Commands::Chat => chat(&Session::connect(config)).await,
        Commands::Transcribe { file } => transcribe(&Session::connect(config), &file).await,
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let directive = if verbose {
        "ragdesk_core=debug"
    } else {
        "ragdesk_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(Config::default());
    }
    Config::load(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

fn show_config(config: &Config, yaml: bool) -> Result<()> {
    if yaml {
        let content = serde_yaml::to_string(config).context("Failed to serialize config")?;
        print!("{content}");
        return Ok(());
    }

    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "Server:".bold());
    println!("  Base URL:        {}", config.server.base_url.cyan());
    println!();
    println!("{}", "Chat:".bold());
    println!("  Default Model:   {}", config.chat.default_model.cyan());
    println!("  Temperature:     {}", config.chat.temperature);
    println!("  System Prompt:   {}", config.chat.system_prompt);
    println!();
    println!("{}", "RAG:".bold());
    println!("  Default Top K:   {}", config.rag.default_top_k);
    println!("  Import Limit:    {} characters", config.rag.max_imported_chars);
    println!();
    println!("{}", "Storage:".bold());
    println!("  Preferences:     {}", config.storage.preferences_path);
    println!();
    println!("{}", "Speech:".bold());
    println!("  Enabled:         {}", config.speech.enabled);
    println!("  Rate:            {}", config.speech.rate);
    println!(
        "  Voice:           {}",
        config.speech.voice.as_deref().unwrap_or("(engine default)")
    );
    println!("  Output:          {}", config.speech.output_path);

    Ok(())
}

async fn list_models(session: &Session) -> Result<()> {
    let menu = session.models().load_models().await;

    println!("{}", "Available models:".bold().green());
    println!();
    for option in &menu.options {
        if option.value == menu.selected {
            println!("  {} {}", "•".green(), option.label.bold());
        } else {
            println!("  {} {}", "•".cyan(), option.label);
        }
    }
    println!();
    println!("Use {} to change the model", "ragdesk model set <model>".bold());

    Ok(())
}

async fn set_model(session: &Session, model: &str) -> Result<()> {
    let menu = session.models().load_models().await;
    if !session.models().select(model) {
        let offered: Vec<&str> = menu.options.iter().map(|o| o.value.as_str()).collect();
        bail!("Model '{}' is not offered (available: {})", model, offered.join(", "));
    }

    println!("{} Model updated to: {}", "✓".green().bold(), model.cyan());
    Ok(())
}

async fn docs(session: &Session, command: DocsCommands) -> Result<()> {
    let registry = session.registry();

    match command {
        DocsCommands::List => {
            registry.list_documents(None).await;
            print_registry(&registry.view());
        }
        DocsCommands::AddText { text } => print_status(&registry.add_text(&text).await),
        DocsCommands::AddUrl { url } => print_status(&registry.add_url(&url).await),
        DocsCommands::AddPdf { file } => {
            let upload = read_upload(&file).await?;
            print_status(&registry.add_pdf(Some(upload)).await);
        }
        DocsCommands::Delete { id } => {
            if let Some(status) = registry.delete_document(Some(&id)).await {
                print_status(&status);
            }
        }
        DocsCommands::Clear { yes } => {
            match registry.clear_all(|| yes || confirm("Remove every document?")).await {
                Some(status) => print_status(&status),
                None => println!("{}", "Cancelled.".yellow()),
            }
        }
    }

    Ok(())
}

async fn rag(session: &Session, command: RagCommands) -> Result<()> {
    match command {
        RagCommands::On | RagCommands::Off => {
            let enable = matches!(command, RagCommands::On);
            session.registry().list_documents(None).await;
            switch_retrieval(session, enable)?;
            let state = if enable { "on".green() } else { "off".yellow() };
            println!("{} Retrieval is {}", "✓".green().bold(), state);
        }
        RagCommands::TopK { value } => {
            let top_k = session.top_k().set_input(&value);
            println!("{} Top K set to {}", "✓".green().bold(), top_k.to_string().cyan());
        }
    }
    Ok(())
}

/// Applies `rag on|off` to the current toggle. A disabled toggle is already off.
fn switch_retrieval(session: &Session, enable: bool) -> Result<()> {
    if session.registry().set_rag_enabled(enable) || !enable {
        return Ok(());
    }
    bail!("Retrieval is unavailable until the knowledge base has documents");
}

async fn ask(session: &Session, prompt: &str, temperature: Option<f64>, speak: bool) -> Result<()> {
    session.init().await;
    if let Some(temperature) = temperature {
        session.chat().set_temperature(temperature);
    }

    let Some(reply) = session.chat().send(prompt).await else {
        bail!("Nothing to send");
    };
    println!("{}", reply.text);
    print_retrieval(&session.retrieval().view());

    if speak {
        let path = session
            .speech()
            .speak(&reply.text)
            .await
            .context("Failed to synthesize speech")?;
        println!("{} Reply saved to {}", "♪".blue(), path.display());
    }

    Ok(())
}

async fn chat(session: &Session) -> Result<()> {
    session.init().await;
    println!(
        "{} Chatting with {} (type {} for commands)",
        "→".blue(),
        session.models().current().cyan(),
        "/help".bold()
    );
    print_toggle(&session.registry().view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        if let Some(command) = line.strip_prefix('/') {
            if !chat_command(session, command).await? {
                break;
            }
            continue;
        }

        if let Some(reply) = session.chat().send(line).await {
            println!("{}", reply.text);
            print_retrieval(&session.retrieval().view());
        }
    }

    Ok(())
}

/// Runs one `/command` of the chat loop. Returns `false` to leave the loop.
async fn chat_command(session: &Session, command: &str) -> Result<bool> {
    let mut parts = command.splitn(2, ' ');
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().unwrap_or_default().trim();

    match name {
        "quit" | "exit" => return Ok(false),
        "models" => list_models(session).await?,
        "model" => {
            if session.models().select(arg) {
                println!("{} Model updated to: {}", "✓".green().bold(), arg.cyan());
            } else {
                println!("{} '{}' is not offered", "✗".red().bold(), arg);
            }
        }
        "docs" => {
            session.registry().list_documents(None).await;
            print_registry(&session.registry().view());
        }
        "add" => print_status(&session.registry().add_text(arg).await),
        "url" => print_status(&session.registry().add_url(arg).await),
        "rag" => {
            let enabled = session.registry().set_rag_enabled(arg == "on");
            if arg == "on" && !enabled {
                println!("{}", "Retrieval needs at least one document.".yellow());
            }
            print_toggle(&session.registry().view());
        }
        "top-k" => {
            let top_k = session.top_k().set_input(arg);
            println!("Top K: {}", top_k.to_string().cyan());
        }
        "temp" => match arg.parse::<f64>() {
            Ok(temperature) => {
                session.chat().set_temperature(temperature);
                println!("Temperature: {}", session.chat().temperature());
            }
            Err(_) => println!("{} Not a number: {}", "✗".red().bold(), arg),
        },
        _ => print_help(),
    }

    Ok(true)
}

async fn transcribe(session: &Session, file: &Path) -> Result<()> {
    let upload = read_upload(file).await?;
    let transcript = session.transcribe(upload).await?;

    println!("{}", transcript.text);
    if let Some(language) = transcript.language {
        println!("{} {}", "Language:".dimmed(), language);
    }
    Ok(())
}

async fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Upload::new(filename, bytes))
}

fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_status(status: &Status) {
    match status.severity {
        Severity::Success => println!("{} {}", "✓".green().bold(), status.text),
        Severity::Error => println!("{} {}", "✗".red().bold(), status.text.red()),
        Severity::Info => println!("{} {}", "→".blue(), status.text),
    }
}

fn print_registry(view: &RegistryView) {
    if let Some(status) = &view.status {
        print_status(status);
    }
    if !view.rows.is_empty() {
        println!();
    }

    for row in &view.rows {
        let chunks = if row.chunks == 1 { "chunk" } else { "chunks" };
        println!(
            "  {} {} {}",
            "•".cyan(),
            row.label.bold(),
            format!("[{}]", row.id).dimmed()
        );
        let mut details = vec![format!("{} {}", row.chunks, chunks)];
        details.extend(row.created_at.clone());
        details.extend(row.notes.iter().cloned());
        println!("    {}", details.join(" · ").dimmed());
        if !row.preview.is_empty() {
            println!("    {}", row.preview);
        }
    }

    if let Some(model) = &view.embedding_model {
        println!();
        println!("{} {}", "Embedding model:".dimmed(), model);
    }
    print_toggle(view);
}

fn print_toggle(view: &RegistryView) {
    let state = if view.toggle.disabled {
        "unavailable".dimmed()
    } else if view.toggle.checked {
        "on".green()
    } else {
        "off".yellow()
    };
    println!("{} {}", "Retrieval:".dimmed(), state);
}

fn print_retrieval(view: &RetrievalView) {
    if !view.visible {
        return;
    }
    println!();
    println!("{}", "Sources:".bold());
    for excerpt in &view.excerpts {
        match &excerpt.similarity {
            Some(similarity) => println!(
                "  {} {}",
                excerpt.label.cyan(),
                format!("(similarity {similarity})").dimmed()
            ),
            None => println!("  {}", excerpt.label.cyan()),
        }
        println!("    {}", excerpt.text);
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /models          list models");
    println!("  /model <name>    switch model");
    println!("  /docs            list documents");
    println!("  /add <text>      add a text document");
    println!("  /url <url>       import a web page");
    println!("  /rag on|off      toggle retrieval");
    println!("  /top-k <n>       passages per question");
    println!("  /temp <x>        sampling temperature");
    println!("  /quit            leave");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdesk_core::{HttpBackend, MemoryStore};
    use std::sync::Arc;

    fn offline_session() -> Session {
        Session::new(
            Config::default(),
            Arc::new(HttpBackend::new("http://127.0.0.1:9")),
            Arc::new(MemoryStore::new()),
        )
    }

    #[test]
    fn test_switch_retrieval_on_disabled_toggle() {
        let session = offline_session();
        assert!(session.registry().toggle().disabled);

        assert!(switch_retrieval(&session, false).is_ok());
        assert!(switch_retrieval(&session, true).is_err());
        assert!(!session.registry().toggle().checked);
    }

    #[test]
    fn test_load_config_falls_back_to_defaults() {
        let config = load_config(Path::new("does-not-exist.yaml")).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8000");
    }
}
