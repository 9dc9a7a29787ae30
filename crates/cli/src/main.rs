use clap::{Parser, Subcommand};
use parley::gateway::ErrorBody;
use parley::pipeline::{InboundMessage, ProcessedResult};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: PARLEY_CONFIG_PATH or ~/.parley/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Load the capability providers and serve POST /chat. Exits if any provider fails to load.
    #[command(alias = "gateway")]
    Serve {
        /// Config file path (default: PARLEY_CONFIG_PATH or ~/.parley/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 127.0.0.1)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Chat with a running gateway (interactive).
    Chat {
        /// Config file path (default: PARLEY_CONFIG_PATH or ~/.parley/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Language replies should be translated into.
        #[arg(long, short, default_value = "english")]
        target: String,

        /// Language you are writing in (informational; the gateway detects it).
        #[arg(long, short, default_value = "english")]
        source: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("parley {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port, bind }) => {
            if let Err(e) = run_serve(config, port, bind).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat {
            config,
            target,
            source,
        }) => {
            if let Err(e) = run_chat(config, source, target).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(parley::config::default_config_path);
    let dir = parley::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = parley::config::load_config(config_path)?;
    log::info!("loaded config from {}", path.display());
    if let Some(p) = port {
        config.server.port = p;
    }
    if let Some(b) = bind {
        config.server.bind = b;
    }
    log::info!(
        "starting gateway on {}:{}",
        config.server.bind,
        config.server.port
    );
    parley::gateway::run_gateway(config).await
}

async fn run_chat(
    config_path: Option<std::path::PathBuf>,
    source: String,
    target: String,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, _) = parley::config::load_config(config_path)?;
    let url = chat_url(&config.server.bind, config.server.port);
    let client = reqwest::Client::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }

        let message = InboundMessage::new(input, source.as_str()).with_target(target.as_str());
        match send_message(&client, &url, &message).await {
            Ok(result) => {
                println!("< {}", result.response.trim());
                println!(
                    "  [{} | {} ({:.2})]",
                    result.detected_language, result.sentiment.label, result.sentiment.score
                );
            }
            Err(e) => {
                eprintln!("chat error: {}", e);
            }
        }
    }

    Ok(())
}

/// URL the chat client dials. A wildcard bind is reached through loopback.
fn chat_url(bind: &str, port: u16) -> String {
    let host = match bind.trim().trim_start_matches('[').trim_end_matches(']') {
        "" | "0.0.0.0" => "127.0.0.1".to_string(),
        "::" => "[::1]".to_string(),
        h if h.contains(':') => format!("[{}]", h),
        h => h.to_string(),
    };
    format!("http://{}:{}/chat", host, port)
}

async fn send_message(
    client: &reqwest::Client,
    url: &str,
    message: &InboundMessage,
) -> Result<ProcessedResult, String> {
    let res = client
        .post(url)
        .json(message)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = res.status();
    if !status.is_success() {
        let detail = res
            .json::<ErrorBody>()
            .await
            .map(|b| b.detail)
            .unwrap_or_else(|_| "no detail".to_string());
        return Err(format!("{} {}", status, detail));
    }
    res.json::<ProcessedResult>().await.map_err(|e| e.to_string())
}
