#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::{Parser, Subcommand};
    use tracing_subscriber::EnvFilter;

    use voice_query::desktop::{ClipSource, TerminalHost};
    use voice_query::voice::{Driver, Input, Outcome, RecordingController};
    use voice_query::Config;

    /// voice-query - Ask a spoken question and hear the answer
    #[derive(Parser)]
    #[command(name = "voice-query", version, about)]
    struct Cli {
        /// Server base URL
        #[arg(short, long, env = "VOICE_QUERY_SERVER")]
        server: Option<String>,

        /// Endpoint path or URL
        #[arg(long, env = "VOICE_QUERY_ENDPOINT")]
        endpoint: Option<String>,

        /// Increase verbosity (-v, -vv, -vvv)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Upload a recorded WebM/Opus question and print the answer
        Ask {
            /// Recording to send
            clip: PathBuf,

            /// Print the answer without playing it
            #[arg(long)]
            no_playback: bool,

            /// Fragment size used when replaying the clip
            #[arg(long)]
            fragment_bytes: Option<usize>,
        },
        /// Show the effective configuration
        Config,
    }

    #[tokio::main]
    pub async fn main() -> ExitCode {
        let cli = Cli::parse();

        // Set up logging based on verbosity
        let filter = match cli.verbose {
            0 => "warn,voice_query=info",
            1 => "info,voice_query=debug",
            2 => "debug",
            _ => "trace",
        };

        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .init();

        match run(cli).await {
            Ok(code) => code,
            Err(e) => {
                tracing::error!("fatal: {e}");
                ExitCode::FAILURE
            }
        }
    }

    async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
        let mut config = Config::load()?;
        if let Some(server) = cli.server {
            config.server_url = Some(server);
        }
        if let Some(endpoint) = cli.endpoint {
            config.endpoint = endpoint;
        }

        match cli.command {
            Command::Ask {
                clip,
                no_playback,
                fragment_bytes,
            } => {
                if no_playback {
                    config.playback = false;
                }
                if let Some(bytes) = fragment_bytes {
                    config.fragment_bytes = bytes;
                }
                config.validate()?;
                ask(&config, clip).await
            }
            Command::Config => {
                show_config(&config);
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    /// Run one recording attempt through the controller
    async fn ask(config: &Config, clip: PathBuf) -> anyhow::Result<ExitCode> {
        let source = ClipSource::new(clip, config.fragment_bytes);
        let host = TerminalHost::new(config, source)?;
        let controller =
            RecordingController::new(host.capture_supported()).with_playback(config.playback);

        let enabled = controller.is_enabled();
        let mut driver = Driver::new(controller, host);

        if !enabled {
            driver.flush();
            return Ok(ExitCode::FAILURE);
        }

        driver.inbox().send(Input::Toggle);
        driver.run_until(RecordingController::is_settled).await;

        Ok(match driver.controller().last_outcome() {
            Some(Outcome::Answered) => ExitCode::SUCCESS,
            _ => ExitCode::FAILURE,
        })
    }

    fn show_config(config: &Config) {
        match voice_query::config::file::config_file_path() {
            Some(path) => println!("config file: {}", path.display()),
            None => println!("config file: (no home directory)"),
        }
        let server = config
            .server_url
            .as_deref()
            .unwrap_or(voice_query::config::DEFAULT_SERVER_URL);

        println!("server:      {server}");
        println!("endpoint:    {}", config.endpoint);
        println!("playback:    {}", config.playback);
        println!("fragments:   {} bytes", config.fragment_bytes);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::main()
}

// The browser build starts from `voice_query::web::start` instead
#[cfg(target_arch = "wasm32")]
fn main() {}
