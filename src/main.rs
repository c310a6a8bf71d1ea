use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use timbre_studio::db::{self, AccountRepo, ClipRepo};
use timbre_studio::playback::{LocalAudioFactory, Phase, PlayableItem, PlaybackEngine};
use timbre_studio::voices::Service;
use timbre_studio::{
    Config, Error, LocalSession, Result, StyleHttpProvider, Synthesizer,
};

/// Timbre - local speech synthesis studio
#[derive(Parser)]
#[command(name = "timbre", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate speech from text
    Generate {
        /// Text to synthesize (up to 5000 characters)
        text: String,
        /// Voice id (catalog name or provider-native id)
        #[arg(short = 'V', long, default_value = "andreas")]
        voice: String,
        /// Service backend
        #[arg(short, long, default_value = "styletts2")]
        service: String,
        /// Play the clip after generating it
        #[arg(long)]
        play: bool,
    },
    /// List voices for a service
    Voices {
        /// Service backend
        #[arg(short, long, default_value = "styletts2")]
        service: String,
    },
    /// Play a clip URL through the local output device
    Play {
        /// Clip URL
        url: String,
    },
    /// Show past generations
    History,
    /// Show the credit balance
    Credits {
        /// Add credits before showing the balance
        #[arg(long)]
        grant: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "timbre_studio=info,timbre=info",
        1 => "timbre_studio=debug,timbre=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    std::fs::create_dir_all(&config.data_dir)?;

    let pool = db::init(config.db_path())?;
    let accounts = AccountRepo::new(pool.clone());
    let clips = ClipRepo::new(pool);
    accounts.find_or_create(&config.user, config.starting_credits)?;

    match cli.command {
        Command::Generate {
            text,
            voice,
            service,
            play,
        } => {
            let service = parse_service(&service)?;
            let provider = StyleHttpProvider::new(
                config.provider_url.clone(),
                config.provider_api_key.clone(),
                config.request_timeout,
            )?;
            let synthesizer = Synthesizer::new(
                Arc::new(LocalSession::new(config.user.clone())),
                Arc::new(provider),
                accounts.clone(),
                clips,
            );

            let item = synthesizer.generate(&text, &voice, service).await?;
            let credits = accounts.credits(&config.user)?.unwrap_or(0);
            println!("generated clip {} ({} credits left)", item.id, credits);
            println!("  {}", item.url);

            if play {
                play_item(item)?;
            }
        }
        Command::Voices { service } => {
            let service = parse_service(&service)?;
            let provider = StyleHttpProvider::new(
                config.provider_url.clone(),
                config.provider_api_key.clone(),
                config.request_timeout,
            )?;
            let synthesizer = Synthesizer::new(
                Arc::new(LocalSession::new(config.user.clone())),
                Arc::new(provider),
                accounts,
                clips,
            );

            for voice in synthesizer.list_voices(service)? {
                println!("{voice}");
            }
        }
        Command::Play { url } => {
            let item = PlayableItem {
                id: url.clone(),
                url,
                title: "ad-hoc clip".to_string(),
                voice: String::new(),
                service: Service::StyleTts2,
                duration: None,
            };
            play_item(item)?;
        }
        Command::History => {
            for clip in clips.list_for_account(&config.user)? {
                println!(
                    "{}  {}  {}  {}",
                    clip.created_at.format("%Y-%m-%d %H:%M"),
                    clip.voice,
                    clip.service,
                    clip.text
                );
            }
        }
        Command::Credits { grant } => {
            if let Some(amount) = grant {
                accounts.grant(&config.user, amount)?;
            }
            let credits = accounts.credits(&config.user)?.unwrap_or(0);
            println!("{credits}");
        }
    }

    Ok(())
}

fn parse_service(s: &str) -> Result<Service> {
    Service::parse(s).ok_or_else(|| Error::InvalidInput(format!("unknown service: {s}")))
}

/// Drive the engine until the clip finishes or fails
fn play_item(item: PlayableItem) -> Result<()> {
    let mut engine = PlaybackEngine::new(Box::new(LocalAudioFactory::new()));
    engine.play(item)?;

    let mut started = false;
    loop {
        engine.pump();
        match engine.state().phase {
            Phase::Playing => started = true,
            Phase::Stopped if started => return Ok(()),
            Phase::Errored => {
                return Err(Error::Playback("clip failed to play".to_string()));
            }
            _ => {}
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}
