//! Headless table client: joins (or creates) a game and plays via the
//! built-in first-allowed advisor, printing everything noteworthy.
//!
//! ```text
//! table-client --control ws://host/control --events ws://host/events \
//!     [--position north] [--game <id>] [--create-game] \
//!     [--player <id>] [--pilot off|copilot|autopilot] \
//!     [--server-key FILE] [--public-key FILE] [--secret-key FILE]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use trickwire::prelude::*;

struct Args {
    control: String,
    events: String,
    position: Option<Seat>,
    game: Option<GameId>,
    create_game: bool,
    player: Option<PlayerId>,
    pilot: PilotMode,
    server_key: Option<PathBuf>,
    public_key: Option<PathBuf>,
    secret_key: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut control = None;
    let mut events = None;
    let mut position = None;
    let mut game = None;
    let mut create_game = false;
    let mut player = None;
    let mut pilot = PilotMode::Off;
    let mut server_key = None;
    let mut public_key = None;
    let mut secret_key = None;

    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let mut value = |flag: &str| {
            args.next().ok_or_else(|| format!("{flag} needs a value"))
        };
        match flag.as_str() {
            "--control" => control = Some(value("--control")?),
            "--events" => events = Some(value("--events")?),
            "--position" => {
                position = Some(parse_seat(&value("--position")?)?);
            }
            "--game" => game = Some(GameId(value("--game")?)),
            "--create-game" => create_game = true,
            "--player" => player = Some(PlayerId(value("--player")?)),
            "--pilot" => pilot = parse_pilot(&value("--pilot")?)?,
            "--server-key" => {
                server_key = Some(PathBuf::from(value("--server-key")?));
            }
            "--public-key" => {
                public_key = Some(PathBuf::from(value("--public-key")?));
            }
            "--secret-key" => {
                secret_key = Some(PathBuf::from(value("--secret-key")?));
            }
            other => return Err(format!("unknown flag {other}")),
        }
    }

    Ok(Args {
        control: control.ok_or("--control is required")?,
        events: events.ok_or("--events is required")?,
        position,
        game,
        create_game,
        player,
        pilot,
        server_key,
        public_key,
        secret_key,
    })
}

fn parse_seat(s: &str) -> Result<Seat, String> {
    match s {
        "north" => Ok(Seat::North),
        "east" => Ok(Seat::East),
        "south" => Ok(Seat::South),
        "west" => Ok(Seat::West),
        other => Err(format!("unknown position {other}")),
    }
}

fn parse_pilot(s: &str) -> Result<PilotMode, String> {
    match s {
        "off" => Ok(PilotMode::Off),
        "copilot" => Ok(PilotMode::Copilot),
        "autopilot" => Ok(PilotMode::Autopilot),
        other => Err(format!("unknown pilot mode {other}")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = run(args).await {
        tracing::error!(%error, "client failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(args: Args) -> Result<(), ClientError> {
    let security = LinkSecurity::from_key_files(
        args.server_key.as_deref(),
        args.public_key.as_deref(),
        args.secret_key.as_deref(),
    )?;

    let mut config = ClientConfig::new(&args.control, &args.events)
        .security(security)
        .create_game(args.create_game)
        .pilot(args.pilot);
    if let Some(seat) = args.position {
        config = config.preferred_position(seat);
    }
    if let Some(game) = args.game {
        config = config.game(game);
    }
    if let Some(player) = args.player {
        config = config.player(player);
    }

    let advisor: Option<Box<dyn Advisor>> = match args.pilot {
        PilotMode::Off => None,
        _ => Some(Box::new(FirstAllowed)),
    };

    let mut client = WsClient::connect(config, advisor).await?;
    tracing::info!("connected, starting handshake");
    client
        .run(|notice| match notice {
            Notice::Fatal(text) => println!("fatal: {text}"),
            Notice::Advisory(text) => println!("advisor: {text}"),
            Notice::RuleViolation(text) => println!("rejected: {text}"),
        })
        .await
}
