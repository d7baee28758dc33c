use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use clap::Parser;
use log::{info, error, warn};
use tokio::net::{TcpListener, TcpStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::protocol::Message;
use isolation_engine::{
    AgentConfig, Board, Deadline, Engine, EngineKind, Error, GameState, Heuristic, Move, PlayerId, Result,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 999)]
    port: u16,
    #[arg(long, value_enum, default_value_t = EngineKind::AlphaBeta)]
    engine: EngineKind,
    /// Plies searched by the minimax engine
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long, value_enum)]
    heuristic: Option<Heuristic>,
    /// Remaining milliseconds at which a search gives up
    #[arg(long)]
    timeout: Option<f64>,
    /// Wall-clock budget per engine move, in milliseconds
    #[arg(long, default_value_t = 1000)]
    move_time: u64,
    /// Board width and height
    #[arg(long, default_value_t = 7)]
    size: usize,
    /// JSON agent configuration; command line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn agent_config(&self) -> Result<AgentConfig> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::from_json_file(path)?,
            None => AgentConfig::default(),
        };
        if let Some(depth) = self.depth {
            config.search_depth = depth;
        }
        if let Some(heuristic) = self.heuristic {
            config.heuristic = heuristic;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_ms = timeout;
        }
        config.validate()?;
        Ok(config)
    }
}

/// What every connection needs to set up its own game.
struct Settings {
    kind: EngineKind,
    agent: AgentConfig,
    move_time: Duration,
    size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level: log::Level = args.log_level.parse()
        .map_err(|_| Error::InvalidConfig(format!("unknown log level: {}", args.log_level)))?;
    simple_logger::init_with_level(level)
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;

    if args.size == 0 {
        return Err(Error::InvalidConfig("board size must be at least 1".into()));
    }
    let settings = Arc::new(Settings {
        kind: args.engine,
        agent: args.agent_config()?,
        move_time: Duration::from_millis(args.move_time),
        size: args.size,
    });
    info!("Engine {:?} with {:?}", settings.kind, settings.agent);

    // Bind the server to a local port
    let address = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on: {}", address);

    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(accept_connection(stream, Arc::clone(&settings)));
    }

    Ok(())
}

struct Game {
    started: bool,
    client: PlayerId,
    board: Board,
    /// Taken out while a search runs on the blocking pool.
    engine: Option<Box<dyn Engine<Board> + Send>>,
    move_time: Duration,
}

impl Game {
    fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            started: false,
            client: PlayerId::One,
            board: Board::new(settings.size, settings.size),
            engine: Some(settings.kind.build(&settings.agent)?),
            move_time: settings.move_time,
        })
    }
}

fn lock_game(game_mutex: &Mutex<Game>) -> Result<MutexGuard<'_, Game>> {
    game_mutex.lock().map_err(|_| Error::InvalidInput("game state is unavailable".into()))
}

async fn accept_connection(stream: TcpStream, settings: Arc<Settings>) -> Result<()> {
    let addr = stream.peer_addr()?;
    info!("Peer address: {}", addr);

    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            error!("Error during the websocket handshake with {}: {:?}", addr, e);
            return Ok(());
        }
    };
    info!("New WebSocket connection: {}", addr);

    let (mut write, mut read) = ws_stream.split();

    let game_mutex = Arc::new(Mutex::new(Game::new(&settings)?));

    while let Some(raw_message) = read.next().await {
        match raw_message {
            Ok(text_message) => {
                if !text_message.is_text() && !text_message.is_binary() { continue; }
                match serde_json::from_slice::<Value>(&text_message.into_data()) {
                    Ok(data) => {
                        info!("Received: {}", data);
                        let response = match handle_message(&game_mutex, data).await {
                            Ok(resp) => resp,
                            Err(e) => {
                                error!("Error handling message: {}", e);
                                json!({"error": e.to_string()})
                            }
                        };
                        let response_str = response.to_string();
                        if let Err(e) = write.send(Message::text(response_str.clone())).await {
                            error!("Failed to send message {}: {:?}", response_str, e);
                            break;
                        }
                        info!("Sent: {}", response_str);
                    },
                    Err(e) => { error!("Error parsing JSON: {:?}", e); }
                }
            }
            Err(e) => { error!("Error reading websocket message: {:?}", e); }
        }
    }

    Ok(())
}

async fn handle_message(game_mutex: &Mutex<Game>, data: Value) -> Result<Value> {
    let map = data.as_object()
        .ok_or_else(|| Error::InvalidInput("Expected a dict".into()))?;

    // client message protocol: "start", "move"
    // server message protocol: "move", "legal_moves", "error", "end"
    if map.contains_key("start") {
        let client_first = data["start"].as_bool().ok_or_else(
            || Error::InvalidInput("Expected boolean field: start".into())
        )?;
        handle_start(game_mutex, client_first).await
    } else if map.contains_key("move") {
        let maybe_move: Option<Move> = serde_json::from_value(data["move"].clone())?;
        handle_move(game_mutex, maybe_move).await
    } else {
        Err(Error::InvalidInput(format!("Invalid message: {}", data)))
    }
}

async fn handle_start(game_mutex: &Mutex<Game>, client_first: bool) -> Result<Value> {
    {
        let mut game = lock_game(game_mutex)?;
        game.started = true;
        game.client = if client_first { PlayerId::One } else { PlayerId::Two };
        game.board = Board::new(game.board.width(), game.board.height());
        if client_first {
            return Ok(json!({ "legal_moves": game.board.legal_moves(game.client) }));
        }
    }
    make_engine_move(game_mutex).await
}

async fn handle_move(game_mutex: &Mutex<Game>, maybe_move: Option<Move>) -> Result<Value> {
    {
        let mut game = lock_game(game_mutex)?;
        if !game.started {
            return Err(Error::InvalidInput("Game has not started yet".into()));
        }
        if game.board.active_player() != game.client {
            return Err(Error::InvalidInput("Not your turn".into()));
        }
        game.board = game.board.apply_move(maybe_move)?;
        if let Some(game_over) = check_game_over(&game) {
            return Ok(game_over);
        }
    }
    make_engine_move(game_mutex).await
}

async fn make_engine_move(game_mutex: &Mutex<Game>) -> Result<Value> {
    let (mut engine, board, move_time) = {
        let mut game = lock_game(game_mutex)?;
        let engine = game.engine.take()
            .ok_or_else(|| Error::InvalidInput("Engine is already searching".into()))?;
        (engine, game.board.clone(), game.move_time)
    };

    // the search is CPU bound, keep it off the runtime's worker threads
    let (engine, chosen) = tokio::task::spawn_blocking(move || {
        let deadline = Deadline::new(move_time);
        let chosen = engine.select_move(&board, &|| deadline.time_left());
        (engine, chosen)
    }).await.map_err(|e| Error::Io(std::io::Error::other(e)))?;

    let mut game = lock_game(game_mutex)?;
    let stats = engine.stats();
    game.engine = Some(engine);
    info!("Engine chose {} (depth {}, {} nodes)\n{}", chosen, stats.completed_depth, stats.nodes, game.board);

    let selected_move = if !chosen.is_none() {
        Some(chosen)
    } else {
        // out of time before any pass completed, or nothing to play
        let fallback = game.board.legal_moves(game.board.active_player()).first().copied();
        if let Some(mv) = fallback {
            warn!("Engine returned no move, playing {}", mv);
        }
        fallback
    };
    game.board = game.board.apply_move(selected_move)?;
    match check_game_over(&game) {
        Some(mut game_over) => {
            game_over["move"] = json!(selected_move);
            Ok(game_over)
        },
        None => Ok(json!({ "move": selected_move, "legal_moves": game.board.legal_moves(game.client) }))
    }
}

fn check_game_over(game: &Game) -> Option<Value> {
    if game.board.is_winner(game.client) {
        Some(json!({ "end": true }))
    } else if game.board.is_loser(game.client) {
        Some(json!({ "end": false }))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn settings(move_time: Duration) -> Settings {
        Settings {
            kind: EngineKind::AlphaBeta,
            agent: AgentConfig::default(),
            move_time,
            size: 7,
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn engine_search_leaves_the_runtime_free() {
        let game_mutex = Mutex::new(Game::new(&settings(Duration::from_millis(200))).unwrap());

        let reply = async {
            let response = handle_message(&game_mutex, json!({ "start": false })).await;
            (response, Instant::now())
        };
        let ticker = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Instant::now()
        };
        let ((response, replied_at), ticked_at) = tokio::join!(reply, ticker);

        let response = response.unwrap();
        assert!(response["move"].is_array(), "unexpected response {}", response);
        assert!(ticked_at < replied_at);

        let game = lock_game(&game_mutex).unwrap();
        assert!(game.engine.is_some());
        assert_eq!(game.board.move_count(), 1);
    }

    #[tokio::test]
    async fn moves_are_rejected_before_start() {
        let game_mutex = Mutex::new(Game::new(&settings(Duration::from_millis(50))).unwrap());
        let result = handle_message(&game_mutex, json!({ "move": [0, 0] })).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(lock_game(&game_mutex).unwrap().engine.is_some());
    }
}
