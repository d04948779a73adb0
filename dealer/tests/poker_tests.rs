use std::sync::mpsc as sync_mpsc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use holdem_dealer::config::{Cli, Config, ConfigError};
use holdem_dealer::connection::{accept_seats, InboundEvent};
use holdem_dealer::protocol::{decode, kind, ConnectPayload, Envelope, PlayerActionPayload, ProtocolError};

fn default_cli() -> Cli {
    Cli {
        host: "0.0.0.0".into(),
        port: 5000,
        players: 2,
        timeout: 30,
        blind: 10,
        blind_multiplier: 1.0,
        blind_increase_interval: 0,
        sim: false,
        sim_rounds: 6,
        debug: false,
        log_file: None,
        output_dir: ".".into(),
    }
}

#[test]
fn rejects_a_one_player_table() {
    let cli = Cli { players: 1, ..default_cli() };
    let error = Config::try_from(cli).unwrap_err();
    assert!(matches!(error, ConfigError::TooFewPlayers(1)));
}

#[test]
fn rejects_a_non_positive_blind_multiplier() {
    let cli = Cli { blind_multiplier: 0.0, ..default_cli() };
    assert!(matches!(Config::try_from(cli), Err(ConfigError::NonPositiveMultiplier(_))));
}

#[test]
fn rejects_a_blind_too_small_to_halve() {
    let cli = Cli { blind: 1, ..default_cli() };
    assert!(matches!(Config::try_from(cli), Err(ConfigError::BlindTooSmall(1))));
}

#[test]
fn valid_cli_produces_a_matching_config() {
    let config = Config::try_from(default_cli()).unwrap();
    assert_eq!(config.players, 2);
    assert_eq!(config.blind, 10);
}

#[test]
fn decode_rejects_an_envelope_of_the_wrong_kind() {
    let envelope = Envelope::new(kind::CONNECT, &ConnectPayload { seat: 0 }).unwrap();
    let line = serde_json::to_string(&envelope).unwrap();
    let result = decode::<PlayerActionPayload>(&line, kind::PLAYER_ACTION);
    assert!(matches!(result, Err(ProtocolError::UnexpectedKind(k)) if k == kind::CONNECT));
}

#[test]
fn decode_round_trips_a_player_action() {
    let sent = PlayerActionPayload { player_id: 3, action: "Raise".into(), amount: 250 };
    let envelope = Envelope::new(kind::PLAYER_ACTION, &sent).unwrap();
    let line = serde_json::to_string(&envelope).unwrap();
    let decoded: PlayerActionPayload = decode(&line, kind::PLAYER_ACTION).unwrap();
    assert_eq!(decoded.player_id, 3);
    assert_eq!(decoded.action, "Raise");
    assert_eq!(decoded.amount, 250);
}

#[tokio::test]
async fn accept_seats_claims_distinct_seats_and_forwards_actions() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (inbound_tx, inbound_rx) = sync_mpsc::channel::<InboundEvent>();

    let accept = tokio::spawn(async move { accept_seats(&listener, 2, inbound_tx).await.unwrap() });

    let mut client0 = TcpStream::connect(addr).await.unwrap();
    let connect0 = Envelope::new(kind::CONNECT, &ConnectPayload { seat: 0 }).unwrap();
    client0.write_all(format!("{}\n", serde_json::to_string(&connect0).unwrap()).as_bytes()).await.unwrap();

    let mut client1 = TcpStream::connect(addr).await.unwrap();
    let connect1 = Envelope::new(kind::CONNECT, &ConnectPayload { seat: 1 }).unwrap();
    client1.write_all(format!("{}\n", serde_json::to_string(&connect1).unwrap()).as_bytes()).await.unwrap();

    let seats = accept.await.unwrap();
    assert_eq!(seats.len(), 2);
    assert!(seats.contains_key(&0));
    assert!(seats.contains_key(&1));

    let action = Envelope::new(
        kind::PLAYER_ACTION,
        &PlayerActionPayload { player_id: 0, action: "Call".into(), amount: 0 },
    )
    .unwrap();
    client0.write_all(format!("{}\n", serde_json::to_string(&action).unwrap()).as_bytes()).await.unwrap();

    let event = tokio::task::spawn_blocking(move || inbound_rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .unwrap();
    match event {
        InboundEvent::PlayerAction { seat, payload } => {
            assert_eq!(seat, 0);
            assert_eq!(payload.action, "Call");
        }
        InboundEvent::Disconnected { .. } => panic!("expected a player action, got a disconnect"),
    }

    drop(client0);
    drop(client1);
}
