//! Per-seat network I/O: one reader task and one writer task per connected
//! seat (spec §5's "one task per connected seat"), talking newline-
//! delimited JSON (spec §9's framing decision, documented in SPEC_FULL.md).

use std::collections::BTreeMap;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use holdem_engine::SeatId;

use crate::protocol::{decode, kind, ConnectPayload, Envelope, PlayerActionPayload};

/// An event a reader task hands to the engine-facing arbiter. Crosses the
/// async/sync boundary over a `std::sync::mpsc` channel, since the engine
/// thread blocks on it rather than polling a future (spec §5/§9).
pub enum InboundEvent {
    PlayerAction { seat: SeatId, payload: PlayerActionPayload },
    Disconnected { seat: SeatId },
}

/// The engine's outbound handle to one connected seat: a fire-and-forget
/// queue (spec §5's "network writes are fire-and-forget from the engine's
/// perspective").
#[derive(Clone)]
pub struct SeatHandle {
    pub outbound: mpsc::UnboundedSender<Envelope>,
}

/// Accepts connections until `players` distinct seats have each sent a
/// well-formed CONNECT claiming an unclaimed seat id.
pub async fn accept_seats(
    listener: &TcpListener,
    players: usize,
    inbound_tx: std::sync::mpsc::Sender<InboundEvent>,
) -> anyhow::Result<BTreeMap<SeatId, SeatHandle>> {
    let mut seats: BTreeMap<SeatId, SeatHandle> = BTreeMap::new();
    while seats.len() < players {
        let (socket, addr) = listener.accept().await?;
        tracing::info!(%addr, "accepted connection");
        let (read_half, write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half).lines();

        let claimed = match lines.next_line().await {
            Ok(Some(line)) => match decode::<ConnectPayload>(&line, kind::CONNECT) {
                Ok(payload) => Some(payload.seat),
                Err(error) => {
                    tracing::warn!(%addr, %error, "malformed CONNECT");
                    None
                }
            },
            _ => None,
        };
        let Some(seat) = claimed else {
            tracing::warn!(%addr, "connection closed before sending a valid CONNECT; dropping");
            continue;
        };
        if seats.contains_key(&seat) {
            tracing::warn!(seat, %addr, "seat already claimed; dropping duplicate connection");
            continue;
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Envelope>();
        tokio::spawn(writer_task(write_half, outbound_rx));
        tokio::spawn(reader_task(seat, lines, inbound_tx.clone()));

        tracing::info!(seat, %addr, "seat claimed");
        seats.insert(seat, SeatHandle { outbound: outbound_tx });
    }
    Ok(seats)
}

async fn writer_task(mut writer: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Envelope>) {
    while let Some(envelope) = rx.recv().await {
        let Ok(mut line) = serde_json::to_string(&envelope) else {
            continue;
        };
        line.push('\n');
        if writer.write_all(line.as_bytes()).await.is_err() {
            break;
        }
    }
}

async fn reader_task(
    seat: SeatId,
    mut lines: Lines<BufReader<OwnedReadHalf>>,
    inbound_tx: std::sync::mpsc::Sender<InboundEvent>,
) {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match decode::<PlayerActionPayload>(&line, kind::PLAYER_ACTION) {
                Ok(payload) => {
                    let _ = inbound_tx.send(InboundEvent::PlayerAction { seat, payload });
                }
                Err(crate::protocol::ProtocolError::UnexpectedKind(other)) => {
                    tracing::debug!(seat, kind = other, "ignoring non-semantic inbound message");
                }
                Err(error) => tracing::warn!(seat, %error, "malformed message from seat"),
            },
            Ok(None) | Err(_) => {
                tracing::info!(seat, "seat disconnected");
                let _ = inbound_tx.send(InboundEvent::Disconnected { seat });
                break;
            }
        }
    }
}
