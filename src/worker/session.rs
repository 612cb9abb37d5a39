use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, TransportError};
use crate::protocol::{
    FrameReader, FrameWriter, InboundMessage, OutboundMessage, close_writer, decode_inbound,
    encode_outbound, read_frame, split_stream, write_frame,
};
use crate::shutdown::ShutdownReceiver;
use crate::stats::{REPORT_QUEUE_CAPACITY, Reporter, STATS_EVENT_CAPACITY, spawn_stats_collector};

use super::context::WorkerContext;
use super::controller::{Controller, ControllerExit};
use super::rate::RateLimiter;
use super::settings::WorkerSettings;
use super::user::UserFactory;

const OUTBOUND_QUEUE_CAPACITY: usize = 100;
const INBOUND_QUEUE_CAPACITY: usize = 16;

/// How a worker session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The master sent `quit`; the process should exit immediately.
    MasterQuit,
    /// Local shutdown; the master was told and the connection closed cleanly.
    LocalShutdown,
}

/// Connects to the master and runs the worker until it quits.
///
/// # Errors
///
/// Returns an error when the connection cannot be established or fails while
/// running. There is no reconnect.
pub async fn run_worker<TFactory>(
    settings: &WorkerSettings,
    factory: TFactory,
    shutdown_rx: ShutdownReceiver,
) -> AppResult<WorkerExit>
where
    TFactory: UserFactory,
{
    info!(
        "Connecting to master {} over {} as {}.",
        settings.master_addr,
        settings.transport.as_str(),
        settings.node_id
    );
    let stream = TcpStream::connect(&settings.master_addr)
        .await
        .map_err(|err| {
            AppError::transport(TransportError::Connection {
                addr: settings.master_addr.clone(),
                source: err,
            })
        })?;
    stream.set_nodelay(true).map_err(|err| {
        AppError::transport(TransportError::Io {
            context: "set TCP_NODELAY",
            source: err,
        })
    })?;
    info!("Connected to master {}.", settings.master_addr);
    let (reader, writer) = split_stream(stream);

    let (events_tx, events_rx) = mpsc::channel(STATS_EVENT_CAPACITY);
    let (report_tx, reports_rx) = mpsc::channel(REPORT_QUEUE_CAPACITY);
    let collector_handle = spawn_stats_collector(events_rx, report_tx, settings.stats_interval);

    let rate_limiter = settings.max_rps.map(|cap| {
        info!("Max RPS that this worker may generate is limited to {}.", cap.get());
        RateLimiter::start(cap.get())
    });
    let context = WorkerContext::new(&settings.node_id, Reporter::new(events_tx), rate_limiter);

    let (out_tx, out_rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_QUEUE_CAPACITY);
    let mut writer_handle = tokio::spawn(write_loop(writer, out_rx, context.node_id_shared()));
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
    let reader_handle = tokio::spawn(read_loop(reader, inbound_tx));

    let controller = Controller::new(context, Arc::new(factory), out_tx.clone());

    let outcome = tokio::select! {
        exit = controller.run(inbound_rx, reports_rx, shutdown_rx) => exit,
        joined = &mut writer_handle => Err(writer_stopped(joined)),
    };

    let result = match outcome {
        Ok(ControllerExit::MasterQuit) => {
            writer_handle.abort();
            Ok(WorkerExit::MasterQuit)
        }
        Ok(ControllerExit::LocalShutdown) => {
            disconnect(out_tx, writer_handle).await.map(|()| WorkerExit::LocalShutdown)
        }
        Err(err) => {
            writer_handle.abort();
            Err(err)
        }
    };
    reader_handle.abort();
    collector_handle.abort();
    result
}

/// Sends `quit` and waits until the writer has flushed it and closed the
/// connection.
async fn disconnect(
    out_tx: mpsc::Sender<OutboundMessage>,
    writer_handle: JoinHandle<AppResult<()>>,
) -> AppResult<()> {
    info!("Notifying master of shutdown.");
    out_tx
        .send(OutboundMessage::Quit)
        .await
        .map_err(|_err| AppError::transport(TransportError::OutboundChannelClosed))?;
    drop(out_tx);
    match writer_handle.await {
        Ok(Ok(())) => {
            info!("Disconnected from master.");
            Ok(())
        }
        Ok(Err(err)) => Err(err),
        Err(err) => {
            warn!("Writer task failed before disconnect: {}", err);
            Err(AppError::transport(TransportError::DisconnectUnconfirmed))
        }
    }
}

fn writer_stopped(joined: Result<AppResult<()>, tokio::task::JoinError>) -> AppError {
    match joined {
        Ok(Err(err)) => err,
        Ok(Ok(())) => AppError::transport(TransportError::OutboundChannelClosed),
        Err(err) => AppError::from(err),
    }
}

async fn write_loop(
    mut writer: FrameWriter,
    mut out_rx: mpsc::Receiver<OutboundMessage>,
    node_id: Arc<str>,
) -> AppResult<()> {
    while let Some(message) = out_rx.recv().await {
        let body = encode_outbound(&message, &node_id)?;
        write_frame(&mut writer, body).await?;
        debug!("Sent {} to master.", message.message_type());
    }
    close_writer(&mut writer).await
}

async fn read_loop(mut reader: FrameReader, inbound_tx: mpsc::Sender<AppResult<InboundMessage>>) {
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(err) => {
                if inbound_tx.send(Err(err)).await.is_err() {
                    debug!("Controller gone; stopping reader.");
                }
                break;
            }
        };
        match decode_inbound(&frame) {
            Ok(message) => {
                if inbound_tx.send(Ok(message)).await.is_err() {
                    break;
                }
            }
            Err(err) => warn!("Ignoring undecodable message from master: {}", err),
        }
    }
}
