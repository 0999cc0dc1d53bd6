//! [`InputSource`] over any byte stream speaking the line protocol
//! (UART console on the board, stdin or a pipe on the host).
//!
//! A small reader thread blocks on the stream and hands parsed events to
//! the IO executor through a bounded channel, so `poll_event` never
//! blocks.  End of stream or a read error is reported once as
//! [`InputError::Disconnected`] and sticks.

use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info};

use crate::app::ports::InputSource;
use crate::drivers::task_pin::{Core, spawn_on_core};
use crate::error::{Error, InputError};
use crate::input::InputEvent;
use crate::input::line_protocol::parse_line;

const LINE_QUEUE_DEPTH: usize = 16;

type LineQueue = Channel<CriticalSectionRawMutex, Result<InputEvent, InputError>, LINE_QUEUE_DEPTH>;

/// The reader thread is detached.  It blocks inside `read` on the
/// console, which has no portable cancellation, so it cannot be joined
/// by the runtime's shutdown.  It owns nothing but its end of the queue
/// and touches no actuator; it exits at end of stream, or stays parked
/// until reset.
pub struct LineInput {
    queue: Arc<LineQueue>,
    disconnected: bool,
}

impl LineInput {
    /// Start the reader thread over `reader`.
    pub fn spawn<R: Read + Send + 'static>(reader: R) -> Result<Self, Error> {
        let queue: Arc<LineQueue> = Arc::new(Channel::new());
        let tx = Arc::clone(&queue);
        // Detached, see the type docs.
        let _reader = spawn_on_core(Core::Pro, 5, 6, "line-input\0", move || read_lines(reader, &tx))
            .map_err(|_| Error::Init("line input thread spawn failed"))?;
        Ok(Self { queue, disconnected: false })
    }
}

fn read_lines<R: Read>(reader: R, tx: &LineQueue) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        let item = match lines.next() {
            Some(Ok(line)) => match parse_line(&line) {
                Ok(Some(event)) => Ok(event),
                Ok(None) => continue,
                Err(e) => {
                    debug!("INPUT | bad line {:?}", line);
                    Err(e)
                }
            },
            Some(Err(e)) => {
                info!("INPUT | read error: {}", e);
                Err(InputError::Disconnected)
            }
            None => {
                info!("INPUT | end of stream");
                Err(InputError::Disconnected)
            }
        };
        let last = item == Err(InputError::Disconnected);
        // Blocks while the executor is behind; that is the backpressure.
        futures_lite::future::block_on(tx.send(item));
        if last {
            return;
        }
    }
}

impl InputSource for LineInput {
    fn poll_event(&mut self) -> Result<Option<InputEvent>, InputError> {
        if self.disconnected {
            return Err(InputError::Disconnected);
        }
        match self.queue.try_receive() {
            Ok(Ok(event)) => Ok(Some(event)),
            Ok(Err(InputError::Disconnected)) => {
                self.disconnected = true;
                Err(InputError::Disconnected)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }
}
