// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Background stdin reader.
//
// A dedicated thread reads raw bytes from stdin and sends chunks
// through a standard channel. The event loop receives them with
// `recv_timeout`, which is what makes the hybrid block-or-tick model
// possible: `read()` on stdin blocks, and the loop must stay free for
// rendering, resize handling, and the escape-sequence timeout.
//
// Shutdown: the thread `poll(2)`s stdin with a short timeout and
// checks an atomic stop flag between polls, so it exits promptly
// instead of sitting in a blocking read forever.

#[cfg(unix)]
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Read chunk size. A keypress is 1–6 bytes; held-key repeat bursts
/// stay well under 1 KB.
const READ_BUF_SIZE: usize = 1024;

/// Poll timeout between stop-flag checks (milliseconds). Bounds
/// shutdown latency.
const POLL_TIMEOUT_MS: i32 = 50;

/// Handle to the background reader thread.
///
/// Spawn with [`spawn`](Self::spawn); the thread runs until
/// [`stop`](Self::stop) is called or the handle is dropped.
pub struct StdinReader {
    /// Thread handle. `None` once `stop()` has joined it.
    handle: Option<JoinHandle<()>>,
    /// Shared exit flag.
    stop: Arc<AtomicBool>,
}

impl StdinReader {
    /// Spawn the reader thread.
    ///
    /// Returns the handle and the receiving end of the byte channel.
    /// Every received `Vec<u8>` is a non-empty chunk of raw stdin
    /// data; the channel closes on stop or stdin EOF.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to spawn a thread.
    #[must_use]
    pub fn spawn() -> (Self, Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || Self::run(&tx, &flag))
            .expect("failed to spawn stdin reader thread");

        (
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        )
    }

    /// Signal the thread to exit and join it. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// The reader thread: poll, read, send, repeat.
    #[cfg(unix)]
    fn run(tx: &mpsc::Sender<Vec<u8>>, stop: &AtomicBool) {
        use std::os::unix::io::AsRawFd;

        let fd = io::stdin().as_raw_fd();
        let mut buf = [0u8; READ_BUF_SIZE];

        while !stop.load(Ordering::Relaxed) {
            let ready = unsafe {
                let mut pfd = libc::pollfd {
                    fd,
                    events: libc::POLLIN,
                    revents: 0,
                };
                libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS)
            };

            if ready <= 0 {
                // Timeout or EINTR: check the stop flag and poll again.
                continue;
            }

            let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n <= 0 {
                // EOF or read error: nothing more will arrive.
                break;
            }

            #[allow(clippy::cast_sign_loss)] // n > 0 checked above.
            let chunk = buf[..n as usize].to_vec();
            if tx.send(chunk).is_err() {
                // Receiver dropped.
                break;
            }
        }
    }

    /// Blocking-read fallback for non-unix targets. Shutdown is less
    /// graceful (the thread may sit in one last read), but functional.
    #[cfg(not(unix))]
    fn run(tx: &mpsc::Sender<Vec<u8>>, stop: &AtomicBool) {
        use std::io::Read;

        let stdin = std::io::stdin();
        let mut buf = [0u8; READ_BUF_SIZE];

        while !stop.load(Ordering::Relaxed) {
            match stdin.lock().read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for StdinReader {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn spawn_and_stop() {
        // stdin is not a terminal under the test harness, but spawning
        // and stopping must neither panic nor hang.
        let (mut reader, _rx) = StdinReader::spawn();
        reader.stop();
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut reader, _rx) = StdinReader::spawn();
        reader.stop();
        reader.stop();
    }

    #[test]
    fn drop_stops_the_thread() {
        let (reader, _rx) = StdinReader::spawn();
        drop(reader); // Must not hang.
    }

    #[test]
    fn channel_closes_after_stop() {
        let (mut reader, rx) = StdinReader::spawn();
        reader.stop();
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
