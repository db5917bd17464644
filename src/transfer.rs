use futures::{Stream, StreamExt};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use indicatif::HumanBytes;
use reqwest::{Client, StatusCode};
use std::io::{self, Write};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::TransferError;
use crate::hashing::{calculate_hash, hashes_match};
use crate::render::ProgressRenderer;
use crate::status::{ByteCounter, TransferStatus};
use crate::utils::{get_filename_from_url, temp_filepath, warning, FALLBACK_FILENAME};

#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub download_dir: PathBuf,
    pub interval: Duration,
    pub rate_limit: Option<u32>,
    pub sha256: Option<String>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            interval: Duration::from_secs(1),
            rate_limit: None,
            sha256: None,
        }
    }
}

/// Where a finished transfer ended up.
#[derive(Debug)]
pub struct TransferReport {
    pub filename: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub status: StatusCode,
    /// False when a non-OK status left the data under the temporary name.
    pub renamed: bool,
}

impl TransferReport {
    /// Closing line for the console: a success notice, or the non-OK status warning.
    pub fn message(&self) -> String {
        if self.renamed {
            format!(
                "The file {} has been successfully downloaded ({})",
                self.filename,
                HumanBytes(self.bytes)
            )
        } else {
            format!(
                "The response status is \"{}\". The resulting file name is \"{}\"",
                self.status,
                self.path.display()
            )
        }
    }
}

pub fn fallback_name_warning(filename: &str) -> String {
    format!("Failed to get a file name from the link so \"{}\" will be used", filename)
}

/// Token bucket over bytes per second.
pub struct Throttle {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    burst: NonZeroU32,
}

impl Throttle {
    pub fn per_second(limit: NonZeroU32) -> Self {
        Self {
            limiter: RateLimiter::direct(Quota::per_second(limit)),
            burst: limit,
        }
    }

    /// Waits until `len` bytes may pass; chunks above the burst go in burst-sized pieces.
    pub async fn admit(&self, len: usize) -> Result<(), TransferError> {
        let mut remaining = len;
        while remaining > 0 {
            let step = remaining.min(self.burst.get() as usize);
            if let Some(n) = NonZeroU32::new(step as u32) {
                self.limiter
                    .until_n_ready(n)
                    .await
                    .map_err(|e| TransferError::Copy(io::Error::new(io::ErrorKind::Other, e)))?;
            }
            remaining -= step;
        }
        Ok(())
    }
}

/// Copies `body` into `file`, mirroring every chunk into `counter` first.
/// Returns the number of bytes written.
pub async fn copy_body<S, B, E, F>(
    body: S,
    file: &mut F,
    counter: &ByteCounter,
    throttle: Option<&Throttle>,
) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
    F: AsyncWrite + Unpin,
{
    futures::pin_mut!(body);
    let mut copied: u64 = 0;

    while let Some(item) = body.next().await {
        let chunk = item.map_err(|e| TransferError::Copy(io::Error::new(io::ErrorKind::Other, e)))?;
        let chunk = chunk.as_ref();
        if chunk.is_empty() {
            continue;
        }

        if let Some(throttle) = throttle {
            throttle.admit(chunk.len()).await?;
        }

        counter.record(chunk);
        file.write_all(chunk).await.map_err(TransferError::Copy)?;
        copied += chunk.len() as u64;
    }

    file.flush().await.map_err(TransferError::Copy)?;
    Ok(copied)
}

/// Downloads one link into the download directory while drawing the progress table to `out`.
pub struct TransferDriver<W> {
    client: Client,
    options: TransferOptions,
    throttle: Option<Throttle>,
    out: W,
    warnings: Box<dyn Write + Send>,
}

impl<W: Write + Send + 'static> TransferDriver<W> {
    pub fn new(options: TransferOptions, out: W) -> Result<Self, TransferError> {
        let client = Client::builder()
            .user_agent(concat!("tabdl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let throttle = options
            .rate_limit
            .and_then(NonZeroU32::new)
            .map(Throttle::per_second);

        Ok(Self {
            client,
            options,
            throttle,
            out,
            warnings: Box::new(io::stderr()),
        })
    }

    /// Sends `[Warning]` lines to `sink` instead of stderr.
    pub fn with_warning_sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.warnings = Box::new(sink);
        self
    }

    pub async fn run(mut self, link: &str) -> Result<TransferReport, TransferError> {
        let mut filename = get_filename_from_url(link);
        if filename.is_empty() {
            filename = FALLBACK_FILENAME.to_string();
            warning(&mut self.warnings, fallback_name_warning(&filename));
        }

        let response = self.client.get(link).send().await?;
        let status_code = response.status();

        let temp_path = temp_filepath(&self.options.download_dir, &filename);
        let mut file = match File::create(&temp_path).await {
            Ok(file) => file,
            Err(source) => {
                drop(response);
                return Err(TransferError::CreateFile { path: temp_path, source });
            }
        };

        let status = Arc::new(TransferStatus::new(response.content_length()));
        let counter = ByteCounter::new(status.clone());
        let cancel = CancellationToken::new();
        let renderer = ProgressRenderer::new(status.clone(), filename.clone(), self.options.interval, self.out)
            .spawn(cancel.clone());

        let copied = copy_body(response.bytes_stream(), &mut file, &counter, self.throttle.as_ref()).await;
        drop(file);

        cancel.cancel();
        let renderer = join_renderer(renderer, &mut self.warnings).await;
        let bytes = copied?;

        status.set_expected(bytes);
        if let Some(mut renderer) = renderer {
            if let Err(e) = renderer.render_row() {
                warning(&mut self.warnings, format!("Failed to print progress: {}", e));
            }
        }

        if status_code != StatusCode::OK {
            let report = TransferReport {
                filename,
                path: temp_path,
                bytes,
                status: status_code,
                renamed: false,
            };
            warning(&mut self.warnings, report.message());
            return Ok(report);
        }

        if let Some(expected) = &self.options.sha256 {
            let actual = calculate_hash(&temp_path)
                .await
                .map_err(|source| TransferError::Verify { path: temp_path.clone(), source })?;
            if !hashes_match(expected, &actual) {
                return Err(TransferError::Checksum {
                    expected: expected.trim().to_string(),
                    actual,
                });
            }
        }

        let final_path = self.options.download_dir.join(&filename);
        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|source| TransferError::Rename {
                from: temp_path.clone(),
                to: final_path.clone(),
                source,
            })?;

        Ok(TransferReport {
            filename,
            path: final_path,
            bytes,
            status: status_code,
            renamed: true,
        })
    }
}

async fn join_renderer<W>(
    handle: JoinHandle<io::Result<ProgressRenderer<W>>>,
    warnings: &mut (dyn Write + Send),
) -> Option<ProgressRenderer<W>> {
    match handle.await {
        Ok(Ok(renderer)) => Some(renderer),
        Ok(Err(e)) => {
            warning(warnings, format!("Failed to print progress: {}", e));
            None
        }
        Err(e) => {
            warning(warnings, format!("Progress task failed: {}", e));
            None
        }
    }
}
