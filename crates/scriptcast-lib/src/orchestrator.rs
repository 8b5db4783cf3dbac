//! Synthesis orchestrator — segments → sequential provider calls → one buffer.
//!
//! Calls are awaited one at a time so the output is already in segment order.
//! The first provider failure aborts the request; nothing is retried and no
//! partial audio is returned.

use std::time::Duration;

use tracing::{error, info};

use scriptcast_core::types::Segment;

use crate::error::{Error, Result};
use crate::synth::Synthesizer;

/// Synthesize every segment in order and concatenate the audio.
///
/// An empty segment list yields an empty buffer without touching the
/// synthesizer.
pub async fn synthesize_all<S>(segments: &[Segment], credential: &str, synth: &S) -> Result<Vec<u8>>
where
    S: Synthesizer + ?Sized,
{
    if credential.trim().is_empty() {
        return Err(Error::MissingParameter("credential"));
    }

    let total = segments.len();
    let mut audio = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        info!(
            "segment {}/{total}: voice {} ({} chars)",
            index + 1,
            segment.voice_id,
            segment.text.len()
        );

        match synth.synthesize(&segment.voice_id, &segment.text, credential).await {
            Ok(chunk) => audio.extend_from_slice(&chunk),
            Err(failure) => {
                error!(
                    "segment {index} (line {}) failed: {:?} {}",
                    segment.line, failure.status, failure.body
                );
                return Err(Error::Provider {
                    index,
                    status: failure.status,
                    body: failure.body,
                });
            }
        }
    }

    info!("synthesized {total} segments, {} bytes", audio.len());
    Ok(audio)
}

/// [`synthesize_all`] bounded by a deadline. Expiry is a failure, never a
/// truncated buffer.
pub async fn synthesize_with_deadline<S>(
    segments: &[Segment],
    credential: &str,
    synth: &S,
    deadline: Duration,
) -> Result<Vec<u8>>
where
    S: Synthesizer + ?Sized,
{
    tokio::time::timeout(deadline, synthesize_all(segments, credential, synth))
        .await
        .map_err(|_| Error::DeadlineExceeded(deadline))?
}
