//! Building `rodio` sinks over an already fetched resource.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, Sink, Source};

/// Create a paused `Sink` over `bytes` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    bytes: &Arc<[u8]>,
    start_at: Duration,
    volume: f32,
) -> Result<Sink, DecoderError> {
    let source = Decoder::new(Cursor::new(Arc::clone(bytes)))?
        // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
        .skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.pause();
    sink.set_volume(volume);
    sink.append(source);
    Ok(sink)
}
