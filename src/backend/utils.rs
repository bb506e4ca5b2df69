#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;

use futures::{Stream, StreamExt};

use super::ChunkStream;

/// Incremental UTF-8 decoder. A multi-byte character split across two
/// chunks is held back until its remaining bytes arrive.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        // Incomplete trailing sequence
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }

    /// Flush whatever is still held back.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Turn a byte stream into a [`ChunkStream`]. Empty decodes are skipped and
/// the first read error is yielded once, ending the stream.
pub fn decode_stream<S, B, E>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = (body.boxed(), Utf8Decoder::default(), false);
    futures::stream::unfold(state, |(mut body, mut decoder, done)| async move {
        if done {
            return None;
        }
        loop {
            match body.next().await {
                Some(Ok(bytes)) => {
                    let text = decoder.decode(bytes.as_ref());
                    if !text.is_empty() {
                        return Some((Ok(text), (body, decoder, false)));
                    }
                }
                Some(Err(err)) => {
                    let err = eyre::Report::new(err).wrap_err("reading response stream");
                    return Some((Err(err), (body, decoder, true)));
                }
                None => {
                    let rest = decoder.finish();
                    if rest.is_empty() {
                        return None;
                    }
                    return Some((Ok(rest), (body, decoder, true)));
                }
            }
        }
    })
    .boxed()
}
