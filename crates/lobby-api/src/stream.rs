//! Incremental text stream for the completion endpoint
//!
//! `POST /chat/stream` answers with a chunked plain-text body. This module
//! turns the byte stream into UTF-8 text fragments, carrying incomplete
//! multi-byte sequences over to the next chunk so fragment boundaries never
//! split a character.

use std::pin::Pin;

use async_stream::stream;
use futures::StreamExt;
use tokio_stream::Stream;

use crate::error::{Error, Result};

/// A stream of decoded text fragments from a completion response
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Build a fragment stream from a streaming HTTP response
pub fn text_fragments(response: reqwest::Response) -> CompletionStream {
    let mut bytes = response.bytes_stream();

    Box::pin(stream! {
        let mut decoder = FragmentDecoder::default();

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    let fragment = decoder.push(&chunk);
                    if !fragment.is_empty() {
                        yield Ok(fragment);
                    }
                }
                Err(e) => {
                    yield Err(Error::Http(e));
                    return;
                }
            }
        }

        match decoder.finish() {
            Ok(rest) => {
                if !rest.is_empty() {
                    yield Ok(rest);
                }
            }
            Err(e) => yield Err(e),
        }
    })
}

/// Streaming UTF-8 decoder that buffers a trailing partial character.
#[derive(Debug, Default)]
pub struct FragmentDecoder {
    pending: Vec<u8>,
}

impl FragmentDecoder {
    /// Decode a chunk, returning all complete characters seen so far.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                text
            }
            Err(e) => {
                let valid = e.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.pending.drain(..valid);
                text
            }
        }
    }

    /// Flush at end of stream. Leftover bytes mean the body was truncated
    /// mid-character.
    pub fn finish(self) -> Result<String> {
        if self.pending.is_empty() {
            Ok(String::new())
        } else {
            Err(Error::StreamDecode(format!(
                "{} dangling byte(s) at end of stream",
                self.pending.len()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_chunks_pass_through() {
        let mut decoder = FragmentDecoder::default();
        assert_eq!(decoder.push(b"hello "), "hello ");
        assert_eq!(decoder.push(b"world"), "world");
        assert_eq!(decoder.finish().unwrap(), "");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        // "héllo" with the two-byte é split between chunks
        let bytes = "h\u{e9}llo".as_bytes();
        let mut decoder = FragmentDecoder::default();
        let first = decoder.push(&bytes[..2]); // 'h' + first byte of é
        let second = decoder.push(&bytes[2..]);
        assert_eq!(first, "h");
        assert_eq!(format!("{}{}", first, second), "héllo");
    }

    #[test]
    fn test_four_byte_char_split_three_ways() {
        let bytes = "a\u{1F600}b".as_bytes(); // 😀 is 4 bytes
        let mut decoder = FragmentDecoder::default();
        let mut out = String::new();
        out.push_str(&decoder.push(&bytes[..2]));
        out.push_str(&decoder.push(&bytes[2..4]));
        out.push_str(&decoder.push(&bytes[4..]));
        assert_eq!(out, "a\u{1F600}b");
        assert_eq!(decoder.finish().unwrap(), "");
    }

    #[test]
    fn test_truncated_stream_reports_dangling_bytes() {
        let bytes = "\u{1F600}".as_bytes();
        let mut decoder = FragmentDecoder::default();
        assert_eq!(decoder.push(&bytes[..2]), "");
        assert!(decoder.finish().is_err());
    }

    #[test]
    fn test_empty_chunks_yield_empty_fragments() {
        let mut decoder = FragmentDecoder::default();
        assert_eq!(decoder.push(b""), "");
        assert_eq!(decoder.finish().unwrap(), "");
    }
}
