// ABOUTME: Raw event feed read straight off the daemon's /events endpoint.
// ABOUTME: Each JSON line becomes an untyped Event, so fields the client has no model for survive.

use crate::addr::Addr;
use crate::events::Event;
use crate::runtime::traits::{EventError, EventFeed};
use crate::upstream;
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1::SendRequest;
use hyper::header::HOST;
use hyper::Request;

/// Unversioned path; the daemon answers with its own default API version.
pub const EVENTS_PATH: &str = "/events";

/// Splits a byte stream into newline-terminated lines.
///
/// Blank lines are skipped. Bytes after the last terminator stay buffered
/// until more data arrives or `finish` is called.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        loop {
            let end = self.buf.iter().position(|&b| b == b'\n')?;
            let line: Vec<u8> = self.buf.drain(..=end).collect();
            let line = line.trim_ascii();
            if !line.is_empty() {
                return Some(line.to_vec());
            }
        }
    }

    /// Whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buf);
        let rest = rest.trim_ascii();
        (!rest.is_empty()).then(|| rest.to_vec())
    }
}

fn decode(line: &[u8]) -> Result<Event, EventError> {
    Ok(Event::from_value(serde_json::from_slice(line)?))
}

/// Subscribe to the feed at `addr`.
///
/// A failure to open the subscription is reported as one error item,
/// after which the feed ends.
pub fn subscribe(addr: Addr) -> EventFeed {
    let feed = futures::stream::once(async move { open(&addr).await }).flat_map(|opened| {
        match opened {
            Ok(lines) => lines.into_stream().boxed(),
            Err(e) => futures::stream::iter([Err(e)]).boxed(),
        }
    });
    Box::pin(feed)
}

async fn open(addr: &Addr) -> Result<Lines, EventError> {
    let mut sender = upstream::connect::<Empty<Bytes>>(addr)
        .await
        .map_err(|e| EventError::Stream(e.to_string()))?;

    let request = Request::get(EVENTS_PATH)
        .header(HOST, "docker")
        .body(Empty::new())
        .map_err(|e| EventError::Stream(e.to_string()))?;
    let response = sender
        .send_request(request)
        .await
        .map_err(|e| EventError::Stream(e.to_string()))?;

    if !response.status().is_success() {
        return Err(EventError::Stream(format!(
            "GET {} returned {}",
            EVENTS_PATH,
            response.status()
        )));
    }

    Ok(Lines {
        body: response.into_body(),
        decoder: LineDecoder::default(),
        _sender: sender,
        done: false,
    })
}

/// An open `/events` response being cut into events.
struct Lines {
    body: Incoming,
    decoder: LineDecoder,
    // Held so the connection stays up for as long as the body is read.
    _sender: SendRequest<Empty<Bytes>>,
    done: bool,
}

impl Lines {
    fn into_stream(self) -> impl futures::Stream<Item = Result<Event, EventError>> + Send {
        futures::stream::unfold(self, |mut lines| async move {
            loop {
                if let Some(line) = lines.decoder.next_line() {
                    return Some((decode(&line), lines));
                }
                if lines.done {
                    return None;
                }

                match lines.body.frame().await {
                    Some(Ok(frame)) => {
                        if let Ok(data) = frame.into_data() {
                            lines.decoder.push(&data);
                        }
                    }
                    Some(Err(e)) => {
                        lines.done = true;
                        return Some((Err(EventError::Stream(e.to_string())), lines));
                    }
                    None => {
                        lines.done = true;
                        let rest = lines.decoder.finish()?;
                        return Some((decode(&rest), lines));
                    }
                }
            }
        })
    }
}
