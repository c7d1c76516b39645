use crate::protocol::framing::{read_message, write_message};
use crate::protocol::message::{QueryRequest, QueryResponse};
use std::io;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Point-to-point request/reply channel to one data server.
///
/// The protocol is strict turn-taking: one request yields exactly one
/// response before the channel may be reused. `exchange` enforces that with
/// an explicit in-flight check rather than relying on callers; the
/// federator additionally opens one channel per dispatched query.
pub struct Channel {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: String,
    awaiting_reply: bool,
}

impl Channel {
    pub async fn connect(address: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        Ok(Self::from_stream(stream, address.to_string()))
    }

    pub fn from_stream(stream: TcpStream, peer: String) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer,
            awaiting_reply: false,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Send one request and block on its reply.
    pub async fn exchange(&mut self, request: &QueryRequest) -> io::Result<QueryResponse> {
        if self.awaiting_reply {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "request already in flight on this channel",
            ));
        }

        self.awaiting_reply = true;
        write_message(&mut self.writer, request).await?;

        let response = read_message(&mut self.reader).await?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("server {} closed the channel before replying", self.peer),
            )
        })?;
        self.awaiting_reply = false;
        Ok(response)
    }
}
