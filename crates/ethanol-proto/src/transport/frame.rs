// ── Framing ──
//
// One connection carries one message in each direction. The reader
// learns the frame length from the header: first the fixed prefix up to
// `version_len`, then the rest of the header, then `total_size` bytes.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{
    MAX_MESSAGE_SIZE, Schema, decode_header, header_len_from_prefix, header_prefix_len,
};
use crate::error::Error;

/// Read bytes until `buf` holds at least `want` of them. Returns `false`
/// if the peer closed the stream first.
async fn fill<S: AsyncRead + Unpin>(
    stream: &mut S,
    buf: &mut BytesMut,
    want: usize,
) -> Result<bool, Error> {
    while buf.len() < want {
        buf.reserve(want - buf.len());
        if stream.read_buf(buf).await? == 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Read one complete message frame.
///
/// Returns `Ok(None)` if the peer closed the connection without sending
/// anything. A frame cut short by EOF is returned as-is so the decoder
/// can report it as malformed. Frames whose declared size is 0 (legacy
/// senders) end after at most one read past the header.
pub async fn read_frame<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Option<Bytes>, Error> {
    let mut buf = BytesMut::with_capacity(1024);

    if !fill(stream, &mut buf, header_prefix_len()).await? {
        return Ok((!buf.is_empty()).then(|| buf.freeze()));
    }

    let header_len = header_len_from_prefix(&buf)
        .ok_or_else(|| Error::malformed("header prefix unavailable"))?;
    if header_len > MAX_MESSAGE_SIZE {
        return Err(Error::malformed(format!(
            "header of {header_len} bytes exceeds {MAX_MESSAGE_SIZE}"
        )));
    }
    if !fill(stream, &mut buf, header_len).await? {
        return Ok(Some(buf.freeze()));
    }

    let size_at = header_len - 4;
    let raw_size = buf
        .get(size_at..header_len)
        .and_then(|raw| raw.try_into().ok())
        .map(i32::from_le_bytes)
        .ok_or_else(|| Error::malformed("header truncated before total size"))?;
    let total = usize::try_from(raw_size)
        .map_err(|_| Error::malformed(format!("negative total size {raw_size}")))?;
    if total > MAX_MESSAGE_SIZE {
        return Err(Error::malformed(format!(
            "declared size {total} exceeds {MAX_MESSAGE_SIZE}"
        )));
    }
    if total == 0 {
        read_legacy_payload(stream, &mut buf, header_len).await?;
        return Ok(Some(buf.freeze()));
    }

    fill(stream, &mut buf, total).await?;
    if buf.len() > total {
        buf.truncate(total);
    }
    Ok(Some(buf.freeze()))
}

/// Legacy senders leave `total_size` at 0, so the payload length is
/// unknown. If nothing beyond the header has arrived yet, take one more
/// read of up to `MAX_MESSAGE_SIZE` bytes. Header-only types never wait.
async fn read_legacy_payload<S: AsyncRead + Unpin>(
    stream: &mut S,
    buf: &mut BytesMut,
    header_len: usize,
) -> Result<(), Error> {
    let header_only =
        decode_header(&buf[..]).is_ok_and(|h| h.message_type.schema() == Schema::Empty);
    if buf.len() > header_len || header_only {
        return Ok(());
    }
    buf.reserve(MAX_MESSAGE_SIZE - buf.len());
    stream.read_buf(buf).await?;
    buf.truncate(MAX_MESSAGE_SIZE);
    Ok(())
}

/// Write one frame and flush it.
pub async fn write_frame<S: AsyncWrite + Unpin>(stream: &mut S, frame: &[u8]) -> Result<(), Error> {
    stream.write_all(frame).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::schema::{CurrentChannel, Empty, Hello};
    use crate::codec::{Message, MessageType, Payload, decode, encode};
    use tokio_test::io::Builder;

    fn channel_reply() -> Bytes {
        encode(&Message::new(
            MessageType::GetCurrentChannel,
            3,
            Payload::CurrentChannel(CurrentChannel {
                intf_name: "wlan0".into(),
                channel: 6,
                frequency: 2437,
                ..CurrentChannel::default()
            }),
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn reads_frame_delivered_in_pieces() {
        let bytes = channel_reply();
        let mut stream = Builder::new()
            .read(&bytes[..5])
            .read(&bytes[5..20])
            .read(&bytes[20..])
            .build();
        let frame = read_frame(&mut stream).await.unwrap().unwrap();
        assert_eq!(frame, bytes);
        assert_eq!(decode(&frame).unwrap().id, 3);
    }

    #[tokio::test]
    async fn empty_stream_yields_none() {
        let mut stream = Builder::new().build();
        assert!(read_frame(&mut stream).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn trailing_bytes_are_dropped() {
        let bytes = channel_reply();
        let mut padded = bytes.to_vec();
        padded.extend_from_slice(&[0xee; 8]);
        let mut stream = Builder::new().read(&padded).build();
        let frame = read_frame(&mut stream).await.unwrap().unwrap();
        assert_eq!(frame.len(), bytes.len());
    }

    #[tokio::test]
    async fn oversized_declaration_is_rejected() {
        let mut bytes = channel_reply().to_vec();
        bytes[17..21].copy_from_slice(&100_000_i32.to_le_bytes());
        let mut stream = Builder::new().read(&bytes).build();
        assert!(matches!(
            read_frame(&mut stream).await,
            Err(Error::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn legacy_zero_size_returns_what_arrived() {
        let msg = Message::new(
            MessageType::Hello,
            1,
            Payload::Hello(Hello {
                device_type: 1,
                tcp_port: 22222,
                rtt: 0.0,
            }),
        );
        let mut bytes = encode(&msg).unwrap().to_vec();
        bytes[17..21].copy_from_slice(&[0; 4]);
        let mut stream = Builder::new().read(&bytes).build();
        let frame = read_frame(&mut stream).await.unwrap().unwrap();
        assert_eq!(decode(&frame).unwrap(), msg);
    }

    #[tokio::test]
    async fn legacy_zero_size_payload_in_second_read() {
        let msg = Message::new(
            MessageType::Hello,
            2,
            Payload::Hello(Hello {
                device_type: 2,
                tcp_port: 22223,
                rtt: 0.5,
            }),
        );
        let mut bytes = encode(&msg).unwrap().to_vec();
        bytes[17..21].copy_from_slice(&[0; 4]);
        let mut stream = Builder::new().read(&bytes[..21]).read(&bytes[21..]).build();
        let frame = read_frame(&mut stream).await.unwrap().unwrap();
        assert_eq!(frame.len(), bytes.len());
        assert_eq!(decode(&frame).unwrap(), msg);
    }

    #[tokio::test]
    async fn legacy_header_only_frame_decodes() {
        let msg = Message::new(MessageType::TosCleanAll, 4, Payload::Empty(Empty {}));
        let mut bytes = encode(&msg).unwrap().to_vec();
        bytes[17..21].copy_from_slice(&[0; 4]);
        let mut stream = Builder::new().read(&bytes).build();
        let frame = read_frame(&mut stream).await.unwrap().unwrap();
        assert_eq!(decode(&frame).unwrap(), msg);
    }

    #[tokio::test]
    async fn short_frame_is_returned_for_decoder() {
        let bytes = channel_reply();
        let mut stream = Builder::new().read(&bytes[..bytes.len() - 2]).build();
        let frame = read_frame(&mut stream).await.unwrap().unwrap();
        assert!(matches!(decode(&frame), Err(Error::Malformed { .. })));
    }

    #[tokio::test]
    async fn write_frame_sends_all_bytes() {
        let bytes = channel_reply();
        let mut stream = Builder::new().write(&bytes).build();
        write_frame(&mut stream, &bytes).await.unwrap();
    }
}
