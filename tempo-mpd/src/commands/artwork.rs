use log::{debug, trace};

use crate::{
    codec::StrExt,
    config::ArtworkGetter,
    connection::Connection,
    errors::{ErrorCode, MpdError, MpdFailureResponse, MpdResult},
    from_mpd::{FromMpd, LineHandled},
    parser::is_terminator,
};

/// Header preceding each chunk of a binary response.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BinaryHeader {
    pub size: Option<usize>,
    pub mime_type: Option<String>,
    pub binary: Option<usize>,
}

impl FromMpd for BinaryHeader {
    fn next_internal(&mut self, key: &str, value: String) -> MpdResult<LineHandled> {
        match key {
            "size" => self.size = Some(value.parse()?),
            "type" => self.mime_type = Some(value),
            "binary" => self.binary = Some(value.parse()?),
            _ => return Ok(LineHandled::No { value }),
        }
        Ok(LineHandled::Yes)
    }
}

/// Downloads the whole picture for `file` chunk by chunk. `None` when MPD has
/// no picture for it. A failure part way through a chunk drops the session,
/// the rest of that chunk is never read.
pub(crate) async fn fetch_artwork(
    connection: &mut Connection,
    getter: ArtworkGetter,
    file: &str,
) -> MpdResult<Option<Vec<u8>>> {
    let result = fetch_chunks(connection, getter, file).await;
    if result.is_err() {
        connection.abandon_request();
    }
    result
}

async fn fetch_chunks(
    connection: &mut Connection,
    getter: ArtworkGetter,
    file: &str,
) -> MpdResult<Option<Vec<u8>>> {
    let quoted = file.quote_and_escape();
    let mut data: Vec<u8> = Vec::new();

    loop {
        let command = format!("{} {quoted} {}", getter.command(), data.len());
        connection.send(&[command]).await?;

        let header = match read_header(connection).await {
            Ok(Some(header)) => header,
            Ok(None) if data.is_empty() => return Ok(None),
            Ok(None) => {
                return Err(MpdError::Malformed(format!(
                    "Binary response for '{file}' ended without data at offset {}",
                    data.len()
                )));
            }
            Err(MpdError::Mpd(MpdFailureResponse { code: ErrorCode::NoExist, .. })) => {
                debug!(file, command = getter.command(); "No artwork found");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        // header is only returned once the binary key was seen
        let length = header.binary.unwrap_or_default();
        let chunk = connection.read_fixed_length_data(length).await?;
        data.extend_from_slice(&chunk);
        read_trailer(connection).await?;

        let size = header.size.unwrap_or(data.len());
        trace!(
            file, received = data.len(), size, mime_type:? = header.mime_type;
            "Received artwork chunk"
        );
        if length == 0 || data.len() >= size {
            break;
        }
    }

    Ok(Some(data))
}

/// Reads header lines up to and including `binary: N`. `None` when the
/// response completes without any binary payload.
async fn read_header(connection: &mut Connection) -> MpdResult<Option<BinaryHeader>> {
    let mut header = BinaryHeader::default();
    loop {
        let line = connection.read_line().await?;
        if line.starts_with("ACK") {
            connection.finish_request();
            return Err(MpdError::Mpd(MpdFailureResponse::from_ack_line(&line)));
        }
        if is_terminator(&line) {
            connection.finish_request();
            return Ok(None);
        }
        header.next(&line)?;
        if header.binary.is_some() {
            return Ok(Some(header));
        }
    }
}

/// Consumes the newline following the payload and the final `OK`.
async fn read_trailer(connection: &mut Connection) -> MpdResult<()> {
    let mut line = connection.read_line().await?;
    if line.is_empty() {
        line = connection.read_line().await?;
    }
    if line.starts_with("ACK") {
        connection.finish_request();
        return Err(MpdError::Mpd(MpdFailureResponse::from_ack_line(&line)));
    }
    if !line.starts_with("OK") {
        return Err(MpdError::Malformed(format!("Expected OK after binary data, got '{line}'")));
    }
    connection.finish_request();
    Ok(())
}
