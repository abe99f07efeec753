use tether_shared::{
    game_msg, ByteReader, ByteWriter, ConnectionId, ElementInfo, RpcTarget, Serde, SerdeErr,
};

/// Decoded client-to-server call envelope. `args` borrows the raw argument
/// bytes straight out of the message body: they are forwarded opaque and
/// never interpreted here.
pub(crate) struct CallEnvelope<'a> {
    pub target: RpcTarget,
    /// Only meaningful when `target` is [`RpcTarget::Target`].
    pub target_connection: ConnectionId,
    pub info: ElementInfo,
    pub args: &'a [u8],
}

impl<'a> CallEnvelope<'a> {
    pub(crate) fn de(reader: &mut ByteReader<'a>) -> Result<Self, SerdeErr> {
        let target = RpcTarget::de(reader)?;
        let target_connection = if target == RpcTarget::Target {
            reader.read_packed_u64()?
        } else {
            0
        };
        let info = ElementInfo::de(reader)?;
        let args = reader.take_remaining();
        Ok(Self {
            target,
            target_connection,
            info,
            args,
        })
    }
}

/// Builds the client-to-server call packet.
pub(crate) fn client_call_packet(
    target: RpcTarget,
    target_connection: ConnectionId,
    info: &ElementInfo,
    args: &[u8],
) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u16(game_msg::CLIENT_CALL_FUNCTION);
    target.ser(&mut writer);
    if target == RpcTarget::Target {
        writer.write_packed_u64(target_connection);
    }
    info.ser(&mut writer);
    writer.write_bytes(args);
    writer.to_bytes()
}

/// Builds the server-to-client call packet forwarded to addressed peers.
pub(crate) fn server_call_packet(info: &ElementInfo, args: &[u8]) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u16(game_msg::SERVER_CALL_FUNCTION);
    info.ser(&mut writer);
    writer.write_bytes(args);
    writer.to_bytes()
}
