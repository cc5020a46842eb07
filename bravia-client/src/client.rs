//! High-level client API.

use crate::connection::{Connection, ConnectionConfig, ConnectionState};
use crate::error::ClientError;
use bravia_protocol::{CommandCode, Frame, FrameKind, InputType, IrCode, Parameters};
use std::sync::Arc;
use tokio::sync::broadcast;

/// High-level client for one display.
pub struct Client {
    conn: Arc<Connection>,
}

impl Client {
    /// Creates a new client with the given configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            conn: Arc::new(Connection::new(config)),
        }
    }

    /// Connects to the device and starts the background reader.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.conn.start().await
    }

    /// Returns whether the client is connected.
    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    /// Subscribes to device notifications and connectivity changes.
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.conn.subscribe()
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.conn.close().await
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> Arc<Connection> {
        self.conn.clone()
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    async fn control(&self, frame: Frame) -> Result<(), ClientError> {
        let answer = self.conn.execute(&frame).await?;
        answer.as_error()?;
        Ok(())
    }

    async fn enquire(&self, command: CommandCode) -> Result<Frame, ClientError> {
        self.conn.execute(&Frame::enquiry(command)).await
    }

    // =========================================================================
    // Power
    // =========================================================================

    pub async fn set_power_status(&self, on: bool) -> Result<(), ClientError> {
        self.control(Frame::bool(FrameKind::Control, CommandCode::POWER, on))
            .await
    }

    /// Returns true if the display is on.
    pub async fn power_status(&self) -> Result<bool, ClientError> {
        Ok(self.enquire(CommandCode::POWER).await?.as_bool()?)
    }

    pub async fn toggle_power(&self) -> Result<(), ClientError> {
        self.control(Frame::new(
            FrameKind::Control,
            CommandCode::TOGGLE_POWER,
            Parameters::EMPTY,
        ))
        .await
    }

    // =========================================================================
    // Audio
    // =========================================================================

    pub async fn set_audio_volume(&self, volume: u32) -> Result<(), ClientError> {
        let frame = Frame::int(FrameKind::Control, CommandCode::VOLUME, volume)?;
        self.control(frame).await
    }

    pub async fn audio_volume(&self) -> Result<u32, ClientError> {
        Ok(self.enquire(CommandCode::VOLUME).await?.as_int()?)
    }

    pub async fn set_audio_mute(&self, muted: bool) -> Result<(), ClientError> {
        self.control(Frame::bool(FrameKind::Control, CommandCode::AUDIO_MUTE, muted))
            .await
    }

    pub async fn audio_mute(&self) -> Result<bool, ClientError> {
        Ok(self.enquire(CommandCode::AUDIO_MUTE).await?.as_bool()?)
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Switches to input `number` of the given type (e.g. HDMI 2).
    pub async fn set_input(&self, input_type: InputType, number: u32) -> Result<(), ClientError> {
        let frame = Frame::int_pair(
            FrameKind::Control,
            CommandCode::INPUT,
            input_type.code(),
            number,
        )?;
        self.control(frame).await
    }

    /// Returns the active input as `(type code, number)`.
    ///
    /// The type code is left raw so inputs this library doesn't know still
    /// come through; see [`InputType::from_code`].
    pub async fn input(&self) -> Result<(u32, u32), ClientError> {
        Ok(self.enquire(CommandCode::INPUT).await?.as_int_pair()?)
    }

    // =========================================================================
    // Picture
    // =========================================================================

    pub async fn set_picture_mute(&self, muted: bool) -> Result<(), ClientError> {
        self.control(Frame::bool(FrameKind::Control, CommandCode::PICTURE_MUTE, muted))
            .await
    }

    pub async fn picture_mute(&self) -> Result<bool, ClientError> {
        Ok(self.enquire(CommandCode::PICTURE_MUTE).await?.as_bool()?)
    }

    pub async fn toggle_picture_mute(&self) -> Result<(), ClientError> {
        self.control(Frame::new(
            FrameKind::Control,
            CommandCode::TOGGLE_PICTURE_MUTE,
            Parameters::EMPTY,
        ))
        .await
    }

    pub async fn set_scene(&self, scene: &str) -> Result<(), ClientError> {
        let frame = Frame::text(FrameKind::Control, CommandCode::SCENE, scene)?;
        self.control(frame).await
    }

    pub async fn scene(&self) -> Result<String, ClientError> {
        Ok(self.enquire(CommandCode::SCENE).await?.as_string()?)
    }

    // =========================================================================
    // Network
    // =========================================================================

    /// Returns the IPv4 broadcast address of a network interface (e.g. `eth0`).
    pub async fn broadcast_address(&self, iface: &str) -> Result<String, ClientError> {
        let frame = Frame::text(FrameKind::Enquiry, CommandCode::BROADCAST_ADDRESS, iface)?;
        Ok(self.conn.execute(&frame).await?.as_string()?)
    }

    /// Returns the MAC address of a network interface (e.g. `eth0`).
    pub async fn mac_address(&self, iface: &str) -> Result<String, ClientError> {
        let frame = Frame::text(FrameKind::Enquiry, CommandCode::MAC_ADDRESS, iface)?;
        Ok(self.conn.execute(&frame).await?.as_string()?)
    }

    // =========================================================================
    // Remote control
    // =========================================================================

    /// Emulates a key press on the IR remote.
    pub async fn send_ir(&self, code: IrCode) -> Result<(), ClientError> {
        let frame = Frame::int(FrameKind::Control, CommandCode::IR_CODE, code.code())?;
        self.control(frame).await
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // The reader task holds its own handle; make it stop
        self.conn.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bravia_protocol::{ProtocolError, FRAME_LEN};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Mock device answering each request with the next scripted frame.
    /// Received requests are forwarded to the returned channel.
    async fn scripted_device(
        answers: Vec<&'static [u8; FRAME_LEN]>,
    ) -> (String, mpsc::UnboundedReceiver<Frame>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            for answer in answers {
                let mut buf = [0u8; FRAME_LEN];
                if stream.read_exact(&mut buf).await.is_err() {
                    return;
                }
                let _ = tx.send(Frame::decode(&buf).unwrap());
                stream.write_all(answer).await.unwrap();
            }
            // Hold the socket until the client goes away
            let mut buf = [0u8; FRAME_LEN];
            let _ = stream.read_exact(&mut buf).await;
        });

        (addr, rx)
    }

    async fn connected_client(addr: &str) -> Client {
        let config = ConnectionConfig::new(addr)
            .with_dial_timeout(Duration::from_secs(1))
            .with_command_timeout(Duration::from_millis(500));
        let client = Client::new(config);
        client.connect().await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_power() {
        let (addr, mut requests) = scripted_device(vec![
            b"*SAPOWR0000000000000000\n",
            b"*SAPOWR0000000000000001\n",
            b"*SATPOW0000000000000000\n",
        ])
        .await;
        let client = connected_client(&addr).await;

        client.set_power_status(true).await.unwrap();
        assert!(client.power_status().await.unwrap());
        client.toggle_power().await.unwrap();

        let sent: Vec<Vec<u8>> = vec![
            requests.recv().await.unwrap().encode().to_vec(),
            requests.recv().await.unwrap().encode().to_vec(),
            requests.recv().await.unwrap().encode().to_vec(),
        ];
        assert_eq!(sent[0], b"*SCPOWR0000000000000001\n");
        assert_eq!(sent[1], b"*SEPOWR################\n");
        assert_eq!(sent[2], b"*SCTPOW################\n");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_volume_and_mute() {
        let (addr, mut requests) = scripted_device(vec![
            b"*SAVOLU0000000000000000\n",
            b"*SAVOLU0000000000000042\n",
            b"*SAAMUT0000000000000000\n",
            b"*SAAMUT0000000000000000\n",
        ])
        .await;
        let client = connected_client(&addr).await;

        client.set_audio_volume(42).await.unwrap();
        assert_eq!(client.audio_volume().await.unwrap(), 42);
        client.set_audio_mute(false).await.unwrap();
        assert!(!client.audio_mute().await.unwrap());

        let first = requests.recv().await.unwrap();
        assert_eq!(&first.encode()[..], b"*SCVOLU0000000000000042\n");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_input() {
        let (addr, mut requests) = scripted_device(vec![
            b"*SAINPT0000000000000000\n",
            b"*SAINPT0000000100000002\n",
        ])
        .await;
        let client = connected_client(&addr).await;

        client.set_input(InputType::Hdmi, 2).await.unwrap();
        assert_eq!(client.input().await.unwrap(), (1, 2));

        let set = requests.recv().await.unwrap();
        assert_eq!(&set.encode()[..], b"*SCINPT0000000100000002\n");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_picture_and_scene() {
        let (addr, mut requests) = scripted_device(vec![
            b"*SAPMUT0000000000000000\n",
            b"*SAPMUT0000000000000001\n",
            b"*SATPMU0000000000000000\n",
            b"*SASCEN0000000000000000\n",
            b"*SASCENcinema##########\n",
        ])
        .await;
        let client = connected_client(&addr).await;

        client.set_picture_mute(true).await.unwrap();
        assert!(client.picture_mute().await.unwrap());
        client.toggle_picture_mute().await.unwrap();
        client.set_scene("cinema").await.unwrap();
        assert_eq!(client.scene().await.unwrap(), "cinema");

        for _ in 0..3 {
            requests.recv().await.unwrap();
        }
        let scene = requests.recv().await.unwrap();
        assert_eq!(&scene.encode()[..], b"*SCSCENcinema##########\n");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_network_queries() {
        let (addr, mut requests) = scripted_device(vec![
            b"*SAMADR00aabbccddeeff##\n",
            b"*SABADR192.168.0.255###\n",
        ])
        .await;
        let client = connected_client(&addr).await;

        assert_eq!(client.mac_address("eth0").await.unwrap(), "00aabbccddeeff");
        assert_eq!(
            client.broadcast_address("eth0").await.unwrap(),
            "192.168.0.255"
        );

        let mac = requests.recv().await.unwrap();
        assert_eq!(&mac.encode()[..], b"*SEMADReth0############\n");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_ir() {
        let (addr, mut requests) = scripted_device(vec![b"*SAIRCC0000000000000000\n"]).await;
        let client = connected_client(&addr).await;

        client.send_ir(IrCode::VolumeUp).await.unwrap();

        let sent = requests.recv().await.unwrap();
        assert_eq!(&sent.encode()[..], b"*SCIRCC0000000000000030\n");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_device_errors_surface() {
        let (addr, _requests) = scripted_device(vec![
            b"*SAPOWRFFFFFFFFFFFFFFFF\n",
            b"*SAMADRNNNNNNNNNNNNNNNN\n",
        ])
        .await;
        let client = connected_client(&addr).await;

        let err = client.set_power_status(true).await.unwrap_err();
        assert!(err.is_device_error());
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::DeviceError(ref raw)) if raw == "FFFFFFFFFFFFFFFF"
        ));

        let err = client.mac_address("wlan9").await.unwrap_err();
        assert!(err.is_not_available());

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_arguments() {
        let (addr, _requests) = scripted_device(vec![]).await;
        let client = connected_client(&addr).await;

        let err = client.set_audio_volume(100_000_000).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::ValueOutOfRange(100_000_000))
        ));

        let err = client.set_scene("a-scene-name-that-is-too-long").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::ParametersTooLong { .. })
        ));

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_drop_stops_connection() {
        let (addr, _requests) = scripted_device(vec![]).await;
        let client = connected_client(&addr).await;
        let conn = client.connection();
        assert!(conn.is_connected());

        drop(client);
        assert!(conn.is_closed());
    }
}
