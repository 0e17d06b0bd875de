//! HID backends: OTP (keyboard interface) and FIDO (CTAPHID).
//!
//! Packet format for CTAPHID:
//! - Initialization packet: CID(4) + CMD(1) + BCNT(2) + DATA(57)
//! - Continuation packet: CID(4) + SEQ(1) + DATA(59)
//!
//! The OTP interface has no interrupt pipe; everything moves through
//! 8-byte feature reports, with a sequence/flags byte in the last
//! position and a CRC-protected 70-byte frame for commands.

use std::ffi::CStr;
use std::thread;
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use tracing::debug;

use crate::ctap::CtapError;
use crate::device::{DeviceHandle, ProductId, Version};
use crate::error::{Error, Result};
use crate::mgmt::{CTAPHID_READ_CONFIG, ConfigRead, SLOT_CAPABILITIES};

/// USB vendor ids the backends enumerate.
const VENDOR_IDS: [u16; 2] = [0x1050, 0x20a0];

/// FIDO HID usage page.
const FIDO_USAGE_PAGE: u16 = 0xf1d0;

/// Generic desktop page / keyboard usage of the OTP interface.
const OTP_USAGE_PAGE: u16 = 0x0001;
const OTP_USAGE: u16 = 0x06;

/// HID packet size (fixed at 64 bytes for USB HID).
const PACKET_SIZE: usize = 64;

/// Maximum CTAPHID message size.
const MAX_MESSAGE_SIZE: usize = 7609;

/// Broadcast channel ID (used for the INIT command).
const BROADCAST_CID: u32 = 0xffff_ffff;

/// Initialization packet payload size (64 - 4 CID - 1 CMD - 2 BCNT).
const INIT_DATA_SIZE: usize = 57;

/// Continuation packet payload size (64 - 4 CID - 1 SEQ).
const CONT_DATA_SIZE: usize = 59;

const CMD_INIT: u8 = 0x06;
const CMD_CBOR: u8 = 0x10;
const CMD_KEEPALIVE: u8 = 0x3b;
const CMD_ERROR: u8 = 0x3f;

const READ_TIMEOUT_MS: i32 = 5000;

/// Enumerates security keys exposing the OTP keyboard interface.
#[derive(Debug, Default)]
pub struct HidOtpBackend;

impl HidOtpBackend {
    pub fn new() -> Self {
        HidOtpBackend
    }

    pub fn list_devices(&self) -> Result<Vec<DeviceHandle>> {
        let api = HidApi::new()?;
        let devices: Vec<DeviceHandle> = api
            .device_list()
            .filter(|dev| {
                VENDOR_IDS.contains(&dev.vendor_id())
                    && dev.usage_page() == OTP_USAGE_PAGE
                    && dev.usage() == OTP_USAGE
            })
            .map(|dev| {
                DeviceHandle::for_hid_path(Some(ProductId(dev.product_id())), dev.path().to_owned())
            })
            .collect();
        debug!(count = devices.len(), "security keys reachable over HID OTP");
        Ok(devices)
    }

    pub fn open(&self, device: &DeviceHandle) -> Result<OtpHidConnection> {
        let path = device.hid_path().ok_or(Error::ForeignHandle)?;
        let api = HidApi::new()?;
        Ok(OtpHidConnection {
            device: api.open_path(path)?,
        })
    }
}

/// Enumerates security keys exposing the FIDO interface.
#[derive(Debug, Default)]
pub struct HidFidoBackend;

impl HidFidoBackend {
    pub fn new() -> Self {
        HidFidoBackend
    }

    pub fn list_devices(&self) -> Result<Vec<DeviceHandle>> {
        let api = HidApi::new()?;
        let devices: Vec<DeviceHandle> = api
            .device_list()
            .filter(|dev| {
                VENDOR_IDS.contains(&dev.vendor_id()) && dev.usage_page() == FIDO_USAGE_PAGE
            })
            .map(|dev| {
                DeviceHandle::for_hid_path(Some(ProductId(dev.product_id())), dev.path().to_owned())
            })
            .collect();
        debug!(count = devices.len(), "security keys reachable over HID FIDO");
        Ok(devices)
    }

    pub fn open(&self, device: &DeviceHandle) -> Result<FidoHidConnection> {
        let path = device.hid_path().ok_or(Error::ForeignHandle)?;
        let api = HidApi::new()?;
        FidoHidConnection::open(&api, path)
    }
}

// OTP feature-report protocol.

const FEATURE_RPT_SIZE: usize = 8;
const FEATURE_RPT_DATA_SIZE: usize = FEATURE_RPT_SIZE - 1;
const SLOT_DATA_SIZE: usize = 64;
const FRAME_SIZE: usize = SLOT_DATA_SIZE + 6;

const RESP_PENDING_FLAG: u8 = 0x40;
const SLOT_WRITE_FLAG: u8 = 0x80;
const SEQUENCE_MASK: u8 = 0x1f;

const MAX_STATUS_POLLS: u32 = 100;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

const MAX_WRITE_POLLS: u32 = 20;
const WRITE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// An open connection to the OTP keyboard interface.
pub struct OtpHidConnection {
    device: HidDevice,
}

impl OtpHidConnection {
    /// Current status report: version triple, sequence and touch level.
    pub fn read_status(&mut self) -> Result<[u8; FEATURE_RPT_SIZE]> {
        self.device.recv_feature()
    }

    /// Sends a slot command and collects the sequenced response frames.
    pub(crate) fn send_and_receive(&mut self, slot: u8, payload: &[u8]) -> Result<Vec<u8>> {
        exchange(&mut self.device, slot, payload)
    }
}

/// Feature-report exchange the slot protocol runs over. The hidapi
/// report-id byte is handled in the device impl so the protocol code
/// sees bare 8-byte reports.
trait FeatureReport {
    fn send_feature(&mut self, report: &[u8; FEATURE_RPT_SIZE]) -> Result<()>;
    fn recv_feature(&mut self) -> Result<[u8; FEATURE_RPT_SIZE]>;
}

impl FeatureReport for HidDevice {
    fn send_feature(&mut self, report: &[u8; FEATURE_RPT_SIZE]) -> Result<()> {
        let mut buf = [0u8; FEATURE_RPT_SIZE + 1];
        buf[1..].copy_from_slice(report);
        self.send_feature_report(&buf)?;
        Ok(())
    }

    fn recv_feature(&mut self) -> Result<[u8; FEATURE_RPT_SIZE]> {
        let mut buf = [0u8; FEATURE_RPT_SIZE + 1];
        let read = self.get_feature_report(&mut buf)?;
        if read < FEATURE_RPT_SIZE {
            return Err(Error::InvalidResponse(format!(
                "feature report of {read} bytes"
            )));
        }
        let mut report = [0u8; FEATURE_RPT_SIZE];
        report.copy_from_slice(&buf[1..=FEATURE_RPT_SIZE]);
        Ok(report)
    }
}

fn exchange<D: FeatureReport>(device: &mut D, slot: u8, payload: &[u8]) -> Result<Vec<u8>> {
    send_frame(device, slot, payload)?;
    read_frame_response(device)
}

/// Sends one CRC-framed slot command as a series of feature reports.
fn send_frame<D: FeatureReport>(device: &mut D, slot: u8, payload: &[u8]) -> Result<()> {
    if payload.len() > SLOT_DATA_SIZE {
        return Err(Error::InvalidResponse(format!(
            "slot payload too long: {} bytes",
            payload.len()
        )));
    }
    let mut frame = [0u8; FRAME_SIZE];
    frame[..payload.len()].copy_from_slice(payload);
    frame[SLOT_DATA_SIZE] = slot;
    let crc = !calculate_crc(&frame[..SLOT_DATA_SIZE]);
    frame[SLOT_DATA_SIZE + 1..SLOT_DATA_SIZE + 3].copy_from_slice(&crc.to_le_bytes());

    // All-zero reports are skipped on the wire, except the final one
    // which tells the key the frame is complete. The key consumes one
    // report at a time and keeps the write flag raised until it has.
    for (seq, chunk) in frame.chunks(FEATURE_RPT_DATA_SIZE).enumerate() {
        let last = (seq + 1) * FEATURE_RPT_DATA_SIZE >= FRAME_SIZE;
        if last || chunk.iter().any(|&b| b != 0) {
            await_ready_to_write(device)?;
            let mut report = [0u8; FEATURE_RPT_SIZE];
            report[..chunk.len()].copy_from_slice(chunk);
            report[FEATURE_RPT_SIZE - 1] = SLOT_WRITE_FLAG | seq as u8;
            device.send_feature(&report)?;
        }
    }
    Ok(())
}

/// Polls until the key clears the write flag and can take a report.
fn await_ready_to_write<D: FeatureReport>(device: &mut D) -> Result<()> {
    for _ in 0..MAX_WRITE_POLLS {
        let report = device.recv_feature()?;
        if report[FEATURE_RPT_SIZE - 1] & SLOT_WRITE_FLAG == 0 {
            return Ok(());
        }
        thread::sleep(WRITE_POLL_INTERVAL);
    }
    Err(Error::Timeout)
}

/// Collects the sequenced response frames after a slot command.
fn read_frame_response<D: FeatureReport>(device: &mut D) -> Result<Vec<u8>> {
    let mut response = Vec::new();
    let mut seq = 0u8;
    let mut polls = 0;
    loop {
        let report = device.recv_feature()?;
        let status = report[FEATURE_RPT_SIZE - 1];
        if status & RESP_PENDING_FLAG != 0 {
            if status & SEQUENCE_MASK == seq {
                response.extend_from_slice(&report[..FEATURE_RPT_DATA_SIZE]);
                seq += 1;
            } else if status & SEQUENCE_MASK == 0 {
                // Sequence wrapped back to zero: transmission complete.
                reset_read_state(device)?;
                return Ok(response);
            }
        } else {
            // Nothing pending yet; the key needs a moment, or a touch.
            polls += 1;
            if polls > MAX_STATUS_POLLS {
                return Err(Error::Timeout);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Tells the key to stop offering response frames.
fn reset_read_state<D: FeatureReport>(device: &mut D) -> Result<()> {
    let mut report = [0u8; FEATURE_RPT_SIZE];
    report[FEATURE_RPT_SIZE - 1] = 0xff;
    device.send_feature(&report)
}

impl ConfigRead for OtpHidConnection {
    fn read_config_page(&mut self, _page: u8) -> Result<Vec<u8>> {
        let response = self.send_and_receive(SLOT_CAPABILITIES, &[])?;
        let length = response
            .first()
            .copied()
            .ok_or_else(|| Error::InvalidResponse("empty config response".into()))?
            as usize;
        if response.len() < length + 3 {
            return Err(Error::InvalidResponse("config response truncated".into()));
        }
        if calculate_crc(&response[..length + 3]) != CRC_OK_RESIDUAL {
            return Err(Error::InvalidResponse("config checksum mismatch".into()));
        }
        Ok(response[..length + 1].to_vec())
    }
}

/// Yubico CRC-16: polynomial 0x8408, initial 0xffff, no final xor.
pub(crate) fn calculate_crc(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xffff;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            let lsb = crc & 1;
            crc >>= 1;
            if lsb == 1 {
                crc ^= 0x8408;
            }
        }
    }
    crc
}

/// Residual of a buffer whose trailing two bytes hold its own CRC.
pub(crate) const CRC_OK_RESIDUAL: u16 = 0xf0b8;

/// An open connection to the FIDO interface.
///
/// Opening performs the CTAPHID INIT handshake, which allocates the
/// channel and reports protocol version, device version and capability
/// flags; those stay readable for the lifetime of the connection.
pub struct FidoHidConnection {
    device: HidDevice,
    channel: u32,
    protocol_version: u8,
    device_version: Version,
    capabilities: u8,
}

impl FidoHidConnection {
    pub(crate) fn open(api: &HidApi, path: &CStr) -> Result<Self> {
        let device = api.open_path(path)?;
        let nonce: [u8; 8] = rand::random();
        for packet in build_request(BROADCAST_CID, CMD_INIT, &nonce)? {
            write_report(&device, &packet)?;
        }
        // INIT responses fit a single packet. Replies on other channels,
        // or echoing someone else's nonce, are skipped.
        let init = loop {
            let packet = read_packet(&device, READ_TIMEOUT_MS)?;
            if cid_of(&packet) != BROADCAST_CID {
                continue;
            }
            let Some((cmd, length)) = init_header(&packet) else {
                continue;
            };
            if cmd != CMD_INIT {
                continue;
            }
            let data = &packet[7..7 + length.min(INIT_DATA_SIZE)];
            if let Some(init) = parse_init_response(data, &nonce) {
                break init;
            }
        };
        debug!(channel = init.channel, "CTAPHID channel allocated");
        Ok(FidoHidConnection {
            device,
            channel: init.channel,
            protocol_version: init.protocol_version,
            device_version: init.device_version,
            capabilities: init.capabilities,
        })
    }

    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    pub fn device_version(&self) -> Version {
        self.device_version
    }

    pub fn capabilities(&self) -> u8 {
        self.capabilities
    }

    /// Runs one CTAPHID transaction on the allocated channel.
    pub fn call(&mut self, cmd: u8, payload: &[u8]) -> Result<Vec<u8>> {
        for packet in build_request(self.channel, cmd, payload)? {
            write_report(&self.device, &packet)?;
        }

        let (mut message, total) = loop {
            let packet = read_packet(&self.device, READ_TIMEOUT_MS)?;
            if cid_of(&packet) != self.channel {
                continue;
            }
            let Some((rcmd, length)) = init_header(&packet) else {
                continue;
            };
            if rcmd == CMD_KEEPALIVE {
                continue;
            }
            if rcmd == CMD_ERROR {
                return Err(Error::Ctaphid(packet[7]));
            }
            if rcmd != cmd {
                return Err(Error::InvalidPacket);
            }
            let take = length.min(INIT_DATA_SIZE);
            break (packet[7..7 + take].to_vec(), length);
        };

        let mut expected_seq = 0u8;
        while message.len() < total {
            let packet = read_packet(&self.device, READ_TIMEOUT_MS)?;
            if cid_of(&packet) != self.channel {
                continue;
            }
            if packet[4] & 0x80 != 0 || packet[4] != expected_seq {
                return Err(Error::InvalidPacket);
            }
            expected_seq += 1;
            let take = (total - message.len()).min(CONT_DATA_SIZE);
            message.extend_from_slice(&packet[5..5 + take]);
        }
        Ok(message)
    }

    /// Sends a CTAP2 command: CBOR framing plus the status byte check.
    pub fn ctap_cbor(&mut self, ctap_cmd: u8, request: &[u8]) -> Result<Vec<u8>> {
        let mut payload = Vec::with_capacity(1 + request.len());
        payload.push(ctap_cmd);
        payload.extend_from_slice(request);
        let response = self.call(CMD_CBOR, &payload)?;
        let (&status, body) = response
            .split_first()
            .ok_or_else(|| Error::InvalidResponse("empty CTAP response".into()))?;
        if status != 0 {
            return Err(Error::Ctap(CtapError(status)));
        }
        Ok(body.to_vec())
    }
}

impl ConfigRead for FidoHidConnection {
    fn read_config_page(&mut self, page: u8) -> Result<Vec<u8>> {
        self.call(CTAPHID_READ_CONFIG, &[page])
    }
}

#[derive(Debug, PartialEq, Eq)]
struct InitResponse {
    channel: u32,
    protocol_version: u8,
    device_version: Version,
    capabilities: u8,
}

/// INIT response payload:
/// - 8 bytes: nonce (echo)
/// - 4 bytes: channel ID (big-endian)
/// - 1 byte: protocol version
/// - 3 bytes: device version (major, minor, build)
/// - 1 byte: capabilities
fn parse_init_response(data: &[u8], nonce: &[u8; 8]) -> Option<InitResponse> {
    if data.len() < 17 || data[..8] != nonce[..] {
        return None;
    }
    Some(InitResponse {
        channel: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
        protocol_version: data[12],
        device_version: Version::new(data[13], data[14], data[15]),
        capabilities: data[16],
    })
}

fn build_request(cid: u32, cmd: u8, payload: &[u8]) -> Result<Vec<[u8; PACKET_SIZE]>> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(Error::InvalidPacket);
    }
    let mut packets = Vec::new();

    let mut first = [0u8; PACKET_SIZE];
    first[..4].copy_from_slice(&cid.to_be_bytes());
    first[4] = cmd | 0x80;
    first[5..7].copy_from_slice(&(payload.len() as u16).to_be_bytes());
    let head = payload.len().min(INIT_DATA_SIZE);
    first[7..7 + head].copy_from_slice(&payload[..head]);
    packets.push(first);

    let mut rest = &payload[head..];
    let mut seq = 0u8;
    while !rest.is_empty() {
        if seq > 0x7f {
            return Err(Error::InvalidPacket);
        }
        let mut cont = [0u8; PACKET_SIZE];
        cont[..4].copy_from_slice(&cid.to_be_bytes());
        cont[4] = seq;
        let take = rest.len().min(CONT_DATA_SIZE);
        cont[5..5 + take].copy_from_slice(&rest[..take]);
        packets.push(cont);
        rest = &rest[take..];
        seq += 1;
    }
    Ok(packets)
}

fn cid_of(packet: &[u8; PACKET_SIZE]) -> u32 {
    u32::from_be_bytes([packet[0], packet[1], packet[2], packet[3]])
}

/// Command and payload length of an initialization packet.
fn init_header(packet: &[u8; PACKET_SIZE]) -> Option<(u8, usize)> {
    if packet[4] & 0x80 == 0 {
        return None;
    }
    Some((
        packet[4] & 0x7f,
        u16::from_be_bytes([packet[5], packet[6]]) as usize,
    ))
}

fn write_report(device: &HidDevice, packet: &[u8; PACKET_SIZE]) -> Result<()> {
    // hidapi expects the report id in front; FIDO uses unnumbered reports.
    let mut report = [0u8; PACKET_SIZE + 1];
    report[1..].copy_from_slice(packet);
    let written = device.write(&report)?;
    if written < PACKET_SIZE {
        return Err(Error::InvalidPacket);
    }
    Ok(())
}

fn read_packet(device: &HidDevice, timeout_ms: i32) -> Result<[u8; PACKET_SIZE]> {
    let mut buf = [0u8; PACKET_SIZE];
    let read = device.read_timeout(&mut buf, timeout_ms)?;
    if read == 0 {
        return Err(Error::Timeout);
    }
    if read < PACKET_SIZE {
        return Err(Error::InvalidPacket);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    #[test]
    fn test_single_packet_request_layout() {
        let packets = build_request(BROADCAST_CID, CMD_INIT, &[1, 2, 3]).unwrap();
        assert_eq!(packets.len(), 1);
        let packet = &packets[0];
        assert_eq!(cid_of(packet), BROADCAST_CID);
        assert_eq!(init_header(packet), Some((CMD_INIT, 3)));
        assert_eq!(&packet[7..10], &[1, 2, 3]);
    }

    #[test]
    fn test_long_request_is_fragmented() {
        let payload = [0xabu8; 100];
        let packets = build_request(0x0001_0002, CMD_CBOR, &payload).unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(init_header(&packets[0]), Some((CMD_CBOR, 100)));
        // Continuation carries the sequence, not a command bit.
        assert_eq!(packets[1][4], 0);
        assert_eq!(&packets[1][5..5 + 43], &payload[57..]);
        assert!(init_header(&packets[1]).is_none());
    }

    #[test]
    fn test_init_response_parsing() {
        let nonce = [9u8; 8];
        let mut data = Vec::new();
        data.extend_from_slice(&nonce);
        data.extend_from_slice(&0x1122_3344u32.to_be_bytes());
        data.extend_from_slice(&[2, 5, 4, 3, 0x05]);
        let init = parse_init_response(&data, &nonce).unwrap();
        assert_eq!(init.channel, 0x1122_3344);
        assert_eq!(init.protocol_version, 2);
        assert_eq!(init.device_version, Version::new(5, 4, 3));
        assert_eq!(init.capabilities, 0x05);

        // Wrong nonce: response was meant for someone else.
        assert!(parse_init_response(&data, &[0u8; 8]).is_none());
        assert!(parse_init_response(&data[..12], &nonce).is_none());
    }

    #[test]
    fn test_crc_residual_property() {
        let data = [0x55u8, 0x00, 0x12, 0xff, 0x07];
        let crc = !calculate_crc(&data);
        let mut framed = data.to_vec();
        framed.extend_from_slice(&crc.to_le_bytes());
        assert_eq!(calculate_crc(&framed), CRC_OK_RESIDUAL);
    }

    /// A key that raises the write flag for one poll after each report
    /// and only offers response frames once the full frame arrived.
    struct SlotDevice {
        write_busy: u32,
        frame_complete: bool,
        sent: Vec<[u8; FEATURE_RPT_SIZE]>,
        response: VecDeque<[u8; FEATURE_RPT_SIZE]>,
    }

    impl SlotDevice {
        fn respond_with(data: &[u8]) -> Self {
            let mut response = VecDeque::new();
            for (seq, chunk) in data.chunks(FEATURE_RPT_DATA_SIZE).enumerate() {
                let mut frame = [0u8; FEATURE_RPT_SIZE];
                frame[..chunk.len()].copy_from_slice(chunk);
                frame[FEATURE_RPT_SIZE - 1] = RESP_PENDING_FLAG | seq as u8;
                response.push_back(frame);
            }
            let mut wrap = [0u8; FEATURE_RPT_SIZE];
            wrap[FEATURE_RPT_SIZE - 1] = RESP_PENDING_FLAG;
            response.push_back(wrap);
            SlotDevice {
                write_busy: 0,
                frame_complete: false,
                sent: Vec::new(),
                response,
            }
        }

        fn frame_reports(&self) -> Vec<&[u8; FEATURE_RPT_SIZE]> {
            self.sent
                .iter()
                .filter(|report| report[FEATURE_RPT_SIZE - 1] != 0xff)
                .collect()
        }
    }

    impl FeatureReport for SlotDevice {
        fn send_feature(&mut self, report: &[u8; FEATURE_RPT_SIZE]) -> Result<()> {
            assert_eq!(
                self.write_busy, 0,
                "report written while the key was still consuming the previous one"
            );
            self.sent.push(*report);
            let status = report[FEATURE_RPT_SIZE - 1];
            if status == SLOT_WRITE_FLAG | 9 {
                self.frame_complete = true;
            }
            if status != 0xff {
                self.write_busy = 1;
            }
            Ok(())
        }

        fn recv_feature(&mut self) -> Result<[u8; FEATURE_RPT_SIZE]> {
            if self.write_busy > 0 {
                self.write_busy -= 1;
                let mut busy = [0u8; FEATURE_RPT_SIZE];
                busy[FEATURE_RPT_SIZE - 1] = SLOT_WRITE_FLAG;
                return Ok(busy);
            }
            if self.frame_complete {
                if let Some(frame) = self.response.pop_front() {
                    return Ok(frame);
                }
            }
            Ok([0u8; FEATURE_RPT_SIZE])
        }
    }

    #[test]
    fn test_frame_writes_wait_for_the_write_flag() {
        let mut device = SlotDevice::respond_with(&[0xaa; 14]);
        let payload = [0x11u8; 14];

        let response = exchange(&mut device, 0x38, &payload).unwrap();
        assert_eq!(response, vec![0xaa; 14]);

        // Two payload reports plus the final one carrying slot and CRC.
        let reports = device.frame_reports();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0][FEATURE_RPT_SIZE - 1], SLOT_WRITE_FLAG);
        assert_eq!(reports[1][FEATURE_RPT_SIZE - 1], SLOT_WRITE_FLAG | 1);
        assert_eq!(reports[2][FEATURE_RPT_SIZE - 1], SLOT_WRITE_FLAG | 9);
        assert_eq!(reports[2][1], 0x38);
    }

    #[test]
    fn test_empty_payload_sends_only_the_final_report() {
        let mut device = SlotDevice::respond_with(&[0x28, 0x02, 0x04, 0x02, 0, 0, 0]);

        let response = exchange(&mut device, 0x13, &[]).unwrap();
        assert_eq!(response[..4], [0x28, 0x02, 0x04, 0x02]);

        let reports = device.frame_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0][FEATURE_RPT_SIZE - 1], SLOT_WRITE_FLAG | 9);
        assert_eq!(reports[0][1], 0x13);
    }
}
