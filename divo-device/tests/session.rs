//! Integration tests for the session layer against a scripted transport.

use std::sync::Arc;

use chrono::NaiveDate;
use divo_device::{DeviceError, Pixoo};
use divo_transport::command::{ActivatedModes, BoxImage, Rgb, TimeType};
use divo_transport::image::{decode_pixels, PixelGrid};
use divo_transport::protocol::cmd;
use divo_transport::{frame, MemoryTransport, PacketError, ParsedResponse};

fn open() -> (Arc<MemoryTransport>, Pixoo) {
    let memory = Arc::new(MemoryTransport::new());
    let pixoo = Pixoo::new(memory.clone()).expect("memory transport connects");
    (memory, pixoo)
}

fn ack(memory: &MemoryTransport, id: u8) {
    memory.push_response(id, &[]);
}

#[test]
fn set_brightness_sends_exact_frame() {
    let (memory, pixoo) = open();
    ack(&memory, cmd::SET_SYSTEM_BRIGHTNESS);

    let response = pixoo.set_brightness(23).unwrap();
    assert_eq!(response.cmd, cmd::SET_SYSTEM_BRIGHTNESS);
    assert!(response.payload.is_empty());
    assert_eq!(response.parsed, None);
    assert_eq!(
        memory.last_written().unwrap(),
        [0x01, 0x04, 0x00, 0x74, 0x17, 0x8F, 0x00, 0x02]
    );
    assert_eq!(memory.pending(), 0);
}

#[test]
fn reply_without_decoder_is_still_a_reply() {
    let (memory, pixoo) = open();
    memory.push_response(cmd::SET_BOX_MODE, &[0xAA, 0xBB]);

    let response = pixoo.set_score(3, 260).unwrap();
    assert_eq!(response.name(), "SET_BOX_MODE");
    assert_eq!(response.payload, vec![0xAA, 0xBB]);
    assert_eq!(
        memory.last_written().unwrap(),
        frame::build(cmd::SET_BOX_MODE, &[6, 0, 4, 1, 3, 0, 0, 0, 0, 0])
    );
}

#[test]
fn missing_reply_is_no_reply_error() {
    let (_memory, pixoo) = open();
    match pixoo.set_game(true, 2) {
        Err(DeviceError::NoReply { cmd: id }) => assert_eq!(id, cmd::SET_GAME),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn write_command_without_need_tolerates_silence() {
    let (_memory, pixoo) = open();
    let response = pixoo
        .write_command(cmd::SET_24_HOUR, &[1], false)
        .unwrap();
    assert!(response.is_none());
}

#[test]
fn commands_without_response_skip_the_read() {
    let (memory, pixoo) = open();
    // Anything queued must still be there afterwards
    ack(&memory, cmd::SET_SYSTEM_COLOR);
    let queued = memory.pending();

    pixoo.set_sleep_color(Rgb::new(1, 2, 3)).unwrap();
    pixoo.send_app_newest_time(None).unwrap();
    assert_eq!(memory.pending(), queued);

    let written = memory.written();
    assert_eq!(written[0], frame::build(cmd::SET_SLEEP_COLOR, &[1, 2, 3]));
    assert_eq!(written[1], frame::build(cmd::SEND_APP_NEWEST_TIME, &[0xFF]));
}

#[test]
fn garbage_and_truncated_responses_yield_none() {
    let (memory, pixoo) = open();

    // Short prefix
    memory.push_inbound(&[0x01, 0x03]);
    assert!(pixoo.write_command(cmd::SET_24_HOUR, &[0], false).unwrap().is_none());

    // Wrong start marker
    memory.push_inbound(&[0x07, 0x03, 0x00]);
    assert!(pixoo.write_command(cmd::SET_24_HOUR, &[0], false).unwrap().is_none());

    // Prefix, then nothing
    memory.push_inbound(&[0x01, 0x03, 0x00]);
    assert!(pixoo.write_command(cmd::SET_24_HOUR, &[0], false).unwrap().is_none());

    // End marker missing
    memory.push_inbound(&[0x01, 0x03, 0x00, 0x04, 0x2D, 0x55, 0x09]);
    assert!(pixoo.write_command(cmd::SET_24_HOUR, &[0], false).unwrap().is_none());

    // Remainder cut short, but its last byte happens to be the end marker
    memory.push_inbound(&[0x01, 0x05, 0x00, 0x04, 0x2D, 0x55, 0x02]);
    assert!(pixoo.write_command(cmd::SET_24_HOUR, &[0], false).unwrap().is_none());
    assert_eq!(memory.pending(), 0);
}

#[test]
fn bad_magic_in_response_is_a_packet_error() {
    let (memory, pixoo) = open();
    memory.push_inbound(&[0x01, 0x03, 0x00, 0x05, 0x2D, 0x55, 0x02]);
    match pixoo.write_command(cmd::SET_24_HOUR, &[0], true) {
        Err(DeviceError::Packet(PacketError::BadMagicCheck { value })) => assert_eq!(value, 5),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn get_box_mode_decodes_response() {
    let (memory, pixoo) = open();
    let mut payload: Vec<u8> = vec![0, 1, 2, 10, 20, 30, 50, 0, 1, 3, 40, 50, 60, 70, 80, 90];
    payload.extend_from_slice(&[0xDE, 0xAD]);
    memory.push_response(cmd::GET_BOX_MODE, &payload);

    let mode = pixoo.get_box_mode().unwrap();
    assert_eq!(mode.light, Rgb::new(10, 20, 30));
    assert_eq!(mode.level, 50);
    assert_eq!(mode.time_type(), Some(TimeType::Analog));
    assert_eq!(mode.temp, Rgb::new(70, 80, 90));
    assert_eq!(mode.raw, payload);

    assert_eq!(
        memory.last_written().unwrap(),
        [0x01, 0x03, 0x00, 0x46, 0x49, 0x00, 0x02]
    );

    // Temperature view reuses the queried settings
    ack(&memory, cmd::SET_BOX_MODE);
    pixoo.set_light_mode_temperature(&mode).unwrap();
    assert_eq!(
        memory.last_written().unwrap(),
        frame::build(cmd::SET_BOX_MODE, &[1, 1, 70, 80, 90, 0])
    );
}

#[test]
fn get_box_mode_with_short_payload_fails() {
    let (memory, pixoo) = open();
    memory.push_response(cmd::GET_BOX_MODE, &[0; 4]);
    assert!(matches!(
        pixoo.get_box_mode(),
        Err(DeviceError::Payload(_))
    ));
}

#[test]
fn get_box_mode_with_foreign_reply_is_unexpected() {
    let (memory, pixoo) = open();
    ack(&memory, cmd::SET_TIME);
    assert!(matches!(
        pixoo.get_box_mode(),
        Err(DeviceError::UnexpectedResponse(_))
    ));
}

#[test]
fn response_carries_parsed_payload() {
    let (memory, pixoo) = open();
    memory.push_response(cmd::GET_BOX_MODE, &[3u8; 16]);
    let response = pixoo
        .write_command(cmd::GET_BOX_MODE, &[], true)
        .unwrap()
        .unwrap();
    assert!(matches!(
        response.parsed,
        Some(ParsedResponse::GetBoxMode(ref m)) if m.mode == 3
    ));
}

#[test]
fn light_modes_and_time() {
    let (memory, pixoo) = open();

    ack(&memory, cmd::SET_BOX_MODE);
    pixoo
        .set_light_mode_clock(TimeType::Rainbow, Rgb::new(1, 2, 3), None)
        .unwrap();
    assert_eq!(
        memory.last_written().unwrap(),
        frame::build(cmd::SET_BOX_MODE, &[0, 1, 1, 1, 0, 0, 0, 1, 2, 3])
    );

    ack(&memory, cmd::SET_BOX_MODE);
    let modes = ActivatedModes {
        clock: false,
        weather: false,
        temperature: true,
        date: false,
    };
    pixoo
        .set_light_mode_light(Rgb::WHITE, Some(modes))
        .unwrap();
    assert_eq!(
        memory.last_written().unwrap(),
        frame::build(cmd::SET_BOX_MODE, &[1, 255, 255, 255, 0x14, 0, 0, 0, 1, 0])
    );

    ack(&memory, cmd::SET_TIME);
    let ts = NaiveDate::from_ymd_opt(2021, 6, 2)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    pixoo.set_time(Some(ts)).unwrap();
    // 2021-06-02 was a Wednesday
    assert_eq!(
        memory.last_written().unwrap(),
        frame::build(cmd::SET_TIME, &[21, 20, 6, 2, 8, 30, 0, 3])
    );
}

#[test]
fn set_image_round_trips_through_the_wire() {
    let (memory, pixoo) = open();
    ack(&memory, cmd::SET_BOX_COLOR);

    let mut grid = PixelGrid::new();
    for y in 0..PixelGrid::HEIGHT {
        grid.set(y, y, Rgb::RED);
        grid.set(PixelGrid::WIDTH - 1 - y, y, Rgb::BLUE);
    }
    pixoo.set_image(&grid).unwrap();

    let sent = memory.last_written().unwrap();
    let packet = frame::parse(&sent).unwrap();
    assert_eq!(packet.cmd, cmd::SET_BOX_COLOR);

    let image = BoxImage::decode_single(packet.payload).unwrap();
    assert_eq!(image.palette.len(), 3);
    assert_eq!(decode_pixels(&image.palette, &image.image), grid);
}
