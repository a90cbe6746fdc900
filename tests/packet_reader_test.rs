//! Integration tests for stream framing

use bc2relay::protocol::{NextPacket, PacketReader};

/// Build one wire packet from its decoded parts.
fn encode_packet(from_server: bool, response: bool, sequence: u32, words: &[&str]) -> Vec<u8> {
    let mut header = sequence & 0x3fff_ffff;
    if from_server {
        header |= 0x8000_0000;
    }
    if response {
        header |= 0x4000_0000;
    }

    let mut body = Vec::new();
    for word in words {
        body.extend_from_slice(&(word.len() as u32).to_le_bytes());
        body.extend_from_slice(word.as_bytes());
        body.push(0);
    }

    let total = 12 + body.len();
    let mut packet = Vec::with_capacity(total);
    packet.extend_from_slice(&header.to_le_bytes());
    packet.extend_from_slice(&(total as u32).to_le_bytes());
    packet.extend_from_slice(&(words.len() as u32).to_le_bytes());
    packet.extend_from_slice(&body);
    packet
}

/// Pull every packet currently extractable from the reader.
fn drain(reader: &mut PacketReader) -> Vec<Vec<u8>> {
    let mut packets = Vec::new();
    loop {
        match reader.next_packet().unwrap() {
            NextPacket::Ready(packet) => packets.push(packet.as_bytes().to_vec()),
            NextPacket::Incomplete | NextPacket::Empty => break,
        }
    }
    packets
}

fn sample_stream() -> Vec<u8> {
    [
        encode_packet(false, false, 1, &["serverInfo"]),
        encode_packet(false, true, 1, &["OK", "my server", "16"]),
        encode_packet(true, false, 2, &["player.onJoin", "Terrance"]),
    ]
    .concat()
}

#[test]
fn chunk_boundaries_never_change_the_result() {
    let stream = sample_stream();

    // one-shot parse is the reference
    let mut reference = PacketReader::new();
    reference.append(&stream);
    let expected = drain(&mut reference);
    assert_eq!(expected.len(), 3);

    // every split point must produce the same packet sequence
    for cut in 0..=stream.len() {
        let mut reader = PacketReader::new();
        let mut got = Vec::new();
        reader.append(&stream[..cut]);
        got.extend(drain(&mut reader));
        reader.append(&stream[cut..]);
        got.extend(drain(&mut reader));
        assert_eq!(got, expected, "packets differ when split at byte {cut}");
    }
}

#[test]
fn byte_at_a_time_delivery_matches_one_shot() {
    let stream = sample_stream();

    let mut reference = PacketReader::new();
    reference.append(&stream);
    let expected = drain(&mut reference);

    let mut reader = PacketReader::new();
    let mut got = Vec::new();
    for byte in &stream {
        reader.append(std::slice::from_ref(byte));
        got.extend(drain(&mut reader));
    }
    assert_eq!(got, expected);
    assert_eq!(reader.next_packet().unwrap(), NextPacket::Empty);
}

#[test]
fn concatenated_packets_drain_in_order_then_empty() {
    let packets: Vec<Vec<u8>> = (1..=5)
        .map(|i| encode_packet(false, true, i, &["OK"]))
        .collect();

    let mut reader = PacketReader::new();
    reader.append(&packets.concat());

    for expected in &packets {
        match reader.next_packet().unwrap() {
            NextPacket::Ready(packet) => assert_eq!(packet.as_bytes(), &expected[..]),
            other => panic!("expected a packet, got {other:?}"),
        }
    }
    // the sixth call reports a drained buffer, not an incomplete packet
    assert_eq!(reader.next_packet().unwrap(), NextPacket::Empty);
}

#[test]
fn trailing_junk_stays_buffered_in_order() {
    let mut stream = sample_stream();
    stream.extend_from_slice(b"and more junk");

    let mut reader = PacketReader::new();
    reader.append(&stream);
    let packets = drain(&mut reader);

    assert_eq!(packets.len(), 3);
    assert_eq!(reader.buffered(), b"and more junk".len());
    assert_eq!(reader.next_packet().unwrap(), NextPacket::Incomplete);
}

#[test]
fn partial_packet_completes_across_appends() {
    let first = encode_packet(false, true, 9, &["OK"]);
    let second = encode_packet(true, false, 10, &["player.onLeave", "Terrance"]);

    let mut reader = PacketReader::new();
    reader.append(&first);
    reader.append(&second[..6]);

    // the complete first packet comes out, the partial second stays put
    let packets = drain(&mut reader);
    assert_eq!(packets, vec![first]);
    assert_eq!(reader.buffered(), 6);

    reader.append(&second[6..]);
    let packets = drain(&mut reader);
    assert_eq!(packets, vec![second]);
    assert_eq!(reader.next_packet().unwrap(), NextPacket::Empty);
}

#[test]
fn extracted_packets_decode_to_their_source_fields() {
    let stream = sample_stream();
    let mut reader = PacketReader::new();
    reader.append(&stream);

    let mut messages = Vec::new();
    while let NextPacket::Ready(packet) = reader.next_packet().unwrap() {
        messages.push(packet.decode().unwrap());
    }

    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].words, vec!["serverInfo"]);
    assert!(!messages[0].from_server);
    assert_eq!(messages[1].words, vec!["OK", "my server", "16"]);
    assert!(messages[1].response);
    assert_eq!(messages[2].words, vec!["player.onJoin", "Terrance"]);
    assert!(messages[2].from_server);
    assert_eq!(messages[2].sequence, 2);
}
