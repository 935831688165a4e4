//! Contract tests for provider webhook bodies.
//!
//! Samples follow the Evolution API `messages.upsert` payloads as they
//! arrive in production, including fields the service does not read.

use serde_json::json;

use order_intercom::webhook::payload::{classify_body, Inbound};

fn classify(value: &serde_json::Value) -> Inbound {
    classify_body(&serde_json::to_vec(value).expect("encode"))
}

fn message(text: &str) -> Inbound {
    Inbound::Message {
        phone: "5511987654321".into(),
        text: text.into(),
    }
}

#[test]
fn full_plain_text_upsert() {
    let body = json!({
        "event": "messages.upsert",
        "instance": "loja",
        "destination": "https://bot.example.com/webhook",
        "date_time": "2026-03-01T12:00:00.000Z",
        "sender": "5511900000000@s.whatsapp.net",
        "data": {
            "key": {
                "remoteJid": "5511987654321@s.whatsapp.net",
                "fromMe": false,
                "id": "3EB0C431C26A1916E01A"
            },
            "pushName": "Maria",
            "message": { "conversation": "quero pedir" },
            "messageType": "conversation",
            "messageTimestamp": 1_772_366_400
        }
    });
    assert_eq!(classify(&body), message("quero pedir"));
}

#[test]
fn uppercase_event_name_with_extended_text() {
    let body = json!({
        "event": "MESSAGES_UPSERT",
        "data": {
            "key": { "remoteJid": "5511987654321@s.whatsapp.net", "fromMe": false },
            "message": { "extendedTextMessage": { "text": "cardápio", "contextInfo": {} } }
        }
    });
    assert_eq!(classify(&body), message("cardápio"));
}

#[test]
fn button_tap_yields_button_id() {
    let body = json!({
        "event": "messages.upsert",
        "data": {
            "key": { "remoteJid": "5511987654321@s.whatsapp.net", "fromMe": false },
            "message": {
                "buttonsResponseMessage": {
                    "selectedButtonId": "2",
                    "selectedDisplayText": "Delivery"
                }
            }
        }
    });
    assert_eq!(classify(&body), message("2"));
}

#[test]
fn list_selection_yields_row_id() {
    let body = json!({
        "event": "messages.upsert",
        "data": {
            "key": { "remoteJid": "5511987654321@s.whatsapp.net", "fromMe": false },
            "message": {
                "listResponseMessage": {
                    "title": "Lanches",
                    "singleSelectReply": { "selectedRowId": "1" }
                }
            }
        }
    });
    assert_eq!(classify(&body), message("1"));
}

#[test]
fn status_and_connection_events_are_ignored() {
    for event in ["messages.update", "connection.update", "SEND_MESSAGE", "qrcode.updated"] {
        let body = json!({ "event": event, "data": { "state": "open" } });
        assert_eq!(classify(&body), Inbound::Ignored, "event {event}");
    }
}

#[test]
fn group_messages_are_ignored() {
    let body = json!({
        "event": "messages.upsert",
        "data": {
            "key": { "remoteJid": "120363025246125486@g.us", "fromMe": false },
            "message": { "conversation": "oi" }
        }
    });
    assert_eq!(classify(&body), Inbound::Ignored);
}

#[test]
fn media_without_caption_has_no_message() {
    let body = json!({
        "event": "messages.upsert",
        "data": {
            "key": { "remoteJid": "5511987654321@s.whatsapp.net", "fromMe": false },
            "message": { "imageMessage": { "mimetype": "image/jpeg" } }
        }
    });
    assert_eq!(classify(&body), Inbound::NoMessage);
}
