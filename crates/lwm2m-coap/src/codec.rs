//! CoAP message construction and parsing
//!
//! Maps gateway operations onto the CoAP method set the way LwM2M does:
//! Read → GET, Write → PUT (text payload), Execute → POST (arguments
//! payload). Replies with a 2.xx code are protocol successes; 4.xx/5.xx are
//! device-reported failures carried back verbatim.

use std::collections::HashMap;

use coap_lite::{CoapOption, MessageClass, MessageType, Packet, RequestType, ResponseType};

use lwm2m_core::{DeviceReply, OperationRequest, TransportError};

/// Build the confirmable CoAP request for one gateway operation
pub fn encode_request(request: &OperationRequest, message_id: u16, token: Vec<u8>) -> Packet {
    let mut packet = Packet::new();
    packet.header.set_type(MessageType::Confirmable);
    packet.header.message_id = message_id;
    packet.set_token(token);

    for segment in request.path().segments() {
        packet.add_option(CoapOption::UriPath, segment.into_bytes());
    }

    match request {
        OperationRequest::Read(_) => {
            packet.header.code = MessageClass::Request(RequestType::Get);
        }
        OperationRequest::Write(_, value) => {
            packet.header.code = MessageClass::Request(RequestType::Put);
            // zero-length option value encodes content-format 0 (text/plain)
            packet.add_option(CoapOption::ContentFormat, Vec::new());
            packet.payload = value.to_text().into_bytes();
        }
        OperationRequest::Execute(_, arguments) => {
            packet.header.code = MessageClass::Request(RequestType::Post);
            packet.payload = arguments.clone().into_bytes();
        }
    }

    packet
}

/// Interpret a device reply packet as a protocol-level outcome
pub fn parse_reply(packet: &Packet) -> Result<DeviceReply, TransportError> {
    let code = match packet.header.code {
        MessageClass::Response(code) => code,
        other => {
            return Err(TransportError::InvalidResponse(format!(
                "expected a response code, got {:?}",
                other
            )))
        }
    };

    let payload = String::from_utf8_lossy(&packet.payload).into_owned();

    if is_success(code) {
        Ok(DeviceReply::Success { payload })
    } else {
        let message = if payload.is_empty() {
            code_label(code).to_string()
        } else {
            payload
        };
        Ok(DeviceReply::Failure { message })
    }
}

fn is_success(code: ResponseType) -> bool {
    matches!(
        code,
        ResponseType::Created
            | ResponseType::Deleted
            | ResponseType::Valid
            | ResponseType::Changed
            | ResponseType::Content
            | ResponseType::Continue
    )
}

/// Human-readable label for an error response without payload text
fn code_label(code: ResponseType) -> &'static str {
    match code {
        ResponseType::BadRequest => "4.00 Bad Request",
        ResponseType::Unauthorized => "4.01 Unauthorized",
        ResponseType::Forbidden => "4.03 Forbidden",
        ResponseType::NotFound => "4.04 Not Found",
        ResponseType::MethodNotAllowed => "4.05 Method Not Allowed",
        ResponseType::NotAcceptable => "4.06 Not Acceptable",
        ResponseType::UnsupportedContentFormat => "4.15 Unsupported Content-Format",
        ResponseType::InternalServerError => "5.00 Internal Server Error",
        ResponseType::NotImplemented => "5.01 Not Implemented",
        ResponseType::ServiceUnavailable => "5.03 Service Unavailable",
        ResponseType::GatewayTimeout => "5.04 Gateway Timeout",
        _ => "error response",
    }
}

/// Uri-Path segments of an incoming request
pub fn uri_path(packet: &Packet) -> Vec<String> {
    packet
        .get_option(CoapOption::UriPath)
        .map(|segments| {
            segments
                .iter()
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Uri-Query parameters (`ep=node1&lt=300`) of an incoming request
pub fn uri_queries(packet: &Packet) -> HashMap<String, String> {
    packet
        .get_option(CoapOption::UriQuery)
        .map(|queries| {
            queries
                .iter()
                .filter_map(|q| {
                    let q = String::from_utf8_lossy(q).into_owned();
                    q.split_once('=')
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a CoRE link-format payload into object links, order preserved
pub fn parse_object_links(payload: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(payload)
        .split(',')
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(str::to_string)
        .collect()
}
