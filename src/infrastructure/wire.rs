// JSON wire messages exchanged with the simulation client
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Decoded client→server message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    ReactorData(Map<String, Value>),
    TurbineData(Map<String, Value>),
    RawDataRequest,
    /// Correlation value to echo back; `Null` when the client sent none.
    Ping(Value),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("JSON inválido: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("mensagem sem campo 'type'")]
    MissingType,
    #[error("payload inválido para '{0}': 'dados' deve ser um objeto")]
    InvalidPayload(String),
    #[error("tipo de mensagem desconhecido: {0}")]
    UnknownType(String),
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let mut envelope = match value {
            Value::Object(map) => map,
            _ => return Err(ProtocolError::MissingType),
        };

        let kind = match envelope.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_string(),
            None => return Err(ProtocolError::MissingType),
        };

        match kind.as_str() {
            "reactor_data" => Ok(Self::ReactorData(take_payload(&mut envelope, &kind)?)),
            "turbine_data" => Ok(Self::TurbineData(take_payload(&mut envelope, &kind)?)),
            "raw_data_request" => Ok(Self::RawDataRequest),
            "ping" => Ok(Self::Ping(
                envelope.remove("timestamp").unwrap_or(Value::Null),
            )),
            _ => Err(ProtocolError::UnknownType(kind)),
        }
    }
}

/// `dados` field of a data message. A missing payload is an empty field set.
fn take_payload(
    envelope: &mut Map<String, Value>,
    kind: &str,
) -> Result<Map<String, Value>, ProtocolError> {
    match envelope.remove("dados") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(fields)) => Ok(fields),
        Some(_) => Err(ProtocolError::InvalidPayload(kind.to_string())),
    }
}

/// Sent once, immediately after a client connects.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionAck {
    pub tipo: &'static str,
    pub mensagem: &'static str,
    pub timestamp: f64,
}

impl ConnectionAck {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            tipo: "conexao_estabelecida",
            mensagem: "Conectado ao servidor de telemetria de fusão",
            timestamp: unix_seconds(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawDataPayload {
    pub reator: Map<String, Value>,
    pub turbina: Map<String, Value>,
    pub timestamp: f64,
}

/// Server→client reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "confirmacao")]
    Confirmation { status: &'static str, timestamp: f64 },
    #[serde(rename = "dados_brutos")]
    RawData { dados: RawDataPayload, timestamp: f64 },
    #[serde(rename = "pong")]
    Pong { timestamp: Value },
    #[serde(rename = "erro")]
    Error { mensagem: String },
}

impl ServerMessage {
    pub fn reactor_received(now: DateTime<Utc>) -> Self {
        Self::Confirmation {
            status: "dados_reator_recebidos",
            timestamp: unix_seconds(now),
        }
    }

    pub fn turbine_received(now: DateTime<Utc>) -> Self {
        Self::Confirmation {
            status: "dados_turbina_recebidos",
            timestamp: unix_seconds(now),
        }
    }

    pub fn error(err: &ProtocolError) -> Self {
        Self::Error {
            mensagem: err.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| encoding_failure(&err))
    }
}

fn encoding_failure(err: &dyn std::fmt::Display) -> String {
    serde_json::json!({
        "type": "erro",
        "mensagem": format!("falha ao serializar resposta: {err}")
    })
    .to_string()
}

/// Fractional UNIX seconds, the client's timestamp convention.
pub fn unix_seconds(now: DateTime<Utc>) -> f64 {
    now.timestamp_millis() as f64 / 1000.0
}
