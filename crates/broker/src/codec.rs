use crate::envelope::Envelope;
use crate::error::Error;

use std::fmt::Debug;

use bytes::Bytes;

/// Wire format for envelopes.
pub trait Codec
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// Short format name for log lines.
    fn name(&self) -> &'static str;

    /// Serializes an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be serialized.
    fn encode(&self, envelope: &Envelope) -> Result<Bytes, Error>;

    /// Deserializes an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid envelope.
    fn decode(&self, bytes: &[u8]) -> Result<Envelope, Error>;
}

/// JSON objects, readable with `redis-cli monitor` and friends.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, envelope: &Envelope) -> Result<Bytes, Error> {
        Ok(Bytes::from(serde_json::to_vec(envelope)?))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Envelope, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Compact binary encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn encode(&self, envelope: &Envelope) -> Result<Bytes, Error> {
        let mut writer = Vec::new();
        ciborium::ser::into_writer(envelope, &mut writer)?;
        Ok(Bytes::from(writer))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Envelope, Error> {
        Ok(ciborium::de::from_reader(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use airsync_events::{Session, SessionEvent};
    use assert_matches::assert_matches;

    fn envelope() -> Envelope {
        Envelope::wrap(&SessionEvent::session_created(Session::new()), "instance-1")
    }

    #[test]
    fn test_json_is_a_flat_object() {
        let bytes = JsonCodec.encode(&envelope()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["kind"], "session.created");
        assert_eq!(value["client_id"], "instance-1");
        assert_eq!(value["payload"]["kind"], "session.created");
        assert!(value["payload"]["data"]["id"].is_string());
    }

    #[test]
    fn test_both_codecs_decode_what_they_encode() {
        let sent = envelope();

        let json = JsonCodec.decode(&JsonCodec.encode(&sent).unwrap()).unwrap();
        let cbor = CborCodec.decode(&CborCodec.encode(&sent).unwrap()).unwrap();

        assert_eq!(json, sent);
        assert_eq!(cbor, sent);
    }

    #[test]
    fn test_cbor_is_smaller_than_json() {
        let sent = envelope();

        let json = JsonCodec.encode(&sent).unwrap();
        let cbor = CborCodec.encode(&sent).unwrap();

        assert!(cbor.len() < json.len());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_matches!(JsonCodec.decode(b"not json"), Err(Error::Json(_)));
        assert_matches!(CborCodec.decode(&[0xff, 0x00]), Err(Error::CborDecode(_)));
    }
}
