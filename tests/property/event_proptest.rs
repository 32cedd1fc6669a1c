//! Client frame decoding never panics and ids parse leniently

use linkup::shared::event::parse_id;
use linkup::shared::{ClientEvent, ClientFrame};
use proptest::prelude::*;
use uuid::Uuid;

proptest! {
    #[test]
    fn test_arbitrary_event_names_decode_or_error(name in "[a-zA-Z]{0,16}", content in ".*") {
        let frame = ClientFrame::new(name, serde_json::json!({ "content": content }));
        let _ = ClientEvent::from_frame(&frame);
    }

    #[test]
    fn test_parse_id_accepts_padded_uuids(raw in any::<u128>(), pad in " {0,3}") {
        let id = Uuid::from_u128(raw);
        let padded = format!("{}{}{}", pad, id, pad);
        prop_assert_eq!(parse_id(Some(padded.as_str())), Some(id));
    }

    #[test]
    fn test_parse_id_rejects_non_uuids(raw in "[g-z ]{0,20}") {
        prop_assert_eq!(parse_id(Some(raw.as_str())), None);
    }
}
