//! Property tests for response decoding
//!
//! Bodies come from a network peer, so the decoder must turn any input into a
//! value (success or error) and never panic.

use proptest::prelude::*;
use serde_json::json;
use ssokit_types::{ApiResult, DecodeError, Decoded, ResourceDecoder};

proptest! {
    #[test]
    fn arbitrary_text_never_panics(body in ".*") {
        let result = ResourceDecoder::decode(&body);
        prop_assert!(result.is_success() || result.is_error());
    }

    #[test]
    fn unknown_tags_report_the_tag(tag in "[A-Z][a-zA-Z]{2,16}") {
        prop_assume!(!ResourceDecoder::supports(&tag));

        let body = json!({"__type__": &tag, "id": "x"}).to_string();
        let result = ResourceDecoder::decode(&body);

        prop_assert_eq!(result.clone().error(), Some(DecodeError::UnknownType(tag.clone())));
        prop_assert!(result.message().unwrap_or_default().contains(&tag));
    }

    #[test]
    fn page_total_is_taken_verbatim(count in 1usize..20, extra in 0u64..1000) {
        let data: Vec<_> = (0..count)
            .map(|i| json!({"__type__": "Group", "id": format!("grp_{i}")}))
            .collect();
        let total = count as u64 + extra;
        let body = json!({"data": data, "total": total}).to_string();

        match ResourceDecoder::decode(&body) {
            ApiResult::Success(Decoded::Page(page)) => {
                prop_assert_eq!(page.data.len(), count);
                prop_assert_eq!(page.total, total);
            }
            other => prop_assert!(false, "unexpected: {:?}", other),
        }
    }
}

#[test]
fn decoded_page_serializes_back_to_an_envelope() {
    let body = json!({
        "data": [{"__type__": "Environment", "id": "env_1", "production": true}],
        "total": 9,
    });

    let decoded = ResourceDecoder::decode_value(body).success().unwrap();
    let value = serde_json::to_value(&decoded).unwrap();

    assert_eq!(value["total"], 9);
    assert_eq!(value["data"][0]["__type__"], "Environment");
    assert_eq!(value["data"][0]["production"], true);
}
