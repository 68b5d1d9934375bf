use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Placeholder shown when the gateway omits the sender's display name.
pub const ANONYMOUS_SENDER: &str = "Anonymous";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("gift event is missing a usable '{0}' field")]
    MissingField(&'static str),

    #[error("field '{field}' is not a non-negative integer (got {value})")]
    NotANonNegativeInteger { field: &'static str, value: Value },

    #[error("repeatCount must be at least 1")]
    ZeroRepeatCount,

    #[error("combo gift arrived without a comboId")]
    MissingComboId,
}

/// Gift notification as relayed by the webcast gateway. Field names mirror
/// the wire format; numeric fields stay as raw JSON values so that a bad
/// number fails normalization instead of failing the whole frame parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawGiftEvent {
    pub gift_id: Option<Value>,
    pub sender_name: Option<String>,
    pub coins: Option<Value>,
    pub repeat_count: Option<Value>,
    pub is_combo: Option<bool>,
    pub is_finished: Option<bool>,
    pub combo_id: Option<String>,
}

/// Canonical gift event, post-validation. Everything downstream of the
/// normalizer works on this shape only.
#[derive(Debug, Clone, PartialEq)]
pub struct GiftEvent {
    pub gift_id: String,
    pub sender_name: String,
    /// Seconds added per gift unit.
    pub coin_value: u64,
    /// Cumulative count within the combo series; 1 for non-combo gifts.
    pub repeat_count: u64,
    pub is_combo: bool,
    pub is_finished: bool,
    /// Unique key of the combo series. Synthesized per event when the gift
    /// is not part of a combo and the gateway sent none.
    pub combo_id: String,
}

impl GiftEvent {
    /// Validates and reshapes a raw gateway event.
    ///
    /// Fails when `coins` or `repeatCount` cannot be resolved to
    /// non-negative integers, or when a combo gift carries no `comboId`
    /// (we never guess a series key). Unknown fields are ignored upstream
    /// by serde.
    pub fn normalize(raw: &RawGiftEvent) -> Result<Self, ValidationError> {
        let coin_value = require_u64(&raw.coins, "coins")?;
        let repeat_count = require_u64(&raw.repeat_count, "repeatCount")?;
        if repeat_count == 0 {
            return Err(ValidationError::ZeroRepeatCount);
        }

        let is_combo = raw.is_combo.unwrap_or(false);
        let combo_id = match &raw.combo_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ if is_combo => return Err(ValidationError::MissingComboId),
            _ => Uuid::new_v4().to_string(),
        };

        // Non-combo gifts are single-shot; the terminal flag only has
        // meaning inside a combo series.
        let is_finished = if is_combo {
            raw.is_finished.unwrap_or(false)
        } else {
            true
        };

        let sender_name = raw
            .sender_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| ANONYMOUS_SENDER.to_string());

        Ok(Self {
            gift_id: raw.gift_id.as_ref().map(value_as_string).unwrap_or_default(),
            sender_name,
            coin_value,
            repeat_count,
            is_combo,
            is_finished,
            combo_id,
        })
    }
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn require_u64(value: &Option<Value>, field: &'static str) -> Result<u64, ValidationError> {
    let value = value.as_ref().ok_or(ValidationError::MissingField(field))?;
    value
        .as_u64()
        .ok_or_else(|| ValidationError::NotANonNegativeInteger {
            field,
            value: value.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn combo_raw(coins: u64, repeat: u64, combo_id: &str) -> RawGiftEvent {
        RawGiftEvent {
            gift_id: Some(json!(5655)),
            sender_name: Some("viewer_1".to_string()),
            coins: Some(json!(coins)),
            repeat_count: Some(json!(repeat)),
            is_combo: Some(true),
            is_finished: Some(false),
            combo_id: Some(combo_id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_combo_gift() {
        let gift = GiftEvent::normalize(&combo_raw(1, 3, "g1")).unwrap();
        assert_eq!(gift.coin_value, 1);
        assert_eq!(gift.repeat_count, 3);
        assert_eq!(gift.combo_id, "g1");
        assert!(gift.is_combo);
        assert!(!gift.is_finished);
    }

    #[test]
    fn parses_wire_format_field_names() {
        let raw: RawGiftEvent = serde_json::from_value(json!({
            "giftId": 5655,
            "giftName": "Rose",
            "senderName": "viewer_1",
            "senderProfile": "https://cdn.example/p.png",
            "coins": 1,
            "repeatCount": 4,
            "isCombo": true,
            "isFinished": true,
            "comboId": "g1",
            "someFutureField": {"ignored": true},
        }))
        .unwrap();

        let gift = GiftEvent::normalize(&raw).unwrap();
        assert_eq!(gift.gift_id, "5655");
        assert_eq!(gift.repeat_count, 4);
        assert!(gift.is_finished);
    }

    #[test]
    fn rejects_missing_or_malformed_numbers() {
        let mut raw = combo_raw(1, 1, "g1");
        raw.coins = None;
        assert_eq!(
            GiftEvent::normalize(&raw),
            Err(ValidationError::MissingField("coins"))
        );

        let mut raw = combo_raw(1, 1, "g1");
        raw.coins = Some(json!(-3));
        assert!(matches!(
            GiftEvent::normalize(&raw),
            Err(ValidationError::NotANonNegativeInteger { field: "coins", .. })
        ));

        let mut raw = combo_raw(1, 1, "g1");
        raw.repeat_count = Some(json!("lots"));
        assert!(matches!(
            GiftEvent::normalize(&raw),
            Err(ValidationError::NotANonNegativeInteger {
                field: "repeatCount",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_repeat_count() {
        let mut raw = combo_raw(1, 1, "g1");
        raw.repeat_count = Some(json!(0));
        assert_eq!(
            GiftEvent::normalize(&raw),
            Err(ValidationError::ZeroRepeatCount)
        );
    }

    #[test]
    fn zero_coin_gift_is_valid() {
        let gift = GiftEvent::normalize(&combo_raw(0, 1, "g1")).unwrap();
        assert_eq!(gift.coin_value, 0);
    }

    #[test]
    fn combo_without_id_is_rejected() {
        let mut raw = combo_raw(1, 1, "g1");
        raw.combo_id = None;
        assert_eq!(
            GiftEvent::normalize(&raw),
            Err(ValidationError::MissingComboId)
        );

        let mut raw = combo_raw(1, 1, "g1");
        raw.combo_id = Some(String::new());
        assert_eq!(
            GiftEvent::normalize(&raw),
            Err(ValidationError::MissingComboId)
        );
    }

    #[test]
    fn non_combo_without_id_gets_a_unique_one() {
        let raw = RawGiftEvent {
            coins: Some(json!(30)),
            repeat_count: Some(json!(1)),
            ..Default::default()
        };

        let a = GiftEvent::normalize(&raw).unwrap();
        let b = GiftEvent::normalize(&raw).unwrap();
        assert!(!a.combo_id.is_empty());
        assert_ne!(a.combo_id, b.combo_id);
    }

    #[test]
    fn missing_sender_gets_placeholder_and_non_combo_is_finished() {
        let raw = RawGiftEvent {
            coins: Some(json!(5)),
            repeat_count: Some(json!(1)),
            is_finished: Some(false),
            ..Default::default()
        };

        let gift = GiftEvent::normalize(&raw).unwrap();
        assert_eq!(gift.sender_name, ANONYMOUS_SENDER);
        assert!(!gift.is_combo);
        assert!(gift.is_finished);
    }
}
