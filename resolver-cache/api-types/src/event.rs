use {
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateEventKind {
    Pair,
    PairEsdtTokens,
    Token,
}

/// An invalidation or update signal for a single cached entity.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct UpdateEvent {
    pub kind:      UpdateEventKind,
    /// Namespace of the addressed entity.
    #[schema(example = "pairs")]
    pub namespace: String,
    /// Key of the addressed entity.
    #[schema(example = "erd1qqqqqqqqqqqqqpgqeel2kumf0r8ffyhth7pqdujjat9nx0862jpsg2pqaq")]
    pub key:       String,
    /// New or partial value. An absent payload evicts the entity.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub payload:   Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct PublishResult {
    /// Number of subscribers the event was delivered to.
    #[schema(example = 1)]
    pub receivers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        let event: UpdateEvent = serde_json::from_str(
            r#"{"kind":"PAIR_ESDT_TOKENS","namespace":"pairsEsdtTokens","key":"erd1"}"#,
        )
        .unwrap();
        assert_eq!(event.kind, UpdateEventKind::PairEsdtTokens);
        assert_eq!(event.payload, None);
        assert_eq!(
            serde_json::to_value(UpdateEventKind::Token).unwrap(),
            serde_json::json!("TOKEN")
        );
    }
}
