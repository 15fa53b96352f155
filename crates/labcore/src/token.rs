use crate::graph::EdgeId;
use crate::record::RecordId;
use crate::value::Literal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TokenId = Uuid;

/// Unit of data/control propagation along an activity edge.
///
/// A token is produced by exactly one firing and consumed by exactly one
/// later firing. `edge` is `None` for pin-internal tokens, which flow from an
/// input pin to the action that owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub edge: Option<EdgeId>,
    /// Firing record that produced this token
    pub source: RecordId,
    pub value: Literal,
}

impl Token {
    pub fn new(edge: Option<EdgeId>, source: RecordId, value: Literal) -> Self {
        Self {
            id: Uuid::new_v4(),
            edge,
            source,
            value,
        }
    }
}
