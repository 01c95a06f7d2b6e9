use serde::{Deserialize, Serialize};

/// Change operation carried by a result row.
///
/// On the wire the operation is encoded as its numeric code (`0..=3`); a
/// missing code means [`StatementResultOperation::Insert`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum StatementResultOperation {
    #[default]
    Insert,
    UpdateBefore,
    UpdateAfter,
    Delete,
}

impl StatementResultOperation {
    /// Short changelog symbol (`+I`, `-U`, `+U`, `-D`)
    pub fn symbol(&self) -> &'static str {
        match self {
            StatementResultOperation::Insert => "+I",
            StatementResultOperation::UpdateBefore => "-U",
            StatementResultOperation::UpdateAfter => "+U",
            StatementResultOperation::Delete => "-D",
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            StatementResultOperation::Insert => 0,
            StatementResultOperation::UpdateBefore => 1,
            StatementResultOperation::UpdateAfter => 2,
            StatementResultOperation::Delete => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(StatementResultOperation::Insert),
            1 => Some(StatementResultOperation::UpdateBefore),
            2 => Some(StatementResultOperation::UpdateAfter),
            3 => Some(StatementResultOperation::Delete),
            _ => None,
        }
    }
}

impl TryFrom<u8> for StatementResultOperation {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown row operation code {}", code))
    }
}

impl From<StatementResultOperation> for u8 {
    fn from(op: StatementResultOperation) -> Self {
        op.code()
    }
}

impl std::fmt::Display for StatementResultOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
