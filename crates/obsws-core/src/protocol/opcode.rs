//! Operation codes carried in the `op` field of every envelope.

/// All operation codes defined by the protocol.
///
/// There is deliberately no code 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Hello = 0,
    Identify = 1,
    Identified = 2,
    Reidentify = 3,
    Event = 5,
    Request = 6,
    RequestResponse = 7,
    RequestBatch = 8,
    RequestBatchResponse = 9,
}

impl OpCode {
    /// Every defined opcode, in numeric order.
    pub const ALL: [OpCode; 9] = [
        OpCode::Hello,
        OpCode::Identify,
        OpCode::Identified,
        OpCode::Reidentify,
        OpCode::Event,
        OpCode::Request,
        OpCode::RequestResponse,
        OpCode::RequestBatch,
        OpCode::RequestBatchResponse,
    ];

    /// Returns the numeric wire value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// `true` for frames the server sends to the client.
    pub fn is_incoming(self) -> bool {
        matches!(
            self,
            OpCode::Hello
                | OpCode::Identified
                | OpCode::Event
                | OpCode::RequestResponse
                | OpCode::RequestBatchResponse
        )
    }

    /// `true` for frames the client sends to the server.
    pub fn is_outgoing(self) -> bool {
        matches!(
            self,
            OpCode::Identify | OpCode::Reidentify | OpCode::Request | OpCode::RequestBatch
        )
    }
}

impl TryFrom<i64> for OpCode {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OpCode::Hello),
            1 => Ok(OpCode::Identify),
            2 => Ok(OpCode::Identified),
            3 => Ok(OpCode::Reidentify),
            5 => Ok(OpCode::Event),
            6 => Ok(OpCode::Request),
            7 => Ok(OpCode::RequestResponse),
            8 => Ok(OpCode::RequestBatch),
            9 => Ok(OpCode::RequestBatchResponse),
            other => Err(other),
        }
    }
}
