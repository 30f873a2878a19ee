use crate::error::FrameError;

/// Wire error codes defined by the RSocket v1.0 specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidSetup,
    UnsupportedSetup,
    RejectedSetup,
    RejectedResume,
    ConnectionError,
    ConnectionClose,
    ApplicationError,
    Rejected,
    Canceled,
    Invalid,
}

impl ErrorCode {
    pub(crate) fn code(self) -> u32 {
        match self {
            ErrorCode::InvalidSetup => 0x0000_0001,
            ErrorCode::UnsupportedSetup => 0x0000_0002,
            ErrorCode::RejectedSetup => 0x0000_0003,
            ErrorCode::RejectedResume => 0x0000_0004,
            ErrorCode::ConnectionError => 0x0000_0101,
            ErrorCode::ConnectionClose => 0x0000_0102,
            ErrorCode::ApplicationError => 0x0000_0201,
            ErrorCode::Rejected => 0x0000_0202,
            ErrorCode::Canceled => 0x0000_0203,
            ErrorCode::Invalid => 0x0000_0204,
        }
    }

    pub(crate) fn from_code(code: u32) -> Result<Self, FrameError> {
        Ok(match code {
            0x0000_0001 => ErrorCode::InvalidSetup,
            0x0000_0002 => ErrorCode::UnsupportedSetup,
            0x0000_0003 => ErrorCode::RejectedSetup,
            0x0000_0004 => ErrorCode::RejectedResume,
            0x0000_0101 => ErrorCode::ConnectionError,
            0x0000_0102 => ErrorCode::ConnectionClose,
            0x0000_0201 => ErrorCode::ApplicationError,
            0x0000_0202 => ErrorCode::Rejected,
            0x0000_0203 => ErrorCode::Canceled,
            0x0000_0204 => ErrorCode::Invalid,
            _ => return Err(FrameError::UnknownFrameType(0xFF)),
        })
    }
}
