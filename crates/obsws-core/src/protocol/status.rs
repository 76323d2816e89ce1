//! Numeric status tables: per-request status codes and WebSocket close codes.
//!
//! Both tables are closed enumerations on paper, but servers newer than this
//! crate may send codes it has never heard of.  Unknown codes are therefore
//! preserved verbatim in an `Other` variant instead of being rejected, so a
//! caller can still log or compare the exact number the server sent.
//!
//! Each table is declared once with `numeric_table!`, which generates the
//! enum, both lookup directions, and an `ALL` list used by the exhaustive
//! round-trip tests at the bottom of this file.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Declares a numeric wire table with an `Other` fallback variant.
macro_rules! numeric_table {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A code this crate does not know, preserved verbatim.
            Other($repr),
        }

        impl $name {
            /// Every known variant, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// Returns the numeric wire value.
            pub fn code(self) -> $repr {
                match self {
                    $( $name::$variant => $code, )+
                    $name::Other(code) => code,
                }
            }

            /// Looks up a numeric wire value; unknown values become `Other`.
            pub fn from_code(code: $repr) -> Self {
                match code {
                    $( $code => $name::$variant, )+
                    other => $name::Other(other),
                }
            }

            /// Returns the protocol name of a known variant.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $( $name::$variant => Some(stringify!($variant)), )+
                    $name::Other(_) => None,
                }
            }
        }

        impl From<$repr> for $name {
            fn from(code: $repr) -> Self {
                Self::from_code(code)
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> Self {
                value.code()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.code().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                <$repr>::deserialize(deserializer).map(Self::from_code)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.name() {
                    Some(name) => write!(f, "{name} ({})", self.code()),
                    None => write!(f, "unknown ({})", self.code()),
                }
            }
        }
    };
}

numeric_table! {
    /// Outcome classification the server assigns to a single request.
    ///
    /// `Success` (100) is the only success code.  The hundreds digit groups
    /// failures: 2xx request-level, 3xx–4xx field errors, 5xx output state,
    /// 6xx resources, 7xx action failures.
    pub enum RequestStatus: i64 {
        Unknown = 0,
        NoError = 10,
        Success = 100,
        MissingRequestType = 203,
        UnknownRequestType = 204,
        GenericError = 205,
        UnsupportedRequestBatchExecutionType = 206,
        NotReady = 207,
        MissingRequestField = 300,
        MissingRequestData = 301,
        InvalidRequestField = 400,
        InvalidRequestFieldType = 401,
        RequestFieldOutOfRange = 402,
        RequestFieldEmpty = 403,
        TooManyRequestFields = 404,
        OutputRunning = 500,
        OutputNotRunning = 501,
        OutputPaused = 502,
        OutputNotPaused = 503,
        OutputDisabled = 504,
        StudioModeActive = 505,
        StudioModeNotActive = 506,
        ResourceNotFound = 600,
        ResourceAlreadyExists = 601,
        InvalidResourceType = 602,
        NotEnoughResources = 603,
        InvalidResourceState = 604,
        InvalidInputKind = 605,
        ResourceNotConfigurable = 606,
        InvalidFilterKind = 607,
        ResourceCreationFailed = 700,
        ResourceActionFailed = 701,
        RequestProcessingFailed = 702,
        CannotAct = 703,
    }
}

impl RequestStatus {
    /// `true` only for [`RequestStatus::Success`].
    pub fn is_success(self) -> bool {
        self == RequestStatus::Success
    }
}

numeric_table! {
    /// Close codes the server uses when it terminates the session.
    pub enum CloseCode: u16 {
        /// Internal sentinel: the server does not close.
        DontClose = 0,
        UnknownReason = 4000,
        MessageDecodeError = 4002,
        MissingDataField = 4003,
        InvalidDataFieldType = 4004,
        InvalidDataFieldValue = 4005,
        UnknownOpCode = 4006,
        NotIdentified = 4007,
        AlreadyIdentified = 4008,
        AuthenticationFailed = 4009,
        UnsupportedRpcVersion = 4010,
        SessionInvalidated = 4011,
        UnsupportedFeature = 4012,
    }
}

impl CloseCode {
    /// `true` for codes that mean the handshake itself was refused, so
    /// retrying with the same credentials cannot succeed.
    pub fn is_handshake_rejection(self) -> bool {
        matches!(
            self,
            CloseCode::AuthenticationFailed | CloseCode::UnsupportedRpcVersion
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_request_status_round_trips() {
        for status in RequestStatus::ALL {
            assert_eq!(RequestStatus::from_code(status.code()), *status);
        }
    }

    #[test]
    fn test_request_status_codes_are_unique() {
        let mut codes: Vec<i64> = RequestStatus::ALL.iter().map(|s| s.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), RequestStatus::ALL.len());
    }

    #[test]
    fn test_unknown_request_status_is_preserved() {
        // Arrange / Act
        let status = RequestStatus::from_code(999);

        // Assert
        assert_eq!(status, RequestStatus::Other(999));
        assert_eq!(status.code(), 999);
        assert_eq!(status.name(), None);
    }

    #[test]
    fn test_request_status_deserializes_from_bare_integer() {
        let status: RequestStatus = serde_json::from_str("604").unwrap();
        assert_eq!(status, RequestStatus::InvalidResourceState);

        let unknown: RequestStatus = serde_json::from_str("812").unwrap();
        assert_eq!(unknown, RequestStatus::Other(812));
    }

    #[test]
    fn test_request_status_serializes_to_bare_integer() {
        let json = serde_json::to_string(&RequestStatus::Success).unwrap();
        assert_eq!(json, "100");
    }

    #[test]
    fn test_only_success_is_success() {
        for status in RequestStatus::ALL {
            assert_eq!(status.is_success(), *status == RequestStatus::Success);
        }
    }

    #[test]
    fn test_request_status_display_includes_name_and_code() {
        assert_eq!(
            RequestStatus::ResourceNotFound.to_string(),
            "ResourceNotFound (600)"
        );
        assert_eq!(RequestStatus::Other(42).to_string(), "unknown (42)");
    }

    #[test]
    fn test_every_close_code_round_trips() {
        for code in CloseCode::ALL {
            assert_eq!(CloseCode::from_code(code.code()), *code);
        }
    }

    #[test]
    fn test_close_code_range_is_4000_to_4012_plus_sentinel() {
        for code in CloseCode::ALL {
            let n = code.code();
            assert!(n == 0 || (4000..=4012).contains(&n), "{code} out of range");
        }
    }

    #[test]
    fn test_unknown_close_code_is_preserved() {
        assert_eq!(CloseCode::from_code(1006), CloseCode::Other(1006));
    }

    #[test]
    fn test_handshake_rejection_codes() {
        assert!(CloseCode::AuthenticationFailed.is_handshake_rejection());
        assert!(CloseCode::UnsupportedRpcVersion.is_handshake_rejection());
        assert!(!CloseCode::SessionInvalidated.is_handshake_rejection());
        assert!(!CloseCode::Other(1000).is_handshake_rejection());
    }
}
