use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::error::ApiError;

/// The `{code, message, data}` wrapper around every platform response.
///
/// `data` is kept raw until the code is known: failed responses put anything
/// in there, often an empty array. Live endpoints send both `message` and
/// `msg`, passport endpoints only `message`.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    fn into_error(self) -> ApiError {
        let message = if self.message.is_empty() {
            self.msg
        } else {
            self.message
        };

        ApiError::from_platform(self.code, message)
    }

    /// Unwraps the payload of a successful response.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if self.code != 0 {
            return Err(self.into_error());
        }
        if self.data.is_null() {
            return Err(ApiError::Protocol("response has no data".into()));
        }

        serde_json::from_value(self.data).map_err(|err| ApiError::Protocol(err.to_string()))
    }

    /// Checks a response whose payload is irrelevant.
    pub fn into_unit(self) -> Result<(), ApiError> {
        if self.code != 0 {
            return Err(self.into_error());
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct QrGenerateData {
    pub url: String,
    pub qrcode_key: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct QrPollData {
    pub code: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct RoomIdData {
    #[serde(default)]
    pub room_id: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct RtmpData {
    pub addr: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct StartLiveData {
    pub rtmp: Option<RtmpData>,
}
