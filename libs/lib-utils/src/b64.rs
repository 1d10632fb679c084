use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

pub fn b64u_encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn b64u_decode(enc: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_NO_PAD
        .decode(enc)
        .map_err(|_| Error::FailToB64uDecode)
}

pub fn b64u_decode_to_string(enc: &str) -> Result<String, Error> {
    b64u_decode(enc).ok().and_then(|v| String::from_utf8(v).ok()).ok_or(Error::FailToB64uDecode)
}

#[derive(Debug)]
pub enum Error {
    FailToB64uDecode,
}

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
