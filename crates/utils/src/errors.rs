use thiserror::Error;

/// Error type for the external name and fragment oracles.
///
/// Oracle failures are never fatal to an obfuscation run: every caller resolves them through
/// a deterministic local fallback.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The transport failed (connection refused, TLS error, non-2xx status).
    #[error("oracle request failed: {0}")]
    Http(String),
    /// The oracle answered but the payload did not have the expected shape.
    #[error("invalid oracle response: {0}")]
    InvalidResponse(String),
    /// The oracle did not answer within the configured time budget.
    #[error("oracle timed out after {0} ms")]
    Timeout(u128),
    /// No oracle is configured or it refuses to serve requests.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// Error type for the symmetric encryption service.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed")]
    Decrypt,
    #[error("ciphertext too short to contain a nonce")]
    Truncated,
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
    #[error("decrypted payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Error type for the parser collaborator.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source text (or tree document) is not well formed.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// The serialized tree could not be decoded.
    #[error("tree decode error: {0}")]
    Tree(#[from] serde_json::Error),
    /// The external parser process could not be run.
    #[error("parser process failed: {0}")]
    Process(#[from] std::io::Error),
}

/// Error type for transform operations.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A pass asked for a synthetic name after the reserved pool ran dry.
    #[error("reserved name pool exhausted while running {pass}; raise reserve_slack")]
    ReservedPoolExhausted { pass: &'static str },
    /// The encryption service failed while sealing a function body.
    #[error("encryption error: {0}")]
    Cipher(#[from] CipherError),
    /// A sealed body did not decrypt back to the serialized plaintext.
    #[error("ciphertext for function `{0}` does not round-trip")]
    RoundTripMismatch(String),
}

/// Errors that can occur during obfuscation.
#[derive(Debug, Error)]
pub enum ObfuscateError {
    /// Transform application failed.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
    /// Parsing the input failed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    /// Invalid transform pass specified.
    #[error("invalid pass: {0}")]
    InvalidPass(String),
    /// The configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
    /// File read/write error.
    #[error("file error: {0}")]
    File(#[from] std::io::Error),
    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
