//! External collaborators consumed by the obfuscation pipeline: the identifier oracle, the
//! junk-fragment oracle and the symmetric encryption service, with the adapters that make
//! their failures recoverable.
pub mod cipher;
pub mod fragments;
pub mod llm;
pub mod names;

pub use cipher::{AesGcmCipher, Cipher, Key};
pub use fragments::{FragmentOracle, LlmFragmentOracle};
pub use llm::{LlmClient, LlmConfig};
pub use names::{IdentifierOracle, LlmNameOracle, NameGenerator, RandomNameOracle, UnavailableOracle};
