// Token Provider Port (for deterministic testing)

use rand::RngCore;

/// Token provider interface (allows deterministic machine tokens in tests)
pub trait TokenProvider: Send + Sync {
    /// Generate a 40-character lowercase hex token.
    fn generate(&self) -> String;
}

/// Random token provider (production)
pub struct RandTokenProvider;

impl TokenProvider for RandTokenProvider {
    fn generate(&self) -> String {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Fixed token provider for tests.
    pub struct FixedTokenProvider(pub String);

    impl TokenProvider for FixedTokenProvider {
        fn generate(&self) -> String {
            self.0.clone()
        }
    }
}
