/// Solana program IDs recognised by the buy classifier
pub mod programs {
    /// SPL Token program
    pub const TOKEN: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
    /// SPL Token-2022 program
    pub const TOKEN_2022: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
    /// System program
    pub const SYSTEM: &str = "11111111111111111111111111111111";

    /// Programs whose presence marks a transaction as a buy candidate
    pub const RECOGNIZED: [&str; 3] = [TOKEN, TOKEN_2022, SYSTEM];
}

/// Native unit conversion
pub mod native {
    /// 1 SOL = 1,000,000,000 lamports
    pub const LAMPORTS_PER_SOL: u64 = solana_sdk::native_token::LAMPORTS_PER_SOL;
    /// Fiat rate used whenever the oracle cannot be reached
    pub const FALLBACK_USD_RATE: u64 = 150;
}

/// Ledger polling defaults
pub mod polling {
    /// Signatures requested per listing
    pub const SIGNATURE_LIMIT: usize = 10;
    /// Newest entries inspected when catching up after a gap
    pub const CATCH_UP_LIMIT: usize = 3;
    /// Maximum `limit` accepted by `getSignaturesForAddress`
    pub const MAX_SIGNATURE_LIMIT: usize = 1000;
    /// Minimum spend (in SOL) for a balance decrease to count as a buy
    pub const MIN_BUY_SOL: &str = "0.01";
    /// Commitment level used for every ledger query
    pub const COMMITMENT: &str = "confirmed";
}

/// Task intervals
pub mod intervals {
    /// Ledger poller tick
    pub const LEDGER_POLL_SECS: u64 = 60;
    /// Floor tracker tick
    pub const FLOOR_CHECK_SECS: u64 = 300;
}
