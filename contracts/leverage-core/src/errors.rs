use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum LeverageError {
    // Configuration
    InvalidBoundsConfiguration = 1,
    DivisionByZero = 2,
    PositionInsolvent = 3,
    MathOverflow = 4,
    AlreadyInitialized = 5,
    NotInitialized = 6,
    Unauthorized = 7,
    VaultNotRegistered = 8,
    VaultAlreadyRegistered = 9,
    // Logical declines: stop, do not retry
    NoRebalanceNeeded = 10,
    DepositsDisabled = 11,
    WrongDirection = 12,
    // Execution failures
    SlippageExceeded = 20,
    InsufficientRepayment = 21,
    InsufficientOutput = 22,
    StalePrice = 23,
    FlashLiquidityUnavailable = 24,
    QuoteExceedsInstruction = 25,
    SwapInstructionMismatch = 26,
    DepositCapExceeded = 27,
    PrincipalTokenMatured = 28,
    ResidualBalance = 29,
    RebalanceOutOfBounds = 30,
    InvalidAmount = 31,
    // Collaborator legs
    FlashLegFailed = 40,
    SwapLegFailed = 41,
    PoolLegFailed = 42,
    OracleLegFailed = 43,
}

impl LeverageError {
    /// Declines mean the position does not need (or cannot take) this
    /// rebalance right now; callers should stop rather than retry.
    pub fn is_decline(&self) -> bool {
        matches!(
            self,
            LeverageError::NoRebalanceNeeded
                | LeverageError::DepositsDisabled
                | LeverageError::WrongDirection
        )
    }

    pub fn is_configuration(&self) -> bool {
        (*self as u32) < 10
    }
}
