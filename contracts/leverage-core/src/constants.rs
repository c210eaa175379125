pub const BPS: u128 = 10_000u128;
pub const SCALE_1E6: u128 = 1_000_000u128;
/// Upper limit on the caller incentive a vault may configure (10%).
pub const MAX_SUBSIDY_BPS: u128 = 1_000u128;
pub const TTL_THRESHOLD: u32 = 100_000;
pub const TTL_EXTEND_TO: u32 = 200_000;
