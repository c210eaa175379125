use leverage_core::interfaces::PrincipalTokenClient;
use leverage_core::TokenKind;
use soroban_sdk::{Address, Env};

/// How collateral of a given kind can be acquired.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SwapRoute {
    Venue,
    /// Matured principal tokens are redeemed, not bought.
    Closed,
}

/// Resolve the token kind once with a single capability probe: anything
/// answering `maturity()` is a principal token.
pub fn probe(env: &Env, token: &Address) -> TokenKind {
    match PrincipalTokenClient::new(env, token).try_maturity() {
        Ok(Ok(maturity)) => TokenKind::PrincipalToken(maturity),
        _ => TokenKind::Plain,
    }
}

pub fn buy_route(env: &Env, kind: &TokenKind) -> SwapRoute {
    match kind {
        TokenKind::Plain => SwapRoute::Venue,
        TokenKind::PrincipalToken(maturity) if env.ledger().timestamp() < *maturity => SwapRoute::Venue,
        TokenKind::PrincipalToken(_) => SwapRoute::Closed,
    }
}
