//! End-to-end flows across the pool, bank, registry and config

use anyhow::Result;
use steamm_core::{
    Asset, Bank, CoreResult, FeeConfig, LendingAction, LendingMarket, Pool, PoolId, PoolRegistry,
    ProtocolConfig, SteammError, SwapFeeConfig,
};

struct Sui;
struct Usdc;

impl Asset for Sui {
    const SYMBOL: &'static str = "SUI";
}

impl Asset for Usdc {
    const SYMBOL: &'static str = "USDC";
}

/// Lending market paying ctokens 1:1 and accruing interest on demand
#[derive(Default)]
struct MockMarket {
    deposited: u64,
    ctokens: u64,
}

impl MockMarket {
    fn accrue_interest(&mut self, amount: u64) {
        self.deposited += amount;
    }
}

impl LendingMarket for MockMarket {
    fn deploy(&mut self, amount: u64) -> CoreResult<u64> {
        let minted = if self.ctokens == 0 {
            amount
        } else {
            amount * self.ctokens / self.deposited
        };
        self.deposited += amount;
        self.ctokens += minted;
        Ok(minted)
    }

    fn recall(&mut self, ctokens: u64) -> CoreResult<u64> {
        if ctokens > self.ctokens {
            return Err(SteammError::InsufficientLiquidity);
        }
        let amount = ctokens * self.deposited / self.ctokens;
        self.deposited -= amount;
        self.ctokens -= ctokens;
        Ok(amount)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn test_pool_lifecycle() -> Result<()> {
    init_tracing();

    let config = ProtocolConfig::default();
    let mut registry = PoolRegistry::new();
    let mut pool: Pool<Sui, Usdc> = Pool::from_config(&config, 0)?;
    registry.register::<Sui, Usdc>(PoolId(7))?;

    let initial = pool.deposit(1_000_000, 4_000_000, 0)?;
    assert!(initial.initial_deposit);
    assert_eq!(initial.mint_lp, 2_000_000 - 10);

    let mut k = pool.k()?;
    for (amount, a2b) in [(10_000, true), (40_000, false), (123_456, true), (7, false)] {
        let quote = pool.swap(amount, a2b, 1)?;
        assert!(quote.amount_out > 0);
        let k_after = pool.k()?;
        assert!(k_after >= k);
        k = k_after;
    }

    let data = *pool.trading_data();
    assert_eq!(data.total_swap_a_in_amount(), 133_456);
    assert_eq!(data.total_swap_b_in_amount(), 40_007);

    let (protocol_a, protocol_b) = pool.collect_protocol_fees();
    assert_eq!(protocol_a, data.protocol_fees_a);
    assert_eq!(protocol_b, data.protocol_fees_b);
    assert_eq!(pool.protocol_fees().balances(), (0, 0));

    let redeem = pool.redeem(initial.mint_lp, 0, 0)?;
    assert!(redeem.fees_a > 0 && redeem.fees_b > 0);
    // Only the locked floor remains
    assert_eq!(pool.lp_supply(), 10);
    assert!(pool.reserve_a() > 0 && pool.reserve_b() > 0);

    assert_eq!(registry.get::<Sui, Usdc>(), Some(PoolId(7)));
    Ok(())
}

#[test]
fn test_offset_pool_bounds_input() -> Result<()> {
    let swap_fees = SwapFeeConfig::new(FeeConfig::from_bps(30, 0)?, 0)?;
    let mut pool: Pool<Sui, Usdc> = Pool::new(swap_fees, FeeConfig::zero(), 1_000_000, 100)?;
    pool.deposit(0, 500_000, 0)
        .expect_err("a one-sided first deposit has no geometric mean");

    pool.deposit(1_000, 500_000, 0)?;
    let bound = pool
        .max_amount_in_on_a2b()?
        .expect("offset pools are bounded");

    assert!(pool.quote_swap(bound, true).is_ok());
    // Twice the bound is far past the drain point
    assert_eq!(
        pool.quote_swap(bound.saturating_mul(2), true),
        Err(SteammError::InsufficientLiquidity)
    );
    Ok(())
}

#[test]
fn test_bank_recall_before_withdraw() -> Result<()> {
    init_tracing();

    let config = ProtocolConfig::default();
    let mut market = MockMarket::default();
    let mut bank = Bank::new();
    bank.init_lending_from_config(&config, 0)?;

    let btokens = bank.deposit(10_000)?;
    assert_eq!(btokens, 10_000);

    // All funds idle: far below the 7000..9000 band
    assert_eq!(bank.needs_lending_action(0, true)?, LendingAction::Recall);
    bank.deploy(&mut market, 8_000)?;
    assert_eq!(bank.effective_utilisation_bps(), 8_000);
    assert_eq!(bank.needs_lending_action(0, true)?, LendingAction::None);

    // A withdrawal beyond the liquid funds requires a recall first
    assert_eq!(bank.needs_lending_action(5_000, false)?, LendingAction::Recall);
    assert_eq!(bank.withdraw(5_000), Err(SteammError::InsufficientLiquidity));

    let recall = bank.recall_amount_for_withdraw(5_000)?;
    assert!(recall >= 3_000);
    bank.recall(&mut market, recall)?;
    assert_eq!(bank.withdraw(5_000)?, 5_000);
    assert_eq!(bank.total_funds()?, 5_000);
    assert_eq!(bank.effective_utilisation_bps(), 8_000);

    // A large deposit dilutes utilisation below the band
    bank.deposit(4_000)?;
    let (action, amount) = bank.rebalance_amount()?;
    assert_eq!((action, amount), (LendingAction::Lend, 3_200));
    assert_eq!(bank.rebalance(&mut market)?, (LendingAction::Lend, 3_200));
    assert_eq!(bank.effective_utilisation_bps(), 8_000);
    Ok(())
}

#[test]
fn test_market_interest_reaches_btokens() -> Result<()> {
    let mut market = MockMarket::default();
    let mut bank = Bank::new();
    bank.init_lending(5_000, 500, 0)?;
    bank.deposit(1_000)?;
    bank.deploy(&mut market, 500)?;
    market.accrue_interest(500);

    // The bank books interest only when it is recalled
    let released = bank.recall(&mut market, 500)?;
    assert_eq!(released, 1_000);
    assert_eq!(bank.funds_available, 1_500);
    assert_eq!(bank.from_btokens(1_000)?, 1_500);
    Ok(())
}

#[test]
fn test_config_drives_pool_fees() -> Result<()> {
    let config = ProtocolConfig::from_toml_str(
        r#"
[swap]
fee_bps = 100
min_fee = 0
protocol_share_bps = 5000
max_in_safety_margin_bps = 0

[redemption]
fee_bps = 0
min_fee = 0

[bank]
target_utilisation_bps = 5000
utilisation_buffer_bps = 500
"#,
    )?;
    let mut pool: Pool<Sui, Usdc> = Pool::from_config(&config, 0)?;
    pool.deposit(1_000_000, 1_000_000, 0)?;

    let quote = pool.swap(10_000, false, 0)?;
    assert_eq!((quote.protocol_fees, quote.pool_fees), (50, 50));
    assert_eq!(pool.protocol_fees().fee_b(), 50);
    Ok(())
}

#[cfg(feature = "client")]
#[test]
fn test_quote_snapshot() -> Result<()> {
    let swap_fees = SwapFeeConfig::new(FeeConfig::from_bps(30, 0)?, 0)?;
    let quote = steamm_core::cpmm::quote_swap(1_000_000, 1_000_000, 1_000, 0, true, &swap_fees)?;
    let json = serde_json::to_value(quote)?;
    assert_eq!(
        json,
        serde_json::json!({
            "amount_in": 1000,
            "amount_out": 996,
            "protocol_fees": 0,
            "pool_fees": 3,
            "a2b": true
        })
    );
    Ok(())
}
