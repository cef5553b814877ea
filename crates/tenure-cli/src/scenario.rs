//! Scenario files
//!
//! A scenario seeds balances, then runs a list of steps against one pool.
//! Amounts are written in whole asset units as strings (`"1000"`, `"0.5"`).

use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tenure_common::{AccountId, Amount, AssetUnit, TenureError, Timestamp};
use tenure_ledger::{
    Clock, Collaborators, DelegationAuthorizer, InMemoryBonusLedger, InMemoryVault, LedgerConfig,
    LenderPool, ManualClock, PoolSettings, SystemClock,
};

/// Parsed scenario file
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Overrides the loaded pool settings
    #[serde(default)]
    pub pool: Option<PoolSettings>,
    /// Start time; wall clock when absent
    #[serde(default)]
    pub start: Option<Timestamp>,
    /// Initial pool reserve for paying rewards
    #[serde(default)]
    pub reserve: Decimal,
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
    #[serde(default)]
    pub delegates: Vec<DelegateSeed>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct AccountSeed {
    pub id: String,
    pub balance: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct DelegateSeed {
    pub depositor: String,
    pub agent: String,
}

/// One scenario action
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    CreateRound {
        depositor: String,
        #[serde(default)]
        caller: Option<String>,
        amount: Decimal,
        bonus_rate_bps: u32,
        tenure_days: u32,
        #[serde(default)]
        bonus_flag: bool,
    },
    AdvanceDays {
        days: u64,
    },
    Withdraw {
        depositor: String,
        #[serde(default)]
        caller: Option<String>,
        index: usize,
    },
    WithdrawAll {
        depositor: String,
        #[serde(default)]
        caller: Option<String>,
    },
    SetMinimumDeposit {
        caller: String,
        amount: Decimal,
    },
    Report {
        depositor: String,
    },
}

impl Scenario {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("invalid scenario")
    }
}

/// Pool plus the in-memory collaborators a scenario drives
pub struct Runner {
    pub pool: LenderPool,
    pub vault: Arc<InMemoryVault>,
    pub bonus: Arc<InMemoryBonusLedger>,
    pub clock: ManualClock,
    asset: AssetUnit,
}

impl Runner {
    /// Build the pool from `config` with the scenario's overrides and seeds
    pub fn new(mut config: LedgerConfig, scenario: &Scenario) -> Result<Self> {
        if let Some(pool) = &scenario.pool {
            config.pool = pool.clone();
        }
        config.validate()?;
        let pool_config = config.pool_config()?;
        let asset = pool_config.asset.clone();

        let vault = Arc::new(InMemoryVault::new());
        let bonus = Arc::new(InMemoryBonusLedger::new());
        let auth = Arc::new(DelegationAuthorizer::new(config.admin_account()));

        vault.fund_reserve(units(&asset, scenario.reserve)?);
        for seed in &scenario.accounts {
            vault.deposit(&AccountId::new(seed.id.clone()), units(&asset, seed.balance)?);
        }
        for seed in &scenario.delegates {
            auth.approve_delegate(
                &AccountId::new(seed.depositor.clone()),
                &AccountId::new(seed.agent.clone()),
            );
        }

        let pool = LenderPool::with_event_bus(
            pool_config,
            Collaborators::new(vault.clone(), bonus.clone(), auth),
            tenure_ledger::EventBus::new(config.event_capacity),
        );
        let clock = ManualClock::new(scenario.start.unwrap_or_else(|| SystemClock.now()));

        Ok(Self {
            pool,
            vault,
            bonus,
            clock,
            asset,
        })
    }

    /// Run one step and describe its outcome.
    ///
    /// Rejected steps, including unrepresentable amounts, are part of the
    /// outcome, not failures of the run.
    pub async fn run_step(&self, step: &Step) -> Value {
        let now = self.clock.now();
        match self.apply(step, now).await {
            Ok(detail) => json!({ "ok": true, "now": now, "detail": detail }),
            Err(err) => json!({ "ok": false, "now": now, "error": err.to_string() }),
        }
    }

    async fn apply(&self, step: &Step, now: Timestamp) -> tenure_common::Result<Value> {
        match step {
            Step::CreateRound {
                depositor,
                caller,
                amount,
                bonus_rate_bps,
                tenure_days,
                bonus_flag,
            } => {
                let depositor = AccountId::new(depositor.clone());
                let caller = caller_or(caller, &depositor);
                let amount = units(&self.asset, *amount)?;
                self.pool
                    .create_round(
                        &caller,
                        &depositor,
                        amount,
                        *bonus_rate_bps,
                        *tenure_days,
                        *bonus_flag,
                        now,
                    )
                    .await
                    .map(|index| json!({ "index": index }))
            }
            Step::AdvanceDays { days } => {
                let now = self.clock.advance_days(*days);
                Ok(json!({ "now": now }))
            }
            Step::Withdraw {
                depositor,
                caller,
                index,
            } => {
                let depositor = AccountId::new(depositor.clone());
                let caller = caller_or(caller, &depositor);
                self.pool
                    .withdraw(&caller, &depositor, *index, now)
                    .await
                    .map(|p| {
                        json!({
                            "principal": self.amount(p.principal),
                            "stable_reward": self.amount(p.stable_reward),
                            "bonus_reward": self.amount(p.bonus_reward),
                        })
                    })
            }
            Step::WithdrawAll { depositor, caller } => {
                let depositor = AccountId::new(depositor.clone());
                let caller = caller_or(caller, &depositor);
                self.pool
                    .withdraw_all_finished(&caller, &depositor, now)
                    .await
                    .map(|b| {
                        json!({
                            "settled": b.settled_indices,
                            "principal": self.amount(b.principal),
                            "stable_reward": self.amount(b.stable_reward),
                            "bonus_reward": self.amount(b.bonus_reward),
                        })
                    })
            }
            Step::SetMinimumDeposit { caller, amount } => {
                let amount = units(&self.asset, *amount)?;
                self.pool
                    .set_minimum_deposit(&AccountId::new(caller.clone()), amount)
                    .map(|_| json!({ "minimum_deposit": self.amount(amount) }))
            }
            Step::Report { depositor } => self.report(&AccountId::new(depositor.clone())).await,
        }
    }

    /// Rounds, balances and live rewards of one depositor
    pub async fn report(&self, depositor: &AccountId) -> tenure_common::Result<Value> {
        let now = self.clock.now();
        let mut rounds = Vec::new();
        for (index, round) in self.pool.ledger().rounds(depositor).await.into_iter().enumerate() {
            let rewards = self.pool.rewards_of(depositor, index, now).await?;
            rounds.push(json!({
                "index": index,
                "amount_lent": self.amount(round.amount_lent),
                "bonus_rate_bps": round.bonus_rate_bps,
                "tenure_days": round.tenure_seconds / tenure_common::SECONDS_PER_DAY,
                "bonus_flag": round.bonus_flag,
                "settled": round.settled,
                "stable_reward": self.amount(rewards.stable),
                "bonus_reward": self.amount(rewards.bonus),
                "total_reward": self.amount(rewards.total),
            }));
        }
        Ok(json!({
            "depositor": depositor,
            "total_lent": self.amount(self.pool.total_lent(depositor).await?),
            "finished": self.pool.finished_rounds(depositor, now).await,
            "balance": self.amount(self.vault.balance_of(depositor)),
            "bonus_credited": self.amount(self.bonus.credited(depositor)),
            "rounds": rounds,
        }))
    }

    fn amount(&self, units: Amount) -> String {
        self.asset.format(units)
    }
}

fn caller_or(caller: &Option<String>, depositor: &AccountId) -> AccountId {
    caller
        .as_ref()
        .map(|c| AccountId::new(c.clone()))
        .unwrap_or_else(|| depositor.clone())
}

fn units(asset: &AssetUnit, value: Decimal) -> tenure_common::Result<Amount> {
    asset.to_units(value).ok_or_else(|| {
        TenureError::Serialization(format!("{} is not a valid {} amount", value, asset.symbol))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SCENARIO: &str = r#"{
        "pool": { "stable_rate_bps": 500, "minimum_deposit": "100" },
        "start": 1700000000,
        "reserve": "10000",
        "accounts": [{ "id": "alice", "balance": "5000" }],
        "delegates": [{ "depositor": "alice", "agent": "bot" }],
        "steps": [
            { "op": "create_round", "depositor": "alice", "amount": "1000", "bonus_rate_bps": 1000, "tenure_days": 30, "bonus_flag": true },
            { "op": "create_round", "depositor": "alice", "amount": "10", "bonus_rate_bps": 1000, "tenure_days": 30 },
            { "op": "withdraw", "depositor": "alice", "index": 0 },
            { "op": "advance_days", "days": 31 },
            { "op": "withdraw", "depositor": "alice", "caller": "bot", "index": 0 },
            { "op": "report", "depositor": "alice" }
        ]
    }"#;

    #[tokio::test]
    async fn test_scenario_runs() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let runner = Runner::new(LedgerConfig::default(), &scenario).unwrap();

        let mut outcomes = Vec::new();
        for step in &scenario.steps {
            outcomes.push(runner.run_step(step).await);
        }

        assert_eq!(outcomes[0]["ok"], true);
        assert_eq!(outcomes[0]["detail"]["index"], 0);
        // below minimum
        assert_eq!(outcomes[1]["ok"], false);
        // not finished yet
        assert_eq!(outcomes[2]["ok"], false);
        assert_eq!(outcomes[4]["ok"], true);
        assert_eq!(outcomes[4]["detail"]["stable_reward"], "4.109589 USDC");
        assert_eq!(outcomes[4]["detail"]["bonus_reward"], "8.219178 USDC");
        assert_eq!(outcomes[5]["detail"]["total_lent"], "0 USDC");
        assert_eq!(outcomes[5]["detail"]["rounds"][0]["settled"], true);
    }

    #[test]
    fn test_parses_decimal_amounts() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        assert_eq!(scenario.reserve, dec!(10000));
        assert_eq!(scenario.accounts[0].balance, dec!(5000));
        match &scenario.steps[0] {
            Step::CreateRound {
                amount,
                caller,
                bonus_flag,
                ..
            } => {
                assert_eq!(*amount, dec!(1000));
                assert!(caller.is_none());
                assert!(*bonus_flag);
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert!(matches!(&scenario.steps[1], Step::CreateRound { bonus_flag: false, .. }));
    }

    #[tokio::test]
    async fn test_invalid_amount_is_an_outcome() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let runner = Runner::new(LedgerConfig::default(), &scenario).unwrap();

        let negative = Step::CreateRound {
            depositor: "alice".to_string(),
            caller: None,
            amount: dec!(-5),
            bonus_rate_bps: 1000,
            tenure_days: 30,
            bonus_flag: false,
        };
        let outcome = runner.run_step(&negative).await;
        assert_eq!(outcome["ok"], false);
        assert!(outcome["error"].as_str().unwrap().contains("-5"));

        let minimum = Step::SetMinimumDeposit {
            caller: "admin".to_string(),
            amount: dec!(-1),
        };
        assert_eq!(runner.run_step(&minimum).await["ok"], false);

        // The run carries on
        let report = runner
            .run_step(&Step::Report {
                depositor: "alice".to_string(),
            })
            .await;
        assert_eq!(report["ok"], true);
        assert_eq!(report["detail"]["rounds"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_rejects_unknown_op() {
        let err = Scenario::from_json(r#"{ "steps": [{ "op": "explode" }] }"#);
        assert!(err.is_err());
    }
}
