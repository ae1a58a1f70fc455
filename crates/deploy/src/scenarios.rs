//! Built-in scenarios.
//!
//! Each scenario is plain data: an ordered list of [`DeploymentStep`]s built from
//! [`ScenarioParams`]. The [`Orchestrator`](crate::Orchestrator) runs any of them the same way.

use serde::{Deserialize, Serialize};

use crate::{
    chain::uint128,
    contracts::{minter, price_collector, price_feed, wrap_token},
    pipeline::{Binding, DeploymentStep, Scenario},
};

/// Literal inputs of the built-in scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    /// Initial controller of a freshly instantiated price feed.
    pub controller: String,
    /// Address allowed to feed prices into the collector.
    pub price_feeder: String,
    pub feed_description: String,
    pub decimals: u8,

    /// Deployed wrap token targeted by the `mint` scenario.
    pub wrap_token_address: String,
    pub mint_recipient: String,
    #[serde(with = "uint128")]
    pub mint_amount: u128,

    /// Minter written into a new wrap token.
    pub wrap_token_minter: String,
    pub wrap_token_name: String,
    pub wrap_token_symbol: String,

    pub receiver_name: String,
    pub receiver_address: String,
    pub stable_token_name: String,
    pub stable_token_symbol: String,
    /// Existing price feed for the minter. A new feed is deployed first when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minter_price_feed: Option<String>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            controller: "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd".to_string(),
            price_feeder: "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd".to_string(),
            feed_description: "AURA / VND".to_string(),
            decimals: 6,
            wrap_token_address: "aura199ehk0vljy6tx9rsyzz9pl3ee8hldyjl8enje0vsnzgxauvf5slsms95jp"
                .to_string(),
            mint_recipient: "aura1uaflg8e46wwtvm0td8mkjeaa0d5s53c92dj85r".to_string(),
            mint_amount: 30_000_000_000,
            wrap_token_minter: "aura1uaflg8e46wwtvm0td8mkjeaa0d5s53c92dj85r".to_string(),
            wrap_token_name: "Aura Wrap Token".to_string(),
            wrap_token_symbol: "wAURA".to_string(),
            receiver_name: "Aura Receiver".to_string(),
            receiver_address: "aura1s9e6r0qv8nvfgzhdw9z23rpvgzzdwavu2qfjdd".to_string(),
            stable_token_name: "Aura Stable VND".to_string(),
            stable_token_symbol: "sVND".to_string(),
            minter_price_feed: None,
        }
    }
}

/// Selects a built-in scenario.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ScenarioKind {
    /// Deploy a price feed and a price collector and wire them together.
    Bootstrap,
    /// Mint wrap tokens against a native payment.
    Mint,
    /// Deploy a new wrap token.
    WrapToken,
    /// Deploy a minter together with the token code it instantiates.
    Minter,
}

impl ScenarioKind {
    /// Build the step list for this scenario.
    ///
    /// `native_denom` is the chain denom a wrap token or minter accepts.
    pub fn build(self, params: &ScenarioParams, native_denom: &str) -> Scenario {
        match self {
            ScenarioKind::Bootstrap => bootstrap(params),
            ScenarioKind::Mint => mint(params),
            ScenarioKind::WrapToken => wrap_token(params, native_denom),
            ScenarioKind::Minter => minter(params, native_denom),
        }
    }
}

fn price_feed_init(params: &ScenarioParams) -> price_feed::InstantiateMsg {
    price_feed::InstantiateMsg {
        controller: params.controller.as_str().into(),
        decimals: params.decimals,
        description: params.feed_description.clone(),
    }
}

/// Price feed and collector, with the collector taking control of the feed.
pub fn bootstrap(params: &ScenarioParams) -> Scenario {
    Scenario::new(ScenarioKind::Bootstrap.to_string())
        .step(DeploymentStep::upload("upload-price-feed", "price_feed"))
        .step(DeploymentStep::instantiate(
            "instantiate-price-feed",
            Binding::code_id_of("upload-price-feed"),
            price_feed_init(params),
        ))
        .step(DeploymentStep::upload(
            "upload-price-collector",
            "price_collector",
        ))
        .step(DeploymentStep::instantiate(
            "instantiate-price-collector",
            Binding::code_id_of("upload-price-collector"),
            price_collector::InstantiateMsg {
                price_feed: Binding::contract_address_of("instantiate-price-feed"),
                decimals: params.decimals,
            },
        ))
        .step(DeploymentStep::execute(
            "update-controller",
            Binding::contract_address_of("instantiate-price-feed"),
            price_feed::ExecuteMsg::UpdateController {
                controller: Binding::contract_address_of("instantiate-price-collector"),
            },
        ))
        .step(DeploymentStep::execute(
            "update-price-feeder",
            Binding::contract_address_of("instantiate-price-collector"),
            price_collector::ExecuteMsg::UpdatePriceFeeder {
                price_feeder: params.price_feeder.as_str().into(),
                status: true,
            },
        ))
}

/// A single paid mint on an existing wrap token.
pub fn mint(params: &ScenarioParams) -> Scenario {
    Scenario::new(ScenarioKind::Mint.to_string()).step(
        DeploymentStep::execute(
            "mint",
            params.wrap_token_address.as_str(),
            wrap_token::ExecuteMsg::Mint {
                recipient: params.mint_recipient.as_str().into(),
                amount: params.mint_amount,
            },
        )
        .with_funds(params.mint_amount),
    )
}

/// Upload and instantiate a wrap token backed by `native_denom`.
pub fn wrap_token(params: &ScenarioParams, native_denom: &str) -> Scenario {
    Scenario::new(ScenarioKind::WrapToken.to_string())
        .step(DeploymentStep::upload("upload-wrap-token", "wrap_token"))
        .step(DeploymentStep::instantiate(
            "instantiate-wrap-token",
            Binding::code_id_of("upload-wrap-token"),
            wrap_token::InstantiateMsg {
                name: params.wrap_token_name.clone(),
                symbol: params.wrap_token_symbol.clone(),
                decimals: params.decimals,
                initial_balances: Vec::new(),
                mint: Some(wrap_token::MinterResponse {
                    minter: params.wrap_token_minter.as_str().into(),
                    cap: None,
                }),
                native_denom: native_denom.to_string(),
            },
        ))
}

/// Minter plus the token code it instantiates, then a read back of its exchange setup.
pub fn minter(params: &ScenarioParams, native_denom: &str) -> Scenario {
    let mut scenario = Scenario::new(ScenarioKind::Minter.to_string());

    let price_feed = match &params.minter_price_feed {
        Some(address) => Binding::Literal(address.clone()),
        None => {
            scenario = scenario
                .step(DeploymentStep::upload("upload-price-feed", "price_feed"))
                .step(DeploymentStep::instantiate(
                    "instantiate-price-feed",
                    Binding::code_id_of("upload-price-feed"),
                    price_feed_init(params),
                ));
            Binding::contract_address_of("instantiate-price-feed")
        }
    };

    scenario
        .step(DeploymentStep::upload("upload-token", "wrap_token"))
        .step(DeploymentStep::upload("upload-minter", "minter"))
        .step(DeploymentStep::instantiate(
            "instantiate-minter",
            Binding::code_id_of("upload-minter"),
            minter::InstantiateMsg {
                receiver_name: params.receiver_name.clone(),
                receiver_address: params.receiver_address.as_str().into(),
                accepted_denom: native_denom.to_string(),
                price_feed,
                token_code_id: Binding::code_id_of("upload-token"),
                token_instantiation_msg: minter::TokenInstantiateMsg {
                    name: params.stable_token_name.clone(),
                    symbol: params.stable_token_symbol.clone(),
                    decimals: params.decimals,
                    initial_balances: Vec::new(),
                    mint: None,
                },
            },
        ))
        .step(DeploymentStep::query(
            "exchanging-info",
            Binding::contract_address_of("instantiate-minter"),
            minter::QueryMsg::ExchangingInfo {},
        ))
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::pipeline::{Operation, StepKind};

    #[test]
    fn test_every_builtin_scenario_validates() {
        let params = ScenarioParams::default();
        for kind in ScenarioKind::iter() {
            let scenario = kind.build(&params, "uaura");
            assert_eq!(scenario.name, kind.to_string());
            scenario
                .validate()
                .unwrap_or_else(|e| panic!("{kind} does not validate: {e}"));
        }
    }

    #[test]
    fn test_bootstrap_order() {
        let scenario = bootstrap(&ScenarioParams::default());
        let kinds: Vec<StepKind> = scenario.steps.iter().map(DeploymentStep::kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Upload,
                StepKind::Instantiate,
                StepKind::Upload,
                StepKind::Instantiate,
                StepKind::Execute,
                StepKind::Execute,
            ]
        );
        // No step in bootstrap pays native currency.
        assert!(scenario.steps.iter().all(|step| !matches!(
            step.operation,
            Operation::Execute {
                native_amount: Some(_),
                ..
            }
        )));
    }

    #[test]
    fn test_mint_pays_the_minted_amount() {
        let scenario = mint(&ScenarioParams::default());
        assert_eq!(scenario.steps.len(), 1);
        match &scenario.steps[0].operation {
            Operation::Execute {
                contract,
                native_amount,
                ..
            } => {
                assert_eq!(
                    contract.as_literal().map(String::as_str),
                    Some("aura199ehk0vljy6tx9rsyzz9pl3ee8hldyjl8enje0vsnzgxauvf5slsms95jp")
                );
                assert_eq!(*native_amount, Some(30_000_000_000));
            }
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[test]
    fn test_minter_with_existing_feed_skips_feed_deployment() {
        let params = ScenarioParams {
            minter_price_feed: Some(
                "aura199ehk0vljy6tx9rsyzz9pl3ee8hldyjl8enje0vsnzgxauvf5slsms95jp".to_string(),
            ),
            ..Default::default()
        };
        let scenario = minter(&params, "uaura");
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(scenario.steps[0].name, "upload-token");
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_scenario_kind_parsing() {
        assert_eq!("wrap-token".parse::<ScenarioKind>().unwrap(), ScenarioKind::WrapToken);
        assert_eq!(ScenarioKind::Bootstrap.as_ref(), "bootstrap");
        assert!("unknown".parse::<ScenarioKind>().is_err());
    }
}
