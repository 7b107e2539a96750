use std::sync::Arc;

use ergo_swap_lib::EngineRegistry;
use ergo_swap_lib::commands::{self, SwapArgs};
use ergo_swap_sdk::testing::{
    MOCK_TX_ID, MockIndexer, MockNode, MockProver, erg_box, n2t_pool, token_box, token_id,
};
use ergo_swap_sdk::{
    Account, EngineConfig, EngineHandle, Network, Slippage, SwapNode, TokenInfo,
};

const WALLET: &str = "3WwXpssaZwcNzaGMv3AgxBdTPJQBt5gCmqBsg3DykQ39bYdhJBsN";

fn registry() -> EngineRegistry<MockIndexer, MockNode> {
    let indexer = MockIndexer::default();
    indexer.add_token(TokenInfo {
        id: token_id(0xaa),
        name: "SigUSD".into(),
        decimals: 2,
    });
    indexer.set_pools(vec![n2t_pool(1, 10_000_000_000, token_id(0xaa), 5_000_000)]);
    indexer.set_boxes(
        WALLET,
        vec![
            erg_box(0x10, 1_500_000_000),
            token_box(0x11, 1_000_000, &[(token_id(0xaa), 12_345)]),
        ],
    );
    let config = EngineConfig {
        swap_order_contract: "19aabbcc".into(),
        ..EngineConfig::for_network(Network::Testnet)
    };
    let engine = EngineHandle::build(config, indexer, MockNode::default())
        .activate()
        .unwrap();
    let mut registry = EngineRegistry::default();
    registry.insert(Network::Testnet, engine);
    registry
}

fn node(registry: &EngineRegistry<MockIndexer, MockNode>) -> &SwapNode<MockIndexer, MockNode> {
    registry.get(Network::Testnet).unwrap()
}

fn sell_erg(amount: &str) -> SwapArgs {
    SwapArgs {
        base: "ERG".into(),
        quote: "sigusd".into(),
        amount: amount.into(),
        slippage: "1".parse::<Slippage>().unwrap(),
        pool_id: None,
    }
}

#[test]
fn registry_tracks_active_networks() {
    let registry = registry();
    assert_eq!(registry.networks(), vec![Network::Testnet]);
    assert!(registry.get(Network::Mainnet).is_err());
}

#[tokio::test]
async fn balance_uses_display_decimals() {
    let registry = registry();
    let lines = commands::balance(node(&registry), WALLET.into()).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].asset, "ERG");
    assert_eq!(lines[0].amount, "1.501");
    assert_eq!(lines[1].asset, "SigUSD");
    assert_eq!(lines[1].amount, "123.45");
}

#[tokio::test]
async fn balance_fails_when_token_metadata_is_missing() {
    let registry = registry();
    let engine = node(&registry).engine();
    let mut boxes = engine.unspent_boxes(WALLET).unwrap();
    boxes.push(token_box(0x12, 1_000_000, &[(token_id(0xbb), 500)]));
    engine.indexer().set_boxes(WALLET, boxes);

    let err = commands::balance(node(&registry), WALLET.into()).await.unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");
}

#[tokio::test]
async fn pools_for_a_named_pair() {
    let registry = registry();
    let lines = commands::pools(node(&registry), Some(("SigUSD".into(), "ERG".into())))
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].name, "ERG/SigUSD");
    assert_eq!(lines[0].fee, "0.3%");

    let all = commands::pools(node(&registry), None).await.unwrap();
    assert_eq!(all, lines);
}

#[tokio::test]
async fn quote_reads_decimal_amounts() {
    let registry = registry();
    let report = commands::quote(node(&registry), sell_erg("0.1")).await.unwrap();
    assert_eq!(report.pool_id, token_id(1));
    assert_eq!(report.input, "0.1 ERG");
    assert_eq!(report.miner_fee, "0.002 ERG");
    assert!(report.min_output.ends_with("SigUSD"));
}

#[tokio::test]
async fn unknown_asset_is_reported() {
    let registry = registry();
    let mut args = sell_erg("0.1");
    args.quote = "NOPE".into();
    let err = commands::quote(node(&registry), args).await.unwrap_err();
    assert!(err.to_string().contains("unknown asset"), "{err}");
}

#[tokio::test]
async fn swap_submits_through_the_engine() {
    let registry = registry();
    let account = Arc::new(Account::new(WALLET, Box::new(MockProver)));
    let report = commands::swap(node(&registry), sell_erg("0.25"), account, None)
        .await
        .unwrap();
    assert_eq!(report.tx_id, MOCK_TX_ID);
    assert_eq!(report.input, "0.25 ERG");
    assert_eq!(node(&registry).engine().node().submitted().len(), 1);
}
