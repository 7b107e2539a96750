use ergo_swap_sdk::testing::{
    MOCK_TX_ID, MockIndexer, MockNode, MockProver, erg_box, n2t_pool, token_box, token_id,
};
use ergo_swap_sdk::{
    Account, AssetId, EngineConfig, EngineHandle, Error, Network, Slippage, SwapEngine,
    SwapRequest, check_conservation, sigma,
};

const WALLET: &str = "3WwXpssaZwcNzaGMv3AgxBdTPJQBt5gCmqBsg3DykQ39bYdhJBsN";
const ORDER_CONTRACT: &str = "19aabbcc";
const HEIGHT: u32 = 1_250_000;

fn config() -> EngineConfig {
    EngineConfig {
        swap_order_contract: ORDER_CONTRACT.into(),
        ..EngineConfig::for_network(Network::Testnet)
    }
}

fn token() -> AssetId {
    AssetId::Token(token_id(0xaa))
}

/// Two ERG/token pools, the second one deeper; the wallet holds 1 ERG and
/// some of the token.
fn engine() -> SwapEngine<MockIndexer, MockNode> {
    let indexer = MockIndexer::default();
    indexer.set_pools(vec![
        n2t_pool(1, 10_000_000_000, token_id(0xaa), 5_000_000),
        n2t_pool(2, 10_000_000_000, token_id(0xaa), 8_000_000),
    ]);
    indexer.set_boxes(
        WALLET,
        vec![
            erg_box(0x10, 1_000_000_000),
            token_box(0x11, 2_000_000, &[(token_id(0xaa), 40_000)]),
        ],
    );
    indexer.set_height(HEIGHT);
    EngineHandle::build(config(), indexer, MockNode::default())
        .activate()
        .unwrap()
}

fn sell_erg(amount: u128) -> SwapRequest {
    SwapRequest {
        base: AssetId::Native,
        quote: token(),
        amount,
        slippage: Slippage::from_percent(1).unwrap(),
        pool_id: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn activation_validates_config() {
    let handle = EngineHandle::build(
        EngineConfig::for_network(Network::Testnet),
        MockIndexer::default(),
        MockNode::default(),
    );
    assert!(matches!(handle.activate(), Err(Error::Config(_))));
}

#[test]
fn activation_loads_pools() {
    let engine = engine();
    assert_eq!(engine.registry().snapshot().len(), 2);
    assert_eq!(engine.pools_for_pair(&token(), &AssetId::Native).len(), 2);
}

#[test]
fn quote_routes_to_the_deepest_pool() {
    let engine = engine();
    let quote = engine.quote(&sell_erg(100_000_000)).unwrap();
    assert_eq!(quote.pool.id, token_id(2));
    assert!(quote.order.extremes.min_output.amount <= quote.order.expected_output.amount);
    assert_eq!(quote.order.miner_fee, engine.config().miner_fee);
    assert_eq!(quote.order.fee_budget, 3 * engine.config().miner_fee);
}

#[test]
fn quote_honours_pool_restriction() {
    let engine = engine();
    let mut request = sell_erg(100_000_000);
    request.pool_id = Some(token_id(1));
    assert_eq!(engine.quote(&request).unwrap().pool.id, token_id(1));

    request.pool_id = Some(token_id(0x42));
    assert!(matches!(engine.quote(&request), Err(Error::PoolNotFound(_))));
}

#[test]
fn quote_without_pools_has_no_route() {
    let engine = engine();
    let mut request = sell_erg(100_000_000);
    request.quote = AssetId::Token(token_id(0xbb));
    assert!(matches!(engine.quote(&request), Err(Error::NoViableRoute { .. })));
}

#[test]
fn prepared_swap_is_balanced_and_well_formed() {
    let engine = engine();
    let prepared = engine.prepare_swap(&sell_erg(100_000_000), WALLET, None).unwrap();
    let tx = &prepared.unsigned;

    check_conservation(&prepared.funded.selection.boxes, tx).unwrap();
    assert_eq!(tx.inputs.len(), 1, "the ERG box alone covers the order");
    assert_eq!(tx.outputs.len(), 3);

    let order_box = &tx.outputs[0];
    assert_eq!(order_box.ergo_tree, ORDER_CONTRACT);
    assert_eq!(order_box.creation_height, HEIGHT);
    assert_eq!(u128::from(order_box.value), prepared.funded.order_box_value);

    let redeemer = hex::decode(MockNode::tree_of(WALLET)).unwrap();
    assert_eq!(
        order_box.additional_registers.get("R5"),
        Some(&sigma::encode_coll_byte(&redeemer))
    );
    assert_eq!(tx.outputs[1].ergo_tree, MockNode::tree_of(WALLET));
    assert_eq!(u128::from(tx.outputs[2].value), engine.config().miner_fee);
}

#[test]
fn change_goes_to_the_requested_address() {
    let engine = engine();
    let change = "3WvsT2Gm4EpsM9Pg18PdY6XyhNNMqXDsvJTbbf6ihLvAmSb7u5RN";
    let prepared = engine
        .prepare_swap(&sell_erg(100_000_000), WALLET, Some(change))
        .unwrap();
    assert_eq!(prepared.context.change_address, change);
    assert_eq!(prepared.unsigned.outputs[1].ergo_tree, MockNode::tree_of(change));
}

#[test]
fn token_sell_carries_the_token_in_the_order_box() {
    let engine = engine();
    let request = SwapRequest {
        base: token(),
        quote: AssetId::Native,
        amount: 30_000,
        slippage: Slippage::from_percent(1).unwrap(),
        pool_id: None,
    };
    let prepared = engine.prepare_swap(&request, WALLET, None).unwrap();
    let order_box = &prepared.unsigned.outputs[0];
    assert_eq!(order_box.assets.len(), 1);
    assert_eq!(order_box.assets[0].token_id, token_id(0xaa));
    assert_eq!(order_box.assets[0].amount, 30_000);
    check_conservation(&prepared.funded.selection.boxes, &prepared.unsigned).unwrap();
}

#[test]
fn insufficient_funds_report_the_shortfall() {
    let engine = engine();
    let request = SwapRequest {
        base: token(),
        quote: AssetId::Native,
        amount: 120_000,
        slippage: Slippage::ZERO,
        pool_id: None,
    };
    match engine.prepare_swap(&request, WALLET, None).unwrap_err() {
        Error::InsufficientInputs(shortfalls) => {
            let s = shortfalls
                .iter()
                .find(|s| s.asset == token())
                .expect("token shortfall");
            assert_eq!(s.missing(), 80_000);
        }
        other => panic!("expected InsufficientInputs, got {other}"),
    }
    assert!(engine.node().submitted().is_empty());
}

#[test]
fn swap_signs_and_submits() {
    let engine = engine();
    let account = Account::new(WALLET, Box::new(MockProver));
    let result = engine.swap(&sell_erg(100_000_000), &account, None).unwrap();

    assert_eq!(result.tx_id, MOCK_TX_ID);
    assert_eq!(result.pool_id, token_id(2));
    assert_eq!(result.input.amount, 100_000_000);
    assert_eq!(engine.node().submitted().len(), 1);
}

#[test]
fn rejected_submission_is_reported_verbatim() {
    let engine = engine();
    engine.node().reject_with("double spending attempt");
    let account = Account::new(WALLET, Box::new(MockProver));
    let err = engine.swap(&sell_erg(100_000_000), &account, None).unwrap_err();
    assert!(matches!(err, Error::SubmissionFailed(ref m) if m == "double spending attempt"));
}

#[test]
fn balance_and_live_pool() {
    let engine = engine();
    let balance = engine.balance(WALLET).unwrap();
    assert_eq!(balance.native, 1_002_000_000);
    assert_eq!(balance.amount_of(&token()), 40_000);

    let live = engine.live_pool(&token_id(1)).unwrap();
    assert_eq!(live.y.amount, 5_000_000);
    assert!(matches!(engine.live_pool(&token_id(0x42)), Err(Error::PoolNotFound(_))));
}

#[test]
fn reload_picks_up_new_pools() {
    let engine = engine();
    engine
        .indexer()
        .set_pools(vec![n2t_pool(3, 1_000_000_000, token_id(0xbb), 1_000)]);
    assert_eq!(engine.reload_pools().unwrap(), 1);
    assert!(engine.pools_for_pair(&AssetId::Native, &token()).is_empty());
}
