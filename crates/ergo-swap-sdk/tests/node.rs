use std::sync::Arc;
use std::time::Duration;

use ergo_swap_sdk::testing::{
    MOCK_TX_ID, MockIndexer, MockNode, MockProver, erg_box, n2t_pool, token_id,
};
use ergo_swap_sdk::{
    Account, AssetId, EngineConfig, EngineHandle, Error, Network, NodeError, Slippage, SwapNode,
    SwapRequest,
};

const WALLET: &str = "3WwXpssaZwcNzaGMv3AgxBdTPJQBt5gCmqBsg3DykQ39bYdhJBsN";

fn setup_node() -> SwapNode<MockIndexer, MockNode> {
    let indexer = MockIndexer::default();
    indexer.set_pools(vec![n2t_pool(1, 10_000_000_000, token_id(0xaa), 5_000_000)]);
    indexer.set_boxes(WALLET, vec![erg_box(0x10, 1_000_000_000)]);
    indexer.set_height(900_000);
    let config = EngineConfig {
        swap_order_contract: "19aabbcc".into(),
        ..EngineConfig::for_network(Network::Testnet)
    };
    let engine = EngineHandle::build(config, indexer, MockNode::default())
        .activate()
        .unwrap();
    SwapNode::new(engine)
}

fn request() -> SwapRequest {
    SwapRequest {
        base: AssetId::Native,
        quote: AssetId::Token(token_id(0xaa)),
        amount: 50_000_000,
        slippage: Slippage::from_percent(2).unwrap(),
        pool_id: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn async_quote_and_swap() {
    let node = setup_node();

    let quote = node.quote(request()).await.unwrap();
    assert_eq!(quote.pool.id, token_id(1));

    let account = Arc::new(Account::new(WALLET, Box::new(MockProver)));
    let result = node.swap(request(), account, None).await.unwrap();
    assert_eq!(result.tx_id, MOCK_TX_ID);
    assert_eq!(result.min_output, quote.order.extremes.min_output);
    assert_eq!(node.engine().node().submitted().len(), 1);
}

#[tokio::test]
async fn async_errors_keep_the_engine_error() {
    let node = setup_node();
    let balance = node.balance("3unknown".into()).await.unwrap();
    assert_eq!(balance.native, 0);

    node.engine().indexer().fail_next("explorer down");
    match node.reload_pools().await {
        Err(NodeError::Engine(Error::Indexer(msg))) => assert_eq!(msg, "explorer down"),
        other => panic!("expected indexer error, got {other:?}"),
    }
    // The previous snapshot survives a failed reload.
    assert_eq!(
        node.pools_for_pair(&AssetId::Native, &AssetId::Token(token_id(0xaa)))
            .len(),
        1
    );
}

#[tokio::test]
async fn refresher_reloads_until_shutdown() {
    let node = setup_node();
    let (tx, rx) = tokio::sync::watch::channel(false);
    let handle = node.spawn_pool_refresher(Duration::from_millis(20), rx);

    node.engine()
        .indexer()
        .set_pools(vec![n2t_pool(7, 1_000_000_000, token_id(0xaa), 1_000)]);
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(node.engine().registry().by_id(&token_id(7)).is_some());

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("refresher stops on shutdown")
        .unwrap();
}
