use std::time::Duration;

use super::*;
use crate::{
    api::ItemFields,
    test_support::{ids, three_contacts, Call, FakeApi},
};
use shared::domain::Contact;

fn collection_with(api: Arc<FakeApi>) -> Arc<Collection<Contact>> {
    Collection::new(api)
}

async fn wait_for_fetches(api: &FakeApi, count: usize) {
    for _ in 0..200 {
        let fetches = api
            .calls()
            .into_iter()
            .filter(|call| *call == Call::Fetch)
            .count();
        if fetches >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("backend never saw {count} fetch(es)");
}

#[tokio::test]
async fn starts_idle_and_loads_into_mirror() {
    let api = Arc::new(FakeApi::with_items(three_contacts()));
    let collection = collection_with(api.clone());
    assert_eq!(collection.state().await, LoadState::Idle);

    let outcome = collection.reload().await.expect("reload");

    assert_eq!(outcome, ReloadOutcome::Applied { generation: 1, len: 3 });
    assert_eq!(collection.state().await, LoadState::Loaded);
    assert_eq!(ids(&collection.mirror().await.snapshot()), vec![1, 2, 3]);
}

#[tokio::test]
async fn failed_load_enters_error_until_acknowledged() {
    let api = Arc::new(FakeApi::with_items(three_contacts()));
    api.fail_next_fetch(ClientError::Transport("connection refused".into()));
    let collection = collection_with(api.clone());

    let err = collection.reload().await.expect_err("must fail");

    assert!(err.is_transport());
    assert_eq!(
        collection.state().await,
        LoadState::Error(crate::error::CONNECTION_ERROR_MESSAGE.to_string())
    );
    assert!(collection.mirror().await.is_empty());
    assert!(collection.acknowledge_error().await);
    assert_eq!(collection.state().await, LoadState::Idle);
    assert!(!collection.acknowledge_error().await);
}

#[tokio::test]
async fn older_reload_response_is_discarded() {
    let api = Arc::new(FakeApi::with_items(three_contacts()));
    let collection = collection_with(api.clone());
    let release_first = api.hold_next_fetch();

    let first = {
        let collection = Arc::clone(&collection);
        tokio::spawn(async move { collection.reload().await })
    };
    wait_for_fetches(&api, 1).await;

    api.create(ItemFields::new().with("name", "Posgrado"))
        .await
        .expect("server side create");
    let second = collection.reload().await.expect("second reload");
    assert_eq!(second, ReloadOutcome::Applied { generation: 2, len: 4 });

    release_first.send(()).expect("release");
    let first = first.await.expect("join").expect("first reload");

    assert_eq!(first, ReloadOutcome::Stale { generation: 1 });
    assert_eq!(collection.mirror().await.len(), 4);
    assert_eq!(collection.state().await, LoadState::Loaded);
}

#[tokio::test]
async fn close_cancels_in_flight_reload() {
    let api = Arc::new(FakeApi::with_items(three_contacts()));
    let collection = collection_with(api.clone());
    let _held = api.hold_next_fetch();

    let pending = {
        let collection = Arc::clone(&collection);
        tokio::spawn(async move { collection.reload().await })
    };
    wait_for_fetches(&api, 1).await;
    collection.close();

    let result = pending.await.expect("join");
    assert_eq!(result, Err(ClientError::Cancelled));
    assert_eq!(collection.state().await, LoadState::Idle);
    assert!(collection.mirror().await.is_empty());

    assert_eq!(collection.reload().await, Err(ClientError::Cancelled));
    assert!(collection.is_closed());
}

#[tokio::test]
async fn aborted_mutation_returns_to_loaded() {
    let api = Arc::new(FakeApi::with_items(three_contacts()));
    let collection = collection_with(api);
    collection.reload().await.expect("reload");

    let previous = collection.begin_mutation().await;
    assert_eq!(previous, LoadState::Loaded);
    assert_eq!(collection.state().await, LoadState::Mutating);
    collection.abort_mutation(previous).await;
    assert_eq!(collection.state().await, LoadState::Loaded);
}

#[tokio::test]
async fn aborted_mutation_keeps_a_failed_load_failed() {
    let api = Arc::new(FakeApi::with_items(three_contacts()));
    api.fail_next_fetch(ClientError::Transport("connection refused".into()));
    let collection = collection_with(api);
    collection.reload().await.expect_err("load fails");

    let previous = collection.begin_mutation().await;
    assert!(matches!(previous, LoadState::Error(_)));
    collection.abort_mutation(previous).await;

    assert!(matches!(collection.state().await, LoadState::Error(_)));
    assert!(collection.mirror().await.is_empty());
}
