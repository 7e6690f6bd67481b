//! Request routing through the in-process server.

use std::sync::Arc;
use std::time::Duration;

use libdataset::{
    CREATE_TASK, CreateArgs, DatasetError, DatasetKind, DatasetServer, HookDelivery, Outcome,
    Request,
};
use tokio::sync::mpsc;

use crate::common::{STREAM_BASE, init_logger, pooled, provider, seeded_backend};

type Hooks = mpsc::UnboundedReceiver<HookDelivery>;

fn start() -> (libdataset::DatasetClient, tokio::task::JoinHandle<()>, Hooks) {
    let (hooks_tx, hooks_rx) = mpsc::unbounded_channel();
    let server = DatasetServer::new(Arc::new(provider(seeded_backend())), hooks_tx);
    let (client, handle) = server.spawn(16);
    (client, handle, hooks_rx)
}

#[tokio::test(flavor = "multi_thread")]
async fn create_over_transport() {
    init_logger();

    let (client, _handle, _hooks) = start();
    let result = client
        .create(&CreateArgs::filesystem(pooled("fscreate1")))
        .await
        .unwrap();
    assert_eq!(result.dataset.name, "tank/fscreate1");
    assert_eq!(result.dataset.kind, DatasetKind::Filesystem);

    let err = client
        .create(&CreateArgs::filesystem(pooled("fscreate1")))
        .await
        .unwrap_err();
    assert_eq!(err, DatasetError::AlreadyExists(pooled("fscreate1")));
}

#[tokio::test(flavor = "multi_thread")]
async fn direct_response_has_no_stream_ref() {
    let (client, _handle, _hooks) = start();
    let request = Request::new(CREATE_TASK, &CreateArgs::volume(pooled("vol3"), 8192)).unwrap();
    let id = request.id;
    let response = client.request(request).await.unwrap();
    assert_eq!(response.id, id);
    assert!(response.stream_ref().is_none());
    assert!(response.error_ref().is_none());
    assert_eq!(response.result().unwrap().dataset.volsize, Some(8192));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_is_rejected() {
    let (client, _handle, _hooks) = start();
    let request = Request::new("dataset-destroy", &CreateArgs::filesystem(pooled("fs1"))).unwrap();
    let response = client.request(request).await.unwrap();
    assert_eq!(
        response.error_ref(),
        Some(&DatasetError::InvalidArgument(
            "unknown task: dataset-destroy".into()
        ))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_args_are_rejected() {
    let (client, _handle, _hooks) = start();
    let mut request = Request::new(CREATE_TASK, &CreateArgs::default()).unwrap();
    request.args = serde_json::json!({ "name": ["not", "a", "string"] });
    let response = client.request(request).await.unwrap();
    assert!(matches!(
        response.error_ref(),
        Some(DatasetError::InvalidArgument(msg)) if msg.starts_with("args:")
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn streamed_outcome_goes_to_hook() {
    init_logger();

    let (client, _handle, mut hooks) = start();
    let request = Request::new(
        CREATE_TASK,
        &CreateArgs::filesystem(pooled("fs2")).with_property("foo:bar", "baz"),
    )
    .unwrap()
    .with_response_hook("mem://hooks/caller-1");
    let id = request.id;

    let response = client.request(request).await.unwrap();
    let stream = response.stream_ref().expect("stream ref");
    assert_eq!(stream.as_str(), format!("{STREAM_BASE}/{id}"));
    assert!(response.result().is_none());

    let delivery = tokio::time::timeout(Duration::from_secs(5), hooks.recv())
        .await
        .expect("hook delivery in time")
        .expect("hook channel open");
    assert_eq!(delivery.hook, "mem://hooks/caller-1");
    assert_eq!(delivery.response.id, id);
    match delivery.response.outcome {
        Outcome::Created(result) => assert_eq!(result.dataset.name, "tank/fs2"),
        other => panic!("expected created outcome, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn streamed_backend_failure_goes_to_hook() {
    let (client, _handle, mut hooks) = start();
    let request = Request::new(CREATE_TASK, &CreateArgs::filesystem(pooled("fs1")))
        .unwrap()
        .with_response_hook("mem://hooks/caller-2");

    let response = client.request(request).await.unwrap();
    assert!(response.stream_ref().is_some());

    let delivery = tokio::time::timeout(Duration::from_secs(5), hooks.recv())
        .await
        .expect("hook delivery in time")
        .expect("hook channel open");
    assert_eq!(
        delivery.response.error_ref(),
        Some(&DatasetError::AlreadyExists(pooled("fs1")))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn streamed_validation_failure_is_immediate() {
    let (client, _handle, mut hooks) = start();
    let request = Request::new(CREATE_TASK, &CreateArgs::volume(pooled("vol1"), 0))
        .unwrap()
        .with_response_hook("mem://hooks/caller-3");

    let response = client.request(request).await.unwrap();
    assert_eq!(
        response.error_ref(),
        Some(&DatasetError::MissingOrInvalidArgument("volsize".into()))
    );
    assert!(hooks.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn stopped_server_is_transport_error() {
    let (client, handle, _hooks) = start();
    handle.abort();
    let _ = handle.await;

    let err = client
        .create(&CreateArgs::filesystem(pooled("late")))
        .await
        .unwrap_err();
    assert!(matches!(err, DatasetError::Transport(_)));
}
