mod common;

use common::{SlowRand, TIMEOUT, client, loopback_config, start_server, users_update};
use core::time::Duration;
use logical_core::{
    Error,
    proto::{PingMessage, Reply},
    random::FixedRand,
};
use logical_server::{LogicalServer, ServerConfig, ServerState, client::connect};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tonic::Code;

#[tokio::test]
async fn start_enters_listening() {
    let server = LogicalServer::new(loopback_config(), Arc::new(FixedRand(3)));
    assert_eq!(server.state(), ServerState::Unstarted);
    assert_eq!(server.local_addr(), None);

    let addr = server.start().await.unwrap();
    assert_eq!(server.state(), ServerState::Listening);
    assert_eq!(server.local_addr(), Some(addr));
    assert_ne!(addr.port(), 0);

    server.stop(TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn ping_before_start_is_a_connection_error() {
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };
    let endpoint = format!("http://127.0.0.1:{port}");

    let err = connect(&endpoint, Duration::from_millis(500)).await;
    assert!(err.is_err(), "nothing should be listening yet");

    let server = LogicalServer::new(
        ServerConfig::with_listen_addr(format!("127.0.0.1:{port}")),
        Arc::new(FixedRand(3)),
    );
    server.start().await.unwrap();

    let reply = client(&endpoint)
        .await
        .ping(PingMessage {})
        .await
        .unwrap()
        .into_inner();
    assert_eq!(reply, Reply::pong());

    server.stop(TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn second_start_is_rejected() {
    let (server, _) = start_server(loopback_config(), FixedRand(3)).await;
    assert_eq!(server.start().await, Err(Error::AlreadyStarted));
    assert_eq!(server.state(), ServerState::Listening);
    server.stop(TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn address_in_use_is_a_bind_error() {
    let (first, _) = start_server(loopback_config(), FixedRand(3)).await;
    let taken = first.local_addr().unwrap().to_string();

    let second = LogicalServer::new(
        ServerConfig::with_listen_addr(taken.clone()),
        Arc::new(FixedRand(3)),
    );
    match second.start().await {
        Err(Error::Bind { addr, .. }) => assert_eq!(addr, taken),
        other => panic!("expected bind error, got {other:?}"),
    }
    assert_eq!(second.state(), ServerState::Unstarted);
    assert_eq!(
        second.serve_forever(CancellationToken::new()).await,
        Err(Error::NotStarted)
    );

    first.stop(TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn malformed_address_is_a_bind_error() {
    let server = LogicalServer::new(
        ServerConfig::with_listen_addr("not-an-address"),
        Arc::new(FixedRand(3)),
    );
    assert!(matches!(server.start().await, Err(Error::Bind { .. })));
}

#[tokio::test]
async fn stop_is_idempotent() {
    let (server, endpoint) = start_server(loopback_config(), FixedRand(3)).await;
    let mut states = server.subscribe_state();

    server.stop(TIMEOUT).await.unwrap();
    assert_eq!(server.state(), ServerState::Stopped);
    server.stop(TIMEOUT).await.unwrap();
    assert_eq!(server.state(), ServerState::Stopped);
    assert_eq!(*states.borrow_and_update(), ServerState::Stopped);

    assert!(connect(&endpoint, Duration::from_millis(500)).await.is_err());
}

#[tokio::test]
async fn concurrent_stops_agree() {
    let (server, _) = start_server(loopback_config(), FixedRand(3)).await;
    let (a, b) = tokio::join!(server.stop(TIMEOUT), server.stop(TIMEOUT));
    assert_eq!(a, Ok(()));
    assert_eq!(b, Ok(()));
    assert_eq!(server.state(), ServerState::Stopped);
}

#[tokio::test]
async fn stopping_an_unstarted_server() {
    let server = LogicalServer::new(loopback_config(), Arc::new(FixedRand(3)));
    server.stop(TIMEOUT).await.unwrap();
    assert_eq!(server.state(), ServerState::Stopped);
    assert_eq!(server.start().await, Err(Error::ServiceShutdown));
}

#[tokio::test]
async fn serve_forever_returns_once_stopped_without_start() {
    let server = LogicalServer::new(loopback_config(), Arc::new(FixedRand(3)));
    server.stop(TIMEOUT).await.unwrap();

    let res = tokio::time::timeout(TIMEOUT, server.serve_forever(CancellationToken::new()))
        .await
        .expect("serve_forever blocked on a stopped server");
    assert_eq!(res, Ok(()));
    assert_eq!(server.state(), ServerState::Stopped);
}

#[tokio::test]
async fn termination_token_ends_serve_forever() {
    let (server, endpoint) = start_server(loopback_config(), FixedRand(3)).await;
    let server = Arc::new(server);
    let termination = CancellationToken::new();

    let serving = {
        let server = Arc::clone(&server);
        let termination = termination.clone();
        tokio::spawn(async move { server.serve_forever(termination).await })
    };

    let reply = client(&endpoint)
        .await
        .ping(PingMessage {})
        .await
        .unwrap()
        .into_inner();
    assert!(reply.status);

    termination.cancel();
    assert_eq!(serving.await.unwrap(), Ok(()));
    assert_eq!(server.state(), ServerState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn inflight_call_finishes_within_grace() {
    let (server, endpoint) = start_server(
        loopback_config(),
        SlowRand {
            delay: Duration::from_millis(300),
            value: 2,
        },
    )
    .await;
    let server = Arc::new(server);

    let call = {
        let mut client = client(&endpoint).await;
        tokio::spawn(async move { client.call(users_update()).await })
    };
    while server.pool().inflight() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    server.stop(TIMEOUT).await.unwrap();

    let reply = call.await.unwrap().unwrap().into_inner();
    assert_eq!(reply, Reply::success());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn call_past_grace_is_terminated() {
    let (server, endpoint) = start_server(
        loopback_config(),
        SlowRand {
            delay: Duration::from_millis(1500),
            value: 2,
        },
    )
    .await;
    let server = Arc::new(server);

    let call = {
        let mut client = client(&endpoint).await;
        tokio::spawn(async move { client.call(users_update()).await })
    };
    while server.pool().inflight() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    server.stop(Duration::from_millis(50)).await.unwrap();
    assert_eq!(server.state(), ServerState::Stopped);

    // The caller sees a transport-level status, never a reply.
    let status = call.await.unwrap().unwrap_err();
    assert!(
        matches!(status.code(), Code::Aborted | Code::Unavailable),
        "unexpected status: {status:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn calls_are_refused_while_stopping() {
    let (server, endpoint) = start_server(
        loopback_config(),
        SlowRand {
            delay: Duration::from_millis(500),
            value: 2,
        },
    )
    .await;
    let server = Arc::new(server);
    let mut slow_client = client(&endpoint).await;
    let mut late_client = slow_client.clone();

    let slow = tokio::spawn(async move { slow_client.call(users_update()).await });
    while server.pool().inflight() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let stopping = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.stop(TIMEOUT).await })
    };
    while !server.pool().is_closed() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // Same connection, new stream: rejected without a reply.
    let late = late_client.call(users_update()).await;
    assert!(late.is_err());

    assert!(slow.await.unwrap().unwrap().get_ref().status);
    assert_eq!(stopping.await.unwrap(), Ok(()));
}
