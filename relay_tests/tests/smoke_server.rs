//! Smoke tests: server lifecycle without the full scenario machinery.

use std::time::Duration;

use relay_client::RelayClient;
use relay_server::server::bind_ephemeral;

/// Server binds, accepts a client, and survives its departure.
#[tokio::test]
async fn server_survives_connect_and_disconnect() -> anyhow::Result<()> {
    let (server, cfg) = bind_ephemeral().await?;
    let _server = tokio::spawn(server.run());

    let first = RelayClient::connect(&cfg).await?;
    assert_eq!(first.view.len(), 1);
    assert_eq!(first.server_peer()?.to_string(), cfg.server_addr);
    drop(first);

    // The registry is back to empty: a later joiner's snapshot is just
    // itself.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = RelayClient::connect(&cfg).await?;
    assert_eq!(second.view.len(), 1);
    assert!(second.view.get(second.session_id).is_some());

    Ok(())
}

/// Ids are never reused across connections within a process.
#[tokio::test]
async fn session_ids_are_not_recycled() -> anyhow::Result<()> {
    let (server, cfg) = bind_ephemeral().await?;
    let _server = tokio::spawn(server.run());

    let first = RelayClient::connect(&cfg).await?;
    let first_id = first.session_id;
    drop(first);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = RelayClient::connect(&cfg).await?;
    assert_ne!(second.session_id, first_id);

    Ok(())
}
