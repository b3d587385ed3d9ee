//! Minimal embedding example for nameline-core
//!
//! Demonstrates using nameline-core as a library in a custom application:
//! the authoritative resolver runs in-process on an ephemeral port, a
//! record goes in through the registration bridge, and the resolution
//! client reads it back. The resolver lifecycle is fully managed by the
//! application.

use std::time::Duration;

use nameline_core::{
    send_registration, Authority, AuthorityConfig, RecordStore, ResolverClient, Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    println!("=== Embedded nameline-core Example ===\n");

    // In-process resolver on an ephemeral port
    println!("1. Binding resolver on an ephemeral port...");
    let store = RecordStore::new();
    let config = AuthorityConfig {
        listen: "127.0.0.1:0".parse().map_err(|_| {
            nameline_core::Error::config("demo listen address failed to parse")
        })?,
        event_channel_capacity: 100,
    };
    let (authority, mut event_rx) = Authority::bind(&config, store.clone()).await?;
    let registry = authority.local_addr()?;
    println!("   Resolver listening on udp://{registry}");

    // Event listener (optional; drop the receiver if you do not care)
    let event_listener = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("   [event] {event:?}");
        }
    });

    println!("2. Starting resolver in background...");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let resolver_task =
        tokio::spawn(async move { authority.run_with_shutdown(Some(shutdown_rx)).await });

    println!("3. Registering printer.local -> 192.168.1.42 through the bridge...");
    send_registration("printer.local", "192.168.1.42", registry).await?;

    // The bridge is fire-and-forget; wait until the resolver applied it.
    for _ in 0..100 {
        if store.get("printer.local").await.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    println!("4. Resolving through the client...");
    let client = ResolverClient::new();
    let address = client.resolve("printer.local", registry).await?;
    println!("   printer.local resolves to {address}");

    match client.resolve("missing.local", registry).await {
        Err(error) => println!("   missing.local does not: {error}"),
        Ok(address) => println!("   missing.local unexpectedly resolved to {address}"),
    }

    println!("5. Stopping resolver...");
    let _ = shutdown_tx.send(());
    if let Ok(result) = resolver_task.await {
        result?;
    }
    let _ = tokio::time::timeout(Duration::from_millis(100), event_listener).await;

    println!("\n=== Embedding Successful ===");
    println!("Key points:");
    println!("- Resolver lifecycle is fully controlled by the application");
    println!("- No global state; the store handle is plain data");
    println!("- Registration and resolution are ordinary library calls");

    Ok(())
}
